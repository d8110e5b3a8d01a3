//! Tonearm: a music player daemon controlled over a line-based TCP protocol.
//!
//! Clients browse a virtual filesystem rooted at the music directory, manage
//! playlists and drive a single playback stream. The pieces, leaf first:
//!
//! - [`vfs`] sandboxed paths and the directory resolver (cue sheets included)
//! - [`playlist`] named track lists
//! - [`audio`] capability contracts and the playback thread
//! - [`engine`] the facade that ties playlists and playback together
//! - [`protocol`] and [`server`] the client-facing layer

pub mod audio;
pub mod backend;
pub mod cli;
pub mod config;
pub mod cue;
pub mod engine;
pub mod error;
pub mod playlist;
pub mod protocol;
pub mod runtime;
pub mod server;
pub mod vfs;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
