//! Configuration loader and schema types.
//!
//! This module exposes the settings schema that drives the daemon
//! (socket, music root, audio device defaults, playback policy) and
//! helpers to load it from disk and the environment.

mod load;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use schema::*;
