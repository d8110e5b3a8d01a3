//! Audio-related small types and handles.
//!
//! This module defines the playback state, the messages understood by the
//! playback thread, the events it reports back and the read-only snapshot it
//! publishes for everyone else.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::vfs::Track;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        }
    }
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Switch to decoding and playing this track.
    Play(Arc<Track>),
    /// Toggle pause/resume. No-op while stopped.
    TogglePause,
    /// Release decoder and device, then acknowledge.
    Stop(Sender<()>),
    /// Like `Stop`, then end the playback thread.
    Kill(Sender<()>),
}

/// Everything the playback thread receives, in arrival order.
#[derive(Debug)]
pub(super) enum Message {
    Cmd(AudioCmd),
    /// A buffer-ready watcher finished. `device` identifies which opened
    /// device it waited on; `ready` is false when the wait timed out.
    WatcherDone { device: u64, ready: bool },
}

/// Reported by the playback thread for the layer that sequences tracks.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A play request went through; the thread is now playing this track.
    TrackStarted(Arc<Track>),
    /// A play request was dropped; whatever played before keeps playing.
    PlayFailed(Arc<Track>),
    /// The decoder ran dry; the thread is now stopped with the device still open.
    TrackFinished(Arc<Track>),
}

#[derive(Debug, Clone, Default)]
/// Runtime playback information, written only by the playback thread.
pub struct PlaybackInfo {
    pub state: PlaybackState,
    pub track: Option<Arc<Track>>,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
