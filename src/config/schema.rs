use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level daemon settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/tonearm/config.toml` or `~/.config/tonearm/config.toml`
///
/// Precedence (highest wins):
/// 1) Command line flags (applied by the runtime after loading)
/// 2) Environment variables (prefix `TONEARM__`, `__` as nested separator)
/// 3) Config file (if present)
/// 4) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub library: LibrarySettings,
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the control socket binds to.
    pub host: String,
    pub port: u16,
    /// Service name sent in the greeting line.
    pub greeting: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            greeting: "Tonearm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Physical directory exposed to clients as the virtual `/`.
    pub root: PathBuf,
    /// Extension of cue sheet files (case-insensitive, without dot).
    pub cue_extension: String,
    /// Whether to list hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to follow symlinks while listing.
    pub follow_links: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            cue_extension: "cue".to_string(),
            include_hidden: false,
            follow_links: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Sample rate the output device is opened with.
    pub sample_rate: u32,
    /// Channel count the output device is opened with.
    pub channels: u16,
    /// Upper bound for one buffer-ready wait (milliseconds).
    pub wait_timeout_ms: u64,
    /// Frames per device period.
    pub buffer_frames: usize,
    /// Number of periods the device may have queued at once.
    pub buffer_periods: usize,
}

impl AudioSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            wait_timeout_ms: 500,
            buffer_frames: 4096,
            buffer_periods: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// What happens when the current track runs out.
    pub end_of_track: EndOfTrack,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndOfTrack {
    /// Stay stopped.
    #[serde(alias = "stopped")]
    Stop,
    /// Continue with the next entry of the playlist that was playing.
    #[default]
    #[serde(alias = "next", alias = "auto-advance")]
    Advance,
}
