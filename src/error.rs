//! Error taxonomy shared by every layer of the daemon.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("playlist '{0}' not found")]
    PlaylistNotFound(String),

    #[error("playlist '{playlist}' has no track number {index}")]
    TrackOutOfRange { playlist: String, index: usize },

    #[error("no decoder found for file '{}'", .0.display())]
    NoDecoder(PathBuf),

    #[error("no tag reader found for file '{}'", .0.display())]
    NoTagReader(PathBuf),

    #[error("playlist '{0}' already exists")]
    AlreadyExists(String),

    #[error("system playlist '{0}' can't be created")]
    SystemNameRejected(String),

    #[error("system playlist '{0}' can't be deleted")]
    SystemPlaylistProtected(String),

    #[error("'{}' is outside of the music root", .0.display())]
    OutsideRoot(PathBuf),

    #[error("'{0}' is not a directory")]
    NotADirectory(String),

    #[error("audio device error: {0}")]
    Device(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("cue sheet '{}' line {line}: {reason}", path.display())]
    CueParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("player thread is not running")]
    PlayerGone,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ::config::ConfigError),
}
