use std::path::Path;

use crate::error::Result;

/// Metadata attached to one playable track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub artist: String,
    pub album: String,
    pub title: String,
    /// Track number as written in the source, may be empty.
    pub number: String,
    /// Track length as `m:ss`.
    pub length: String,
}

impl Tag {
    pub const UNKNOWN_LENGTH: &'static str = "0:00";
}

impl Default for Tag {
    fn default() -> Self {
        Self {
            artist: String::new(),
            album: String::new(),
            title: String::new(),
            number: String::new(),
            length: Self::UNKNOWN_LENGTH.to_string(),
        }
    }
}

/// Reads metadata from audio files of the formats it recognises.
pub trait TagReader: Send + Sync {
    /// Returns true if `path` can be processed by this reader.
    fn matches(&self, path: &Path) -> bool;

    /// Parse the file's metadata.
    fn read_tag(&self, path: &Path) -> Result<Tag>;
}
