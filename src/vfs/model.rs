use std::sync::Arc;

use crate::audio::Tag;

use super::path::VfsPath;

/// One playable unit: a whole file, or one cue-sheet track inside a file.
#[derive(Debug, Clone)]
pub struct Track {
    pub file_path: VfsPath,
    /// Cue track number; 0 for a standalone file.
    pub number: u32,
    pub tag: Tag,
}

impl Track {
    pub fn new(file_path: VfsPath, number: u32, tag: Tag) -> Self {
        Self {
            file_path,
            number,
            tag,
        }
    }

    /// Lookup identity: the same logical track inside the same file.
    pub fn same_as(&self, other: &Track) -> bool {
        self.number == other.number && self.file_path == other.file_path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub filename: VfsPath,
    pub name: String,
}

impl Directory {
    pub fn new(filename: VfsPath) -> Self {
        let name = filename.name().to_string();
        Self { filename, name }
    }
}

/// A listing entry.
#[derive(Debug, Clone)]
pub enum Entry {
    Directory(Directory),
    Track(Arc<Track>),
}

impl Entry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Entry::Directory(_) => "DIRECTORY",
            Entry::Track(_) => "TRACK",
        }
    }

    pub fn is_track(&self) -> bool {
        matches!(self, Entry::Track(_))
    }

    /// Panics if the entry is a directory.
    pub fn track(&self) -> &Arc<Track> {
        match self {
            Entry::Track(t) => t,
            Entry::Directory(d) => panic!("entry '{}' is a directory, not a track", d.filename),
        }
    }

    /// Panics if the entry is a track.
    pub fn directory(&self) -> &Directory {
        match self {
            Entry::Directory(d) => d,
            Entry::Track(t) => panic!("entry '{}' is a track, not a directory", t.file_path),
        }
    }
}
