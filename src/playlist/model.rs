use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::vfs::Track;

/// Name of the playlist the engine fills for "play this directory".
pub const VFS_PLAYLIST: &str = "*vfs*";

/// Names wrapped in `*` on both ends are reserved for the engine.
pub fn is_system_name(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('*') && name.ends_with('*')
}

/// A named, ordered list of tracks. Duplicates are allowed.
#[derive(Debug)]
pub struct Playlist {
    name: String,
    tracks: Mutex<Vec<Arc<Track>>>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_system(&self) -> bool {
        is_system_name(&self.name)
    }

    /// Copy of the current contents.
    pub fn tracks(&self) -> Vec<Arc<Track>> {
        self.lock().clone()
    }

    pub fn track(&self, index: usize) -> Option<Arc<Track>> {
        self.lock().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn append(&self, tracks: impl IntoIterator<Item = Arc<Track>>) {
        self.lock().extend(tracks);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Track>>> {
        self.tracks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
