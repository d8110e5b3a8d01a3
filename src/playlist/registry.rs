use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::error::{Error, Result};

use super::model::{Playlist, VFS_PLAYLIST, is_system_name};

/// The set of playlists known to the engine, in creation order.
///
/// The registry lock only guards membership. Track contents are guarded by
/// each playlist's own lock, and the two are never held together.
#[derive(Debug)]
pub struct PlaylistRegistry {
    playlists: Mutex<Vec<Arc<Playlist>>>,
}

impl Default for PlaylistRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaylistRegistry {
    /// A registry holding only the system playlist.
    pub fn new() -> Self {
        Self {
            playlists: Mutex::new(vec![Arc::new(Playlist::new(VFS_PLAYLIST))]),
        }
    }

    pub fn list(&self) -> Vec<Arc<Playlist>> {
        self.lock().clone()
    }

    pub fn get(&self, name: &str) -> Result<Arc<Playlist>> {
        self.lock()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
            .ok_or_else(|| Error::PlaylistNotFound(name.to_string()))
    }

    pub fn add(&self, name: &str) -> Result<Arc<Playlist>> {
        if is_system_name(name) {
            return Err(Error::SystemNameRejected(name.to_string()));
        }
        let mut playlists = self.lock();
        if playlists.iter().any(|p| p.name() == name) {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        let playlist = Arc::new(Playlist::new(name));
        playlists.push(Arc::clone(&playlist));
        debug!("added playlist '{name}'");
        Ok(playlist)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let mut playlists = self.lock();
        let pos = playlists
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| Error::PlaylistNotFound(name.to_string()))?;
        if playlists[pos].is_system() {
            return Err(Error::SystemPlaylistProtected(name.to_string()));
        }
        playlists.remove(pos);
        debug!("deleted playlist '{name}'");
        Ok(())
    }

    /// The engine-owned playlist used for directory playback.
    pub fn vfs(&self) -> Result<Arc<Playlist>> {
        self.get(VFS_PLAYLIST)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Playlist>>> {
        self.playlists.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
