//! Player facade: the one object the protocol layer talks to.
//!
//! `Engine` owns the playlist registry and the playback thread. Operations
//! that touch both (look a track up, then play it) run under a single facade
//! lock so two clients can't interleave them. A sequencer thread follows the
//! playback thread's answers to play requests and applies the configured
//! end-of-track policy when a track runs out.

use std::collections::VecDeque;
use std::fs;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::audio::{AudioPlayer, Capabilities, PlaybackState, PlayerEvent};
use crate::config::{EndOfTrack, LibrarySettings, Settings};
use crate::error::{Error, Result};
use crate::playlist::{Playlist, PlaylistRegistry, VFS_PLAYLIST};
use crate::vfs::{self, Entry, Root, Track, VfsPath};

/// Where playback currently is, as far as sequencing is concerned.
#[derive(Debug, Clone)]
struct Cursor {
    playlist: String,
    index: usize,
    track: Arc<Track>,
    /// Sent by the sequencer rather than a client.
    advancing: bool,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub state: PlaybackState,
    pub track: Option<Arc<Track>>,
    /// Playlist name and index of the playing entry, if it came from one.
    pub position: Option<(String, usize)>,
}

/// The facade's view of the playback thread.
#[derive(Debug, Default)]
struct Sequence {
    /// Last request the playback thread confirmed.
    current: Option<Cursor>,
    /// Requests sent but not yet answered. Answers come back in this order.
    pending: VecDeque<Cursor>,
}

impl Sequence {
    /// Take the oldest pending request if `track` answers it.
    fn answer(&mut self, track: &Arc<Track>) -> Option<Cursor> {
        if self.pending.front().is_some_and(|c| Arc::ptr_eq(&c.track, track)) {
            return self.pending.pop_front();
        }
        debug!("unmatched answer for '{}'", track.file_path);
        None
    }

    /// Cursor of the track the playback thread holds, newest request first.
    fn locate(&self, track: &Arc<Track>) -> Option<&Cursor> {
        self.pending
            .iter()
            .rev()
            .chain(self.current.iter())
            .find(|c| Arc::ptr_eq(&c.track, track))
    }
}

struct Shared {
    root: Root,
    capabilities: Arc<Capabilities>,
    library: LibrarySettings,
    end_of_track: EndOfTrack,
    playlists: PlaylistRegistry,
    player: AudioPlayer,
    /// Facade lock. Compound operations hold it from lookup to hand-off.
    sequence: Mutex<Sequence>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Sequence> {
        self.sequence.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_track(
        &self,
        seq: &mut Sequence,
        playlist: &Playlist,
        index: usize,
        advancing: bool,
    ) -> Result<()> {
        let track = playlist.track(index).ok_or_else(|| Error::TrackOutOfRange {
            playlist: playlist.name().to_string(),
            index,
        })?;
        self.player.play(Arc::clone(&track))?;
        seq.pending.push_back(Cursor {
            playlist: playlist.name().to_string(),
            index,
            track,
            advancing,
        });
        Ok(())
    }

    fn on_event(&self, event: PlayerEvent) {
        let mut seq = self.lock();
        match event {
            PlayerEvent::TrackStarted(track) => {
                if let Some(started) = seq.answer(&track) {
                    seq.current = Some(started);
                }
            }
            PlayerEvent::PlayFailed(track) => {
                let Some(failed) = seq.answer(&track) else {
                    return;
                };
                // Skip a broken entry only when nothing else is playing or queued.
                if failed.advancing && seq.current.is_none() && seq.pending.is_empty() {
                    info!("skipping '{}' #{}", failed.playlist, failed.index);
                    self.advance(&mut seq, &failed);
                }
            }
            PlayerEvent::TrackFinished(track) => {
                let finished = match &seq.current {
                    Some(c) if Arc::ptr_eq(&c.track, &track) => c.clone(),
                    _ => return,
                };
                seq.current = None;
                // A newer play request already replaced this track.
                if !seq.pending.is_empty() || self.end_of_track == EndOfTrack::Stop {
                    return;
                }
                self.advance(&mut seq, &finished);
            }
        }
    }

    fn advance(&self, seq: &mut Sequence, from: &Cursor) {
        let next = from.index + 1;
        let result = self
            .playlists
            .get(&from.playlist)
            .and_then(|pl| self.start_track(seq, &pl, next, true));
        match result {
            Ok(()) => debug!("advancing to '{}' #{next}", from.playlist),
            Err(Error::TrackOutOfRange { .. }) => {
                info!("reached end of playlist '{}'", from.playlist);
            }
            Err(e) => warn!("cannot advance playlist '{}': {e}", from.playlist),
        }
    }
}

pub struct Engine {
    shared: Arc<Shared>,
    sequencer: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Start the playback thread and the sequencer. The music root must be an
    /// existing directory.
    pub fn start(settings: &Settings, capabilities: Arc<Capabilities>) -> Result<Self> {
        let root = Root::new(&settings.library.root)?;
        if !fs::metadata(root.dir())?.is_dir() {
            return Err(Error::NotADirectory(root.dir().display().to_string()));
        }

        let (player, events) = AudioPlayer::new(Arc::clone(&capabilities), settings.audio.clone())?;
        let shared = Arc::new(Shared {
            root,
            capabilities,
            library: settings.library.clone(),
            end_of_track: settings.playback.end_of_track,
            playlists: PlaylistRegistry::new(),
            player,
            sequence: Mutex::new(Sequence::default()),
        });

        let seq_shared = Arc::clone(&shared);
        let sequencer = thread::Builder::new()
            .name("sequencer".to_string())
            .spawn(move || run_sequencer(&seq_shared, events))?;

        info!(
            "engine started (root '{}', end of track: {:?})",
            shared.root.dir().display(),
            shared.end_of_track
        );
        Ok(Self {
            shared,
            sequencer: Mutex::new(Some(sequencer)),
        })
    }

    pub fn root(&self) -> &Root {
        &self.shared.root
    }

    pub fn playlists(&self) -> Vec<Arc<Playlist>> {
        self.shared.playlists.list()
    }

    pub fn playlist(&self, name: &str) -> Result<Arc<Playlist>> {
        self.shared.playlists.get(name)
    }

    pub fn add_playlist(&self, name: &str) -> Result<()> {
        self.shared.playlists.add(name).map(|_| ())
    }

    pub fn delete_playlist(&self, name: &str) -> Result<()> {
        self.shared.playlists.delete(name)
    }

    /// Append every track found at `path` to a user playlist. A directory
    /// contributes its whole listing, a file its own track(s).
    pub fn add_tracks(&self, name: &str, path: &VfsPath) -> Result<usize> {
        let playlist = self.user_playlist(name)?;

        let physical = path.physical();
        let tracks: Vec<Arc<Track>> = if fs::metadata(&physical)?.is_dir() {
            self.list(path)?
                .into_iter()
                .filter_map(|e| match e {
                    Entry::Track(t) => Some(t),
                    Entry::Directory(_) => None,
                })
                .collect()
        } else {
            let parent = path.join("..");
            let found: Vec<Arc<Track>> = self
                .list(&parent)?
                .into_iter()
                .filter_map(|e| match e {
                    Entry::Track(t) if t.file_path == *path => Some(t),
                    _ => None,
                })
                .collect();
            if found.is_empty() {
                return Err(Error::NoTagReader(physical));
            }
            found
        };

        let added = tracks.len();
        playlist.append(tracks);
        debug!("appended {added} track(s) from '{path}' to '{name}'");
        Ok(added)
    }

    pub fn clear_playlist(&self, name: &str) -> Result<()> {
        self.user_playlist(name)?.clear();
        Ok(())
    }

    fn user_playlist(&self, name: &str) -> Result<Arc<Playlist>> {
        let playlist = self.shared.playlists.get(name)?;
        if playlist.is_system() {
            return Err(Error::SystemPlaylistProtected(name.to_string()));
        }
        Ok(playlist)
    }

    /// Play entry `index` (0-based) of playlist `name`.
    pub fn play(&self, name: &str, index: usize) -> Result<()> {
        let mut seq = self.shared.lock();
        let playlist = self.shared.playlists.get(name)?;
        self.shared.start_track(&mut seq, &playlist, index, false)
    }

    /// Refill the system playlist with the tracks of `dir` and play entry
    /// `index` of it.
    pub fn play_directory(&self, dir: &VfsPath, index: usize) -> Result<()> {
        let mut seq = self.shared.lock();

        let tracks: Vec<Arc<Track>> = self
            .list(dir)?
            .into_iter()
            .filter_map(|e| match e {
                Entry::Track(t) => Some(t),
                Entry::Directory(_) => None,
            })
            .collect();

        let playlist = self.shared.playlists.vfs()?;
        playlist.clear();
        playlist.append(tracks);
        debug!("'{VFS_PLAYLIST}' now holds {} tracks from '{dir}'", playlist.len());

        self.shared.start_track(&mut seq, &playlist, index, false)
    }

    pub fn pause(&self) -> Result<()> {
        self.shared.player.pause()
    }

    /// Returns once the output device is closed.
    pub fn stop(&self) -> Result<()> {
        let mut seq = self.shared.lock();
        seq.current = None;
        // Requests still in flight get answered, but must not advance.
        for c in seq.pending.iter_mut() {
            c.advancing = false;
        }
        self.shared.player.stop()
    }

    /// The position is reported only for the track the playback thread
    /// actually holds.
    pub fn status(&self) -> Status {
        let seq = self.shared.lock();
        let info = self.shared.player.snapshot();
        let position = match (&info.track, info.state) {
            (_, PlaybackState::Stopped) | (None, _) => None,
            (Some(track), _) => seq.locate(track).map(|c| (c.playlist.clone(), c.index)),
        };
        Status {
            state: info.state,
            track: info.track,
            position,
        }
    }

    pub fn list(&self, dir: &VfsPath) -> Result<Vec<Entry>> {
        vfs::list(dir, &self.shared.capabilities, &self.shared.library)
    }

    /// Kill the playback thread and wait for the sequencer. Calling it again
    /// fails with [`Error::PlayerGone`].
    pub fn shutdown(&self) -> Result<()> {
        self.shared.player.kill()?;

        let handle = self
            .sequencer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(h) = handle {
            if h.join().is_err() {
                warn!("sequencer thread panicked");
            }
        }
        info!("engine stopped");
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let running = self
            .sequencer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if running {
            let _ = self.shutdown();
        }
    }
}

/// Runs until the playback thread exits and drops its event sender.
fn run_sequencer(shared: &Shared, events: Receiver<PlayerEvent>) {
    for event in events {
        shared.on_event(event);
    }
    debug!("sequencer exiting");
}

#[cfg(test)]
mod tests;
