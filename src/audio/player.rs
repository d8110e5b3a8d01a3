use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::config::AudioSettings;
use crate::error::{Error, Result};
use crate::vfs::Track;

use super::registry::Capabilities;
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, Message, PlaybackHandle, PlaybackInfo, PlayerEvent};

/// Client handle of the playback thread.
///
/// `play` and `pause` only hand the command over; `stop` and `kill` block
/// until the thread has released the decoder and the output device.
pub struct AudioPlayer {
    tx: Sender<Message>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    /// Start the playback thread. Events are delivered on the returned receiver.
    pub fn new(
        capabilities: Arc<Capabilities>,
        audio_settings: AudioSettings,
    ) -> Result<(Self, Receiver<PlayerEvent>)> {
        let (tx, rx) = mpsc::channel::<Message>();
        let (events_tx, events_rx) = mpsc::channel::<PlayerEvent>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let audio_handle = spawn_audio_thread(
            capabilities,
            audio_settings,
            tx.clone(),
            rx,
            playback_info.clone(),
            events_tx,
        )?;

        let player = Self {
            tx,
            playback: playback_info,
            join: Mutex::new(Some(audio_handle)),
        };
        Ok((player, events_rx))
    }

    pub fn snapshot(&self) -> PlaybackInfo {
        self.playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn play(&self, track: Arc<Track>) -> Result<()> {
        self.send(AudioCmd::Play(track))
    }

    pub fn pause(&self) -> Result<()> {
        self.send(AudioCmd::TogglePause)
    }

    pub fn stop(&self) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.send(AudioCmd::Stop(ack_tx))?;
        ack_rx.recv().map_err(|_| Error::PlayerGone)
    }

    /// Stop playback and end the thread. A second call fails with
    /// [`Error::PlayerGone`].
    pub fn kill(&self) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.send(AudioCmd::Kill(ack_tx))?;
        ack_rx.recv().map_err(|_| Error::PlayerGone)?;

        let handle = self
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(h) = handle {
            if h.join().is_err() {
                warn!("playback thread panicked during shutdown");
            }
        }
        Ok(())
    }

    fn send(&self, cmd: AudioCmd) -> Result<()> {
        if self.is_finished() {
            return Err(Error::PlayerGone);
        }
        self.tx.send(Message::Cmd(cmd)).map_err(|_| Error::PlayerGone)
    }

    fn is_finished(&self) -> bool {
        self.join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_none_or(|h| h.is_finished())
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        if !self.is_finished() {
            debug!("audio player dropped while running, killing playback thread");
            let _ = self.kill();
        }
    }
}
