use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, PoisonError};
use std::thread;
use std::thread::JoinHandle;

use log::{debug, error, info, warn};

use crate::config::AudioSettings;
use crate::error::{Error, Result};
use crate::vfs::Track;

use super::decoder::{AudioFormat, Decoder};
use super::output::Output;
use super::registry::Capabilities;
use super::types::{AudioCmd, Message, PlaybackHandle, PlaybackState, PlayerEvent};

pub(super) fn spawn_audio_thread(
    capabilities: Arc<Capabilities>,
    audio_settings: AudioSettings,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    playback_info: PlaybackHandle,
    events: Sender<PlayerEvent>,
) -> Result<JoinHandle<()>> {
    let mut actor = PlaybackThread {
        capabilities,
        settings: audio_settings,
        tx,
        playback_info,
        events,
        state: PlaybackState::Stopped,
        track: None,
        decoder: None,
        output: None,
        watcher_armed: false,
        next_device_id: 0,
    };

    let handle = thread::Builder::new()
        .name("playback".to_string())
        .spawn(move || actor.run(rx))?;
    Ok(handle)
}

struct OpenOutput {
    device: Arc<dyn Output>,
    id: u64,
    format: AudioFormat,
}

/// Sole owner of the decoder, the output device and the playback state.
struct PlaybackThread {
    capabilities: Arc<Capabilities>,
    settings: AudioSettings,
    /// Loopback sender handed to buffer-ready watchers.
    tx: Sender<Message>,
    playback_info: PlaybackHandle,
    events: Sender<PlayerEvent>,

    state: PlaybackState,
    track: Option<Arc<Track>>,
    decoder: Option<Box<dyn Decoder>>,
    output: Option<OpenOutput>,
    /// Set while a watcher is in flight; only the watcher's report clears it.
    watcher_armed: bool,
    next_device_id: u64,
}

impl PlaybackThread {
    fn run(&mut self, rx: Receiver<Message>) {
        loop {
            self.arm_watcher();

            let Ok(msg) = rx.recv() else {
                self.release();
                break;
            };

            match msg {
                Message::Cmd(AudioCmd::Play(track)) => self.play(track),
                Message::Cmd(AudioCmd::TogglePause) => self.toggle_pause(),
                Message::Cmd(AudioCmd::Stop(ack)) => {
                    self.release();
                    let _ = ack.send(());
                }
                Message::Cmd(AudioCmd::Kill(ack)) => {
                    self.release();
                    let _ = ack.send(());
                    debug!("playback thread exiting");
                    break;
                }
                Message::WatcherDone { device, ready } => {
                    self.watcher_armed = false;
                    let current = self.output.as_ref().is_some_and(|o| o.id == device);
                    if ready && current && self.state == PlaybackState::Playing {
                        self.pump();
                    }
                }
            }
        }
    }

    /// Spawn a buffer-ready watcher unless one is already outstanding.
    fn arm_watcher(&mut self) {
        if self.state != PlaybackState::Playing || self.watcher_armed {
            return;
        }
        let Some(out) = &self.output else {
            return;
        };

        let device = Arc::clone(&out.device);
        let id = out.id;
        let tx = self.tx.clone();
        let timeout = self.settings.wait_timeout();

        self.watcher_armed = true;
        thread::spawn(move || {
            let ready = device.wait(timeout);
            // The playback thread may already be gone.
            let _ = tx.send(Message::WatcherDone { device: id, ready });
        });
    }

    /// Every request is answered with `TrackStarted` or `PlayFailed`, in
    /// the order the requests arrived.
    fn play(&mut self, track: Arc<Track>) {
        let path = track.file_path.physical();

        let Some(codec) = self.capabilities.codec_for(&path) else {
            warn!("dropping play request: {}", Error::NoDecoder(path));
            self.report(PlayerEvent::PlayFailed(track));
            return;
        };
        let mut decoder = match codec.open(&path) {
            Ok(d) => d,
            Err(e) => {
                warn!("dropping play request for '{}': {e}", track.file_path);
                self.report(PlayerEvent::PlayFailed(track));
                return;
            }
        };

        if let Err(e) = self.prepare_output(decoder.format()) {
            error!("dropping play request for '{}': {e}", track.file_path);
            decoder.close();
            self.report(PlayerEvent::PlayFailed(track));
            return;
        }

        if let Some(mut old) = self.decoder.replace(decoder) {
            old.close();
        }

        if self.state == PlaybackState::Paused {
            if let Some(out) = &self.output {
                out.device.unpause();
            }
        }

        info!("playing '{}' (track {})", track.file_path, track.number);
        self.track = Some(Arc::clone(&track));
        self.set_state(PlaybackState::Playing);
        self.report(PlayerEvent::TrackStarted(track));
    }

    fn report(&self, event: PlayerEvent) {
        // Nobody may be listening any more.
        let _ = self.events.send(event);
    }

    /// Open the device with the configured defaults if needed, then make
    /// sure it matches `format`.
    fn prepare_output(&mut self, format: AudioFormat) -> Result<()> {
        if self.output.is_none() {
            let device = self.capabilities.output().create();
            device.open()?;

            let defaults = AudioFormat {
                sample_rate: self.settings.sample_rate,
                channels: self.settings.channels,
            };
            if let Err(e) = configure(device.as_ref(), defaults) {
                device.close();
                return Err(e);
            }

            self.next_device_id += 1;
            debug!(
                "opened '{}' output ({} Hz, {} ch)",
                self.capabilities.output().name(),
                defaults.sample_rate,
                defaults.channels
            );
            self.output = Some(OpenOutput {
                device,
                id: self.next_device_id,
                format: defaults,
            });
        }

        if let Some(out) = self.output.as_mut() {
            if out.format != format {
                debug!(
                    "reconfiguring output {} Hz/{} ch -> {} Hz/{} ch",
                    out.format.sample_rate, out.format.channels, format.sample_rate, format.channels
                );
                configure(out.device.as_ref(), format)?;
                out.format = format;
            }
        }
        Ok(())
    }

    fn toggle_pause(&mut self) {
        let Some(out) = &self.output else {
            return;
        };
        match self.state {
            PlaybackState::Playing => {
                out.device.pause();
                self.set_state(PlaybackState::Paused);
            }
            PlaybackState::Paused => {
                out.device.unpause();
                self.set_state(PlaybackState::Playing);
            }
            PlaybackState::Stopped => {}
        }
    }

    /// Move one device buffer worth of PCM from the decoder to the device.
    fn pump(&mut self) {
        let (Some(out), Some(decoder)) = (&self.output, self.decoder.as_mut()) else {
            return;
        };

        let avail = match out.device.avail_update() {
            Ok(n) => n,
            Err(e) => {
                warn!("output buffer query failed: {e}");
                return;
            }
        };
        if avail == 0 {
            return;
        }

        let mut buf = vec![0u8; avail];
        let read = match fill(decoder.as_mut(), &mut buf) {
            Ok(n) => n,
            Err(e) => {
                warn!("decoding failed, ending track: {e}");
                self.finish_track();
                return;
            }
        };
        if read == 0 {
            self.finish_track();
            return;
        }

        if let Err(e) = out.device.write(&buf[..read]) {
            warn!("output write failed: {e}");
        }
    }

    /// The decoder is exhausted: close it, stop, and report. The device stays
    /// open so the next track can reuse it.
    fn finish_track(&mut self) {
        if let Some(mut d) = self.decoder.take() {
            d.close();
        }
        let finished = self.track.take();
        self.set_state(PlaybackState::Stopped);

        if let Some(track) = finished {
            debug!("finished '{}'", track.file_path);
            self.report(PlayerEvent::TrackFinished(track));
        }
    }

    /// Close decoder and device and go to `Stopped`.
    fn release(&mut self) {
        if let Some(mut d) = self.decoder.take() {
            d.close();
        }
        if let Some(out) = self.output.take() {
            out.device.close();
            debug!("closed output device #{}", out.id);
        }
        self.track = None;
        self.set_state(PlaybackState::Stopped);
    }

    fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        let mut info = self
            .playback_info
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        info.state = state;
        info.track = self.track.clone();
    }
}

fn configure(device: &dyn Output, format: AudioFormat) -> Result<()> {
    device.set_sample_rate(format.sample_rate)?;
    device.set_channels(format.channels)
}

/// Read until `buf` is full or the decoder reports end of stream.
fn fill(decoder: &mut dyn Decoder, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = decoder.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
