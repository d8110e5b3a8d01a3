//! Output device backed by a rodio `Sink`.
//!
//! The cpal stream behind rodio must stay on the thread that opened it, so
//! `open` starts a small device thread that owns the stream and hands the
//! sink back. PCM arrives as interleaved S16LE and is queued on the sink one
//! `SamplesBuffer` per write; "available space" is counted in whole periods.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStreamBuilder, Sink};

use crate::audio::{Output, OutputDriver};
use crate::config::AudioSettings;
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Creates [`RodioOutput`] devices on the default output.
pub struct RodioDriver {
    settings: AudioSettings,
}

impl RodioDriver {
    pub fn new(settings: AudioSettings) -> Self {
        Self { settings }
    }
}

impl OutputDriver for RodioDriver {
    fn name(&self) -> &str {
        "rodio"
    }

    fn create(&self) -> Arc<dyn Output> {
        Arc::new(RodioOutput::new(&self.settings))
    }
}

struct Opened {
    sink: Arc<Sink>,
    shutdown: Sender<()>,
    thread: JoinHandle<()>,
}

pub struct RodioOutput {
    buffer_frames: usize,
    buffer_periods: usize,
    sample_rate: Mutex<u32>,
    channels: Mutex<u16>,
    opened: Mutex<Option<Opened>>,
}

impl RodioOutput {
    pub fn new(settings: &AudioSettings) -> Self {
        Self {
            buffer_frames: settings.buffer_frames,
            buffer_periods: settings.buffer_periods,
            sample_rate: Mutex::new(settings.sample_rate),
            channels: Mutex::new(settings.channels),
            opened: Mutex::new(None),
        }
    }

    fn sink(&self) -> Result<Arc<Sink>> {
        lock(&self.opened)
            .as_ref()
            .map(|o| Arc::clone(&o.sink))
            .ok_or_else(|| Error::Device("output device is not open".to_string()))
    }

    fn period_bytes(&self) -> usize {
        self.buffer_frames * usize::from(*lock(&self.channels)) * 2
    }

    fn free_periods(&self, sink: &Sink) -> usize {
        self.buffer_periods.saturating_sub(sink.len())
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Output for RodioOutput {
    fn open(&self) -> Result<()> {
        let mut opened = lock(&self.opened);
        if opened.is_some() {
            return Ok(());
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<Arc<Sink>>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("audio-device".to_string())
            .spawn(move || {
                let mut stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = ready_tx.send(Err(Error::Device(e.to_string())));
                        return;
                    }
                };
                // rodio logs to stderr when the stream is dropped.
                stream.log_on_drop(false);

                let sink = Arc::new(Sink::connect_new(stream.mixer()));
                if ready_tx.send(Ok(sink)).is_err() {
                    return;
                }
                // Keep the stream alive until the device is closed.
                let _ = shutdown_rx.recv();
            })?;

        let sink = ready_rx
            .recv()
            .map_err(|_| Error::Device("device thread exited during open".to_string()))??;

        debug!("rodio output opened");
        *opened = Some(Opened {
            sink,
            shutdown: shutdown_tx,
            thread,
        });
        Ok(())
    }

    fn set_sample_rate(&self, rate: u32) -> Result<()> {
        if rate == 0 {
            return Err(Error::Device("sample rate must be positive".to_string()));
        }
        *lock(&self.sample_rate) = rate;
        Ok(())
    }

    fn set_channels(&self, channels: u16) -> Result<()> {
        if channels == 0 {
            return Err(Error::Device("channel count must be positive".to_string()));
        }
        *lock(&self.channels) = channels;
        Ok(())
    }

    fn wait(&self, timeout: Duration) -> bool {
        let Ok(sink) = self.sink() else {
            return false;
        };
        let deadline = Instant::now() + timeout;
        loop {
            if !sink.is_paused() && self.free_periods(&sink) > 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn avail_update(&self) -> Result<usize> {
        let sink = self.sink()?;
        Ok(self.free_periods(&sink) * self.period_bytes())
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        let sink = self.sink()?;
        let samples: Vec<f32> = buf
            .chunks_exact(2)
            .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / 32768.0)
            .collect();
        if samples.is_empty() {
            return Ok(0);
        }

        let written = samples.len() * 2;
        let channels = *lock(&self.channels);
        let rate = *lock(&self.sample_rate);
        sink.append(SamplesBuffer::new(channels, rate, samples));
        Ok(written)
    }

    fn pause(&self) {
        if let Ok(sink) = self.sink() {
            sink.pause();
        }
    }

    fn unpause(&self) {
        if let Ok(sink) = self.sink() {
            sink.play();
        }
    }

    fn close(&self) {
        let Some(opened) = lock(&self.opened).take() else {
            return;
        };
        opened.sink.stop();
        drop(opened.shutdown);
        if opened.thread.join().is_err() {
            warn!("audio device thread panicked");
        }
        debug!("rodio output closed");
    }
}
