//! Instrumented capability doubles shared by the unit tests.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::{AudioFormat, Capabilities, Codec, Decoder, Output, OutputDriver, Tag, TagReader};
use crate::error::{Error, Result};

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Matches by extension; the title is the file stem.
pub struct FakeTagReader {
    pub extensions: Vec<&'static str>,
}

impl FakeTagReader {
    pub fn new(extensions: &[&'static str]) -> Self {
        Self {
            extensions: extensions.to_vec(),
        }
    }
}

impl TagReader for FakeTagReader {
    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &self.extensions)
    }

    fn read_tag(&self, path: &Path) -> Result<Tag> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem.contains("corrupt") {
            return Err(Error::Decode(format!("bad tag in {stem}")));
        }
        Ok(Tag {
            title: stem,
            artist: "Tester".to_string(),
            ..Tag::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    Opened(String),
    Read(String, usize),
    Closed(String),
}

/// Codec producing `total_bytes` of silence per file and logging every call.
/// Files whose name contains `broken` fail to open.
pub struct RecordingCodec {
    pub log: Arc<Mutex<Vec<DecoderEvent>>>,
    pub total_bytes: usize,
    pub format: AudioFormat,
}

impl RecordingCodec {
    pub fn new(total_bytes: usize) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            total_bytes,
            format: AudioFormat {
                sample_rate: 44_100,
                channels: 2,
            },
        }
    }

    pub fn events(&self) -> Vec<DecoderEvent> {
        self.log.lock().unwrap().clone()
    }
}

impl Codec for RecordingCodec {
    fn name(&self) -> &str {
        "recording"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["flac", "mp3", "ogg", "wav"])
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Decoder>> {
        let name = file_name(path);
        if name.contains("broken") {
            return Err(Error::Decode(format!("cannot open {name}")));
        }
        let format = if name.contains("mono") {
            AudioFormat {
                sample_rate: 22_050,
                channels: 1,
            }
        } else {
            self.format
        };
        self.log.lock().unwrap().push(DecoderEvent::Opened(name.clone()));
        Ok(Box::new(RecordingDecoder {
            name,
            remaining: self.total_bytes,
            format,
            log: Arc::clone(&self.log),
        }))
    }
}

struct RecordingDecoder {
    name: String,
    remaining: usize,
    format: AudioFormat,
    log: Arc<Mutex<Vec<DecoderEvent>>>,
}

impl Decoder for RecordingDecoder {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.remaining);
        buf[..n].fill(0);
        self.remaining -= n;
        self.log
            .lock()
            .unwrap()
            .push(DecoderEvent::Read(self.name.clone(), n));
        Ok(n)
    }

    fn close(&mut self) {
        self.log
            .lock()
            .unwrap()
            .push(DecoderEvent::Closed(self.name.clone()));
    }
}

/// Counters shared by every device a [`FakeDriver`] creates.
#[derive(Default)]
pub struct DeviceStats {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub waits: AtomicUsize,
    pub in_wait: AtomicUsize,
    pub max_concurrent_waits: AtomicUsize,
    pub bytes_written: AtomicUsize,
    pub pauses: AtomicUsize,
    pub unpauses: AtomicUsize,
    pub configured: Mutex<Vec<(u32, u16)>>,
}

impl DeviceStats {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct FakeDriver {
    pub stats: Arc<DeviceStats>,
    pub fail_open: Arc<AtomicBool>,
    /// How long a `wait` blocks before reporting readiness.
    pub wait_delay: Duration,
    pub avail: usize,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(DeviceStats::default()),
            fail_open: Arc::new(AtomicBool::new(false)),
            wait_delay: Duration::from_millis(2),
            avail: 1024,
        }
    }
}

impl OutputDriver for FakeDriver {
    fn name(&self) -> &str {
        "fake"
    }

    fn create(&self) -> Arc<dyn Output> {
        Arc::new(FakeOutput {
            stats: Arc::clone(&self.stats),
            fail_open: self.fail_open.load(Ordering::SeqCst),
            wait_delay: self.wait_delay,
            avail: self.avail,
            paused: AtomicBool::new(false),
            sample_rate: Mutex::new(0),
            channels: Mutex::new(0),
        })
    }
}

struct FakeOutput {
    stats: Arc<DeviceStats>,
    fail_open: bool,
    wait_delay: Duration,
    avail: usize,
    paused: AtomicBool,
    sample_rate: Mutex<u32>,
    channels: Mutex<u16>,
}

impl FakeOutput {
    fn record_format(&self) {
        let rate = *self.sample_rate.lock().unwrap();
        let channels = *self.channels.lock().unwrap();
        if rate != 0 && channels != 0 {
            self.stats.configured.lock().unwrap().push((rate, channels));
        }
    }
}

impl Output for FakeOutput {
    fn open(&self) -> Result<()> {
        if self.fail_open {
            return Err(Error::Device("no such device".to_string()));
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_sample_rate(&self, rate: u32) -> Result<()> {
        *self.sample_rate.lock().unwrap() = rate;
        Ok(())
    }

    fn set_channels(&self, channels: u16) -> Result<()> {
        *self.channels.lock().unwrap() = channels;
        self.record_format();
        Ok(())
    }

    fn wait(&self, timeout: Duration) -> bool {
        let now = self.stats.in_wait.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_concurrent_waits.fetch_max(now, Ordering::SeqCst);
        self.stats.waits.fetch_add(1, Ordering::SeqCst);

        let started = Instant::now();
        thread::sleep(self.wait_delay.min(timeout));
        let ready = !self.paused.load(Ordering::SeqCst) && started.elapsed() <= timeout;

        self.stats.in_wait.fetch_sub(1, Ordering::SeqCst);
        ready
    }

    fn avail_update(&self) -> Result<usize> {
        Ok(self.avail)
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.stats.bytes_written.fetch_add(buf.len(), Ordering::SeqCst);
        Ok(buf.len())
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.stats.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn unpause(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.stats.unpauses.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Capabilities wired to doubles; the handles let tests inspect them.
pub struct Doubles {
    pub codec: Arc<RecordingCodec>,
    pub stats: Arc<DeviceStats>,
    pub fail_open: Arc<AtomicBool>,
    pub capabilities: Arc<Capabilities>,
}

pub fn doubles(total_bytes: usize) -> Doubles {
    let codec = Arc::new(RecordingCodec::new(total_bytes));
    let driver = FakeDriver::new();
    let stats = Arc::clone(&driver.stats);
    let fail_open = Arc::clone(&driver.fail_open);
    let capabilities = Capabilities::new(Arc::new(driver))
        .with_codec(codec.clone())
        .with_tag_reader(Arc::new(FakeTagReader::new(&["flac", "mp3", "ogg", "wav"])));
    Doubles {
        codec,
        stats,
        fail_open,
        capabilities: Arc::new(capabilities),
    }
}

/// Poll `cond` until it holds or two seconds pass.
pub fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}
