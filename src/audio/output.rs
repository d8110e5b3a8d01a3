use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// An audio output device.
///
/// Methods take `&self`: the playback thread owns the device, but the
/// buffer-ready watcher needs to call [`Output::wait`] from its own thread.
pub trait Output: Send + Sync {
    fn open(&self) -> Result<()>;

    fn set_sample_rate(&self, rate: u32) -> Result<()>;

    fn set_channels(&self, channels: u16) -> Result<()>;

    /// Block until the device can accept more data, but no longer than
    /// `timeout`. Returns false on timeout (or when the device is paused/closed).
    fn wait(&self, timeout: Duration) -> bool;

    /// Free space in the device buffer, in bytes.
    fn avail_update(&self) -> Result<usize>;

    fn write(&self, buf: &[u8]) -> Result<usize>;

    fn pause(&self);

    fn unpause(&self);

    fn close(&self);
}

/// Creates output devices.
pub trait OutputDriver: Send + Sync {
    fn name(&self) -> &str;

    fn create(&self) -> Arc<dyn Output>;
}
