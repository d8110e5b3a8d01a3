use std::path::Path;

use crate::error::Result;

/// PCM layout a decoder produces and an output device is configured for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// A decoder family for one or more file formats.
pub trait Codec: Send + Sync {
    fn name(&self) -> &str;

    /// Returns true if files like `path` are supported.
    fn matches(&self, path: &Path) -> bool;

    /// Open `path` for decoding.
    fn open(&self, path: &Path) -> Result<Box<dyn Decoder>>;
}

/// An open decoding session producing interleaved signed 16-bit
/// little-endian PCM.
pub trait Decoder: Send {
    fn format(&self) -> AudioFormat;

    /// Decode up to `buf.len()` bytes. Fewer bytes are returned only at the
    /// end of the stream; `Ok(0)` means the stream is exhausted.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Release decoder resources. Reading after `close` is a bug.
    fn close(&mut self);
}
