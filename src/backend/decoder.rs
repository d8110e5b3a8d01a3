use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::Source;

use crate::audio::{AudioFormat, Codec, Decoder};
use crate::error::{Error, Result};

use super::has_extension;

const EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg"];

/// Decodes the formats rodio's default features support.
pub struct RodioCodec;

impl Codec for RodioCodec {
    fn name(&self) -> &str {
        "rodio"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, EXTENSIONS)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Decoder>> {
        let file = File::open(path)?;
        let source = rodio::Decoder::new(BufReader::new(file))
            .map_err(|e| Error::Decode(format!("{}: {e}", path.display())))?;
        let format = AudioFormat {
            sample_rate: source.sample_rate(),
            channels: source.channels(),
        };
        Ok(Box::new(RodioDecoder {
            source: Some(source),
            format,
        }))
    }
}

/// Yields interleaved S16LE PCM.
pub struct RodioDecoder {
    source: Option<rodio::Decoder<BufReader<File>>>,
    format: AudioFormat,
}

impl Decoder for RodioDecoder {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some(source) = self.source.as_mut() else {
            return Err(Error::Decode("decoder is closed".to_string()));
        };

        let mut written = 0;
        for frame in buf.chunks_exact_mut(2) {
            let Some(sample) = source.next() else {
                break;
            };
            let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            frame.copy_from_slice(&pcm.to_le_bytes());
            written += 2;
        }
        Ok(written)
    }

    fn close(&mut self) {
        self.source = None;
    }
}
