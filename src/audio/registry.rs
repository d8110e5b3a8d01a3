//! The set of pluggable audio capabilities the engine calls through.
//!
//! Built once at startup and shared read-only afterwards.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::decoder::Codec;
use super::output::OutputDriver;
use super::tag::TagReader;

#[derive(Clone)]
pub struct Capabilities {
    codecs: Vec<Arc<dyn Codec>>,
    tag_readers: Vec<Arc<dyn TagReader>>,
    output: Arc<dyn OutputDriver>,
}

impl Capabilities {
    pub fn new(output: Arc<dyn OutputDriver>) -> Self {
        Self {
            codecs: Vec::new(),
            tag_readers: Vec::new(),
            output,
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codecs.push(codec);
        self
    }

    pub fn with_tag_reader(mut self, reader: Arc<dyn TagReader>) -> Self {
        self.tag_readers.push(reader);
        self
    }

    /// First registered codec that accepts `path`.
    pub fn codec_for(&self, path: &Path) -> Option<&Arc<dyn Codec>> {
        self.codecs.iter().find(|c| c.matches(path))
    }

    /// First registered tag reader that accepts `path`.
    pub fn tag_reader_for(&self, path: &Path) -> Option<&Arc<dyn TagReader>> {
        self.tag_readers.iter().find(|r| r.matches(path))
    }

    pub fn output(&self) -> &Arc<dyn OutputDriver> {
        &self.output
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("codecs", &self.codecs.iter().map(|c| c.name()).collect::<Vec<_>>())
            .field("tag_readers", &self.tag_readers.len())
            .field("output", &self.output.name())
            .finish()
    }
}
