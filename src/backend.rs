//! Concrete capabilities: rodio playback and lofty tag reading.

mod decoder;
mod output;
mod tags;

use std::path::Path;
use std::sync::Arc;

pub use decoder::{RodioCodec, RodioDecoder};
pub use output::{RodioDriver, RodioOutput};
pub use tags::LoftyTagReader;

use crate::audio::Capabilities;
use crate::config::AudioSettings;

/// The capability set the daemon runs with.
pub fn default_capabilities(settings: &AudioSettings) -> Capabilities {
    Capabilities::new(Arc::new(RodioDriver::new(settings.clone())))
        .with_codec(Arc::new(RodioCodec))
        .with_tag_reader(Arc::new(LoftyTagReader))
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| exts.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
