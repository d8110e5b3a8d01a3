//! Playback: capability contracts and the playback thread.
//!
//! The playback thread owns the decoder and the output device and is driven
//! by [`AudioCmd`] messages sent through an [`AudioPlayer`] handle. While
//! playing, a short-lived watcher thread blocks on the device's readiness and
//! reports back, so the control loop itself never waits on hardware.

mod decoder;
mod output;
mod player;
mod registry;
mod tag;
mod thread;
mod types;

pub use decoder::{AudioFormat, Codec, Decoder};
pub use output::{Output, OutputDriver};
pub use player::AudioPlayer;
pub use registry::Capabilities;
pub use tag::{Tag, TagReader};
pub use types::{AudioCmd, PlaybackHandle, PlaybackInfo, PlaybackState, PlayerEvent};
