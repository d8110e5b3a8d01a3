use std::path::Path;
use std::time::Duration;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};

use crate::audio::{Tag, TagReader};
use crate::error::{Error, Result};

use super::has_extension;

const EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg"];

/// Reads tags and duration through lofty.
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn matches(&self, path: &Path) -> bool {
        has_extension(path, EXTENSIONS)
    }

    fn read_tag(&self, path: &Path) -> Result<Tag> {
        let tagged = lofty::read_from_path(path)
            .map_err(|e| Error::Decode(format!("{}: {e}", path.display())))?;

        let mut tag = Tag {
            length: format_length(tagged.properties().duration()),
            ..Tag::default()
        };

        if let Some(t) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            let text = |v: Option<std::borrow::Cow<'_, str>>| {
                v.map(|s| s.trim().to_string()).unwrap_or_default()
            };
            tag.artist = text(t.artist());
            tag.album = text(t.album());
            tag.title = text(t.title());
            tag.number = t.track().map(|n| n.to_string()).unwrap_or_default();
        }
        Ok(tag)
    }
}

/// `m:ss`, minutes unbounded.
fn format_length(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
