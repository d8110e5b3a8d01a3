use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use walkdir::WalkDir;

use crate::audio::{Capabilities, Tag};
use crate::config::LibrarySettings;
use crate::cue::{self, CueSheet};
use crate::error::{Error, Result};

use super::model::{Directory, Entry, Track};
use super::path::VfsPath;

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    let ext = ext.trim().trim_start_matches('.');
    path.extension()
        .and_then(|s| s.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// List `dir`: sub-directories first (sorted by name), then cue-sheet tracks,
/// then standalone tracks. Files without a tag reader are left out.
///
/// Only failures to read `dir` itself are returned; a broken cue sheet or an
/// unreadable file is logged and skipped.
pub fn list(dir: &VfsPath, caps: &Capabilities, settings: &LibrarySettings) -> Result<Vec<Entry>> {
    let physical = dir.physical();
    if !fs::metadata(&physical)?.is_dir() {
        return Err(Error::NotADirectory(dir.to_string()));
    }

    let mut dirs: Vec<Directory> = Vec::new();
    let mut cue_files: Vec<VfsPath> = Vec::new();
    // Sorted by virtual path and addressable by basename.
    let mut audio_files: BTreeSet<VfsPath> = BTreeSet::new();

    let walker = WalkDir::new(&physical)
        .min_depth(1)
        .max_depth(1)
        .follow_links(settings.follow_links);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable entry in '{dir}': {e}");
                continue;
            }
        };
        let path = entry.path();
        if !settings.include_hidden && is_hidden(path) {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        let vpath = dir.join(&name);
        let kind = entry.file_type();
        if kind.is_dir() {
            dirs.push(Directory::new(vpath));
        } else if kind.is_file() {
            if has_extension(path, &settings.cue_extension) {
                cue_files.push(vpath);
            } else {
                audio_files.insert(vpath);
            }
        }
    }

    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    cue_files.sort();

    let mut tracks: Vec<Arc<Track>> = Vec::new();

    for cue_path in &cue_files {
        let sheet = match cue::parse_file(&cue_path.physical()) {
            Ok(s) => s,
            Err(e) => {
                warn!("skipping cue sheet '{cue_path}': {e}");
                continue;
            }
        };
        tracks.extend(cue_tracks(dir, &sheet, caps, &mut audio_files));
    }

    for file in audio_files {
        let physical = file.physical();
        let Some(reader) = caps.tag_reader_for(&physical) else {
            continue;
        };
        match reader.read_tag(&physical) {
            Ok(tag) => tracks.push(Arc::new(Track::new(file, 0, tag))),
            Err(e) => warn!("skipping '{file}': {e}"),
        }
    }

    debug!("listed '{dir}': {} directories, {} tracks", dirs.len(), tracks.len());

    let entries = dirs
        .into_iter()
        .map(Entry::Directory)
        .chain(tracks.into_iter().map(Entry::Track))
        .collect();
    Ok(entries)
}

/// Last segment of a cue `FILE` value. Rippers write either separator.
fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or(name)
}

/// Expand one parsed sheet into tracks, claiming the files it references so
/// they are not listed again as standalone tracks.
fn cue_tracks(
    dir: &VfsPath,
    sheet: &CueSheet,
    caps: &Capabilities,
    audio_files: &mut BTreeSet<VfsPath>,
) -> Vec<Arc<Track>> {
    let mut out = Vec::new();

    for file in &sheet.files {
        let file_path = dir.join(basename(&file.name));
        audio_files.remove(&file_path);

        if caps.tag_reader_for(&file_path.physical()).is_none() {
            warn!(
                "skipping '{}' referenced by cue sheet: {}",
                file.name,
                Error::NoTagReader(file_path.physical())
            );
            continue;
        }

        for t in &file.tracks {
            let artist = if t.performer.is_empty() {
                sheet.performer.clone()
            } else {
                t.performer.clone()
            };
            let tag = Tag {
                artist,
                album: sheet.title.clone(),
                title: t.title.clone(),
                number: t.number.to_string(),
                ..Tag::default()
            };
            out.push(Arc::new(Track::new(file_path.clone(), t.number, tag)));
        }
    }
    out
}

/// Resolve `arg` against `cwd` for a change of working directory. `..` stops
/// at the root. The target must be an existing directory.
pub fn change_dir(cwd: &VfsPath, arg: &str) -> Result<VfsPath> {
    let target = cwd.join(arg);
    match fs::metadata(target.physical()) {
        Ok(meta) if meta.is_dir() => Ok(target),
        Ok(_) => Err(Error::NotADirectory(target.to_string())),
        Err(e) => {
            debug!("cd '{target}' failed: {e}");
            Err(Error::NotADirectory(target.to_string()))
        }
    }
}
