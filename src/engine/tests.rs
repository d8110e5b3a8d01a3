use std::fs;
use std::path::Path;

use tempfile::{TempDir, tempdir};

use super::*;
use crate::config::{AudioSettings, PlaybackSettings};
use crate::test_support::{DecoderEvent, DeviceStats, Doubles, doubles, eventually};

fn library(files: &[&str]) -> TempDir {
    let tmp = tempdir().unwrap();
    for f in files {
        let path = tmp.path().join(f);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }
    tmp
}

fn settings(root: &Path, end_of_track: EndOfTrack) -> Settings {
    Settings {
        library: LibrarySettings {
            root: root.to_path_buf(),
            ..LibrarySettings::default()
        },
        audio: AudioSettings {
            wait_timeout_ms: 50,
            ..AudioSettings::default()
        },
        playback: PlaybackSettings { end_of_track },
        ..Settings::default()
    }
}

fn start(root: &Path, bytes: usize, end_of_track: EndOfTrack) -> (Engine, Doubles) {
    let d = doubles(bytes);
    let engine = Engine::start(&settings(root, end_of_track), d.capabilities.clone()).unwrap();
    (engine, d)
}

fn opened(d: &Doubles) -> Vec<String> {
    d.codec
        .events()
        .into_iter()
        .filter_map(|e| match e {
            DecoderEvent::Opened(name) => Some(name),
            _ => None,
        })
        .collect()
}

#[test]
fn start_requires_an_existing_root() {
    let tmp = tempdir().unwrap();
    let d = doubles(0);
    let missing = tmp.path().join("nope");
    assert!(Engine::start(&settings(&missing, EndOfTrack::Stop), d.capabilities.clone()).is_err());
}

#[test]
fn playlist_management_through_the_facade() {
    let tmp = library(&[]);
    let (engine, _d) = start(tmp.path(), 0, EndOfTrack::Stop);

    engine.add_playlist("road trip").unwrap();
    assert!(matches!(engine.add_playlist("*mine*"), Err(Error::SystemNameRejected(_))));
    assert_eq!(engine.playlists().len(), 2);
    assert!(engine.playlist("road trip").unwrap().is_empty());

    engine.delete_playlist("road trip").unwrap();
    assert!(matches!(engine.delete_playlist("road trip"), Err(Error::PlaylistNotFound(_))));
    assert!(matches!(
        engine.delete_playlist(VFS_PLAYLIST),
        Err(Error::SystemPlaylistProtected(_))
    ));
}

#[test]
fn play_rejects_unknown_playlist_and_bad_index() {
    let tmp = library(&["a.flac"]);
    let (engine, d) = start(tmp.path(), 1 << 20, EndOfTrack::Stop);

    assert!(matches!(engine.play("missing", 0), Err(Error::PlaylistNotFound(_))));
    engine.add_playlist("empty").unwrap();
    assert!(matches!(
        engine.play("empty", 0),
        Err(Error::TrackOutOfRange { index: 0, .. })
    ));
    assert!(opened(&d).is_empty());
}

#[test]
fn play_directory_fills_the_system_playlist() {
    let tmp = library(&["a.flac", "b.mp3", "notes.txt", "sub/c.flac"]);
    let (engine, d) = start(tmp.path(), 1 << 24, EndOfTrack::Stop);

    engine.play_directory(&engine.root().top(), 1).unwrap();

    let vfs = engine.playlist(VFS_PLAYLIST).unwrap();
    let names: Vec<String> = vfs.tracks().iter().map(|t| t.file_path.to_string()).collect();
    assert_eq!(names, vec!["/a.flac", "/b.mp3"]);

    assert!(eventually(|| engine.status().state == PlaybackState::Playing));
    let status = engine.status();
    assert_eq!(status.position, Some((VFS_PLAYLIST.to_string(), 1)));
    assert_eq!(status.track.unwrap().file_path.virtual_path(), "/b.mp3");
    assert_eq!(opened(&d), vec!["b.mp3"]);

    // A second directory replaces the contents instead of appending.
    engine.play_directory(&engine.root().from_virtual("/sub"), 0).unwrap();
    assert_eq!(vfs.len(), 1);
}

#[test]
fn play_directory_out_of_range() {
    let tmp = library(&["a.flac"]);
    let (engine, _d) = start(tmp.path(), 0, EndOfTrack::Stop);
    assert!(matches!(
        engine.play_directory(&engine.root().top(), 5),
        Err(Error::TrackOutOfRange { .. })
    ));
}

#[test]
fn finished_tracks_advance_through_the_playlist() {
    let tmp = library(&["1.flac", "2.flac", "3.flac"]);
    let (engine, d) = start(tmp.path(), 2048, EndOfTrack::Advance);

    engine.play_directory(&engine.root().top(), 0).unwrap();
    assert!(eventually(|| opened(&d).len() == 3));
    assert_eq!(opened(&d), vec!["1.flac", "2.flac", "3.flac"]);

    assert!(eventually(|| engine.status().state == PlaybackState::Stopped
        && engine.status().position.is_none()));
}

#[test]
fn advancing_skips_entries_that_fail_to_open() {
    let tmp = library(&["1.flac", "2broken.flac", "3.flac"]);
    let (engine, d) = start(tmp.path(), 2048, EndOfTrack::Advance);

    engine.play_directory(&engine.root().top(), 0).unwrap();
    assert!(eventually(|| opened(&d).len() == 2));
    assert_eq!(opened(&d), vec!["1.flac", "3.flac"]);

    assert!(eventually(|| engine.status().state == PlaybackState::Stopped));
    assert_eq!(opened(&d).len(), 2);
}

#[test]
fn failed_play_keeps_the_position_of_the_playing_track() {
    let tmp = library(&["1.flac", "2broken.flac"]);
    let (engine, _d) = start(tmp.path(), 1 << 24, EndOfTrack::Advance);

    engine.play_directory(&engine.root().top(), 0).unwrap();
    assert!(eventually(|| engine.status().state == PlaybackState::Playing));

    engine.play(VFS_PLAYLIST, 1).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(50));

    let status = engine.status();
    assert_eq!(status.state, PlaybackState::Playing);
    assert_eq!(status.track.unwrap().file_path.virtual_path(), "/1.flac");
    assert_eq!(status.position, Some((VFS_PLAYLIST.to_string(), 0)));
}

#[test]
fn failed_play_does_not_break_advancing() {
    let tmp = library(&["1.flac", "2broken.flac", "3.flac"]);
    let (engine, d) = start(tmp.path(), 64 * 1024, EndOfTrack::Advance);

    engine.play_directory(&engine.root().top(), 0).unwrap();
    engine.play(VFS_PLAYLIST, 1).unwrap();

    assert!(eventually(|| opened(&d).len() == 2));
    assert_eq!(opened(&d), vec!["1.flac", "3.flac"]);
}

#[test]
fn stop_policy_does_not_advance() {
    let tmp = library(&["1.flac", "2.flac"]);
    let (engine, d) = start(tmp.path(), 2048, EndOfTrack::Stop);

    engine.play_directory(&engine.root().top(), 0).unwrap();
    assert!(eventually(|| {
        d.codec.events().contains(&DecoderEvent::Closed("1.flac".to_string()))
    }));
    assert!(eventually(|| engine.status().state == PlaybackState::Stopped));
    assert_eq!(opened(&d), vec!["1.flac"]);
}

#[test]
fn stop_closes_the_device_and_clears_position() {
    let tmp = library(&["a.flac"]);
    let (engine, d) = start(tmp.path(), 1 << 24, EndOfTrack::Advance);

    engine.play_directory(&engine.root().top(), 0).unwrap();
    engine.stop().unwrap();

    assert_eq!(DeviceStats::get(&d.stats.closes), 1);
    let status = engine.status();
    assert_eq!(status.state, PlaybackState::Stopped);
    assert!(status.position.is_none());
}

#[test]
fn pause_toggles_through_the_facade() {
    let tmp = library(&["a.flac"]);
    let (engine, _d) = start(tmp.path(), 1 << 24, EndOfTrack::Stop);

    engine.play_directory(&engine.root().top(), 0).unwrap();
    engine.pause().unwrap();
    assert!(eventually(|| engine.status().state == PlaybackState::Paused));
    engine.pause().unwrap();
    assert!(eventually(|| engine.status().state == PlaybackState::Playing));
}

#[test]
fn add_tracks_from_files_and_directories() {
    let tmp = library(&["album/album.flac", "album/bonus.mp3", "readme.txt"]);
    fs::write(
        tmp.path().join("album/album.cue"),
        "FILE \"album.flac\" WAVE\nTRACK 01 AUDIO\nTRACK 02 AUDIO\n",
    )
    .unwrap();
    let (engine, _d) = start(tmp.path(), 0, EndOfTrack::Stop);
    let root = engine.root().clone();

    engine.add_playlist("mix").unwrap();
    assert_eq!(engine.add_tracks("mix", &root.from_virtual("/album/album.flac")).unwrap(), 2);
    assert_eq!(engine.add_tracks("mix", &root.from_virtual("/album")).unwrap(), 3);
    assert_eq!(engine.playlist("mix").unwrap().len(), 5);

    assert!(matches!(
        engine.add_tracks("mix", &root.from_virtual("/readme.txt")),
        Err(Error::NoTagReader(_))
    ));
    assert!(matches!(
        engine.add_tracks(VFS_PLAYLIST, &root.from_virtual("/album")),
        Err(Error::SystemPlaylistProtected(_))
    ));

    engine.clear_playlist("mix").unwrap();
    assert!(engine.playlist("mix").unwrap().is_empty());
}

#[test]
fn shutdown_is_final() {
    let tmp = library(&["a.flac"]);
    let (engine, d) = start(tmp.path(), 1 << 24, EndOfTrack::Advance);

    engine.play_directory(&engine.root().top(), 0).unwrap();
    engine.shutdown().unwrap();
    assert_eq!(DeviceStats::get(&d.stats.closes), 1);

    assert!(matches!(engine.shutdown(), Err(Error::PlayerGone)));
    assert!(matches!(engine.play(VFS_PLAYLIST, 0), Err(Error::PlayerGone)));
}
