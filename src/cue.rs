//! Cue sheet parsing.
//!
//! Only the parts the listing needs are kept: album performer/title, the
//! referenced files and, per file, the track numbers with their own
//! performer/title. Timing (`INDEX`, `PREGAP`, ...) and `REM` lines are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueSheet {
    pub performer: String,
    /// Album title.
    pub title: String,
    pub files: Vec<CueFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueFile {
    /// File name as written in the sheet, relative to the sheet's directory.
    pub name: String,
    pub tracks: Vec<CueTrack>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueTrack {
    pub number: u32,
    pub performer: String,
    pub title: String,
}

pub fn parse_file(path: &Path) -> Result<CueSheet> {
    let bytes = fs::read(path)?;
    parse_str(path, &String::from_utf8_lossy(&bytes))
}

/// `path` is only used for error messages.
pub fn parse_str(path: &Path, text: &str) -> Result<CueSheet> {
    let mut sheet = CueSheet::default();
    let mut in_track = false;

    let err = |line: usize, reason: &str| Error::CueParse {
        path: PathBuf::from(path),
        line,
        reason: reason.to_string(),
    };

    for (i, raw) in text.lines().enumerate() {
        let lineno = i + 1;
        let line = raw.trim_start_matches('\u{feff}').trim();
        if line.is_empty() {
            continue;
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (line, ""),
        };

        match keyword.to_ascii_uppercase().as_str() {
            "PERFORMER" => {
                let value = unquote(rest).to_string();
                match sheet.files.last_mut().and_then(|f| f.tracks.last_mut()) {
                    Some(track) if in_track => track.performer = value,
                    _ => sheet.performer = value,
                }
            }
            "TITLE" => {
                let value = unquote(rest).to_string();
                match sheet.files.last_mut().and_then(|f| f.tracks.last_mut()) {
                    Some(track) if in_track => track.title = value,
                    _ => sheet.title = value,
                }
            }
            "FILE" => {
                let name = file_name(rest);
                if name.is_empty() {
                    return Err(err(lineno, "FILE without a file name"));
                }
                sheet.files.push(CueFile {
                    name: name.to_string(),
                    tracks: Vec::new(),
                });
                in_track = false;
            }
            "TRACK" => {
                let Some(file) = sheet.files.last_mut() else {
                    return Err(err(lineno, "TRACK before any FILE"));
                };
                let number = rest
                    .split_whitespace()
                    .next()
                    .and_then(|n| n.parse::<u32>().ok())
                    .ok_or_else(|| err(lineno, "TRACK without a valid number"))?;
                file.tracks.push(CueTrack {
                    number,
                    ..CueTrack::default()
                });
                in_track = true;
            }
            _ => {}
        }
    }

    if sheet.files.is_empty() {
        return Err(err(0, "no FILE entries"));
    }

    Ok(sheet)
}

/// `"a b" WAVE` -> `a b`; unquoted names lose their trailing type token.
fn file_name(rest: &str) -> &str {
    if rest.starts_with('"') {
        return unquote(rest);
    }
    match rest.rsplit_once(char::is_whitespace) {
        Some((name, _kind)) => name.trim(),
        None => rest,
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    if let Some(inner) = value.strip_prefix('"') {
        match inner.find('"') {
            Some(end) => &inner[..end],
            None => inner,
        }
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALBUM: &str = r#"REM GENRE "Hard Rock"
REM DATE 1975
PERFORMER "AC/DC"
TITLE "High Voltage"
FILE "album.flac" WAVE
  TRACK 01 AUDIO
    TITLE "Baby, Please Don't Go"
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    TITLE "She's Got Balls"
    PERFORMER "Bon Scott"
    INDEX 00 04:49:10
    INDEX 01 04:50:00
"#;

    #[test]
    fn parses_album_and_track_metadata() {
        let sheet = parse_str(Path::new("album.cue"), ALBUM).unwrap();
        assert_eq!(sheet.performer, "AC/DC");
        assert_eq!(sheet.title, "High Voltage");
        assert_eq!(sheet.files.len(), 1);

        let file = &sheet.files[0];
        assert_eq!(file.name, "album.flac");
        assert_eq!(file.tracks.len(), 2);
        assert_eq!(file.tracks[0].number, 1);
        assert_eq!(file.tracks[0].title, "Baby, Please Don't Go");
        assert_eq!(file.tracks[0].performer, "");
        assert_eq!(file.tracks[1].number, 2);
        assert_eq!(file.tracks[1].performer, "Bon Scott");
    }

    #[test]
    fn handles_multiple_files_and_unquoted_names() {
        let text = "TITLE Split\nFILE side_a.wav WAVE\nTRACK 1 AUDIO\nFILE \"side b.wav\" WAVE\nTRACK 2 AUDIO\n";
        let sheet = parse_str(Path::new("x.cue"), text).unwrap();
        assert_eq!(sheet.title, "Split");
        let names: Vec<&str> = sheet.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["side_a.wav", "side b.wav"]);
        assert_eq!(sheet.files[1].tracks[0].number, 2);
    }

    #[test]
    fn rejects_track_without_file() {
        let e = parse_str(Path::new("bad.cue"), "TITLE \"x\"\nTRACK 01 AUDIO\n").unwrap_err();
        assert!(matches!(e, Error::CueParse { line: 2, .. }));
    }

    #[test]
    fn rejects_bad_track_number_and_empty_sheets() {
        let e = parse_str(Path::new("bad.cue"), "FILE \"a.flac\" WAVE\nTRACK xx AUDIO\n").unwrap_err();
        assert!(matches!(e, Error::CueParse { line: 2, .. }));

        assert!(parse_str(Path::new("empty.cue"), "REM nothing\n").is_err());
    }

    #[test]
    fn tolerates_byte_order_mark_and_lowercase_keywords() {
        let text = "\u{feff}performer \"X\"\nfile \"a.flac\" WAVE\ntrack 03 audio\n";
        let sheet = parse_str(Path::new("bom.cue"), text).unwrap();
        assert_eq!(sheet.performer, "X");
        assert_eq!(sheet.files[0].tracks[0].number, 3);
    }
}
