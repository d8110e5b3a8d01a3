use std::fmt::Display;

use crate::error::{Error, Result};
use crate::vfs::{self, Entry, Track};

use super::session::Session;

/// One parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

/// Split a request into words. Double quotes group words and are dropped;
/// an unterminated quote is an error.
pub fn parse(line: &str) -> Result<Command> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quoted {
        return Err(Error::InvalidArgument("unterminated quote".to_string()));
    }
    if in_word {
        words.push(current);
    }

    let mut words = words.into_iter();
    let name = words
        .next()
        .ok_or_else(|| Error::InvalidArgument("empty command".to_string()))?;
    Ok(Command {
        name,
        args: words.collect(),
    })
}

pub(super) type Handler = fn(&mut Session, &[String], &mut String) -> Result<()>;

pub(super) struct CommandSpec {
    pub name: &'static str,
    pub argc: usize,
    pub handler: Handler,
}

/// `QUIT` is handled by the session itself.
pub(super) const COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "PING", argc: 0, handler: cmd_ping },
    CommandSpec { name: "PWD", argc: 0, handler: cmd_pwd },
    CommandSpec { name: "CD", argc: 1, handler: cmd_cd },
    CommandSpec { name: "LS", argc: 0, handler: cmd_ls },
    CommandSpec { name: "PLAYLISTS", argc: 0, handler: cmd_playlists },
    CommandSpec { name: "PLAYLIST", argc: 1, handler: cmd_playlist },
    CommandSpec { name: "ADDPLAYLIST", argc: 1, handler: cmd_add_playlist },
    CommandSpec { name: "DELPLAYLIST", argc: 1, handler: cmd_del_playlist },
    CommandSpec { name: "ADDTRACK", argc: 2, handler: cmd_add_track },
    CommandSpec { name: "CLEAR", argc: 1, handler: cmd_clear },
    CommandSpec { name: "PLAY", argc: 2, handler: cmd_play },
    CommandSpec { name: "PLAYDIR", argc: 1, handler: cmd_play_dir },
    CommandSpec { name: "PAUSE", argc: 0, handler: cmd_pause },
    CommandSpec { name: "STOP", argc: 0, handler: cmd_stop },
    CommandSpec { name: "STATUS", argc: 0, handler: cmd_status },
];

pub(super) fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name == name)
}

fn field(out: &mut String, key: &str, value: impl Display) {
    out.push_str(&format!("{key}: {value}\n"));
}

fn write_track(out: &mut String, track: &Track) {
    field(out, "FileName", &track.file_path);
    field(out, "Number", track.number);
    field(out, "Artist", &track.tag.artist);
    field(out, "Album", &track.tag.album);
    field(out, "Title", &track.tag.title);
    field(out, "Length", &track.tag.length);
}

/// Blocks separated by one blank line.
fn write_blocks<T>(out: &mut String, items: &[T], mut block: impl FnMut(&mut String, usize, &T)) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        block(out, i, item);
    }
}

fn parse_index(arg: &str) -> Result<usize> {
    arg.parse::<usize>()
        .map_err(|_| Error::InvalidArgument(format!("'{arg}' is not a valid track index")))
}

fn cmd_ping(_: &mut Session, _: &[String], _: &mut String) -> Result<()> {
    Ok(())
}

fn cmd_pwd(s: &mut Session, _: &[String], out: &mut String) -> Result<()> {
    out.push_str(s.cwd.virtual_path());
    out.push('\n');
    Ok(())
}

fn cmd_cd(s: &mut Session, args: &[String], _: &mut String) -> Result<()> {
    s.cwd = vfs::change_dir(&s.cwd, &args[0])?;
    Ok(())
}

fn cmd_ls(s: &mut Session, _: &[String], out: &mut String) -> Result<()> {
    let entries = s.engine.list(&s.cwd)?;
    write_blocks(out, &entries, |out, _, entry| {
        field(out, "Type", entry.type_name());
        match entry {
            Entry::Directory(d) => field(out, "Name", format!("[{}]", d.name)),
            Entry::Track(t) => write_track(out, t),
        }
    });
    Ok(())
}

fn cmd_playlists(s: &mut Session, _: &[String], out: &mut String) -> Result<()> {
    let playlists = s.engine.playlists();
    write_blocks(out, &playlists, |out, _, pl| {
        field(out, "Name", pl.name());
        field(out, "Tracks", pl.len());
        field(out, "System", if pl.is_system() { "yes" } else { "no" });
    });
    Ok(())
}

fn cmd_playlist(s: &mut Session, args: &[String], out: &mut String) -> Result<()> {
    let tracks = s.engine.playlist(&args[0])?.tracks();
    write_blocks(out, &tracks, |out, i, track| {
        field(out, "Index", i);
        write_track(out, track);
    });
    Ok(())
}

fn cmd_add_playlist(s: &mut Session, args: &[String], _: &mut String) -> Result<()> {
    s.engine.add_playlist(&args[0])
}

fn cmd_del_playlist(s: &mut Session, args: &[String], _: &mut String) -> Result<()> {
    s.engine.delete_playlist(&args[0])
}

fn cmd_add_track(s: &mut Session, args: &[String], out: &mut String) -> Result<()> {
    let path = s.cwd.join(&args[1]);
    let added = s.engine.add_tracks(&args[0], &path)?;
    field(out, "Added", added);
    Ok(())
}

fn cmd_clear(s: &mut Session, args: &[String], _: &mut String) -> Result<()> {
    s.engine.clear_playlist(&args[0])
}

fn cmd_play(s: &mut Session, args: &[String], _: &mut String) -> Result<()> {
    let index = parse_index(&args[1])?;
    s.engine.play(&args[0], index)
}

fn cmd_play_dir(s: &mut Session, args: &[String], _: &mut String) -> Result<()> {
    let index = parse_index(&args[0])?;
    s.engine.play_directory(&s.cwd, index)
}

fn cmd_pause(s: &mut Session, _: &[String], _: &mut String) -> Result<()> {
    s.engine.pause()
}

fn cmd_stop(s: &mut Session, _: &[String], _: &mut String) -> Result<()> {
    s.engine.stop()
}

fn cmd_status(s: &mut Session, _: &[String], out: &mut String) -> Result<()> {
    let status = s.engine.status();
    field(out, "State", status.state.as_str());
    if let Some((playlist, index)) = &status.position {
        field(out, "Playlist", playlist);
        field(out, "Index", index);
    }
    if let Some(track) = &status.track {
        write_track(out, track);
    }
    Ok(())
}
