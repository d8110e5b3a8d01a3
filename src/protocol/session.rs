use std::sync::Arc;

use log::debug;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::vfs::VfsPath;

use super::command::{self, Command};

/// What the server sends back for one request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// The client asked to end the conversation.
    pub quit: bool,
}

/// Per-connection state: the engine handle and the working directory.
pub struct Session {
    pub(super) engine: Arc<Engine>,
    pub(super) cwd: VfsPath,
}

impl Session {
    pub fn new(engine: Arc<Engine>) -> Self {
        let cwd = engine.root().top();
        Self { engine, cwd }
    }

    pub fn cwd(&self) -> &VfsPath {
        &self.cwd
    }

    /// Run one request. The body of a failed command is discarded.
    pub fn handle(&mut self, line: &str) -> Reply {
        let cmd = match command::parse(line) {
            Ok(c) => c,
            Err(e) => return error_reply(&e),
        };

        if cmd.name == "QUIT" {
            return Reply {
                text: "OK\n".to_string(),
                quit: true,
            };
        }

        let mut body = String::new();
        match self.run(&cmd, &mut body) {
            Ok(()) => {
                body.push_str("OK\n");
                Reply {
                    text: body,
                    quit: false,
                }
            }
            Err(e) => {
                debug!("{} failed: {e}", cmd.name);
                error_reply(&e)
            }
        }
    }

    fn run(&mut self, cmd: &Command, out: &mut String) -> Result<()> {
        let spec = command::lookup(&cmd.name)
            .ok_or_else(|| Error::InvalidArgument(format!("Unsupported command '{}'", cmd.name)))?;
        if spec.argc != cmd.args.len() {
            return Err(Error::InvalidArgument(format!(
                "Command '{}' requires {} parameters but {} given",
                cmd.name,
                spec.argc,
                cmd.args.len()
            )));
        }
        (spec.handler)(self, &cmd.args, out)
    }
}

fn error_reply(e: &Error) -> Reply {
    // Replies are line based.
    let msg = e.to_string().replace('\n', " ");
    Reply {
        text: format!("ERROR {msg}\n"),
        quit: false,
    }
}
