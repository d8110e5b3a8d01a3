//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;

/// Network-controlled music player daemon.
#[derive(Debug, Parser)]
#[command(name = "tonearm", version, about)]
pub struct Cli {
    /// Config file to load instead of the default location
    #[arg(short, long, value_name = "FILE", env = "TONEARM_CONFIG_PATH", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Music directory exposed to clients as `/`
    #[arg(short, long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, value_name = "ADDR")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log debug messages
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,
}

impl Cli {
    /// Flags win over everything that was loaded.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(root) = &self.root {
            settings.library.root = root.clone();
        }
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
    }
}
