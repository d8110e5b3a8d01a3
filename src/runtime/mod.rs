//! Daemon lifecycle: settings, capabilities, engine, server, teardown.

use std::sync::Arc;

use log::{error, info};

use crate::backend::default_capabilities;
use crate::cli::Cli;
use crate::engine::Engine;
use crate::error::Result;
use crate::server::Server;

mod settings;

pub use settings::load_settings;

pub fn run(cli: &Cli) -> Result<()> {
    let mut settings = load_settings(cli.config.clone());
    cli.apply(&mut settings);

    if cli.dump_config {
        match settings.to_toml() {
            Ok(text) => print!("{text}"),
            Err(e) => error!("cannot render config: {e}"),
        }
        return Ok(());
    }

    let capabilities = Arc::new(default_capabilities(&settings.audio));
    info!("capabilities: {capabilities:?}");

    let engine = Arc::new(Engine::start(&settings, capabilities)?);
    let served = Server::bind(&settings.server, Arc::clone(&engine)).and_then(|server| server.serve());
    if let Err(e) = &served {
        error!("server stopped: {e}");
    }

    engine.shutdown()?;
    served
}
