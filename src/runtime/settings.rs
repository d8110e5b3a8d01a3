use std::path::PathBuf;

use log::warn;

use crate::config;

/// Load settings, falling back to defaults when the file or environment is
/// unusable. A broken config never keeps the daemon from starting.
pub fn load_settings(explicit: Option<PathBuf>) -> config::Settings {
    match config::Settings::load(explicit) {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                warn!("invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            warn!("failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
