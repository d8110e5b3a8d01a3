use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then environment variables
/// (prefix `TONEARM__`) on top, and falls back to struct defaults.
impl Settings {
    /// Load settings from the optional config file and environment.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ::config::ConfigError> {
        let config_path = explicit.or_else(resolve_config_path);

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("TONEARM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.sample_rate == 0 {
            return Err("audio.sample_rate must be >= 1".to_string());
        }
        if self.audio.channels == 0 {
            return Err("audio.channels must be >= 1".to_string());
        }
        if self.audio.wait_timeout_ms == 0 {
            return Err("audio.wait_timeout_ms must be >= 1".to_string());
        }
        if self.audio.buffer_frames == 0 || self.audio.buffer_periods == 0 {
            return Err("audio.buffer_frames and audio.buffer_periods must be >= 1".to_string());
        }
        if self.library.cue_extension.trim_start_matches('.').is_empty() {
            return Err("library.cue_extension must not be empty".to_string());
        }
        Ok(())
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Resolve the config path from `TONEARM_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("TONEARM_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/tonearm/config.toml`
/// or `~/.config/tonearm/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".config"))
    } else {
        None
    };

    config_home.map(|d| d.join("tonearm").join("config.toml"))
}
