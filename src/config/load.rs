use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `LORCHESTRE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("LORCHESTRE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.network.host.trim().is_empty() {
            return Err("network.host must not be empty".to_string());
        }
        if self.network.port == 0 {
            return Err("network.port must be >= 1".to_string());
        }
        if self.audio.crossfade_steps == 0 {
            return Err("audio.crossfade_steps must be >= 1".to_string());
        }
        if self.audio.tick_ms == 0 {
            return Err("audio.tick_ms must be >= 1".to_string());
        }
        Ok(())
    }

    /// `host:port` of the media daemon.
    pub fn daemon_endpoint(&self) -> String {
        self.network.endpoint()
    }

    /// Render the settings as a `config.toml` document.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Where the session file lives, unless storage is disabled.
    pub fn session_path(&self) -> Option<PathBuf> {
        if !self.storage.enabled {
            return None;
        }
        match &self.storage.path {
            Some(p) => Some(PathBuf::from(p)),
            None => data_dir().map(|d| d.join("session.json")),
        }
    }
}

/// Resolve the config path from `LORCHESTRE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("LORCHESTRE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/lorchestre/config.toml`
/// or `~/.config/lorchestre/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("lorchestre").join("config.toml"))
}

/// `$XDG_DATA_HOME/lorchestre` or `~/.local/share/lorchestre`. Holds the
/// session file and the log.
pub fn data_dir() -> Option<PathBuf> {
    let data_home = if let Some(xdg) = env::var_os("XDG_DATA_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("share"))
    };

    data_home.map(|d| d.join("lorchestre"))
}
