use log::{debug, warn};

use crate::config::Settings;

/// Settings for this run. A config that fails to load or validate falls back
/// to the built-in defaults instead of stopping the client.
pub fn load_settings() -> Settings {
    let loaded = Settings::load()
        .map_err(|e| e.to_string())
        .and_then(|s| s.validate().map(|()| s));
    match loaded {
        Ok(settings) => {
            debug!("settings loaded, daemon at {}", settings.daemon_endpoint());
            settings
        }
        Err(msg) => {
            warn!("config unusable ({msg}), using defaults");
            Settings::default()
        }
    }
}
