use super::load::{data_dir, default_config_path, resolve_config_path};
use crate::queue::QueueMode;
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_lorchestre_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("LORCHESTRE_CONFIG_PATH", "/tmp/lorchestre-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/lorchestre-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("lorchestre")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("lorchestre")
            .join("config.toml")
    );
}

#[test]
fn data_dir_follows_xdg_data_home_then_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_DATA_HOME", "/tmp/xdg-data");
    assert_eq!(
        data_dir().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-data/lorchestre")
    );
    drop(_g1);

    let _g2 = EnvGuard::remove("XDG_DATA_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        data_dir().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/share/lorchestre")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[network]
host = "10.0.0.2"
port = 7800

[playback]
shuffle = true
queue_mode = "repeat-all"
volume = 0.5

[audio]
crossfade_ms = 0
crossfade_steps = 3
quit_fade_out_ms = 123
tick_ms = 40

[controls]
scrub_seconds = 9
volume_step = 0.1

[ui]
header_text = "hello"
now_playing_track_fields = ["artist", "title"]
now_playing_track_separator = " • "
now_playing_time_fields = ["elapsed", "remaining"]
now_playing_time_separator = " | "
list_fields = ["filename"]
list_separator = "::"

[storage]
enabled = false

[toast]
timeout_ms = 1000
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LORCHESTRE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("LORCHESTRE__AUDIO__CROSSFADE_MS");
    let _g3 = EnvGuard::remove("LORCHESTRE__NETWORK__PORT");

    let s = Settings::load().unwrap();
    assert_eq!(s.network.host, "10.0.0.2");
    assert_eq!(s.daemon_endpoint(), "10.0.0.2:7800");
    assert!(s.playback.shuffle);
    assert_eq!(s.playback.queue_mode, QueueMode::RepeatAll);
    assert_eq!(s.playback.volume, 0.5);
    assert_eq!(s.audio.crossfade_ms, 0);
    assert_eq!(s.audio.crossfade_steps, 3);
    assert_eq!(s.audio.quit_fade_out_ms, 123);
    assert_eq!(s.audio.tick_ms, 40);
    assert_eq!(s.controls.scrub_seconds, 9);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.now_playing_track_fields.len(), 2);
    assert!(matches!(s.ui.now_playing_track_fields[0], TrackDisplayField::Artist));
    assert!(matches!(s.ui.now_playing_track_fields[1], TrackDisplayField::Title));
    assert_eq!(s.ui.now_playing_track_separator, " • ");
    assert!(matches!(s.ui.now_playing_time_fields[1], TimeField::Remaining));
    assert_eq!(s.ui.list_separator, "::");
    assert!(matches!(s.ui.list_fields[0], TrackDisplayField::Filename));
    assert!(!s.storage.enabled);
    assert!(s.session_path().is_none());
    assert_eq!(s.toast.timeout_ms, 1000);
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
crossfade_ms = 250

[network]
port = 7800
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LORCHESTRE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("LORCHESTRE__AUDIO__CROSSFADE_MS", "0");
    let _g3 = EnvGuard::set("LORCHESTRE__NETWORK__PORT", "7900");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.crossfade_ms, 0);
    assert_eq!(s.network.port, 7900);
    assert_eq!(s.network.host, "localhost");
}

#[test]
fn defaults_point_at_local_daemon() {
    let s = Settings::default();
    assert_eq!(s.daemon_endpoint(), "localhost:7700");
    assert_eq!(s.toast.timeout_ms, 3500);
    assert_eq!(s.playback.queue_mode, QueueMode::Continue);
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_unusable_values() {
    let mut s = Settings::default();
    s.audio.crossfade_steps = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.network.port = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.network.host = "  ".into();
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.audio.tick_ms = 0;
    assert!(s.validate().is_err());
}

#[test]
fn explicit_session_path_wins_over_data_dir() {
    let mut s = Settings::default();
    s.storage.path = Some("/tmp/custom-session.json".into());
    assert_eq!(
        s.session_path().unwrap(),
        std::path::PathBuf::from("/tmp/custom-session.json")
    );
}

#[test]
fn rendered_toml_parses_back() {
    let mut s = Settings::default();
    s.network.port = 7123;
    s.playback.queue_mode = QueueMode::Repeat;
    let text = s.to_toml().unwrap();
    let back: Settings = toml::from_str(&text).unwrap();
    assert_eq!(back.network.port, 7123);
    assert_eq!(back.playback.queue_mode, QueueMode::Repeat);
}
