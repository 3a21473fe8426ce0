use serde::{Deserialize, Serialize};

use crate::queue::QueueMode;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/lorchestre/config.toml` or `~/.config/lorchestre/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `LORCHESTRE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub network: NetworkSettings,
    pub playback: PlaybackSettings,
    pub audio: AudioSettings,
    pub controls: ControlsSettings,
    pub ui: UiSettings,
    pub storage: StorageSettings,
    pub toast: ToastSettings,
}

/// Where the media daemon listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub host: String,
    pub port: u16,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 7700,
        }
    }
}

impl NetworkSettings {
    /// `host:port`, as used in every daemon URI.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Playback state used when no previous session can be restored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub queue_mode: QueueMode,
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Initial volume, 0.0 to 1.0.
    pub volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            queue_mode: QueueMode::Continue,
            shuffle: false,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Crossfade duration when switching tracks (milliseconds).
    /// Set to 0 to disable crossfade.
    pub crossfade_ms: u64,
    /// Number of steps used to fade volumes (higher = smoother, more CPU).
    pub crossfade_steps: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// How often the audio thread reports the playback clock (milliseconds).
    pub tick_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            crossfade_ms: 250,
            crossfade_steps: 10,
            quit_fade_out_ms: 500,
            tick_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change per `+` / `-` press.
    pub volume_step: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            volume_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which track fields to show in the status "Song:" line, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub now_playing_track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_track_fields`.
    pub now_playing_track_separator: String,

    /// Which time fields to show for the status line, and in what order.
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,

    /// How library and queue rows are labelled.
    pub list_fields: Vec<TrackDisplayField>,
    pub list_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ L'Orchestre ~ ".to_string(),
            now_playing_track_fields: vec![TrackDisplayField::Display],
            now_playing_track_separator: " - ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total, TimeField::Remaining],
            now_playing_time_separator: " / ".to_string(),
            list_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            list_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Persist queue, history and playback position between runs.
    pub enabled: bool,
    /// Session file. Defaults to `$XDG_DATA_HOME/lorchestre/session.json`.
    pub path: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastSettings {
    /// How long a notification stays up (milliseconds). Loading notices stay until closed.
    pub timeout_ms: u64,
}

impl Default for ToastSettings {
    fn default() -> Self {
        Self { timeout_ms: 3500 }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// Artists and title together.
    Display,
    Title,
    Artist,
    Album,
    Filename,
    Path,
}
