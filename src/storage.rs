//! Session persistence: a flat JSON key-value file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::queue::SessionSnapshot;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const KEY_VERSION: &str = "version";
const KEY_QMODE: &str = "qmode";
const KEY_PMODE: &str = "pmode";
const KEY_QUEUE: &str = "queue";
const KEY_BACKLOG: &str = "backlog";
const KEY_HISTORY: &str = "history";
const KEY_CURRENT_TRACK: &str = "currentTrack";
const KEY_CURRENT_TIME: &str = "currentTime";
const KEY_VOLUME: &str = "volume";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    data: Map<String, Value>,
}

impl SessionStore {
    /// Open (or start) the store at `path`.
    ///
    /// A file written by another version is wiped before anything is read
    /// from it. An unreadable file is treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let mut data = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!("ignoring corrupt session file {}: {e}", path.display());
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };

        if data.get(KEY_VERSION).and_then(Value::as_str) != Some(VERSION) {
            if !data.is_empty() {
                debug!("session file from another version, wiping");
            }
            data.clear();
            data.insert(KEY_VERSION.to_string(), Value::String(VERSION.to_string()));
        }

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read one key, `None` when missing or of the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.data.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("session key {key} unreadable: {e}");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Everything stored for the previous session. Each piece falls back to
    /// its default on its own.
    pub fn load_session(&self) -> SessionSnapshot {
        let d = SessionSnapshot::default();
        SessionSnapshot {
            queue_mode: self.get(KEY_QMODE).unwrap_or(d.queue_mode),
            play_mode: self.get(KEY_PMODE).unwrap_or(d.play_mode),
            queue: self.get(KEY_QUEUE).unwrap_or(d.queue),
            backlog: self.get(KEY_BACKLOG).unwrap_or(d.backlog),
            history: self.get(KEY_HISTORY).unwrap_or(d.history),
            current_track: self.get(KEY_CURRENT_TRACK).unwrap_or(d.current_track),
            current_time: self.get(KEY_CURRENT_TIME).unwrap_or(d.current_time),
            volume: self.get(KEY_VOLUME).unwrap_or(d.volume),
        }
    }

    /// Whether anything besides the version stamp is stored.
    pub fn has_session(&self) -> bool {
        self.data.keys().any(|k| k != KEY_VERSION)
    }

    pub fn save_session(&mut self, session: &SessionSnapshot) -> Result<(), StorageError> {
        self.set(KEY_QMODE, &session.queue_mode)?;
        self.set(KEY_PMODE, &session.play_mode)?;
        self.set(KEY_QUEUE, &session.queue)?;
        self.set(KEY_BACKLOG, &session.backlog)?;
        self.set(KEY_HISTORY, &session.history)?;
        self.set(KEY_CURRENT_TRACK, &session.current_track)?;
        self.set(KEY_CURRENT_TIME, &session.current_time)?;
        self.set(KEY_VOLUME, &session.volume)?;
        self.flush()
    }

    /// Write the store to disk through a temporary sibling file.
    pub fn flush(&self) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(serde_json::to_string(&self.data)?.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!("session saved to {}", self.path.display());
        Ok(())
    }
}
