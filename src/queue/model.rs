use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::library::Track;

/// Maximum number of entries held in the live queue; the rest waits in the backlog.
pub const QUEUE_LIMIT: usize = 70;

/// A track admitted to the queue, carrying its own identity so the same file
/// can be queued more than once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTrack {
    pub id: Uuid,
    #[serde(flatten)]
    pub track: Track,
}

impl QueueTrack {
    /// Admit `track` to the queue under a fresh identity.
    pub fn admit(track: Track) -> Self {
        Self {
            id: Uuid::new_v4(),
            track,
        }
    }

    /// Same admission and same underlying file.
    pub fn matches(&self, other: &QueueTrack) -> bool {
        self.id == other.id && self.track.file_path == other.track.file_path
    }
}

impl std::ops::Deref for QueueTrack {
    type Target = Track;

    fn deref(&self) -> &Track {
        &self.track
    }
}

/// What `QueueManager::play` accepts: a bare library track, or an entry that
/// already went through the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Playable {
    Track(Track),
    Queued(QueueTrack),
}

impl From<Track> for Playable {
    fn from(track: Track) -> Self {
        Playable::Track(track)
    }
}

impl From<QueueTrack> for Playable {
    fn from(track: QueueTrack) -> Self {
        Playable::Queued(track)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueMode {
    /// Play the queue through, then stop.
    #[default]
    Continue,
    /// Replay the current track.
    Repeat,
    /// Replay the history once queue and backlog run dry.
    RepeatAll,
}

impl QueueMode {
    pub fn cycle(self) -> Self {
        match self {
            QueueMode::Continue => QueueMode::Repeat,
            QueueMode::Repeat => QueueMode::RepeatAll,
            QueueMode::RepeatAll => QueueMode::Continue,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QueueMode::Continue => "Continue",
            QueueMode::Repeat => "Repeat-one",
            QueueMode::RepeatAll => "Repeat-all",
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    #[default]
    Normal,
    Shuffle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddMode {
    /// Insert at the head, ahead of everything already queued.
    Top,
    /// Append at the tail.
    Bottom,
}

/// Everything needed to resume a session where it was left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub queue_mode: QueueMode,
    pub play_mode: PlayMode,
    pub queue: Vec<QueueTrack>,
    pub backlog: Vec<QueueTrack>,
    pub history: Vec<QueueTrack>,
    pub current_track: Option<QueueTrack>,
    pub current_time: f64,
    pub volume: f32,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            queue_mode: QueueMode::Continue,
            play_mode: PlayMode::Normal,
            queue: Vec::new(),
            backlog: Vec::new(),
            history: Vec::new(),
            current_track: None,
            current_time: 0.0,
            volume: 1.0,
        }
    }
}
