//! Audio-related small types.
//!
//! Commands sent to the audio thread, events it reports back, its error
//! type, and the playback clock it keeps.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug)]
pub enum AudioCmd {
    /// Start playing the file at `path` from the beginning.
    Load(PathBuf),
    /// Toggle pause/resume.
    TogglePause,
    /// Jump to an absolute position in the current track.
    SeekTo(Duration),
    SetVolume(f32),
    /// Stop playback immediately.
    Stop,
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// What the audio thread reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Elapsed time of the current track, in seconds.
    Time(f64),
    Paused,
    Resumed,
    /// The file that was loaded played to its end.
    Ended(PathBuf),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    NoDevice(String),

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}

/// Elapsed time of the loaded track: time banked before the last pause plus
/// the running stretch since the last resume.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Clock {
    /// Running from `offset` as of `now`.
    pub fn start(offset: Duration, now: Instant) -> Self {
        Self {
            started_at: Some(now),
            accumulated: offset,
        }
    }

    /// Stopped at `offset`.
    pub fn paused_at(offset: Duration) -> Self {
        Self {
            started_at: None,
            accumulated: offset,
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += now.saturating_duration_since(st);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.accumulated
            + self
                .started_at
                .map_or(Duration::ZERO, |st| now.saturating_duration_since(st))
    }
}

/// Volume pairs `(outgoing, incoming)` for each step of a crossfade to `target`.
pub fn crossfade_steps(steps: u64, target: f32) -> Vec<(f32, f32)> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|step| {
            let t = step as f32 / steps as f32;
            (target * (1.0 - t), target * t)
        })
        .collect()
}
