//! Maps the playback clock onto the active lyric lines.

use std::collections::HashMap;

use log::debug;

use crate::library::{LyricLine, Track};
use crate::observers::{Observers, SubscriptionId};

use super::line::{Line, expand};
use super::markers::{ProcessedMarker, analyze};

/// Names the track a remote lyric fetch was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    file_path: String,
}

impl FetchTicket {
    pub fn file_path(&self) -> &str {
        &self.file_path
    }
}

#[derive(Debug, Default)]
pub struct LyricSync {
    lines: Vec<Line>,
    active: Vec<Line>,
    markers: HashMap<usize, ProcessedMarker>,
    duration: f64,
    artists: Vec<String>,
    /// `file_path` of the track the lines belong to.
    bound: Option<String>,
    hooks: Observers<Vec<Line>>,
}

impl LyricSync {
    pub fn new(duration: f64, raw: &[LyricLine], artists: &[String]) -> Self {
        let mut sync = Self::default();
        sync.reset(duration, raw, artists);
        sync
    }

    /// Replace the line set. Clears the active lines without notifying.
    pub fn reset(&mut self, duration: f64, raw: &[LyricLine], artists: &[String]) {
        self.duration = duration;
        self.artists = artists.to_vec();
        self.lines = expand(raw, duration);
        self.markers = analyze(&self.lines, &self.artists);
        self.active.clear();
    }

    /// Bind to `track`, taking its embedded lyrics.
    ///
    /// Returns a ticket when the track has none, to be handed back to
    /// `apply_fetched` once the daemon answers.
    pub fn load_track(&mut self, track: &Track) -> Option<FetchTicket> {
        self.bound = Some(track.file_path.clone());
        self.reset(track.duration_secs(), &track.lyrics, &track.artists);
        if track.lyrics.is_empty() {
            Some(FetchTicket {
                file_path: track.file_path.clone(),
            })
        } else {
            None
        }
    }

    /// Apply lines fetched for `ticket`. Returns false, leaving everything
    /// as it was, when the synchronizer has moved on to another track.
    pub fn apply_fetched(&mut self, ticket: &FetchTicket, raw: &[LyricLine]) -> bool {
        if self.bound.as_deref() != Some(ticket.file_path.as_str()) {
            debug!("dropping stale lyrics for {}", ticket.file_path);
            return false;
        }
        let artists = std::mem::take(&mut self.artists);
        self.reset(self.duration, raw, &artists);
        true
    }

    /// Forget the bound track, e.g. when playback stops.
    pub fn unbind(&mut self) {
        self.bound = None;
        self.reset(0.0, &[], &[]);
    }

    /// Recompute the active lines for `time` (seconds). Hooks only run when
    /// the set actually changed.
    pub fn update(&mut self, time: f64) {
        let mut next: Vec<&Line> = Vec::new();
        for line in &self.lines {
            if line.start_time > time {
                break;
            }
            if line.end_time >= time {
                next.push(line);
            }
        }

        let unchanged = next.len() == self.active.len()
            && next.iter().zip(&self.active).all(|(a, b)| a.id == b.id);
        if unchanged {
            return;
        }

        self.active = next.into_iter().cloned().collect();
        self.hooks.notify(&self.active);
    }

    /// Register `hook` to receive the new active lines on every change.
    pub fn on_cue_change<F>(&mut self, hook: F) -> SubscriptionId
    where
        F: FnMut(&Vec<Line>) + 'static,
    {
        self.hooks.subscribe(hook)
    }

    pub fn remove_hook(&mut self, id: SubscriptionId) -> bool {
        self.hooks.unsubscribe(id)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn active_lines(&self) -> &[Line] {
        &self.active
    }

    /// Attribution for line `id`; defaults for lines without a named marker.
    pub fn marker(&self, id: usize) -> ProcessedMarker {
        self.markers.get(&id).cloned().unwrap_or_default()
    }

    pub fn markers(&self) -> &HashMap<usize, ProcessedMarker> {
        &self.markers
    }

    pub fn bound_track(&self) -> Option<&str> {
        self.bound.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
