//! Application model types: `App`, `View` and `PlaybackState`.
//!
//! The `App` struct holds the library fetched from the daemon, cursor and
//! filter state for each view, search results and pending lyric candidates.
//! Playback itself lives in the `QueueManager`; the app only mirrors it.

use crate::config::TrackDisplayField;
use crate::library::{Lrc, Media, SearchResults, Track, display_from_fields};
use crate::lyrics::LyricEditor;
use crate::queue::QueueManager;

/// The playback state of the application.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn of(queue: &QueueManager) -> Self {
        match (queue.current_track(), queue.is_paused()) {
            (None, _) => PlaybackState::Stopped,
            (Some(_), true) => PlaybackState::Paused,
            (Some(_), false) => PlaybackState::Playing,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Library,
    Queue,
    Lyrics,
    Search,
}

impl View {
    pub fn cycle(self) -> Self {
        match self {
            View::Library => View::Queue,
            View::Queue => View::Lyrics,
            View::Lyrics => View::Search,
            View::Search => View::Library,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Library => "Library",
            View::Queue => "Queue",
            View::Lyrics => "Lyrics",
            View::Search => "Search",
        }
    }
}

/// Where a search query is sent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SearchScope {
    /// The daemon's external sources.
    #[default]
    Remote,
    /// The indexed library.
    Local,
}

impl SearchScope {
    pub fn label(self) -> &'static str {
        match self {
            SearchScope::Remote => "remote",
            SearchScope::Local => "library",
        }
    }
}

/// Lyric search results waiting for the user to pick one.
#[derive(Debug, Clone)]
pub struct LyricCandidates {
    pub track: Track,
    pub candidates: Vec<Lrc>,
    pub selected: usize,
}

/// The main application model.
pub struct App {
    pub media: Media,
    labels: Vec<String>,
    lower_labels: Vec<String>,
    list_fields: Vec<TrackDisplayField>,
    list_separator: String,

    pub view: View,
    pub selected: usize,
    pub queue_selected: usize,
    pub playback: PlaybackState,

    pub filter_mode: bool,
    pub filter_query: String,

    pub search_mode: bool,
    pub search_query: String,
    pub search_scope: SearchScope,
    pub search_results: SearchResults,
    pub search_selected: usize,

    pub candidates: Option<LyricCandidates>,
    /// The daemon is re-indexing.
    pub syncing: bool,
    pub metadata_window: bool,
}

impl LyricEditor for App {
    fn show_candidates(&mut self, track: &Track, candidates: Vec<Lrc>) {
        self.candidates = Some(LyricCandidates {
            track: track.clone(),
            candidates,
            selected: 0,
        });
    }
}

impl App {
    pub fn new(list_fields: Vec<TrackDisplayField>, list_separator: String) -> Self {
        Self {
            media: Media::default(),
            labels: Vec::new(),
            lower_labels: Vec::new(),
            list_fields,
            list_separator,
            view: View::Library,
            selected: 0,
            queue_selected: 0,
            playback: PlaybackState::Stopped,
            filter_mode: false,
            filter_query: String::new(),
            search_mode: false,
            search_query: String::new(),
            search_scope: SearchScope::Remote,
            search_results: SearchResults::default(),
            search_selected: 0,
            candidates: None,
            syncing: false,
            metadata_window: false,
        }
    }

    /// Swap in a freshly fetched library, keeping the cursor on the same file when possible.
    pub fn set_media(&mut self, media: Media) {
        let keep = self.selected_track().map(|t| t.file_path.clone());

        self.labels = media
            .tracks
            .iter()
            .map(|(_, t)| display_from_fields(t, &self.list_fields, &self.list_separator))
            .collect();
        // Lowercase once so filtering does not convert on every keystroke.
        self.lower_labels = self.labels.iter().map(|l| l.to_lowercase()).collect();
        self.media = media;

        self.selected = keep
            .and_then(|p| self.media.tracks.iter().position(|(path, _)| *path == p))
            .unwrap_or(0);
        self.ensure_selected_visible();
    }

    pub fn label(&self, index: usize) -> &str {
        self.labels.get(index).map(String::as_str).unwrap_or("")
    }

    /// Row label for any track, library member or not.
    pub fn label_for(&self, track: &Track) -> String {
        display_from_fields(track, &self.list_fields, &self.list_separator)
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.media.tracks.get(index).map(|(_, t)| t)
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.track(self.selected)
    }

    pub fn has_tracks(&self) -> bool {
        !self.media.tracks.is_empty()
    }

    /// Tracks currently visible in the library view, in display order.
    pub fn visible_tracks(&self) -> Vec<Track> {
        self.display_indices()
            .into_iter()
            .filter_map(|i| self.track(i).cloned())
            .collect()
    }

    pub fn cycle_view(&mut self) {
        self.view = self.view.cycle();
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Library indices in display order, narrowed by the active filter.
    pub fn display_indices(&self) -> Vec<usize> {
        let base = 0..self.media.tracks.len();
        let query = self.filter_query.trim();
        if query.is_empty() {
            return base.collect();
        }
        let query_lower = query.to_lowercase();
        base.filter(|&i| {
            Self::fuzzy_match_positions_lower(&self.lower_labels[i], &query_lower).is_some()
        })
        .collect()
    }

    /// Fuzzy-match `query_lower` against a specific track by index.
    ///
    /// Returns the character positions that match, or `None` when there is no match.
    pub fn fuzzy_match_positions_for_track_lower(
        &self,
        track_index: usize,
        query_lower: &str,
    ) -> Option<Vec<usize>> {
        let label = self.lower_labels.get(track_index)?;
        Self::fuzzy_match_positions_lower(label, query_lower)
    }

    /// Return the next visible index in the current display order after `current`.
    /// Wraps around to the first element.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Return the previous visible index in the current display order before `current`.
    /// Wraps around to the last element.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(0) => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
            None => Some(display[display.len() - 1]),
        }
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        Self::fuzzy_match_positions_lower(&title.to_lowercase(), &query.to_lowercase())
    }

    fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title_lower.chars().enumerate();

        for qc in query_lower.chars() {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc == qc => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    /// Enter filter mode.
    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.ensure_selected_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Ensure that `selected` is part of the current filtered view,
    /// otherwise move selection to the first visible track.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }

        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }

    /// Move selection to the next visible track.
    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    /// Move selection to the previous visible track.
    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    /// Move the queue cursor by `delta`, clamped to `len` entries.
    pub fn move_queue_cursor(&mut self, delta: isize, len: usize) {
        self.queue_selected = step_clamped(self.queue_selected, delta, len);
    }

    pub fn enter_search_mode(&mut self) {
        self.view = View::Search;
        self.search_mode = true;
    }

    pub fn exit_search_mode(&mut self) {
        self.search_mode = false;
    }

    pub fn toggle_search_scope(&mut self) {
        self.search_scope = match self.search_scope {
            SearchScope::Remote => SearchScope::Local,
            SearchScope::Local => SearchScope::Remote,
        };
    }

    pub fn set_search_results(&mut self, results: SearchResults) {
        self.search_results = results;
        self.search_selected = 0;
    }

    pub fn clear_search_results(&mut self) {
        self.set_search_results(SearchResults::default());
    }

    pub fn move_search_cursor(&mut self, delta: isize) {
        self.search_selected =
            step_clamped(self.search_selected, delta, self.search_results.tracks.len());
    }

    pub fn selected_search_track(&self) -> Option<&Track> {
        self.search_results.tracks.get(self.search_selected)
    }

    pub fn move_candidate_cursor(&mut self, delta: isize) {
        if let Some(c) = self.candidates.as_mut() {
            c.selected = step_clamped(c.selected, delta, c.candidates.len());
        }
    }

    /// Take the picked candidate, closing the picker.
    pub fn take_candidate(&mut self) -> Option<(Track, Lrc)> {
        let mut c = self.candidates.take()?;
        if c.selected >= c.candidates.len() {
            return None;
        }
        let lrc = c.candidates.swap_remove(c.selected);
        Some((c.track, lrc))
    }

    pub fn dismiss_candidates(&mut self) {
        self.candidates = None;
    }
}

fn step_clamped(pos: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = pos as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}
