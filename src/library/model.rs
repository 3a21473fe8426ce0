//! Media types as served by the daemon.
//!
//! Field names follow the daemon's JSON so these deserialize straight from
//! `/media`, `/lyrics` and the live channel payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimestamp {
    pub minutes: u8,
    pub seconds: u8,
    pub millis: Option<u16>,
}

impl RawTimestamp {
    /// Position of the timestamp in milliseconds.
    pub fn as_millis(&self) -> u64 {
        (self.minutes as u64 * 60 + self.seconds as u64) * 1000 + self.millis.unwrap_or(0) as u64
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.as_millis() as f64 / 1000.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Syllable {
    pub text: String,
    pub start: RawTimestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocal {
    pub text: String,
    pub time: RawTimestamp,
    #[serde(default)]
    pub syllables: Vec<Syllable>,
}

/// Per-line annotation naming who performs it, e.g. `Named("singer", "Alice")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Named(String, String),
    #[default]
    Empty,
}

impl Marker {
    /// The named value (the artist for a `singer` marker).
    pub fn value(&self) -> Option<&str> {
        match self {
            Marker::Named(_, value) => Some(value.as_str()),
            Marker::Empty => None,
        }
    }
}

/// A timestamped lyric entry exactly as the daemon parsed it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricLine {
    pub marker: Marker,
    pub syllables: Vec<Syllable>,
    pub text: String,
    pub time: RawTimestamp,
    pub vocals: Vec<Vocal>,
    pub ln: usize,
    pub is_instrumental: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    pub title: String,
    pub artists: Vec<String>,
    pub track: u32,
    pub album: String,
    pub album_artist: Option<String>,
    pub album_id: String,
    pub album_year: Option<u32>,
    pub lyrics: Vec<LyricLine>,
    pub cover_ext: String,
    pub mime: String,
    pub color: Option<Color>,
    pub created_at: u64,
    pub is_light: Option<bool>,
    pub file_path: String,
    pub path_base64: String,
    /// Length in seconds.
    pub duration: u64,
    pub bitrate: u32,
    pub disc: u32,
    pub encoder: String,
    pub embeded_lyrics: Option<String>,
    pub genres: Vec<String>,
}

impl Track {
    pub fn duration_secs(&self) -> f64 {
        self.duration as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Album {
    pub name: String,
    pub artist: String,
    pub tracks: Vec<String>,
    pub genres: Vec<String>,
    pub disc_total: u32,
    pub tracks_count: u32,
    pub encoder: String,
    pub year: Option<u32>,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playlist {
    pub metadata: HashMap<String, String>,
    pub tracks: Vec<String>,
    pub path: String,
    pub path_base64: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    pub tracks: Vec<(String, Track)>,
    pub albums: Vec<Album>,
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResults {
    pub albums: Vec<Album>,
    pub tracks: Vec<Track>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.albums.is_empty() && self.tracks.is_empty()
    }
}

/// One lyric source for a track: parsed lines plus the raw LRC text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lrc {
    pub parsed: Vec<LyricLine>,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsResponse {
    pub lyrics: Vec<Lrc>,
}
