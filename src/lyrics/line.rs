use crate::library::{LyricLine, Marker, Syllable, Vocal};

/// A lyric line placed on the track's timeline.
///
/// `end_time` is the next line's `start_time`, or the track length for the
/// last line. `id` is the line's index in the source sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub id: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub vocals: Vec<Vocal>,
    pub syllables: Vec<Syllable>,
    pub is_instrumental: bool,
    pub marker: Marker,
}

impl Line {
    /// Whether `time` (seconds) falls inside the line. Both ends count.
    pub fn contains(&self, time: f64) -> bool {
        self.start_time <= time && time <= self.end_time
    }

    /// Blank or instrumental lines carry no singer.
    pub fn is_silent(&self) -> bool {
        self.is_instrumental || self.text.trim().is_empty()
    }
}

/// Expand raw timestamped entries into timed lines.
pub fn expand(raw: &[LyricLine], duration: f64) -> Vec<Line> {
    raw.iter()
        .enumerate()
        .map(|(i, l)| {
            let end_time = raw
                .get(i + 1)
                .map(|next| next.time.as_secs_f64())
                .unwrap_or(duration);
            Line {
                id: i,
                start_time: l.time.as_secs_f64(),
                end_time,
                text: l.text.clone(),
                vocals: l.vocals.clone(),
                syllables: l.syllables.clone(),
                is_instrumental: l.is_instrumental,
                marker: l.marker.clone(),
            }
        })
        .collect()
}
