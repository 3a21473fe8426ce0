use std::path::Path;

use crate::config::TrackDisplayField;

use super::model::Track;

/// Join a track's artists the way the header and lists show them.
pub fn artists_line(track: &Track) -> String {
    track
        .artists
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Falls back to the title (or the file stem when the title is blank) when no
/// parts were produced.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let path = Path::new(&track.file_path);
    let title = track.title.trim();
    let artists = artists_line(track);
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Display => {
                if !artists.is_empty() {
                    parts.push(artists.clone());
                }
                if !title.is_empty() {
                    parts.push(title.to_string());
                }
            }
            TrackDisplayField::Title => {
                if !title.is_empty() {
                    parts.push(title.to_string());
                }
            }
            TrackDisplayField::Artist => {
                if !artists.is_empty() {
                    parts.push(artists.clone());
                }
            }
            TrackDisplayField::Album => {
                let album = track.album.trim();
                if !album.is_empty() {
                    parts.push(album.to_string());
                }
            }
            TrackDisplayField::Filename => {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !stem.trim().is_empty() {
                        parts.push(stem.to_string());
                    }
                }
            }
            TrackDisplayField::Path => {
                parts.push(path.display().to_string());
            }
        }
    }

    if !parts.is_empty() {
        return parts.join(sep);
    }
    if !title.is_empty() {
        return title.to_string();
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string()
}

/// Format seconds as `MM:SS`, or `HH:MM` from one hour on.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "--:--".to_string();
    }
    let secs = seconds.max(0.0) as u64;
    if secs >= 60 * 60 {
        format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}
