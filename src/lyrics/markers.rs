use std::collections::HashMap;

use crate::library::Marker;

use super::line::Line;

/// Shown instead of a singer on blank or instrumental lines.
pub const INSTRUMENTAL_PLACEHOLDER: &str = "♪";

/// Who sings a line, and where they stand in the track's singing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMarker {
    pub name: String,
    /// First singer of the track, on a line that is actually sung.
    pub is_main: bool,
    /// Index in the singing order, -1 for singers not credited on the track.
    pub order: i32,
}

impl Default for ProcessedMarker {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_main: false,
            order: -1,
        }
    }
}

/// Resolve duet attribution for every line that carries a named marker.
///
/// The singing order is the first-occurrence order of marked singers that
/// also appear in `artists`.
pub fn analyze(lines: &[Line], artists: &[String]) -> HashMap<usize, ProcessedMarker> {
    let mut singing_order: Vec<&str> = Vec::new();
    for line in lines {
        if let Some(value) = line.marker.value() {
            if artists.iter().any(|a| a == value) && !singing_order.contains(&value) {
                singing_order.push(value);
            }
        }
    }

    let mut out = HashMap::new();
    for line in lines {
        let Marker::Named(_, value) = &line.marker else {
            continue;
        };
        let order = singing_order
            .iter()
            .position(|s| s == value)
            .map_or(-1, |i| i as i32);
        let name = if line.is_silent() {
            INSTRUMENTAL_PLACEHOLDER.to_string()
        } else {
            value.clone()
        };
        out.insert(
            line.id,
            ProcessedMarker {
                name,
                is_main: order == 0 && !line.is_silent(),
                order,
            },
        );
    }
    out
}
