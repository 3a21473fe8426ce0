//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line as TextLine, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, PlaybackState, SearchScope, View};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::{Track, artists_line, display_from_fields, format_time};
use crate::lyrics::{INSTRUMENTAL_PLACEHOLDER, LyricSync};
use crate::notify::{ToastKind, ToastManager};
use crate::queue::{PlayMode, QueueManager};

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("tab".to_string(), "next view".to_string());
    map.insert("enter".to_string(), "play selected".to_string());
    map.insert("a/A".to_string(), "queue last/next".to_string());
    map.insert("d".to_string(), "remove from queue".to_string());
    map.insert("c".to_string(), "clear queue".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next song".to_string());
    // H/L is filled dynamically from config.
    map.insert("+/-".to_string(), "volume".to_string());
    map.insert("/".to_string(), "filter".to_string());
    map.insert("?".to_string(), "search".to_string());
    map.insert("s".to_string(), "shuffle".to_string());
    map.insert("S".to_string(), "shuffle all".to_string());
    map.insert("r".to_string(), "queue mode".to_string());
    map.insert("f".to_string(), "find lyrics".to_string());
    map.insert("w".to_string(), "save queue as playlist".to_string());
    map.insert("R".to_string(), "reload library".to_string());
    map.insert("K".to_string(), "metadata".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "tab", "h/l", "H/L", "enter", "space/p", "a/A", "d", "c", "+/-", "gg/G", "/",
        "?", "s", "S", "r", "f", "w", "R", "K", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Everything a frame is drawn from.
pub struct Scene<'a> {
    pub app: &'a App,
    pub queue: &'a QueueManager,
    pub lyrics: &'a LyricSync,
    pub toasts: &'a ToastManager,
    pub ui: &'a UiSettings,
    pub controls: &'a ControlsSettings,
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(elapsed: f64, total: f64, ui: &UiSettings) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_time(elapsed)),
            TimeField::Total => {
                if total > 0.0 {
                    parts.push(format_time(total));
                }
            }
            TimeField::Remaining => {
                if total > 0.0 {
                    parts.push(format!("-{}", format_time((total - elapsed).max(0.0))));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Window of `total` rows that fits `height` and keeps `sel` centered when possible.
///
/// Returns `(start, end, selected_pos_in_visible)`.
fn visible_window(total: usize, height: usize, sel: usize) -> (usize, usize, usize) {
    if total <= height || height == 0 {
        return (0, total, sel);
    }
    let half = height / 2;
    let mut start = sel.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, sel - start)
}

/// Uppercase the characters at `positions`, the way filter hits are shown.
fn emphasize(title: &str, positions: Vec<usize>) -> String {
    let mut rendered = String::new();
    let mut pos_iter = positions.into_iter();
    let mut next_pos = pos_iter.next();

    for (ci, ch) in title.chars().enumerate() {
        if next_pos == Some(ci) {
            for up in ch.to_uppercase() {
                rendered.push(up);
            }
            next_pos = pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

fn padded() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    title: String,
    rows: Vec<ListItem>,
    selected: Option<usize>,
) {
    let list = List::new(rows)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, scene: &Scene<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(scene.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" lorchestre · {} ", scene.app.view.title()))
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_status(frame, scene, chunks[1]);

    match scene.app.view {
        View::Library => draw_library(frame, scene.app, chunks[2]),
        View::Queue => draw_queue(frame, scene, chunks[2]),
        View::Lyrics => draw_lyrics(frame, scene, chunks[2]),
        View::Search => draw_search(frame, scene.app, chunks[2]),
    }

    if scene.app.metadata_window {
        draw_metadata(frame, scene, chunks[2]);
    }

    draw_toasts(frame, scene.toasts, chunks[2]);

    let footer = Paragraph::new(controls_text(scene.controls.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(padded()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

fn draw_status(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let app = scene.app;
    let queue = scene.queue;
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(" MODE: {}", queue.queue_mode().label()));
    parts.push(format!(
        "Shuffle: {}",
        if queue.play_mode() == PlayMode::Shuffle { "ON" } else { "OFF" }
    ));
    parts.push(format!("Vol: {:.0}%", queue.volume() * 100.0));

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        let mut filter_part = String::from("FILTER:");
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    if let Some(current) = queue.current_track() {
        let song = display_from_fields(
            current,
            &scene.ui.now_playing_track_fields,
            &scene.ui.now_playing_track_separator,
        );
        match now_playing_time_text(queue.current_time(), queue.duration(), scene.ui) {
            Some(time) => parts.push(format!("Song: {} [{}]", song, time)),
            None => parts.push(format!("Song: {}", song)),
        }
    }
    parts.push(
        match app.playback {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
        .to_string(),
    );

    if app.syncing {
        parts.push("Daemon: syncing".to_string());
    }

    let status_par = Paragraph::new(parts.join(" • "))
        .block(Block::bordered().padding(padded()).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, area);
}

fn draw_library(frame: &mut Frame, app: &App, area: Rect) {
    let display = app.display_indices();
    let q = app.filter_query.trim();
    let query_lower = q.to_lowercase();

    // Only build ListItems for the visible window.
    let total = display.len();
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, selected_in_visible) =
        visible_window(total, area.height.saturating_sub(2) as usize, sel_pos);

    let rows: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let label = app.label(i);
            if q.is_empty() {
                return ListItem::new(label.to_string());
            }
            match app.fuzzy_match_positions_for_track_lower(i, &query_lower) {
                Some(positions) => ListItem::new(emphasize(label, positions)),
                None => ListItem::new(label.to_string()),
            }
        })
        .collect();

    let title = if app.has_tracks() {
        format!(" tracks ({}) ", total)
    } else {
        " tracks (waiting for daemon) ".to_string()
    };
    render_list(frame, area, title, rows, (total > 0).then_some(selected_in_visible));
}

fn draw_queue(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let app = scene.app;
    let queue = scene.queue.queue();
    let backlog = scene.queue.backlog().len();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let current = scene
        .queue
        .current_track()
        .map(|t| format!("▶ {}", app.label_for(t)))
        .unwrap_or_else(|| "nothing loaded".to_string());
    let history = scene.queue.history().len();
    let now = Paragraph::new(current).block(
        Block::bordered()
            .padding(padded())
            .title(format!(" now playing · {} played ", history)),
    );
    frame.render_widget(now, chunks[0]);

    let total = queue.len();
    let (start, end, selected_in_visible) = visible_window(
        total,
        chunks[1].height.saturating_sub(2) as usize,
        app.queue_selected.min(total.saturating_sub(1)),
    );
    let mut rows: Vec<ListItem> = queue
        .iter()
        .enumerate()
        .skip(start)
        .take(end - start)
        .map(|(n, t)| ListItem::new(format!("{:>3}. {}", n + 1, app.label_for(t))))
        .collect();
    if backlog > 0 && end == total {
        rows.push(ListItem::new(format!("     … {} more", backlog)).dim());
    }

    render_list(
        frame,
        chunks[1],
        format!(" queue ({}) ", total + backlog),
        rows,
        (total > 0).then_some(selected_in_visible),
    );
}

fn draw_lyrics(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    if let Some(picker) = scene.app.candidates.as_ref() {
        let rows: Vec<ListItem> = picker
            .candidates
            .iter()
            .map(|lrc| {
                let preview = lrc
                    .parsed
                    .iter()
                    .map(|l| l.text.trim())
                    .find(|t| !t.is_empty())
                    .or_else(|| lrc.raw.lines().map(str::trim).find(|l| !l.is_empty()))
                    .unwrap_or("(empty)");
                ListItem::new(format!("{} lines · {}", lrc.parsed.len(), preview))
            })
            .collect();
        let title = format!(
            " lyrics for {} (enter applies, esc dismisses) ",
            picker.track.title
        );
        let selected = (!picker.candidates.is_empty()).then_some(picker.selected);
        render_list(frame, area, title, rows, selected);
        return;
    }

    let lyrics = scene.lyrics;
    let block = Block::bordered().padding(padded()).title(" lyrics ");
    if lyrics.is_empty() {
        let msg = if scene.queue.current_track().is_some() {
            "No lyrics for this track. Press f to search."
        } else {
            "Nothing is playing."
        };
        frame.render_widget(Paragraph::new(msg).dim().block(block), area);
        return;
    }

    let active = lyrics.active_lines();
    let focus = active.first().map(|l| l.id).unwrap_or(0);
    let height = area.height.saturating_sub(2) as usize;
    let (start, end, _) = visible_window(lyrics.lines().len(), height, focus);

    let rows: Vec<TextLine> = lyrics.lines()[start..end]
        .iter()
        .map(|line| {
            let is_active = active.iter().any(|a| a.id == line.id);
            let marker = lyrics.marker(line.id);
            let text = if line.is_silent() {
                INSTRUMENTAL_PLACEHOLDER.to_string()
            } else {
                line.text.clone()
            };

            let mut spans = Vec::new();
            if !marker.name.is_empty() {
                let colour = if marker.is_main { Color::Cyan } else { Color::Magenta };
                spans.push(Span::styled(
                    format!("{}: ", marker.name),
                    Style::default().fg(colour),
                ));
            }
            let style = if is_active {
                Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            spans.push(Span::styled(text, style));
            TextLine::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(rows).block(block), area);
}

fn draw_search(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let cursor = if app.search_mode { "_" } else { "" };
    let input = Paragraph::new(format!("{}{}", app.search_query, cursor)).block(
        Block::bordered().padding(padded()).title(format!(
            " search {} (tab switches) ",
            app.search_scope.label()
        )),
    );
    frame.render_widget(input, chunks[0]);

    let results = &app.search_results;
    let total = results.tracks.len();
    let (start, end, selected_in_visible) = visible_window(
        total,
        chunks[1].height.saturating_sub(2) as usize,
        app.search_selected,
    );
    let rows: Vec<ListItem> = results.tracks[start..end]
        .iter()
        .map(|t| ListItem::new(app.label_for(t)))
        .collect();

    let mut title = format!(" results ({} tracks", total);
    if !results.albums.is_empty() {
        title.push_str(&format!(", {} albums", results.albums.len()));
    }
    title.push_str(") ");
    if app.search_scope == SearchScope::Local && total == 0 && !app.search_query.is_empty() {
        title = " results (none in library) ".to_string();
    }
    render_list(frame, chunks[1], title, rows, (total > 0).then_some(selected_in_visible));
}

fn metadata_text(track: &Track) -> String {
    let artists = artists_line(track);
    let year = track
        .album_year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Title: {}\nArtist: {}\nAlbum: {} ({})\nDuration: {}\nBitrate: {} kbps\nGenres: {}\nPath: {}",
        track.title,
        if artists.is_empty() { "-" } else { artists.as_str() },
        if track.album.is_empty() { "-" } else { track.album.as_str() },
        year,
        format_time(track.duration_secs()),
        track.bitrate,
        track.genres.join(", "),
        track.file_path,
    )
}

fn draw_metadata(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    // Keep the popup inside the list area so it doesn't cover header/status/footer.
    let popup_area = centered_rect_sized(72, 10, area);
    frame.render_widget(Clear, popup_area);

    let track = match scene.app.view {
        View::Library => scene.app.selected_track(),
        View::Search => scene.app.selected_search_track(),
        View::Queue | View::Lyrics => scene.queue.current_track().map(|t| &t.track),
    };
    let meta = track
        .map(metadata_text)
        .unwrap_or_else(|| "No track selected".to_string());
    let meta_paragraph = Paragraph::new(meta)
        .block(
            Block::default()
                .padding(padded())
                .borders(Borders::ALL)
                .title(" metadata (K closes) "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(meta_paragraph, popup_area);
}

/// Stack toasts in the top-right corner of `area`, newest at the bottom.
fn draw_toasts(frame: &mut Frame, toasts: &ToastManager, area: Rect) {
    let width = 42.min(area.width);
    let mut y = area.y + 1;
    for toast in toasts.toasts() {
        let lines = (toast.message.chars().count() as u16 / width.saturating_sub(4).max(1)) + 1;
        let height = lines + 2;
        if y + height > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x + area.width.saturating_sub(width + 1),
            y,
            width,
            height,
        };
        let (title, colour) = match toast.kind {
            ToastKind::Error => ("error", Color::Red),
            ToastKind::Loading => ("…", Color::Blue),
            ToastKind::Success => ("done", Color::Green),
            ToastKind::Simple => ("info", Color::Gray),
        };
        let title = toast.title.as_deref().unwrap_or(title);
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(toast.message.as_str())
                .wrap(Wrap { trim: true })
                .block(
                    Block::bordered()
                        .border_style(Style::default().fg(colour))
                        .title(format!(" {} ", title)),
                ),
            rect,
        );
        y += height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_text_follows_fields() {
        let ui = UiSettings::default();
        assert_eq!(
            now_playing_time_text(65.0, 200.0, &ui).as_deref(),
            Some("01:05 / 03:20 / -02:15")
        );
    }

    #[test]
    fn time_text_skips_unknown_length() {
        let ui = UiSettings::default();
        assert_eq!(now_playing_time_text(5.0, 0.0, &ui).as_deref(), Some("00:05"));

        let ui = UiSettings {
            now_playing_time_fields: Vec::new(),
            ..UiSettings::default()
        };
        assert_eq!(now_playing_time_text(5.0, 10.0, &ui), None);
    }

    #[test]
    fn window_centers_selection() {
        assert_eq!(visible_window(5, 10, 3), (0, 5, 3));
        assert_eq!(visible_window(100, 10, 50), (45, 55, 5));
        assert_eq!(visible_window(100, 10, 98), (90, 100, 8));
    }

    #[test]
    fn emphasize_uppercases_hits() {
        assert_eq!(emphasize("black sabbath", vec![0, 6]), "Black Sabbath");
    }

    #[test]
    fn controls_include_scrub_seconds() {
        let text = controls_text(7);
        assert!(text.contains("[H/L] scrub -/+7s"));
        assert!(text.contains("[q] quit"));
    }
}
