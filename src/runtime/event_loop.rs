use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, PlaybackState, SearchScope, View};
use crate::audio::PlayerEvent;
use crate::config;
use crate::daemon::LiveEvent;
use crate::library::Track;
use crate::lyrics::{LyricSync, offer_candidates};
use crate::mpris::{ControlCmd, MprisHandle};
use crate::notify::{self, Notify, ToastKind, ToastManager};
use crate::queue::{AddMode, QueueManager};
use crate::storage::SessionStore;
use crate::ui::{self, Scene};

use super::mpris_sync::MprisSync;
use super::tasks::{AppEvent, Tasks};

/// Everything the loop reads and mutates.
pub struct Context<'a> {
    pub settings: &'a config::Settings,
    pub app: App,
    pub queue: QueueManager,
    pub lyrics: LyricSync,
    pub toasts: ToastManager,
    pub store: Option<SessionStore>,
    pub tasks: &'a Tasks,
    pub mpris: &'a MprisHandle,
}

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Whether the audio thread holds the current entry. False after a
    /// restore until playback is resumed.
    pub audio_loaded: bool,
    saved_revision: u64,
    mpris: MprisSync,
}

impl EventLoopState {
    pub fn new(queue: &QueueManager) -> Self {
        Self {
            pending_gg: false,
            audio_loaded: false,
            saved_revision: queue.revision(),
            mpris: MprisSync::default(),
        }
    }
}

/// Main terminal event loop: handles input, UI drawing, daemon and player
/// events and MPRIS. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    ctx: &mut Context<'_>,
    events: &Receiver<AppEvent>,
    control_tx: &Sender<ControlCmd>,
    control_rx: &Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(ev) = events.try_recv() {
            handle_app_event(ev, ctx, state);
        }

        ctx.toasts.prune(Instant::now());
        ctx.app.playback = PlaybackState::of(&ctx.queue);
        state.mpris.update(ctx.mpris, &ctx.queue, ctx.app.playback);
        persist(ctx, state);

        terminal.draw(|f| {
            ui::draw(
                f,
                &Scene {
                    app: &ctx.app,
                    queue: &ctx.queue,
                    lyrics: &ctx.lyrics,
                    toasts: &ctx.toasts,
                    ui: &ctx.settings.ui,
                    controls: &ctx.settings.controls,
                },
            )
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, ctx, state) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, ctx, control_tx, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Save the session when the queue changed since the last save.
fn persist(ctx: &mut Context<'_>, state: &mut EventLoopState) {
    let revision = ctx.queue.revision();
    if revision == state.saved_revision {
        return;
    }
    state.saved_revision = revision;
    save_session(ctx);
}

pub fn save_session(ctx: &mut Context<'_>) {
    if let Some(store) = ctx.store.as_mut() {
        if let Err(e) = store.save_session(&ctx.queue.snapshot()) {
            warn!("could not save session: {e}");
        }
    }
}

/// Ask the daemon for the library under a loading toast.
pub fn load_media(ctx: &mut Context<'_>) {
    let loading = ctx.toasts.show(ToastKind::Loading, "Loading library", None);
    ctx.tasks.load_media(loading);
}

/// Point the lyric synchronizer at `track`, fetching lines it does not embed.
pub fn bind_lyrics(ctx: &mut Context<'_>, track: &Track) {
    if let Some(ticket) = ctx.lyrics.load_track(track) {
        ctx.tasks.fetch_lyrics(ticket);
    }
}

fn handle_app_event(ev: AppEvent, ctx: &mut Context<'_>, state: &mut EventLoopState) {
    match ev {
        AppEvent::Player(event) => handle_player_event(event, ctx, state),
        AppEvent::Live(event) => handle_live_event(event, ctx),
        AppEvent::TrackStarted(entry) => {
            // Skip entries that were already replaced by a later play.
            if ctx.queue.current_track().map(|c| c.id) != Some(entry.id) {
                return;
            }
            state.audio_loaded = true;
            bind_lyrics(ctx, &entry.track);
        }
        AppEvent::MediaLoaded { loading, result } => {
            if let Some(media) = notify::finish(&mut ctx.toasts, loading, result, "Loading library")
            {
                info!("library loaded: {} tracks", media.tracks.len());
                ctx.app.set_media(media);
            }
        }
        AppEvent::LyricsFetched { ticket, result } => match result {
            Ok(lines) => {
                if ctx.lyrics.apply_fetched(&ticket, &lines) {
                    ctx.lyrics.update(ctx.queue.current_time());
                }
            }
            Err(e) => {
                ctx.toasts.show(
                    ToastKind::Error,
                    &format!("Fetching lyrics: {e}"),
                    Some("Error"),
                );
            }
        },
        AppEvent::LyricsFound {
            loading,
            track,
            result,
        } => {
            let Some(candidates) = notify::finish(&mut ctx.toasts, loading, result, "Searching lyrics")
            else {
                return;
            };
            if offer_candidates(&mut ctx.app, &track, candidates) {
                ctx.app.view = View::Lyrics;
            } else {
                ctx.toasts.show(ToastKind::Simple, "No lyrics found", None);
            }
        }
        AppEvent::PlaylistCreated { loading, result } => {
            if let Some(path) = notify::finish(&mut ctx.toasts, loading, result, "Saving playlist") {
                ctx.toasts.show(
                    ToastKind::Success,
                    &format!("Playlist saved as {path}"),
                    None,
                );
            }
        }
    }
}

fn handle_player_event(event: PlayerEvent, ctx: &mut Context<'_>, state: &mut EventLoopState) {
    match event {
        PlayerEvent::Time(t) => {
            ctx.queue.set_current_time(t);
            ctx.lyrics.update(t);
        }
        PlayerEvent::Paused => ctx.queue.set_paused(true),
        PlayerEvent::Resumed => ctx.queue.set_paused(false),
        PlayerEvent::Ended(path) => {
            // A later load already replaced the file that ended.
            if !ctx.queue.is_playing_file(&path) {
                debug!("ignoring end of {}", path.display());
                return;
            }
            debug!("track ended");
            state.audio_loaded = false;
            ctx.queue.next();
            after_transport_change(ctx, state);
        }
        PlayerEvent::Failed(msg) => {
            state.audio_loaded = false;
            ctx.queue.set_paused(true);
            ctx.toasts.show(ToastKind::Error, &msg, Some("Playback"));
        }
    }
}

fn handle_live_event(event: LiveEvent, ctx: &mut Context<'_>) {
    match event {
        LiveEvent::LibraryChanged => load_media(ctx),
        LiveEvent::SyncStart => {
            ctx.app.syncing = true;
            ctx.toasts
                .show(ToastKind::Simple, "Daemon is indexing the library", None);
        }
        LiveEvent::SyncEnd => {
            ctx.app.syncing = false;
            load_media(ctx);
        }
        LiveEvent::SearchResponse(results) => {
            if ctx.app.search_scope == SearchScope::Remote {
                ctx.app.set_search_results(results);
            }
        }
        LiveEvent::LocalSearchResponse(results) => {
            if ctx.app.search_scope == SearchScope::Local {
                ctx.app.set_search_results(results);
            }
        }
        LiveEvent::Other(frame) => debug!("ignoring live event {}", frame.event),
    }
}

/// Keep the loaded flag and the lyrics in line with the queue after it
/// moved on its own.
fn after_transport_change(ctx: &mut Context<'_>, state: &mut EventLoopState) {
    if ctx.queue.current_track().is_none() {
        state.audio_loaded = false;
        ctx.lyrics.unbind();
    } else {
        state.audio_loaded = true;
    }
}

/// Play/pause, loading a restored entry into the player first if needed.
fn toggle_play_pause(ctx: &mut Context<'_>, state: &mut EventLoopState) {
    if state.audio_loaded {
        ctx.queue.toggle_play_pause();
        return;
    }
    let Some(entry) = ctx.queue.current_track().cloned() else {
        play_selected(ctx, state);
        return;
    };
    let resume_at = ctx.queue.current_time();
    ctx.queue.play(entry);
    if resume_at > 0.0 {
        ctx.queue.seek_to(resume_at);
    }
    state.audio_loaded = true;
}

/// Start whatever the cursor of the active view points at.
fn play_selected(ctx: &mut Context<'_>, state: &mut EventLoopState) {
    match ctx.app.view {
        View::Library => {
            let display = ctx.app.display_indices();
            let Some(pos) = display.iter().position(|&i| i == ctx.app.selected) else {
                return;
            };
            // The rest of the visible list follows the picked track.
            let mut rest = ctx.app.visible_tracks().into_iter().skip(pos);
            let Some(first) = rest.next() else {
                return;
            };
            ctx.queue.play(first);
            ctx.queue.add_many_to_queue(rest.collect(), AddMode::Bottom);
        }
        View::Queue => {
            let Some(id) = ctx.queue.queue().get(ctx.app.queue_selected).map(|e| e.id) else {
                return;
            };
            ctx.queue.shift_to(id, true);
        }
        View::Search => {
            let Some(track) = ctx.app.selected_search_track().cloned() else {
                return;
            };
            ctx.queue.play(track);
        }
        View::Lyrics => {
            apply_candidate(ctx);
            return;
        }
    }
    after_transport_change(ctx, state);
}

fn apply_candidate(ctx: &mut Context<'_>) {
    let Some((mut track, lrc)) = ctx.app.take_candidate() else {
        return;
    };
    if ctx.lyrics.bound_track() != Some(track.file_path.as_str()) {
        ctx.toasts.show(
            ToastKind::Simple,
            "The track changed, lyrics were not applied",
            None,
        );
        return;
    }
    track.lyrics = lrc.parsed;
    let _ = ctx.lyrics.load_track(&track);
    ctx.lyrics.update(ctx.queue.current_time());
    ctx.toasts.show(ToastKind::Success, "Lyrics applied", None);
}

fn queue_selected(ctx: &mut Context<'_>, mode: AddMode) {
    let track = match ctx.app.view {
        View::Library => ctx.app.selected_track().cloned(),
        View::Search => ctx.app.selected_search_track().cloned(),
        View::Queue | View::Lyrics => None,
    };
    let Some(track) = track else {
        return;
    };
    let label = ctx.app.label_for(&track);
    ctx.queue.add_to_queue(track, mode);
    let place = match mode {
        AddMode::Top => "next",
        AddMode::Bottom => "last",
    };
    ctx.toasts
        .show(ToastKind::Simple, &format!("Queued {place}: {label}"), None);
}

fn seek_by(ctx: &mut Context<'_>, delta: f64) {
    let duration = ctx.queue.duration();
    let mut target = (ctx.queue.current_time() + delta).max(0.0);
    if duration > 0.0 {
        target = target.min(duration);
    }
    ctx.queue.seek_to(target);
}

fn change_volume(ctx: &mut Context<'_>, delta: f32) {
    let volume = (ctx.queue.volume() + delta).clamp(0.0, 1.0);
    ctx.queue.set_volume(volume);
}

fn search_lyrics(ctx: &mut Context<'_>) {
    let Some(track) = ctx.queue.current_track().map(|e| e.track.clone()) else {
        ctx.toasts.show(ToastKind::Simple, "Nothing is playing", None);
        return;
    };
    let loading = ctx
        .toasts
        .show(ToastKind::Loading, &format!("Searching lyrics for {}", track.title), None);
    ctx.tasks.search_lyrics(loading, track);
}

fn save_queue_as_playlist(ctx: &mut Context<'_>) {
    let tracks: Vec<String> = ctx
        .queue
        .current_track()
        .into_iter()
        .chain(ctx.queue.queue())
        .chain(ctx.queue.backlog())
        .map(|e| e.file_path.clone())
        .collect();
    if tracks.is_empty() {
        ctx.toasts.show(ToastKind::Simple, "The queue is empty", None);
        return;
    }
    let metadata = vec![(
        "Name".to_string(),
        format!("Queue ({} tracks)", tracks.len()),
    )];
    let loading = ctx.toasts.show(ToastKind::Loading, "Saving playlist", None);
    ctx.tasks.create_playlist(loading, metadata, tracks);
}

fn submit_search(ctx: &mut Context<'_>) {
    ctx.app.exit_search_mode();
    let query = ctx.app.search_query.trim().to_string();
    let live = ctx.tasks.live();
    let sent = match ctx.app.search_scope {
        SearchScope::Remote => live.search(&query),
        SearchScope::Local => live.local_search(&query),
    };
    match sent {
        Ok(true) => {}
        Ok(false) => ctx.app.clear_search_results(),
        Err(e) => {
            ctx.toasts
                .show(ToastKind::Error, &format!("Search: {e}"), Some("Error"));
        }
    }
}

fn handle_control_cmd(cmd: ControlCmd, ctx: &mut Context<'_>, state: &mut EventLoopState) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => match ctx.app.playback {
            PlaybackState::Paused => toggle_play_pause(ctx, state),
            PlaybackState::Stopped => play_selected(ctx, state),
            PlaybackState::Playing => {}
        },
        ControlCmd::Pause => {
            if ctx.app.playback == PlaybackState::Playing {
                toggle_play_pause(ctx, state);
            }
        }
        ControlCmd::PlayPause => match ctx.app.playback {
            PlaybackState::Stopped => play_selected(ctx, state),
            PlaybackState::Playing | PlaybackState::Paused => toggle_play_pause(ctx, state),
        },
        ControlCmd::Stop => {
            ctx.queue.stop();
            after_transport_change(ctx, state);
        }
        ControlCmd::Next => {
            ctx.queue.next();
            after_transport_change(ctx, state);
        }
        ControlCmd::Prev => {
            ctx.queue.prev();
            after_transport_change(ctx, state);
        }
    }
    ctx.app.playback = PlaybackState::of(&ctx.queue);
    false
}

fn move_cursor(ctx: &mut Context<'_>, delta: isize) {
    match ctx.app.view {
        View::Library => {
            if delta > 0 {
                ctx.app.next();
            } else {
                ctx.app.prev();
            }
        }
        View::Queue => {
            let len = ctx.queue.queue().len();
            ctx.app.move_queue_cursor(delta, len);
        }
        View::Search => ctx.app.move_search_cursor(delta),
        View::Lyrics => ctx.app.move_candidate_cursor(delta),
    }
}

fn jump_cursor(ctx: &mut Context<'_>, to_end: bool) {
    let far = if to_end { isize::MAX / 2 } else { isize::MIN / 2 };
    match ctx.app.view {
        View::Library if to_end => ctx.app.last(),
        View::Library => ctx.app.first(),
        View::Queue | View::Search | View::Lyrics => move_cursor(ctx, far),
    }
}

fn handle_filter_key(key: KeyEvent, ctx: &mut Context<'_>, state: &mut EventLoopState) {
    let app: &mut App = &mut ctx.app;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j') | KeyCode::Char('n') if ctrl => app.next(),
        KeyCode::Char('k') | KeyCode::Char('p') if ctrl => app.prev(),
        KeyCode::Down => app.next(),
        KeyCode::Up => app.prev(),
        KeyCode::Char(c) => {
            if !c.is_control() {
                app.push_filter_char(c);
            }
        }
        KeyCode::Enter => {
            if app.display_indices().is_empty() {
                return;
            }
            app.exit_filter_mode();
            play_selected(ctx, state);
        }
        _ => {}
    }
}

fn handle_search_key(key: KeyEvent, ctx: &mut Context<'_>) {
    match key.code {
        KeyCode::Esc => ctx.app.exit_search_mode(),
        KeyCode::Tab => ctx.app.toggle_search_scope(),
        KeyCode::Backspace => {
            ctx.app.search_query.pop();
        }
        KeyCode::Enter => submit_search(ctx),
        KeyCode::Char(c) => {
            if !c.is_control() {
                ctx.app.search_query.push(c);
            }
        }
        _ => {}
    }
}

/// Returns true when the user asked to quit.
fn handle_key_event(
    key: KeyEvent,
    ctx: &mut Context<'_>,
    control_tx: &Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    if ctx.app.filter_mode {
        state.pending_gg = false;
        handle_filter_key(key, ctx, state);
        return false;
    }
    if ctx.app.search_mode {
        state.pending_gg = false;
        handle_search_key(key, ctx);
        return false;
    }
    if ctx.app.view == View::Lyrics && ctx.app.candidates.is_some() && key.code == KeyCode::Esc {
        ctx.app.dismiss_candidates();
        return false;
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    let scrub = ctx.settings.controls.scrub_seconds as f64;
    let step = ctx.settings.controls.volume_step;

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => ctx.app.cycle_view(),
        KeyCode::Char('/') => {
            ctx.app.view = View::Library;
            ctx.app.enter_filter_mode();
        }
        KeyCode::Char('?') => ctx.app.enter_search_mode(),
        KeyCode::Char('s') => ctx.queue.toggle_shuffle(),
        KeyCode::Char('S') => {
            let tracks = ctx.app.visible_tracks();
            if !tracks.is_empty() {
                ctx.queue.shuffle_play(tracks);
                after_transport_change(ctx, state);
            }
        }
        KeyCode::Char('r') => ctx.queue.cycle_queue_mode(),
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                jump_cursor(ctx, false);
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => jump_cursor(ctx, true),
        KeyCode::Char('j') | KeyCode::Down => move_cursor(ctx, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(ctx, -1),
        KeyCode::Enter => play_selected(ctx, state),
        KeyCode::Char('a') => queue_selected(ctx, AddMode::Bottom),
        KeyCode::Char('A') => queue_selected(ctx, AddMode::Top),
        KeyCode::Char('d') | KeyCode::Delete => {
            if ctx.app.view == View::Queue {
                if let Some(entry) = ctx.queue.queue().get(ctx.app.queue_selected).cloned() {
                    ctx.queue.remove(&entry);
                    let len = ctx.queue.queue().len();
                    ctx.app.move_queue_cursor(0, len);
                }
            }
        }
        KeyCode::Char('c') => {
            ctx.queue.clear_queue();
            ctx.app.queue_selected = 0;
            ctx.toasts.show(ToastKind::Simple, "Queue cleared", None);
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => seek_by(ctx, scrub),
        KeyCode::Char('H') => seek_by(ctx, -scrub),
        KeyCode::Char('+') | KeyCode::Char('=') => change_volume(ctx, step),
        KeyCode::Char('-') => change_volume(ctx, -step),
        KeyCode::Char('f') => search_lyrics(ctx),
        KeyCode::Char('w') => save_queue_as_playlist(ctx),
        KeyCode::Char('R') => load_media(ctx),
        KeyCode::Char('K') => ctx.app.toggle_metadata_window(),
        _ => {}
    }

    false
}
