use std::sync::mpsc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use log::{debug, info};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::AudioPlayer;
use crate::daemon::DaemonClient;
use crate::lyrics::LyricSync;
use crate::mpris::ControlCmd;
use crate::notify::ToastManager;
use crate::queue::QueueManager;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;
mod tasks;

pub use settings::load_settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    startup::init_logging();
    let settings = settings::load_settings();
    info!("lorchestre {} talking to {}", crate::storage::VERSION, settings.daemon_endpoint());

    let store = startup::open_store(&settings);
    let mut queue = QueueManager::default();
    startup::restore_session(&mut queue, store.as_ref(), &settings);

    let (events_tx, events_rx) = mpsc::channel::<tasks::AppEvent>();

    let audio_player = AudioPlayer::new(
        settings.audio.clone(),
        queue.volume(),
        tasks::player_reporter(events_tx.clone()),
    );
    queue.set_transport(Box::new(audio_player.handle()));
    let seek_handle = audio_player.handle();
    queue.on_seek(move |t: &f64| seek_handle.seek_to(*t));
    let started_tx = events_tx.clone();
    queue.on_after_play(move |entry| {
        let _ = started_tx.send(tasks::AppEvent::TrackStarted(entry.clone()));
    });

    let mut lyrics = LyricSync::default();
    lyrics.on_cue_change(|lines| debug!("lyrics: {} active line(s)", lines.len()));

    let tasks = tasks::Tasks::new(DaemonClient::new(&settings.network), events_tx)?;

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx.clone());

    let mut ctx = event_loop::Context {
        settings: &settings,
        app: App::new(settings.ui.list_fields.clone(), settings.ui.list_separator.clone()),
        queue,
        lyrics,
        toasts: ToastManager::new(Duration::from_millis(settings.toast.timeout_ms)),
        store,
        tasks: &tasks,
        mpris: &mpris,
    };
    let mut state = event_loop::EventLoopState::new(&ctx.queue);

    if let Some(track) = ctx.queue.current_track().map(|e| e.track.clone()) {
        event_loop::bind_lyrics(&mut ctx, &track);
        ctx.lyrics.update(ctx.queue.current_time());
    }
    event_loop::load_media(&mut ctx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        event_loop::run(
            &mut terminal,
            &mut ctx,
            &events_rx,
            &control_tx,
            &control_rx,
            &mut state,
        )
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    event_loop::save_session(&mut ctx);
    audio_player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
    drop(ctx);
    tasks.shutdown();
    info!("bye");

    run_result
}
