use std::fs::{self, OpenOptions};

use log::{info, warn};

use crate::config::{self, data_dir};
use crate::queue::QueueManager;
use crate::storage::SessionStore;

/// Send `log` output to `lorchestre.log` in the data dir. Stderr would
/// draw over the terminal UI, so without a data dir nothing is logged.
pub fn init_logging() {
    let Some(dir) = data_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("lorchestre.log"))
    else {
        return;
    };

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

/// Open the session store unless storage is disabled. Failures leave the
/// session unsaved rather than stopping the client.
pub fn open_store(settings: &config::Settings) -> Option<SessionStore> {
    let path = settings.session_path()?;
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("cannot create {}: {e}", parent.display());
            return None;
        }
    }
    match SessionStore::open(&path) {
        Ok(store) => {
            info!("session store at {}", store.path().display());
            Some(store)
        }
        Err(e) => {
            warn!("session store unavailable: {e}");
            None
        }
    }
}

/// Resume the stored session, or start from the configured playback defaults.
pub fn restore_session(
    queue: &mut QueueManager,
    store: Option<&SessionStore>,
    settings: &config::Settings,
) {
    if let Some(store) = store.filter(|s| s.has_session()) {
        queue.restore(store.load_session());
        info!(
            "restored session: {} queued, {} in backlog",
            queue.queue().len(),
            queue.backlog().len()
        );
        return;
    }
    apply_playback_defaults(queue, settings);
}

pub fn apply_playback_defaults(queue: &mut QueueManager, settings: &config::Settings) {
    queue.set_queue_mode(settings.playback.queue_mode);
    if settings.playback.shuffle {
        queue.toggle_shuffle();
    }
    queue.set_volume(settings.playback.volume.clamp(0.0, 1.0));
}
