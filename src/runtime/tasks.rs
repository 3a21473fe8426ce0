use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use log::{info, warn};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use crate::audio::PlayerEvent;
use crate::daemon::{DaemonClient, DaemonError, Frame, LiveEvent, LiveHandle, run_live_channel};
use crate::library::{LyricLine, Lrc, Media, Track};
use crate::lyrics::FetchTicket;
use crate::queue::QueueTrack;

/// Delay before the live channel is dialled again after it drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Everything that reaches the event loop from other threads.
#[derive(Debug)]
pub enum AppEvent {
    Player(PlayerEvent),
    Live(LiveEvent),
    /// Emitted by the queue's after-play observer.
    TrackStarted(QueueTrack),
    MediaLoaded {
        loading: u64,
        result: Result<Media, DaemonError>,
    },
    LyricsFetched {
        ticket: FetchTicket,
        result: Result<Vec<LyricLine>, DaemonError>,
    },
    LyricsFound {
        loading: u64,
        track: Track,
        result: Result<Vec<Lrc>, DaemonError>,
    },
    PlaylistCreated {
        loading: u64,
        result: Result<String, DaemonError>,
    },
}

/// Background daemon work, run on a tokio runtime beside the UI thread.
/// Every outcome comes back as an `AppEvent`.
pub struct Tasks {
    rt: Runtime,
    client: Arc<DaemonClient>,
    live: LiveHandle,
    events: Sender<AppEvent>,
}

impl Tasks {
    pub fn new(client: DaemonClient, events: Sender<AppEvent>) -> std::io::Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("lorchestre-net")
            .enable_all()
            .build()?;
        let (live, outgoing) = LiveHandle::channel();
        let tasks = Self {
            rt,
            client: Arc::new(client),
            live,
            events,
        };
        tasks.spawn_live_channel(outgoing);
        Ok(tasks)
    }

    pub fn live(&self) -> &LiveHandle {
        &self.live
    }

    /// Keep the live socket up for the whole session, redialling after drops.
    fn spawn_live_channel(&self, mut outgoing: UnboundedReceiver<Frame>) {
        let uri = self.client.socket_uri();
        let events = self.events.clone();
        self.rt.spawn(async move {
            loop {
                // `outgoing` outlives each connection; frames are relayed per attempt.
                let (relay_tx, relay_rx) = unbounded_channel();
                let pump = async {
                    while let Some(frame) = outgoing.recv().await {
                        if relay_tx.send(frame).is_err() {
                            break;
                        }
                    }
                };
                let ev = events.clone();
                let session = run_live_channel(&uri, relay_rx, move |event| {
                    let _ = ev.send(AppEvent::Live(event));
                });

                let result = tokio::select! {
                    r = session => r,
                    _ = pump => {
                        info!("live channel no longer needed");
                        return;
                    }
                };
                match result {
                    Ok(()) => return,
                    Err(e) => warn!("live channel: {e}; retrying in {}s", RECONNECT_DELAY.as_secs()),
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        });
    }

    pub fn load_media(&self, loading: u64) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.rt.spawn(async move {
            let result = client.media().await;
            let _ = events.send(AppEvent::MediaLoaded { loading, result });
        });
    }

    pub fn fetch_lyrics(&self, ticket: FetchTicket) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.rt.spawn(async move {
            let result = client.lyrics(ticket.file_path()).await;
            let _ = events.send(AppEvent::LyricsFetched { ticket, result });
        });
    }

    pub fn search_lyrics(&self, loading: u64, track: Track) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.rt.spawn(async move {
            let result = client.search_lyrics(&track.file_path).await;
            let _ = events.send(AppEvent::LyricsFound {
                loading,
                track,
                result,
            });
        });
    }

    pub fn create_playlist(&self, loading: u64, metadata: Vec<(String, String)>, tracks: Vec<String>) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.rt.spawn(async move {
            let result = client.create_playlist(&metadata, &tracks).await;
            let _ = events.send(AppEvent::PlaylistCreated { loading, result });
        });
    }

    /// Stop background work without waiting on in-flight requests.
    pub fn shutdown(self) {
        self.rt.shutdown_timeout(Duration::from_millis(200));
    }
}

/// Forward player reports onto the event channel from the audio thread.
pub fn player_reporter(events: Sender<AppEvent>) -> impl FnMut(PlayerEvent) + Send + 'static {
    move |event| {
        let _ = events.send(AppEvent::Player(event));
    }
}
