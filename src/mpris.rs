//! MPRIS surface so desktop media keys and `playerctl` can drive the client.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use log::{debug, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::app::PlaybackState;
use crate::library::artists_line;
use crate::queue::QueueTrack;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.lorchestre";

#[derive(Clone, Debug)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackState,
    track_id: Option<OwnedObjectPath>,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_playback(&self, playback: PlaybackState) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
        }
        let _ = self.notify.send(());
    }

    /// Publish the loaded entry, or clear everything when `None`.
    pub fn set_track_metadata(&self, track: Option<&QueueTrack>) {
        if let Ok(mut s) = self.state.lock() {
            match track {
                Some(t) => {
                    s.track_id = ObjectPath::try_from(format!(
                        "{OBJECT_PATH}/track/{}",
                        t.id.simple()
                    ))
                    .ok()
                    .map(OwnedObjectPath::from);
                    s.title = Some(t.title.clone());
                    let artists = artists_line(t);
                    s.artist = if artists.is_empty() {
                        Vec::new()
                    } else {
                        vec![artists]
                    };
                    s.album = (!t.album.is_empty()).then(|| t.album.clone());
                    s.url = Some(format!("file://{}", t.file_path));
                    s.length_micros = (t.duration > 0).then(|| t.duration as i64 * 1_000_000);
                }
                None => {
                    s.track_id = None;
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.url = None;
                    s.length_micros = None;
                }
            }
        }
        let _ = self.notify.send(());
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "L'Orchestre"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Option<OwnedValue>| {
            if let Some(v) = value {
                map.insert(key.to_string(), v);
            }
        };

        if let Some(id) = &s.track_id {
            put("mpris:trackid", owned(Value::from(id.clone().into_inner())));
        }
        if let Some(title) = &s.title {
            put("xesam:title", owned(Value::from(title.as_str())));
        }
        if !s.artist.is_empty() {
            put("xesam:artist", owned(Value::from(s.artist.clone())));
        }
        if let Some(album) = &s.album {
            put("xesam:album", owned(Value::from(album.as_str())));
        }
        if let Some(url) = &s.url {
            put("xesam:url", owned(Value::from(url.as_str())));
        }
        if let Some(len) = s.length_micros {
            put("mpris:length", owned(Value::from(len)));
        }
        map
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                warn!("MPRIS unavailable: {e}");
            }
        });
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    debug!("MPRIS registered as {BUS_NAME}");

    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;

    loop {
        Timer::after(Duration::from_millis(250)).await;

        let mut changed = false;
        loop {
            match notify.try_recv() {
                Ok(()) => changed = true,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if !changed {
            continue;
        }

        let iface = player.get().await;
        let emitter = player.signal_emitter();
        iface.playback_status_changed(emitter).await?;
        iface.metadata_changed(emitter).await?;
    }
}

#[cfg(test)]
mod tests;
