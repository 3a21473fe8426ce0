use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use log::warn;

use crate::config::AudioSettings;
use crate::queue::{QueueTrack, Transport};

use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, PlayerEvent};

/// Owns the audio thread.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    /// Start the audio thread. `report` receives every `PlayerEvent`.
    pub fn new<F>(audio_settings: AudioSettings, volume: f32, report: F) -> Self
    where
        F: FnMut(PlayerEvent) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let audio_handle = spawn_audio_thread(rx, audio_settings, volume, report);

        Self {
            tx,
            join: Mutex::new(Some(audio_handle)),
        }
    }

    /// A cheap command handle, e.g. to hand to the queue as its transport.
    pub fn handle(&self) -> AudioHandle {
        AudioHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.tx.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioHandle {
    pub(super) tx: Sender<AudioCmd>,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCmd) {
        if self.tx.send(cmd).is_err() {
            warn!("audio thread is gone, command dropped");
        }
    }

    pub fn seek_to(&self, seconds: f64) {
        self.send(AudioCmd::SeekTo(Duration::from_secs_f64(seconds.max(0.0))));
    }
}

impl Transport for AudioHandle {
    fn play(&mut self, track: &QueueTrack) {
        self.send(AudioCmd::Load(PathBuf::from(&track.file_path)));
    }

    fn toggle_pause(&mut self) {
        self.send(AudioCmd::TogglePause);
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(AudioCmd::SetVolume(volume));
    }

    fn stop(&mut self) {
        self.send(AudioCmd::Stop);
    }
}
