use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::config::AudioSettings;

use super::sink::create_sink_at;
use super::types::{AudioCmd, AudioError, Clock, PlayerEvent, crossfade_steps};

/// State owned by the audio thread: at most one loaded track.
struct Engine<F: FnMut(PlayerEvent)> {
    stream: OutputStream,
    settings: AudioSettings,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    paused: bool,
    clock: Clock,
    volume: f32,
    report: F,
}

impl<F: FnMut(PlayerEvent)> Engine<F> {
    fn load(&mut self, path: &Path) -> Result<(), AudioError> {
        let new_sink = create_sink_at(&self.stream, path, Duration::ZERO)?;
        new_sink.set_volume(self.volume);

        // Crossfade if currently playing a sink; otherwise just swap.
        if let Some(old_sink) = self.sink.take() {
            if !self.paused && self.settings.crossfade_ms > 0 {
                new_sink.set_volume(0.0);
                new_sink.play();

                // Fade volumes in a short blocking loop; audio continues in rodio's mixer thread.
                let steps = self.settings.crossfade_steps.max(1);
                let step_ms = (self.settings.crossfade_ms / steps).max(1);
                for (out, inc) in crossfade_steps(steps, self.volume) {
                    old_sink.set_volume(out);
                    new_sink.set_volume(inc);
                    thread::sleep(Duration::from_millis(step_ms));
                }
            }
            old_sink.stop();
        }

        new_sink.play();
        self.sink = Some(new_sink);
        self.path = Some(path.to_path_buf());
        self.paused = false;
        self.clock = Clock::start(Duration::ZERO, Instant::now());
        info!("audio: playing {}", path.display());
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.path = None;
        self.paused = true;
        self.clock = Clock::default();
    }

    fn toggle_pause(&mut self) {
        let Some(s) = self.sink.as_ref() else {
            return;
        };
        let now = Instant::now();
        if self.paused {
            s.play();
            self.clock.resume(now);
            (self.report)(PlayerEvent::Resumed);
        } else {
            s.pause();
            self.clock.pause(now);
            (self.report)(PlayerEvent::Paused);
        }
        self.paused = !self.paused;
    }

    /// Scrubbing: rebuild the current sink and skip into the file.
    /// This uses `Source::skip_duration` (works for common formats).
    fn seek_to(&mut self, target: Duration) -> Result<(), AudioError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        let new_sink = create_sink_at(&self.stream, &path, target)?;
        new_sink.set_volume(self.volume);
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        if self.paused {
            self.clock = Clock::paused_at(target);
        } else {
            new_sink.play();
            self.clock = Clock::start(target, Instant::now());
        }
        self.sink = Some(new_sink);
        debug!("audio: seek to {:.1}s", target.as_secs_f64());
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(volume);
        }
    }

    fn fade_out(&mut self, fade_out_ms: u64) {
        let Some(s) = self.sink.take() else {
            return;
        };
        if fade_out_ms > 0 && !self.paused {
            let steps: u64 = 20;
            let step_ms = (fade_out_ms / steps).max(1);
            for (out, _) in crossfade_steps(steps, self.volume) {
                s.set_volume(out);
                thread::sleep(Duration::from_millis(step_ms));
            }
        }
        s.set_volume(0.0);
        s.stop();
    }

    /// Periodic clock report and end-of-track detection.
    fn tick(&mut self) {
        let Some(s) = self.sink.as_ref() else {
            return;
        };
        if self.paused {
            return;
        }
        if s.empty() {
            self.sink = None;
            self.paused = true;
            self.clock.pause(Instant::now());
            if let Some(path) = self.path.clone() {
                (self.report)(PlayerEvent::Ended(path));
            }
            return;
        }
        let elapsed = self.clock.elapsed(Instant::now());
        (self.report)(PlayerEvent::Time(elapsed.as_secs_f64()));
    }

    fn fail(&mut self, e: AudioError) {
        error!("audio: {e}");
        (self.report)(PlayerEvent::Failed(e.to_string()));
    }
}

pub(super) fn spawn_audio_thread<F>(
    rx: Receiver<AudioCmd>,
    audio_settings: AudioSettings,
    volume: f32,
    report: F,
) -> JoinHandle<()>
where
    F: FnMut(PlayerEvent) + Send + 'static,
{
    thread::spawn(move || {
        let mut report = report;
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                let err = AudioError::NoDevice(e.to_string());
                error!("audio: {err}");
                report(PlayerEvent::Failed(err.to_string()));
                // Keep draining so senders never block on a dead thread.
                while let Ok(cmd) = rx.recv() {
                    if let AudioCmd::Quit { .. } = cmd {
                        break;
                    }
                }
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        let tick = Duration::from_millis(audio_settings.tick_ms.max(1));
        let mut engine = Engine {
            stream,
            settings: audio_settings,
            sink: None,
            path: None,
            paused: true,
            clock: Clock::default(),
            volume,
            report,
        };

        loop {
            match rx.recv_timeout(tick) {
                Ok(cmd) => match cmd {
                    AudioCmd::Load(path) => {
                        if let Err(e) = engine.load(&path) {
                            engine.stop();
                            engine.fail(e);
                        }
                    }
                    AudioCmd::TogglePause => engine.toggle_pause(),
                    AudioCmd::SeekTo(target) => {
                        if let Err(e) = engine.seek_to(target) {
                            engine.fail(e);
                        }
                    }
                    AudioCmd::SetVolume(v) => engine.set_volume(v),
                    AudioCmd::Stop => engine.stop(),
                    AudioCmd::Quit { fade_out_ms } => {
                        engine.fade_out(fade_out_ms);
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => engine.tick(),
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("audio: command channel closed");
                    break;
                }
            }
        }
    })
}
