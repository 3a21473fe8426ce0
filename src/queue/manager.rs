//! The play queue state machine.
//!
//! `QueueManager` owns the live queue (at most `QUEUE_LIMIT` entries while the
//! backlog holds anything), the unbounded backlog behind it, the play history
//! and the transport state mirrored from the player. All operations are
//! in-memory list edits; asking for something that is not there is a no-op.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use log::{debug, info};
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::library::Track;
use crate::observers::{Observers, SubscriptionId};

use super::model::{AddMode, PlayMode, Playable, QUEUE_LIMIT, QueueMode, QueueTrack, SessionSnapshot};
use super::transport::{NullTransport, Transport};

pub struct QueueManager {
    queue: VecDeque<QueueTrack>,
    backlog: VecDeque<QueueTrack>,
    history: Vec<QueueTrack>,
    current: Option<QueueTrack>,
    current_time: f64,
    volume: f32,
    paused: bool,
    queue_mode: QueueMode,
    play_mode: PlayMode,
    /// Queue order captured when shuffle was switched on.
    saved_order: Vec<QueueTrack>,

    transport: Box<dyn Transport>,
    after_play: Observers<QueueTrack>,
    seek: Observers<f64>,
    volume_change: Observers<f32>,

    revision: u64,
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new(Box::new(NullTransport))
    }
}

impl QueueManager {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            queue: VecDeque::new(),
            backlog: VecDeque::new(),
            history: Vec::new(),
            current: None,
            current_time: 0.0,
            volume: 1.0,
            paused: true,
            queue_mode: QueueMode::Continue,
            play_mode: PlayMode::Normal,
            saved_order: Vec::new(),
            transport,
            after_play: Observers::new(),
            seek: Observers::new(),
            volume_change: Observers::new(),
            revision: 0,
        }
    }

    /// Swap the player surface, e.g. once the audio thread is up.
    pub fn set_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport = transport;
    }

    /// Called with the loaded entry after every `play`.
    pub fn on_after_play<F>(&mut self, hook: F) -> SubscriptionId
    where
        F: FnMut(&QueueTrack) + 'static,
    {
        self.after_play.subscribe(hook)
    }

    /// Called with the new position (seconds) on every `seek_to`.
    pub fn on_seek<F>(&mut self, hook: F) -> SubscriptionId
    where
        F: FnMut(&f64) + 'static,
    {
        self.seek.subscribe(hook)
    }

    pub fn on_volume_change<F>(&mut self, hook: F) -> SubscriptionId
    where
        F: FnMut(&f32) + 'static,
    {
        self.volume_change.subscribe(hook)
    }

    /// Drop a hook registered through any of the `on_*` methods.
    pub fn remove_observer(&mut self, id: SubscriptionId) -> bool {
        self.after_play.unsubscribe(id)
            || self.seek.unsubscribe(id)
            || self.volume_change.unsubscribe(id)
    }

    /// Load something into the player.
    ///
    /// A bare `Track` starts a fresh session: queue, backlog and history are
    /// cleared and the track is admitted under a new identity. A `QueueTrack`
    /// is played as is.
    pub fn play(&mut self, item: impl Into<Playable>) {
        let entry = match item.into() {
            Playable::Queued(entry) => entry,
            Playable::Track(track) => {
                self.clear_queue();
                QueueTrack::admit(track)
            }
        };
        self.load(entry);
    }

    fn load(&mut self, entry: QueueTrack) {
        info!("playing {:?} ({})", entry.title, entry.id);
        if self.current.is_none() {
            self.transport.activate();
        }
        self.transport.play(&entry);
        self.paused = false;
        self.current_time = 0.0;
        self.current = Some(entry.clone());
        self.touch();
        self.after_play.notify(&entry);
    }

    /// Move the playhead. No-op when nothing is loaded.
    pub fn seek_to(&mut self, time: f64) {
        if self.current.is_none() {
            return;
        }
        self.current_time = time;
        self.seek.notify(&time);
    }

    pub fn toggle_play_pause(&mut self) {
        self.transport.toggle_pause();
    }

    /// Reflect the player's pause state.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Reflect the player's clock.
    pub fn set_current_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Range checking is left to the caller.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.transport.set_volume(volume);
        self.touch();
        self.volume_change.notify(&volume);
    }

    pub fn add_to_queue(&mut self, track: Track, mode: AddMode) {
        self.insert(vec![QueueTrack::admit(track)], mode);
    }

    /// Queue a batch, keeping its order. In shuffle mode the batch is shuffled first.
    pub fn add_many_to_queue(&mut self, tracks: Vec<Track>, mode: AddMode) {
        let mut batch: Vec<QueueTrack> = tracks.into_iter().map(QueueTrack::admit).collect();
        if self.play_mode == PlayMode::Shuffle {
            batch.shuffle(&mut rand::rng());
        }
        self.insert(batch, mode);
    }

    fn insert(&mut self, batch: Vec<QueueTrack>, mode: AddMode) {
        debug!("queueing {} entries at {:?}", batch.len(), mode);
        match mode {
            AddMode::Top => {
                // Reverse so repeated head insertion leaves the batch in order.
                for entry in batch.into_iter().rev() {
                    self.queue.push_front(entry);
                }
                self.spill_overflow();
            }
            AddMode::Bottom => {
                for entry in batch {
                    if self.queue.len() < QUEUE_LIMIT {
                        self.queue.push_back(entry);
                    } else {
                        self.backlog.push_back(entry);
                    }
                }
            }
        }
        self.touch();
    }

    /// Remove every entry with the identity of `entry`, wherever it sits.
    pub fn remove(&mut self, entry: &QueueTrack) {
        self.queue.retain(|t| !t.matches(entry));
        self.backlog.retain(|t| !t.matches(entry));
        self.saved_order.retain(|t| !t.matches(entry));
        self.touch();
    }

    /// Jump to the queued entry `id`, dropping everything ahead of it.
    ///
    /// The entry itself leaves the queue; with `play` it is loaded, otherwise
    /// it is assumed to be loaded already. Unknown ids leave the queue untouched.
    pub fn shift_to(&mut self, id: Uuid, play: bool) {
        let Some(pos) = self.queue.iter().position(|t| t.id == id) else {
            return;
        };
        self.queue.drain(..pos);
        let target = self.queue.pop_front();
        self.touch();

        if play {
            if let Some(target) = target {
                if let Some(prev) = self.current.take() {
                    self.history.push(prev);
                }
                self.load(target);
            }
        }
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.backlog.clear();
        self.history.clear();
        self.saved_order.clear();
        self.touch();
    }

    /// Advance according to the queue mode. Deactivates the player when
    /// there is nothing left to play.
    pub fn next(&mut self) {
        if self.queue_mode == QueueMode::Repeat {
            if let Some(current) = self.current.clone() {
                self.load(current);
                return;
            }
        }

        let mut upcoming = self.pop_next();
        let mut wrapped = false;

        if upcoming.is_none() && self.queue_mode == QueueMode::RepeatAll && !self.history.is_empty()
        {
            if let Some(current) = self.current.clone() {
                self.history.push(current);
            }
            debug!("repeat-all: replaying {} entries", self.history.len());
            self.backlog.extend(self.history.drain(..));
            upcoming = self.pop_next();
            wrapped = true;
        }

        match upcoming {
            Some(entry) => {
                if !wrapped {
                    if let Some(prev) = self.current.clone() {
                        self.history.push(prev);
                    }
                }
                self.load(entry);
            }
            None => self.deactivate(),
        }
    }

    /// Step back into the history, putting the current entry back at the head.
    pub fn prev(&mut self) {
        let Some(entry) = self.history.pop() else {
            return;
        };
        if let Some(current) = self.current.clone() {
            self.queue.push_front(current);
            self.spill_overflow();
        }
        self.load(entry);
    }

    /// Start over on `tracks` in random order.
    pub fn shuffle_play(&mut self, tracks: Vec<Track>) {
        self.clear_queue();
        self.play_mode = PlayMode::Normal;
        self.add_many_to_queue(tracks, AddMode::Bottom);
        self.toggle_shuffle();
        if let Some(entry) = self.pop_next() {
            self.load(entry);
        }
    }

    pub fn toggle_shuffle(&mut self) {
        match self.play_mode {
            PlayMode::Normal => {
                self.saved_order = self.queue.iter().cloned().collect();
                self.queue.make_contiguous().shuffle(&mut rand::rng());
                self.play_mode = PlayMode::Shuffle;
                self.touch();
            }
            PlayMode::Shuffle => {
                // Entries queued while shuffled (or restored from a previous
                // session) are not in the saved order; they follow it. Entries
                // since spilled to the backlog stay there.
                let saved = std::mem::take(&mut self.saved_order);
                let known: HashSet<Uuid> = saved.iter().map(|t| t.id).collect();
                let parked: HashSet<Uuid> = self.backlog.iter().map(|t| t.id).collect();
                let added: Vec<QueueTrack> = self
                    .queue
                    .drain(..)
                    .filter(|t| !known.contains(&t.id))
                    .collect();
                self.queue = saved
                    .into_iter()
                    .filter(|t| !parked.contains(&t.id))
                    .chain(added)
                    .collect();
                self.play_mode = PlayMode::Normal;
                self.touch();
                if let Some(id) = self.current.as_ref().map(|t| t.id) {
                    self.shift_to(id, false);
                }
                self.spill_overflow();
            }
        }
        debug!("play mode now {:?}", self.play_mode);
    }

    pub fn set_queue_mode(&mut self, mode: QueueMode) {
        self.queue_mode = mode;
        self.touch();
    }

    pub fn cycle_queue_mode(&mut self) {
        self.set_queue_mode(self.queue_mode.cycle());
    }

    fn pop_next(&mut self) -> Option<QueueTrack> {
        if self.queue.is_empty() && !self.backlog.is_empty() {
            self.promote_backlog();
        }
        self.queue.pop_front()
    }

    fn promote_backlog(&mut self) {
        let room = QUEUE_LIMIT.saturating_sub(self.queue.len());
        let take = room.min(self.backlog.len());
        debug!("promoting {take} backlog entries");
        self.queue.extend(self.backlog.drain(..take));
    }

    /// Keep the queue within its limit by handing its tail back to the backlog.
    fn spill_overflow(&mut self) {
        while self.queue.len() > QUEUE_LIMIT {
            if let Some(last) = self.queue.pop_back() {
                self.backlog.push_front(last);
            }
        }
    }

    fn deactivate(&mut self) {
        info!("queue exhausted");
        self.stop();
    }

    /// Unload the current entry and forget the history. The queue stays.
    pub fn stop(&mut self) {
        info!("stopping playback");
        self.transport.deactivate();
        self.paused = true;
        self.current = None;
        self.current_time = 0.0;
        self.history.clear();
        self.transport.stop();
        self.touch();
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn queue(&self) -> &VecDeque<QueueTrack> {
        &self.queue
    }

    pub fn backlog(&self) -> &VecDeque<QueueTrack> {
        &self.backlog
    }

    pub fn history(&self) -> &[QueueTrack] {
        &self.history
    }

    pub fn current_track(&self) -> Option<&QueueTrack> {
        self.current.as_ref()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Whether the loaded entry is backed by the file at `path`.
    pub fn is_playing_file(&self, path: &Path) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| Path::new(&t.file_path) == path)
    }

    /// Length of the loaded track in seconds, 0 when idle.
    pub fn duration(&self) -> f64 {
        self.current.as_ref().map_or(0.0, |t| t.duration_secs())
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn queue_mode(&self) -> QueueMode {
        self.queue_mode
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// Bumped by every change worth persisting.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            queue_mode: self.queue_mode,
            play_mode: self.play_mode,
            queue: self.queue.iter().cloned().collect(),
            backlog: self.backlog.iter().cloned().collect(),
            history: self.history.clone(),
            current_track: self.current.clone(),
            current_time: self.current_time,
            volume: self.volume,
        }
    }

    /// Load a previous session without touching the transport. The restored
    /// track stays paused until the caller decides to play it.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.queue_mode = snapshot.queue_mode;
        self.play_mode = snapshot.play_mode;
        self.queue = snapshot.queue.into();
        self.backlog = snapshot.backlog.into();
        self.history = snapshot.history;
        self.current = snapshot.current_track;
        self.current_time = snapshot.current_time;
        self.volume = snapshot.volume;
        self.paused = true;
        self.saved_order.clear();
        self.spill_overflow();
        self.touch();
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("queue", &self.queue.len())
            .field("backlog", &self.backlog.len())
            .field("history", &self.history.len())
            .field("current", &self.current.as_ref().map(|t| t.id))
            .field("queue_mode", &self.queue_mode)
            .field("play_mode", &self.play_mode)
            .finish()
    }
}
