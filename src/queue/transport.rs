//! The player surface the queue drives.
//!
//! Every method defaults to a no-op, so a manager whose player is not wired
//! yet (or a test double that only cares about one call) stays valid.

use super::model::QueueTrack;

pub trait Transport {
    /// Load `track` and start rendering it from the beginning.
    fn play(&mut self, _track: &QueueTrack) {}

    /// Flip between playing and paused. The resulting state is reported back
    /// through `QueueManager::set_paused`.
    fn toggle_pause(&mut self) {}

    fn set_volume(&mut self, _volume: f32) {}

    /// Something was loaded while nothing was.
    fn activate(&mut self) {}

    /// The queue ran dry.
    fn deactivate(&mut self) {}

    fn stop(&mut self) {}
}

/// Transport used until a real player is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {}
