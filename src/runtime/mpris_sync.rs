use uuid::Uuid;

use crate::app::PlaybackState;
use crate::mpris::MprisHandle;
use crate::queue::QueueManager;

/// What was last published over MPRIS, so unchanged state is not re-sent.
#[derive(Debug, Default)]
pub struct MprisSync {
    track: Option<Uuid>,
    playback: PlaybackState,
}

impl MprisSync {
    pub fn update(&mut self, mpris: &MprisHandle, queue: &QueueManager, playback: PlaybackState) {
        let track = queue.current_track().map(|t| t.id);
        if track != self.track {
            mpris.set_track_metadata(queue.current_track());
            self.track = track;
        }
        if playback != self.playback {
            mpris.set_playback(playback);
            self.playback = playback;
        }
    }
}
