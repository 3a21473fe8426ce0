//! Audio playback: a dedicated thread owning the `rodio` output stream,
//! commanded over a channel.

mod player;
mod sink;
mod thread;
mod types;

pub use player::{AudioHandle, AudioPlayer};
pub use types::{AudioCmd, PlayerEvent};
