//! Client side of the media daemon: HTTP catalog plus the live socket.

mod client;
mod error;
mod frame;
mod socket;

pub use client::DaemonClient;
pub use error::DaemonError;
pub use frame::{Frame, LiveEvent};
pub use socket::{LiveHandle, run as run_live_channel};
