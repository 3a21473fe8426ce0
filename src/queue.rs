mod manager;
mod model;
mod transport;

pub use manager::QueueManager;
pub use model::{AddMode, PlayMode, Playable, QUEUE_LIMIT, QueueMode, QueueTrack, SessionSnapshot};
pub use transport::{NullTransport, Transport};

#[cfg(test)]
mod tests;
