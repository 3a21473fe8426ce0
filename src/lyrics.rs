mod editor;
mod line;
mod markers;
mod sync;

pub use editor::{LyricEditor, offer_candidates};
pub use line::Line;
pub use markers::{INSTRUMENTAL_PLACEHOLDER, ProcessedMarker};
pub use sync::{FetchTicket, LyricSync};
