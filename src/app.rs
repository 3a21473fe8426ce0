//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the daemon's library,
//! per-view cursors, search results and lyric candidates.

mod model;

pub use model::*;
