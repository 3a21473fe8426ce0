//! Library data as served by the media daemon, plus display helpers.

mod display;
mod model;

pub use display::{artists_line, display_from_fields, format_time};
pub use model::*;

#[cfg(test)]
mod tests;
