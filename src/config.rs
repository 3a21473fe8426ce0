//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive runtime
//! behavior and helpers to locate the config file and the data directory.

mod load;
mod schema;

pub use load::data_dir;
pub use schema::*;

#[cfg(test)]
mod tests;
