//! Collect a playlist's tracks from a local music library.
//!
//! The playlist provider supplies ordered track names, [`fs::index`] snapshots
//! the library, [`matcher::match_tracks`] splits the playlist into found and
//! missing tracks, and [`materialize::materialize`] copies the found files
//! into a fresh per-playlist folder next to a report of what is missing.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod matcher;
pub mod materialize;
pub mod prompt;
pub mod provider;
pub mod run;
pub mod utils;
