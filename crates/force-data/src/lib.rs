//! Data layer of the Datafficheur converter.
//!
//! Responsible for discovering and parsing the raw force logs, merging them
//! into one series, building the per-channel and total columns, applying
//! operator notes and exporting the result as CSV.

pub mod aggregator;
pub mod export;
pub mod loader;
pub mod merger;
pub mod notes;
pub mod parser;
pub mod pipeline;

pub use force_core as core;
