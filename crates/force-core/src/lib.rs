//! Shared types for the Datafficheur force-log converter.
//!
//! Holds the error taxonomy, the data model flowing through the pipeline,
//! the raw record layout, timestamp helpers, display statistics and the
//! command-line / chart settings.

pub mod error;
pub mod layout;
pub mod models;
pub mod settings;
pub mod stats;
pub mod time_utils;

pub use error::{ForceError, Result};
