//! Chart rendering for aggregated force tables.
//!
//! Two figures are produced: the effort of every channel over time and a
//! stack of per-channel histograms. Both are written as PNG or SVG depending
//! on the output file extension.

pub mod error;
pub mod histogram;
pub mod style;
pub mod timeseries;

pub use error::PlotError;
pub use histogram::render_histograms;
pub use style::ChartKind;
pub use timeseries::render_time_series;
