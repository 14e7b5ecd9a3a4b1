use force_core::error::ForceError;
use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

/// Failures raised while drawing a chart.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("unsupported chart format: {0} (expected png or svg)")]
    UnsupportedFormat(String),

    #[error("nothing to plot: {0}")]
    Empty(String),
}

impl<E: std::error::Error + Send + Sync + 'static> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(value: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Draw(format!("{value:?}"))
    }
}

impl From<PlotError> for ForceError {
    fn from(value: PlotError) -> Self {
        match value {
            PlotError::UnsupportedFormat(_) => ForceError::InvalidArgument(value.to_string()),
            other => ForceError::Plot(other.to_string()),
        }
    }
}
