//! Output format selection and the shared colour palette.

use std::path::Path;

use plotters::style::RGBColor;

use crate::error::PlotError;

/// Image format of a chart, picked from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Png,
    Svg,
}

impl ChartKind {
    pub fn from_path(path: &Path) -> Result<Self, PlotError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(ChartKind::Png),
            "svg" => Ok(ChartKind::Svg),
            _ => Err(PlotError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Line colours cycled over the channels, the total always last.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

pub const GRID: RGBColor = RGBColor(200, 200, 200);
pub const MEAN_LINE: RGBColor = RGBColor(220, 20, 60);
pub const STD_LOW_LINE: RGBColor = RGBColor(128, 0, 128);
pub const STD_HIGH_LINE: RGBColor = RGBColor(0, 128, 0);

pub const FONT: &str = "sans-serif";

pub fn palette_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}
