use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ForceError, Result};
use crate::layout::DEFAULT_ACQUISITION_FREQUENCY;
use crate::time_utils::{TimezoneHandler, DEFAULT_TIMEZONE};

/// Default notes file name, looked up inside the data directory.
pub const DEFAULT_NOTES_FILE: &str = "note.csv";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Convert Datafficheur force-sensor logs to CSV and charts
#[derive(Parser, Debug, Clone)]
#[command(
    name = "datafficheur",
    about = "Convert Datafficheur force-sensor logs to CSV and charts",
    version
)]
pub struct Settings {
    /// Directory holding the Datafficheur files
    #[arg(short, long)]
    pub dir: PathBuf,

    /// CSV file to create (relative paths land in the data directory)
    #[arg(short, long, default_value = "output.csv")]
    pub output: PathBuf,

    /// Skip chart generation
    #[arg(long)]
    pub no_plot: bool,

    /// Time-series chart file (PNG or SVG); defaults to `<output>.png`
    #[arg(long)]
    pub output_plot: Option<PathBuf>,

    /// Histogram chart file (PNG or SVG); defaults to `<output>_histogram.png`
    #[arg(long)]
    pub histogram: Option<PathBuf>,

    /// Timezone of the device clock ("auto" for the system timezone)
    #[arg(short = 'z', long, default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,

    /// Notes file name inside the data directory
    #[arg(long, default_value = DEFAULT_NOTES_FILE)]
    pub notes: String,

    /// Samples per second written by the device
    #[arg(long, default_value_t = DEFAULT_ACQUISITION_FREQUENCY)]
    pub frequency: u32,

    /// Histogram: exclude values at or below this bound (kgf)
    #[arg(long)]
    pub exclude_below: Option<f64>,

    /// Histogram: exclude values at or above this bound (kgf)
    #[arg(long)]
    pub exclude_above: Option<f64>,

    /// Histogram bin count
    #[arg(long)]
    pub bins: Option<usize>,

    /// Histogram shows counts instead of densities
    #[arg(long)]
    pub no_density: bool,

    /// Spacing of the horizontal grid lines on the time-series chart (kgf)
    #[arg(long)]
    pub hticks: Option<f64>,

    /// Text appended to the chart titles
    #[arg(long)]
    pub title_suffix: Option<String>,

    /// JSON file with chart settings
    #[arg(long)]
    pub chart_config: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Print progress details
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved destination files of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub series_chart: Option<PathBuf>,
    pub histogram_chart: Option<PathBuf>,
}

impl Settings {
    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.frequency == 0 {
            return Err(ForceError::InvalidArgument(
                "acquisition frequency must be > 0".to_string(),
            ));
        }
        if !TimezoneHandler::validate_timezone(&self.timezone) {
            return Err(ForceError::InvalidArgument(format!(
                "unknown timezone \"{}\"",
                self.timezone
            )));
        }
        if self.notes.trim().is_empty() {
            return Err(ForceError::InvalidArgument(
                "notes file name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// `--verbose` wins over `--log-level`.
    pub fn effective_log_level(&self) -> &str {
        if self.verbose {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_dir: self.dir.clone(),
            frequency: self.frequency,
            notes_file: self.notes.clone(),
            timezone: self.timezone.clone(),
        }
    }

    /// Chart settings: JSON file (when given) then command-line overrides.
    pub fn chart_config(&self) -> Result<ChartConfig> {
        let mut config = match &self.chart_config {
            Some(path) => ChartConfig::load_from(path)?,
            None => ChartConfig::default(),
        };
        if let Some(v) = self.exclude_below {
            config.exclude_below = v;
        }
        if self.exclude_above.is_some() {
            config.exclude_above = self.exclude_above;
        }
        if let Some(v) = self.bins {
            config.bins = v;
        }
        if self.no_density {
            config.density = false;
        }
        if let Some(v) = self.hticks {
            config.hticks = v;
        }
        if self.title_suffix.is_some() {
            config.title_suffix = self.title_suffix.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// Resolve output files against the data directory.
    pub fn output_paths(&self) -> OutputPaths {
        let csv = self.dir.join(&self.output);
        if self.no_plot {
            return OutputPaths {
                csv,
                series_chart: None,
                histogram_chart: None,
            };
        }
        let stem = csv
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let parent = csv.parent().map(Path::to_path_buf).unwrap_or_default();

        let series_chart = self
            .output_plot
            .as_ref()
            .map(|p| self.dir.join(p))
            .unwrap_or_else(|| parent.join(format!("{}.png", stem)));
        let histogram_chart = self
            .histogram
            .as_ref()
            .map(|p| self.dir.join(p))
            .unwrap_or_else(|| parent.join(format!("{}_histogram.png", stem)));

        OutputPaths {
            csv,
            series_chart: Some(series_chart),
            histogram_chart: Some(histogram_chart),
        }
    }
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Everything the conversion pipeline needs, passed in explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub frequency: u32,
    pub notes_file: String,
    pub timezone: String,
}

impl PipelineConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            frequency: DEFAULT_ACQUISITION_FREQUENCY,
            notes_file: DEFAULT_NOTES_FILE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    pub fn notes_path(&self) -> PathBuf {
        self.data_dir.join(&self.notes_file)
    }
}

// ── ChartConfig ────────────────────────────────────────────────────────────────

/// Presentation settings of the two charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Line opacity on the time-series chart, 0 (transparent) to 1 (opaque).
    pub alpha: f64,
    /// Spacing of the horizontal grid lines (kgf).
    pub hticks: f64,
    pub series_width: u32,
    pub series_height: u32,
    /// Histogram bar count.
    pub bins: usize,
    /// Plot densities rather than raw counts.
    pub density: bool,
    /// Target number of X labels on each histogram panel.
    pub histogram_x_subdivisions: usize,
    /// Values `<=` this bound are left out of the histogram.
    pub exclude_below: f64,
    /// Values `>=` this bound are left out of the histogram.
    pub exclude_above: Option<f64>,
    /// Scale applied to Scott's bandwidth for the KDE curve.
    pub kde_bw_adjust: f64,
    pub histogram_width: u32,
    pub histogram_panel_height: u32,
    pub title_suffix: Option<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            alpha: 0.7,
            hticks: 10.0,
            series_width: 1920,
            series_height: 1080,
            bins: 30,
            density: true,
            histogram_x_subdivisions: 20,
            exclude_below: 45.0,
            exclude_above: None,
            kde_bw_adjust: 0.5,
            histogram_width: 1000,
            histogram_panel_height: 600,
            title_suffix: None,
        }
    }
}

impl ChartConfig {
    /// Load settings from a JSON file; missing keys keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ForceError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ForceError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: ChartConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ForceError::InvalidArgument(format!(
                "alpha must be between 0 and 1 (got {})",
                self.alpha
            )));
        }
        if self.bins == 0 {
            return Err(ForceError::InvalidArgument(
                "histogram bin count must be positive".to_string(),
            ));
        }
        if !(self.hticks > 0.0) {
            return Err(ForceError::InvalidArgument(format!(
                "hticks must be positive (got {})",
                self.hticks
            )));
        }
        if !self.exclude_below.is_finite() {
            return Err(ForceError::InvalidArgument(
                "exclusion lower bound must be a finite number".to_string(),
            ));
        }
        if let Some(above) = self.exclude_above {
            if !(above > self.exclude_below) {
                return Err(ForceError::InvalidArgument(format!(
                    "exclusion upper bound {} must be greater than lower bound {}",
                    above, self.exclude_below
                )));
            }
        }
        if !(self.kde_bw_adjust > 0.0) {
            return Err(ForceError::InvalidArgument(
                "KDE bandwidth adjustment must be positive".to_string(),
            ));
        }
        if self.series_width == 0
            || self.series_height == 0
            || self.histogram_width == 0
            || self.histogram_panel_height == 0
        {
            return Err(ForceError::InvalidArgument(
                "chart dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `value` is kept on the histogram.
    pub fn includes(&self, value: f64) -> bool {
        value > self.exclude_below && self.exclude_above.map_or(true, |above| value < above)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
