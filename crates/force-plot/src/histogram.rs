//! Per-channel distribution of the effort values.
//!
//! One panel per column, stacked vertically. Each panel shows the histogram
//! of the values inside the exclusion band, a kernel density curve, the
//! normal curve fitted on the same values and vertical markers at the mean
//! and at one standard deviation on each side.

use std::path::Path;

use force_core::error::Result;
use force_core::models::{AggregatedTable, ColumnKey};
use force_core::settings::ChartConfig;
use force_core::stats::{self, GaussianKde, Histogram};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{info, warn};

use crate::error::PlotError;
use crate::style::{palette_color, ChartKind, FONT, MEAN_LINE, STD_HIGH_LINE, STD_LOW_LINE};
use crate::timeseries::Y_AXIS_LABEL;

pub const HISTOGRAM_TITLE: &str =
    "DATAFFICHEUR - Histogramme de fréquence d'apparition des valeurs d'effort pour capt";

/// Points sampled along the density curves.
const CURVE_POINTS: usize = 200;
/// Curve points per dash of the normal curve.
const DASH_POINTS: usize = 4;
/// Fraction of the bin width covered by a bar.
const BAR_WIDTH: f64 = 0.9;

// ── Panel data ────────────────────────────────────────────────────────────────

/// Everything drawn on one histogram panel.
#[derive(Debug, Clone)]
pub struct HistogramPanel {
    pub key: ColumnKey,
    pub count: usize,
    pub histogram: Histogram,
    pub mean: f64,
    pub std: f64,
    /// KDE curve, scaled to the histogram heights; empty for a constant sample.
    pub kde: Vec<(f64, f64)>,
    /// Fitted normal curve, scaled the same way; empty for a constant sample.
    pub normal: Vec<(f64, f64)>,
}

impl HistogramPanel {
    /// Compute the panel of `key`, or `None` when fewer than two values fall
    /// inside the exclusion band.
    pub fn build(
        table: &AggregatedTable,
        key: &ColumnKey,
        config: &ChartConfig,
    ) -> Result<Option<Self>> {
        let values: Vec<f64> = table
            .values(key)
            .into_iter()
            .filter(|v| config.includes(*v))
            .collect();
        let (Some(mean), Some(std)) = (stats::mean(&values), stats::sample_std(&values)) else {
            return Ok(None);
        };

        let histogram = stats::histogram(&values, config.bins, config.density)?;
        // Counts need the curves scaled from densities to bar heights.
        let scale = if config.density {
            1.0
        } else {
            values.len() as f64 * histogram.bin_width()
        };

        let (lo, hi) = match (histogram.edges.first(), histogram.edges.last()) {
            (Some(lo), Some(hi)) => (*lo, *hi),
            _ => return Ok(None),
        };
        let xs = stats::linspace(lo, hi, CURVE_POINTS);

        let kde = GaussianKde::fit(&values, config.kde_bw_adjust)
            .map(|kde| xs.iter().map(|&x| (x, kde.evaluate(x) * scale)).collect())
            .unwrap_or_default();
        let normal = if std > 0.0 {
            xs.iter()
                .map(|&x| (x, stats::normal_pdf(x, mean, std) * scale))
                .collect()
        } else {
            Vec::new()
        };

        Ok(Some(Self {
            key: *key,
            count: values.len(),
            histogram,
            mean,
            std,
            kde,
            normal,
        }))
    }

    pub fn title(&self) -> String {
        format!("{} : {}", HISTOGRAM_TITLE, self.key)
    }

    /// X range of the panel, wide enough for the ±1σ markers.
    pub fn x_range(&self) -> (f64, f64) {
        let lo = self.histogram.edges.first().copied().unwrap_or(0.0);
        let hi = self.histogram.edges.last().copied().unwrap_or(1.0);
        (lo.min(self.mean - self.std), hi.max(self.mean + self.std))
    }

    /// Tallest bar or curve point, with headroom for the legend.
    pub fn y_max(&self) -> f64 {
        let bars = self.histogram.heights.iter().copied();
        let curves = self.kde.iter().chain(self.normal.iter()).map(|p| p.1);
        let top = bars.chain(curves).fold(0.0f64, f64::max);
        if top > 0.0 {
            top * 1.15
        } else {
            1.0
        }
    }
}

/// X axis caption, showing the exclusion band.
pub fn histogram_x_desc(config: &ChartConfig) -> String {
    match config.exclude_above {
        Some(above) => format!(
            "{}.   Plage {} kgf - {} kgf",
            Y_AXIS_LABEL, config.exclude_below, above
        ),
        None => format!("{}.   Plage > {} kgf", Y_AXIS_LABEL, config.exclude_below),
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Render one histogram panel per column of `table` to `path`.
///
/// Columns with fewer than two values inside the exclusion band get an
/// empty panel.
pub fn render_histograms(
    table: &AggregatedTable,
    path: &Path,
    config: &ChartConfig,
) -> Result<()> {
    let kind = ChartKind::from_path(path)?;
    let keys: Vec<ColumnKey> = table.keys().copied().collect();
    if keys.is_empty() {
        return Err(PlotError::Empty("the table has no columns".into()).into());
    }

    let mut panels = Vec::with_capacity(keys.len());
    for key in &keys {
        let panel = HistogramPanel::build(table, key, config)?;
        if panel.is_none() {
            warn!("Not enough values in range to draw the histogram of {}", key);
        }
        panels.push((*key, panel));
    }

    info!("Plotting histograms to {}", path.display());
    let size = (
        config.histogram_width,
        config.histogram_panel_height * keys.len() as u32,
    );
    match kind {
        ChartKind::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_histograms(root, &panels, config)?;
        }
        ChartKind::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_histograms(root, &panels, config)?;
        }
    }
    Ok(())
}

fn draw_histograms<DB>(
    root: DrawingArea<DB, Shift>,
    panels: &[(ColumnKey, Option<HistogramPanel>)],
    config: &ChartConfig,
) -> std::result::Result<(), PlotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let areas = root.split_evenly((panels.len(), 1));

    for (idx, (area, (key, panel))) in areas.iter().zip(panels.iter()).enumerate() {
        match panel {
            Some(panel) => draw_panel(area, panel, palette_color(idx), config)?,
            None => {
                area.titled(&format!("{} : {}", HISTOGRAM_TITLE, key), (FONT, 18))?;
            }
        }
    }

    root.present()?;
    Ok(())
}

fn draw_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    panel: &HistogramPanel,
    color: RGBColor,
    config: &ChartConfig,
) -> std::result::Result<(), PlotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = panel.x_range();
    let y_max = panel.y_max();

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title(), (FONT, 18))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(config.histogram_x_subdivisions)
        .x_label_formatter(&|x| format!("{:.0}", x))
        .y_label_formatter(&|y| {
            if config.density {
                format!("{:.3}", y)
            } else {
                format!("{:.0}", y)
            }
        })
        .x_desc(histogram_x_desc(config))
        .y_desc(if config.density { "Densité" } else { "Nombre" })
        .draw()?;

    let pad = panel.histogram.bin_width() * (1.0 - BAR_WIDTH) / 2.0;
    chart
        .draw_series(
            panel
                .histogram
                .edges
                .windows(2)
                .zip(panel.histogram.heights.iter())
                .map(|(edge, h)| {
                    Rectangle::new(
                        [(edge[0] + pad, 0.0), (edge[1] - pad, *h)],
                        color.mix(0.4).filled(),
                    )
                }),
        )?
        .label(format!("{} ({} valeurs)", panel.key.chart_label(), panel.count))
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.4).filled())
        });

    if !panel.kde.is_empty() {
        chart
            .draw_series(LineSeries::new(panel.kde.iter().copied(), color.stroke_width(2)))?
            .label("Densité estimée")
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }
    if !panel.normal.is_empty() {
        chart
            .draw_series(
                panel
                    .normal
                    .chunks(DASH_POINTS)
                    .step_by(2)
                    .map(|dash| PathElement::new(dash.to_vec(), BLACK.stroke_width(1))),
            )?
            .label("Loi normale")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(1)));
    }

    let markers = [
        (panel.mean, MEAN_LINE, format!("Moyenne: {:.0} kgf", panel.mean)),
        (
            panel.mean - panel.std,
            STD_LOW_LINE,
            format!("-1 Ec-Typ: {:.0} kgf", panel.mean - panel.std),
        ),
        (
            panel.mean + panel.std,
            STD_HIGH_LINE,
            format!("+1 Ec-Typ: {:.0} kgf", panel.mean + panel.std),
        ),
    ];
    for (x, line_color, label) in markers {
        chart
            .draw_series(LineSeries::new(
                vec![(x, 0.0), (x, y_max)],
                line_color.stroke_width(2),
            ))?
            .label(label)
            .legend(move |(lx, ly)| {
                PathElement::new(vec![(lx, ly), (lx + 20, ly)], line_color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
