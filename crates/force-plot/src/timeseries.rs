//! Effort of every channel against time.

use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use force_core::error::Result;
use force_core::models::{AggregatedTable, ColumnKey};
use force_core::settings::ChartConfig;
use force_core::time_utils::TimezoneHandler;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::error::PlotError;
use crate::style::{palette_color, ChartKind, FONT, GRID};

pub const SERIES_TITLE: &str = "DATAFFICHEUR - Effort en fonction du temps";
pub const Y_AXIS_LABEL: &str = "kgf (kilogramme force - comparable au daN)";

/// Chart title with the optional suffix appended.
pub fn series_title(config: &ChartConfig) -> String {
    match config.title_suffix.as_deref() {
        Some(suffix) if !suffix.is_empty() => format!("{} - {}", SERIES_TITLE, suffix),
        _ => SERIES_TITLE.to_string(),
    }
}

/// Contiguous runs of `key`, as `(seconds since origin, value)` pairs.
///
/// A missing value ends the current run so the chart shows a gap instead of
/// bridging it.
pub fn segments(
    table: &AggregatedTable,
    key: &ColumnKey,
    origin: NaiveDateTime,
) -> Vec<Vec<(f64, f64)>> {
    let Some(column) = table.column(key) else {
        return Vec::new();
    };

    let mut runs = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for (ts, value) in table.timestamps.iter().zip(column.iter()) {
        match value {
            Some(v) => current.push((seconds_since(origin, *ts), *v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Y range covering every value, snapped outward to multiples of `hticks`
/// and always containing zero.
pub fn y_bounds(table: &AggregatedTable, hticks: f64) -> (f64, f64) {
    let (lo, hi) = table
        .columns
        .values()
        .flat_map(|c| c.iter().flatten().copied())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let lo = (lo / hticks).floor() * hticks;
    let mut hi = (hi / hticks).ceil() * hticks;
    if hi <= lo {
        hi = lo + hticks;
    }
    (lo, hi)
}

fn seconds_since(origin: NaiveDateTime, ts: NaiveDateTime) -> f64 {
    (ts - origin).num_milliseconds() as f64 / 1000.0
}

/// Render the time-series chart of `table` to `path`.
pub fn render_time_series(
    table: &AggregatedTable,
    path: &Path,
    config: &ChartConfig,
    timezone: &TimezoneHandler,
) -> Result<()> {
    let kind = ChartKind::from_path(path)?;
    let (Some(first), Some(last)) = (table.timestamps.first(), table.timestamps.last()) else {
        return Err(PlotError::Empty("the table has no rows".into()).into());
    };

    info!("Plotting time series to {}", path.display());
    let size = (config.series_width, config.series_height);
    match kind {
        ChartKind::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_series_chart(root, table, *first, *last, config, timezone)?;
        }
        ChartKind::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_series_chart(root, table, *first, *last, config, timezone)?;
        }
    }
    Ok(())
}

fn draw_series_chart<DB>(
    root: DrawingArea<DB, Shift>,
    table: &AggregatedTable,
    origin: NaiveDateTime,
    end: NaiveDateTime,
    config: &ChartConfig,
    timezone: &TimezoneHandler,
) -> std::result::Result<(), PlotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let x_max = seconds_since(origin, end).max(1.0);
    let (y_min, y_max) = y_bounds(table, config.hticks);
    let grid_lines = ((y_max - y_min) / config.hticks).round() as usize;

    let mut chart = ChartBuilder::on(&root)
        .caption(series_title(config), (FONT, 28))
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 60)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

    let x_formatter = |x: &f64| {
        let ts = origin + Duration::milliseconds((x * 1000.0).round() as i64);
        timezone.localize(ts).format("%H:%M:%S").to_string()
    };
    let x_desc = format!("Temps ({})", timezone.tz().name());

    chart
        .configure_mesh()
        .disable_y_mesh()
        .light_line_style(&GRID.mix(0.3))
        .x_labels(12)
        .y_labels(grid_lines.min(40) + 1)
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&|y| format!("{:.0}", y))
        .x_desc(x_desc)
        .y_desc(Y_AXIS_LABEL)
        .draw()?;

    // Horizontal grid every `hticks` kgf.
    chart.draw_series((0..=grid_lines).map(|k| {
        let y = y_min + k as f64 * config.hticks;
        PathElement::new(vec![(0.0, y), (x_max, y)], GRID.stroke_width(1))
    }))?;

    for (idx, key) in table.keys().enumerate() {
        let color = palette_color(idx).mix(config.alpha);
        chart
            .draw_series(
                segments(table, key, origin)
                    .into_iter()
                    .map(move |run| PathElement::new(run, color.stroke_width(2))),
            )?
            .label(key.chart_label())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
