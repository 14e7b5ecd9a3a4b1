mod bootstrap;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use force_core::models::{AggregatedTable, ColumnSummary};
use force_core::settings::{ChartConfig, OutputPaths, PipelineConfig, Settings};
use force_core::time_utils::TimezoneHandler;
use force_data::aggregator::Aggregator;
use force_data::export::export_csv;
use force_data::pipeline::{self, PipelineResult};
use force_plot::{render_histograms, render_time_series, ChartKind};

fn main() -> ExitCode {
    let settings = Settings::parse();

    if let Err(e) = bootstrap::setup_logging(settings.effective_log_level()) {
        eprintln!("Warning: logging disabled: {e}");
    }

    match run(&settings) {
        Ok(summary) => {
            print!("{}", format_summary(&summary));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Convert the session directory named by `settings` and write every output.
///
/// Nothing is written unless the whole conversion succeeds.
fn run(settings: &Settings) -> Result<Vec<ColumnSummary>> {
    tracing::info!("Datafficheur v{} starting", env!("CARGO_PKG_VERSION"));

    settings.validate()?;
    let chart_config = settings.chart_config()?;
    let outputs = settings.output_paths();
    for path in outputs.series_chart.iter().chain(outputs.histogram_chart.iter()) {
        ChartKind::from_path(path)?;
    }
    let config = settings.pipeline_config();

    let PipelineResult { table, metadata } = pipeline::run(&config)
        .with_context(|| format!("failed to convert {}", config.data_dir.display()))?;
    tracing::debug!("Run metadata: {}", serde_json::to_string(&metadata)?);

    let mut written = Vec::new();
    if let Err(e) = write_outputs(&outputs, &config, &table, &chart_config, &mut written) {
        for path in written.iter().filter(|p| p.exists()) {
            if let Err(rm) = std::fs::remove_file(path) {
                tracing::warn!("Could not remove {}: {}", path.display(), rm);
            }
        }
        return Err(e);
    }

    Ok(Aggregator::describe(&table))
}

/// Draw the charts, then write the CSV. Every file created is pushed to
/// `written` so a failure part-way can be undone by the caller.
fn write_outputs(
    outputs: &OutputPaths,
    config: &PipelineConfig,
    table: &AggregatedTable,
    chart_config: &ChartConfig,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    if let Some(path) = &outputs.series_chart {
        let timezone = TimezoneHandler::new(&config.timezone);
        written.push(path.clone());
        render_time_series(table, path, chart_config, &timezone)
            .with_context(|| format!("failed to draw {}", path.display()))?;
    }
    if let Some(path) = &outputs.histogram_chart {
        written.push(path.clone());
        render_histograms(table, path, chart_config)
            .with_context(|| format!("failed to draw {}", path.display()))?;
    }

    written.push(outputs.csv.clone());
    export_csv(table, &outputs.csv)
        .with_context(|| format!("failed to write {}", outputs.csv.display()))?;
    Ok(())
}

/// Plain-text statistics table printed after a successful run.
fn format_summary(summary: &[ColumnSummary]) -> String {
    let cell = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into());

    let mut out = format!(
        "{:<16}{:>10}{:>12}{:>12}{:>12}{:>12}\n",
        "", "count", "mean", "std", "min", "max"
    );
    for s in summary {
        out.push_str(&format!(
            "{:<16}{:>10}{:>12}{:>12}{:>12}{:>12}\n",
            s.key.to_string(),
            s.count,
            cell(s.mean),
            cell(s.std),
            cell(s.min),
            cell(s.max)
        ));
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
