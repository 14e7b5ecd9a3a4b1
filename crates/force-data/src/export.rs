//! CSV export of the aggregated table.
//!
//! Layout: `date,heure,1 Efforts,…,Total Efforts[,action]`, with `heure`
//! truncated to the decisecond and empty cells for missing values.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use force_core::error::{ForceError, Result};
use force_core::models::AggregatedTable;
use force_core::time_utils::{format_date, format_heure};
use tracing::info;

/// Header cells of `table`.
pub fn header(table: &AggregatedTable) -> Vec<String> {
    let mut cells = vec!["date".to_string(), "heure".to_string()];
    cells.extend(table.keys().map(|k| k.to_string()));
    if table.is_annotated() {
        cells.push("action".to_string());
    }
    cells
}

/// Serialize `table` as CSV into `writer`.
pub fn write_table<W: Write>(table: &AggregatedTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header(table))?;

    let columns: Vec<&Vec<Option<f64>>> = table.columns.values().collect();
    for (row, ts) in table.timestamps.iter().enumerate() {
        let mut cells = Vec::with_capacity(columns.len() + 3);
        cells.push(format_date(*ts));
        cells.push(format_heure(*ts));
        for column in &columns {
            cells.push(column[row].map(|v| v.to_string()).unwrap_or_default());
        }
        if table.is_annotated() {
            cells.push(table.action_at(row).unwrap_or_default().to_string());
        }
        csv_writer.write_record(&cells)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write `table` to `path`, creating parent directories when needed.
pub fn export_csv(table: &AggregatedTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path).map_err(|e| ForceError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("Writing output file {}", path.display());
    write_table(table, file)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
