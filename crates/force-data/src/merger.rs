//! Merging of per-file tables into one ordered series.
//!
//! The device's measurement loop and its write loop can drift by one cycle,
//! which writes the same second twice. After a stable sort on the timestamp
//! only the first row of each timestamp is kept.

use force_core::models::{FileTable, MergedSeries, TimedRow};
use tracing::debug;

/// Concatenate `tables` in the given order, then sort and deduplicate.
pub fn merge_tables(tables: Vec<FileTable>) -> MergedSeries {
    let rows: Vec<TimedRow> = tables.into_iter().flat_map(|t| t.rows).collect();
    merge_rows(rows)
}

/// Stable-sort `rows` by timestamp and keep the first row of each timestamp.
pub fn merge_rows(mut rows: Vec<TimedRow>) -> MergedSeries {
    let before = rows.len();

    // `sort_by_key` is stable: equal timestamps keep their input order.
    rows.sort_by_key(|r| r.timestamp);
    rows.dedup_by(|later, kept| later.timestamp == kept.timestamp);

    let duplicates_dropped = before - rows.len();
    debug!(
        "Merged {} rows into {} ({} duplicate timestamps dropped)",
        before,
        rows.len(),
        duplicates_dropped
    );

    MergedSeries {
        rows,
        duplicates_dropped,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
