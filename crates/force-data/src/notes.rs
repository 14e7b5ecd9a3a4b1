//! Operator notes: `start,end,action` ranges laid over the aggregated table.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use force_core::error::{ForceError, Result};
use force_core::models::{AggregatedTable, NoteInterval};
use force_core::time_utils::{parse_note_end, parse_note_timestamp};
use tracing::{debug, info, warn};

/// Field names of a notes record, in file order.
pub const NOTE_FIELDS: [&str; 3] = ["start", "end", "action"];

/// Read the notes file at `path`.
///
/// Each record must hold exactly a start, an end and an action. A missing or
/// empty field is a [`ForceError::Schema`]; an unreadable timestamp is a
/// [`ForceError::Parse`]. An end written without fractional seconds covers
/// the whole second (or minute) it names.
pub fn load_notes(path: &Path) -> Result<Vec<NoteInterval>> {
    if !path.exists() {
        return Err(ForceError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| ForceError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    let mut notes = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ForceError::parse(path, idx + 1, e.to_string()))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);

        if record.len() != NOTE_FIELDS.len() {
            return Err(ForceError::Schema(format!(
                "{} line {}: expected the {} fields {:?}, found {}",
                path.display(),
                line,
                NOTE_FIELDS.len(),
                NOTE_FIELDS,
                record.len()
            )));
        }
        if let Some(pos) = record.iter().position(str::is_empty) {
            return Err(ForceError::Schema(format!(
                "{} line {}: field '{}' is empty",
                path.display(),
                line,
                NOTE_FIELDS[pos]
            )));
        }

        let start = parse_note_timestamp(&record[0]).ok_or_else(|| {
            ForceError::parse(path, line, format!("unreadable start \"{}\"", &record[0]))
        })?;
        let end = parse_note_end(&record[1]).ok_or_else(|| {
            ForceError::parse(path, line, format!("unreadable end \"{}\"", &record[1]))
        })?;
        if start > end {
            warn!(
                "Note \"{}\" on line {} ends before it starts; it labels nothing",
                &record[2], line
            );
        }

        notes.push(NoteInterval {
            start,
            end,
            action: record[2].to_string(),
        });
    }

    debug!("Loaded {} notes from {}", notes.len(), path.display());
    Ok(notes)
}

/// Overlay `notes` on `table` as an `action` column.
///
/// Intervals apply in order, bounds inclusive; a later interval overwrites an
/// earlier one where they overlap.
pub fn annotate(mut table: AggregatedTable, notes: &[NoteInterval]) -> AggregatedTable {
    let mut actions: Vec<Option<String>> = table
        .actions
        .take()
        .unwrap_or_else(|| vec![None; table.len()]);

    for note in notes {
        // Timestamps are sorted: locate the range with two binary searches.
        let lo = table.timestamps.partition_point(|t| *t < note.start);
        let hi = table.timestamps.partition_point(|t| *t <= note.end);
        info!(
            "Adding action on interval {} - {}: {}",
            note.start, note.end, note.action
        );
        if lo < hi {
            for slot in &mut actions[lo..hi] {
                *slot = Some(note.action.clone());
            }
        }
    }

    table.actions = Some(actions);
    table
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use force_core::models::ColumnKey;
    use tempfile::TempDir;

    fn ts(s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(10, 0, s, ms)
            .unwrap()
    }

    /// Table with one row every 100 ms over `seconds` seconds.
    fn table(seconds: u32) -> AggregatedTable {
        let timestamps: Vec<NaiveDateTime> = (0..seconds * 10)
            .map(|i| ts(i / 10, (i % 10) * 100))
            .collect();
        let mut t = AggregatedTable {
            timestamps,
            ..Default::default()
        };
        t.columns
            .insert(ColumnKey::total(), vec![Some(1.0); t.timestamps.len()]);
        t
    }

    fn note(start: NaiveDateTime, end: NaiveDateTime, action: &str) -> NoteInterval {
        NoteInterval {
            start,
            end,
            action: action.to_string(),
        }
    }

    fn write_notes(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("note.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_notes() {
        let dir = TempDir::new().unwrap();
        let path = write_notes(
            &dir,
            "2024-01-01 10:00:00,2024-01-01 10:00:00.5,démarrage\n\
             01/01/2024 10:00:01,01/01/2024 10:00:02,labour\n",
        );

        let notes = load_notes(&path).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0], note(ts(0, 0), ts(0, 500), "démarrage"));
        assert_eq!(notes[1].start, ts(1, 0));
        assert!(notes[1].end > ts(2, 900) && notes[1].end < ts(3, 0));
        assert_eq!(notes[1].action, "labour");
    }

    #[test]
    fn test_load_notes_missing_field_is_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = write_notes(&dir, "2024-01-01 10:00:00,2024-01-01 10:00:01\n");
        assert!(matches!(load_notes(&path), Err(ForceError::Schema(_))));
    }

    #[test]
    fn test_load_notes_empty_action_is_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = write_notes(&dir, "2024-01-01 10:00:00,2024-01-01 10:00:01,\n");
        match load_notes(&path) {
            Err(ForceError::Schema(msg)) => assert!(msg.contains("action")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_notes_bad_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = write_notes(&dir, "tomorrow,2024-01-01 10:00:01,x\n");
        assert!(matches!(load_notes(&path), Err(ForceError::Parse { .. })));
    }

    #[test]
    fn test_load_notes_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_notes(&dir.path().join("note.csv"));
        assert!(matches!(result, Err(ForceError::NotFound(_))));
    }

    #[test]
    fn test_annotate_inclusive_bounds() {
        let annotated = annotate(table(1), &[note(ts(0, 200), ts(0, 400), "tirage")]);

        assert!(annotated.is_annotated());
        assert_eq!(annotated.action_at(1), None);
        assert_eq!(annotated.action_at(2), Some("tirage"));
        assert_eq!(annotated.action_at(3), Some("tirage"));
        assert_eq!(annotated.action_at(4), Some("tirage"));
        assert_eq!(annotated.action_at(5), None);
    }

    #[test]
    fn test_annotate_later_note_wins() {
        let annotated = annotate(
            table(1),
            &[
                note(ts(0, 0), ts(0, 500), "first"),
                note(ts(0, 300), ts(0, 900), "second"),
            ],
        );

        assert_eq!(annotated.action_at(2), Some("first"));
        assert_eq!(annotated.action_at(3), Some("second"));
        assert_eq!(annotated.action_at(5), Some("second"));
        assert_eq!(annotated.action_at(9), Some("second"));
    }

    #[test]
    fn test_annotate_bounds_between_samples() {
        let annotated = annotate(table(1), &[note(ts(0, 150), ts(0, 350), "x")]);
        assert_eq!(annotated.action_at(1), None);
        assert_eq!(annotated.action_at(2), Some("x"));
        assert_eq!(annotated.action_at(3), Some("x"));
        assert_eq!(annotated.action_at(4), None);
    }

    #[test]
    fn test_whole_second_end_covers_every_sample_of_that_second() {
        let dir = TempDir::new().unwrap();
        let path = write_notes(&dir, "2024-01-01 10:00:00,2024-01-01 10:00:00,tirage\n");

        let annotated = annotate(table(2), &load_notes(&path).unwrap());

        assert!((0..10).all(|i| annotated.action_at(i) == Some("tirage")));
        assert!((10..20).all(|i| annotated.action_at(i).is_none()));
    }

    #[test]
    fn test_annotate_inverted_or_outside_interval() {
        let annotated = annotate(
            table(1),
            &[
                note(ts(0, 500), ts(0, 100), "inverted"),
                note(ts(5, 0), ts(6, 0), "later"),
            ],
        );
        assert!(annotated.is_annotated());
        assert!((0..annotated.len()).all(|i| annotated.action_at(i).is_none()));
    }

    #[test]
    fn test_annotate_without_notes_adds_empty_column() {
        let annotated = annotate(table(1), &[]);
        assert_eq!(annotated.actions.as_ref().unwrap().len(), 10);
    }
}
