//! Decoding of one raw Datafficheur log file.
//!
//! Each line holds a line number, a `DD/MM/YYYY` date, a `HH:MM:SS` time and
//! `frequency × sensors` readings. Every line is pivoted into `frequency`
//! rows (one per sub-second sample), each carrying one value per sensor.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use force_core::error::{ForceError, Result};
use force_core::layout::{column_slot, sensor_count, HEADER_COLUMNS};
use force_core::models::{ColumnSlot, FileTable, TimedRow};
use force_core::time_utils::{compose_timestamp, parse_record_date, parse_record_time};
use tracing::debug;

/// Parser for raw log files written at a fixed acquisition frequency.
#[derive(Debug, Clone)]
pub struct RecordParser {
    frequency: u32,
}

impl RecordParser {
    /// Fails with [`ForceError::InvalidArgument`] for a zero frequency.
    pub fn new(frequency: u32) -> Result<Self> {
        if frequency == 0 {
            return Err(ForceError::InvalidArgument(
                "acquisition frequency must be > 0".to_string(),
            ));
        }
        Ok(Self { frequency })
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Parse `path` into its pivoted per-sample rows, in file order.
    pub fn parse_file(&self, path: &Path) -> Result<FileTable> {
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

        let mut slots: Vec<ColumnSlot> = Vec::new();
        let mut width = 0usize;
        let mut rows: Vec<TimedRow> = Vec::new();
        let mut lines_read = 0usize;

        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| ForceError::parse(path, idx + 1, e.to_string()))?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 1);

            if slots.is_empty() {
                width = record.len();
                slots = self.slots_for_width(width).map_err(|e| match e {
                    ForceError::InvalidArgument(msg) => ForceError::parse(path, line, msg),
                    other => other,
                })?;
            } else if record.len() != width {
                return Err(ForceError::parse(
                    path,
                    line,
                    format!("expected {} columns, found {}", width, record.len()),
                ));
            }

            rows.extend(self.pivot_record(&record, &slots, path, line)?);
            lines_read += 1;
        }

        if lines_read == 0 {
            return Err(ForceError::parse(path, 0, "file is empty"));
        }

        debug!(
            "File {}: {} lines, {} columns, {} samples",
            path.display(),
            lines_read,
            width,
            rows.len()
        );

        Ok(FileTable {
            source: path.to_path_buf(),
            rows,
        })
    }

    /// Slots of the reading columns of a `width`-column record.
    fn slots_for_width(&self, width: usize) -> Result<Vec<ColumnSlot>> {
        let readings = width.saturating_sub(HEADER_COLUMNS);
        sensor_count(readings, self.frequency)?;
        (0..readings)
            .map(|x| column_slot(x as i64, i64::from(self.frequency)))
            .collect()
    }

    /// Turn one record into `frequency` rows sharing its date and time.
    fn pivot_record(
        &self,
        record: &StringRecord,
        slots: &[ColumnSlot],
        path: &Path,
        line: usize,
    ) -> Result<Vec<TimedRow>> {
        let line_number = &record[0];
        if line_number.parse::<i64>().is_err() {
            return Err(ForceError::parse(
                path,
                line,
                format!("line number \"{}\" is not an integer", line_number),
            ));
        }
        let date = parse_record_date(&record[1]).ok_or_else(|| {
            ForceError::parse(path, line, format!("malformed date \"{}\"", &record[1]))
        })?;
        let time = parse_record_time(&record[2]).ok_or_else(|| {
            ForceError::parse(path, line, format!("malformed time \"{}\"", &record[2]))
        })?;

        let mut rows: Vec<TimedRow> = (0..self.frequency)
            .map(|fraction| TimedRow::new(compose_timestamp(date, time, fraction, self.frequency)))
            .collect();

        for (slot, cell) in slots.iter().zip(record.iter().skip(HEADER_COLUMNS)) {
            let value = cell
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    ForceError::parse(path, line, format!("non-numeric cell \"{}\"", cell))
                })?;
            rows[slot.fraction as usize].readings.insert(slot.sensor, value);
        }

        Ok(rows)
    }
}

/// Parse one file at the given frequency.
pub fn parse_file(path: &Path, frequency: u32) -> Result<FileTable> {
    RecordParser::new(frequency)?.parse_file(path)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_log(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    /// Raw line with sensor 1 reading `base + i` and sensor 2 `2 * base + i`.
    fn raw_line(n: u32, date: &str, time: &str, base: u32) -> String {
        let s1 = (0..10).map(|i| (base + i).to_string());
        let s2 = (0..10).map(|i| (2 * base + i).to_string());
        let readings: Vec<String> = s1.chain(s2).collect();
        format!("{},{},{},{}", n, date, time, readings.join(","))
    }

    fn ts(h: u32, m: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(h, m, s, ms)
            .unwrap()
    }

    #[test]
    fn test_parse_single_line_two_sensors() {
        let dir = TempDir::new().unwrap();
        let path = write_log(
            dir.path(),
            "01011000.TXT",
            &[raw_line(1, "01/01/2024", "10:00:00", 100)],
        );

        let table = parse_file(&path, 10).unwrap();

        assert_eq!(table.rows.len(), 10);
        for (i, row) in table.rows.iter().enumerate() {
            assert_eq!(row.timestamp, ts(10, 0, 0, 100 * i as u32));
            assert_eq!(row.readings[&1], 100.0 + i as f64);
            assert_eq!(row.readings[&2], 200.0 + i as f64);
        }
        assert_eq!(table.sensors().into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_parse_keeps_file_order() {
        let dir = TempDir::new().unwrap();
        let path = write_log(
            dir.path(),
            "01011000.TXT",
            &[
                raw_line(1, "01/01/2024", "10:00:01", 10),
                raw_line(2, "01/01/2024", "10:00:00", 10),
            ],
        );

        let table = parse_file(&path, 10).unwrap();
        assert_eq!(table.rows.len(), 20);
        assert_eq!(table.rows[0].timestamp, ts(10, 0, 1, 0));
        assert_eq!(table.rows[10].timestamp, ts(10, 0, 0, 0));
    }

    #[test]
    fn test_parse_single_sensor() {
        let dir = TempDir::new().unwrap();
        let readings: Vec<String> = (0..10).map(|i| format!("{}.5", i)).collect();
        let line = format!("7,01/01/2024,10:00:00,{}", readings.join(","));
        let path = write_log(dir.path(), "01011000.TXT", &[line]);

        let table = parse_file(&path, 10).unwrap();
        assert_eq!(table.rows.len(), 10);
        assert_eq!(table.rows[3].readings.len(), 1);
        assert_eq!(table.rows[3].readings[&1], 3.5);
    }

    #[test]
    fn test_parse_other_frequency() {
        let dir = TempDir::new().unwrap();
        let line = "1,01/01/2024,10:00:00,1,2,3,4,5,6,7,8".to_string();
        let path = write_log(dir.path(), "01011000.TXT", &[line]);

        let table = parse_file(&path, 4).unwrap();
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[1].timestamp, ts(10, 0, 0, 250));
        assert_eq!(table.rows[1].readings[&1], 2.0);
        assert_eq!(table.rows[1].readings[&2], 6.0);
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse_file(Path::new("/tmp/does-not-exist-force-test/01011000.TXT"), 10);
        assert!(matches!(result, Err(ForceError::NotFound(_))));
    }

    #[test]
    fn test_parse_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_log(dir.path(), "01011000.TXT", &[]);
        assert!(matches!(parse_file(&path, 10), Err(ForceError::Parse { .. })));
    }

    #[test]
    fn test_parse_ragged_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_log(
            dir.path(),
            "01011000.TXT",
            &[
                raw_line(1, "01/01/2024", "10:00:00", 10),
                "2,01/01/2024,10:00:01,1,2,3".to_string(),
            ],
        );
        match parse_file(&path, 10) {
            Err(ForceError::Parse { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("expected 23 columns"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_readings_not_multiple_of_frequency() {
        let dir = TempDir::new().unwrap();
        let path = write_log(
            dir.path(),
            "01011000.TXT",
            &["1,01/01/2024,10:00:00,1,2,3,4,5".to_string()],
        );
        assert!(matches!(parse_file(&path, 10), Err(ForceError::Parse { .. })));
    }

    #[test]
    fn test_parse_non_numeric_cell() {
        let dir = TempDir::new().unwrap();
        let mut line = raw_line(1, "01/01/2024", "10:00:00", 10);
        line = line.replacen(",15,", ",abc,", 1);
        let path = write_log(dir.path(), "01011000.TXT", &[line]);
        match parse_file(&path, 10) {
            Err(ForceError::Parse { message, .. }) => assert!(message.contains("abc")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_nan_cell() {
        let dir = TempDir::new().unwrap();
        let line = raw_line(1, "01/01/2024", "10:00:00", 10).replacen(",15,", ",NaN,", 1);
        let path = write_log(dir.path(), "01011000.TXT", &[line]);
        assert!(matches!(parse_file(&path, 10), Err(ForceError::Parse { .. })));
    }

    #[test]
    fn test_parse_malformed_date_and_time() {
        let dir = TempDir::new().unwrap();
        let path = write_log(
            dir.path(),
            "01011000.TXT",
            &[raw_line(1, "2024-01-01", "10:00:00", 10)],
        );
        assert!(matches!(parse_file(&path, 10), Err(ForceError::Parse { .. })));

        let path = write_log(
            dir.path(),
            "01011001.TXT",
            &[raw_line(1, "01/01/2024", "10h00", 10)],
        );
        assert!(matches!(parse_file(&path, 10), Err(ForceError::Parse { .. })));
    }

    #[test]
    fn test_parse_bad_line_number() {
        let dir = TempDir::new().unwrap();
        let path = write_log(
            dir.path(),
            "01011000.TXT",
            &[raw_line(1, "01/01/2024", "10:00:00", 10).replacen('1', "x", 1)],
        );
        assert!(matches!(parse_file(&path, 10), Err(ForceError::Parse { .. })));
    }

    #[test]
    fn test_record_parser_rejects_zero_frequency() {
        assert!(matches!(
            RecordParser::new(0),
            Err(ForceError::InvalidArgument(_))
        ));
    }
}
