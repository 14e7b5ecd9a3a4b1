use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// 1-based sensor channel number as written by the device.
pub type SensorId = u32;

/// Position of one flattened reading inside a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnSlot {
    /// Sub-second sample index, `0..frequency`.
    pub fraction: u32,
    /// Sensor the reading belongs to.
    pub sensor: SensorId,
}

/// First level of a column label: a physical sensor or the synthetic total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    Sensor(SensorId),
    Total,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Sensor(id) => write!(f, "{}", id),
            Channel::Total => f.write_str("Total"),
        }
    }
}

/// Second level of a column label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    /// Raw force value in kgf.
    Efforts,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Efforts => f.write_str("Efforts"),
        }
    }
}

/// Two-level column key of an [`AggregatedTable`].
///
/// Ordering puts every sensor (ascending) before `Total`, which is the column
/// order of the exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnKey {
    pub channel: Channel,
    pub field: Field,
}

impl ColumnKey {
    pub fn sensor(id: SensorId) -> Self {
        Self {
            channel: Channel::Sensor(id),
            field: Field::Efforts,
        }
    }

    pub fn total() -> Self {
        Self {
            channel: Channel::Total,
            field: Field::Efforts,
        }
    }

    /// Short legend label used on charts (`"Capt 1"`, `"Tot"`).
    pub fn chart_label(&self) -> String {
        match self.channel {
            Channel::Sensor(id) => format!("Capt {}", id),
            Channel::Total => "Tot".to_string(),
        }
    }
}

/// Space-joined flat name, e.g. `"1 Efforts"` or `"Total Efforts"`.
impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.channel, self.field)
    }
}

/// All sensor readings sharing one reconstructed timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedRow {
    pub timestamp: NaiveDateTime,
    pub readings: BTreeMap<SensorId, f64>,
}

impl TimedRow {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            readings: BTreeMap::new(),
        }
    }
}

/// Pivoted content of one raw log file, in file order.
#[derive(Debug, Clone)]
pub struct FileTable {
    pub source: PathBuf,
    pub rows: Vec<TimedRow>,
}

impl FileTable {
    /// Sensors present in at least one row.
    pub fn sensors(&self) -> BTreeSet<SensorId> {
        self.rows
            .iter()
            .flat_map(|r| r.readings.keys().copied())
            .collect()
    }
}

/// Rows of every file, sorted by timestamp, one row per distinct timestamp.
#[derive(Debug, Clone, Default)]
pub struct MergedSeries {
    pub rows: Vec<TimedRow>,
    /// Rows discarded because their timestamp was already taken.
    pub duplicates_dropped: usize,
}

impl MergedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of the sensors seen in any row, ascending.
    pub fn sensors(&self) -> BTreeSet<SensorId> {
        self.rows
            .iter()
            .flat_map(|r| r.readings.keys().copied())
            .collect()
    }
}

/// Operator note labelling the inclusive range `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub action: String,
}

impl NoteInterval {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Terminal table handed to the exporter and the chart renderer.
#[derive(Debug, Clone, Default)]
pub struct AggregatedTable {
    /// Row index, strictly ascending.
    pub timestamps: Vec<NaiveDateTime>,
    /// One value per timestamp for every column; `None` when absent.
    pub columns: BTreeMap<ColumnKey, Vec<Option<f64>>>,
    /// Note labels, present once the table went through the annotator.
    pub actions: Option<Vec<Option<String>>>,
}

impl AggregatedTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Column keys in export order (sensors ascending, then `Total`).
    pub fn keys(&self) -> impl Iterator<Item = &ColumnKey> {
        self.columns.keys()
    }

    /// Sensor columns only.
    pub fn sensor_keys(&self) -> Vec<ColumnKey> {
        self.columns
            .keys()
            .filter(|k| matches!(k.channel, Channel::Sensor(_)))
            .copied()
            .collect()
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&[Option<f64>]> {
        self.columns.get(key).map(|v| v.as_slice())
    }

    /// Present values of `key`, skipping gaps.
    pub fn values(&self, key: &ColumnKey) -> Vec<f64> {
        self.column(key)
            .map(|c| c.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// `(timestamp, value)` pairs of `key`, skipping gaps.
    pub fn points(&self, key: &ColumnKey) -> Vec<(NaiveDateTime, f64)> {
        let Some(column) = self.column(key) else {
            return Vec::new();
        };
        self.timestamps
            .iter()
            .zip(column.iter())
            .filter_map(|(ts, v)| v.map(|v| (*ts, v)))
            .collect()
    }

    pub fn action_at(&self, row: usize) -> Option<&str> {
        self.actions
            .as_ref()
            .and_then(|a| a.get(row))
            .and_then(|a| a.as_deref())
    }

    pub fn is_annotated(&self) -> bool {
        self.actions.is_some()
    }
}

/// Descriptive statistics of one column, for display.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub key: ColumnKey,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(h, m, s, ms)
            .unwrap()
    }

    #[test]
    fn test_column_key_display() {
        assert_eq!(ColumnKey::sensor(1).to_string(), "1 Efforts");
        assert_eq!(ColumnKey::sensor(12).to_string(), "12 Efforts");
        assert_eq!(ColumnKey::total().to_string(), "Total Efforts");
    }

    #[test]
    fn test_column_key_order_puts_total_last() {
        let mut keys = vec![
            ColumnKey::total(),
            ColumnKey::sensor(3),
            ColumnKey::sensor(1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![ColumnKey::sensor(1), ColumnKey::sensor(3), ColumnKey::total()]
        );
    }

    #[test]
    fn test_chart_labels() {
        assert_eq!(ColumnKey::sensor(2).chart_label(), "Capt 2");
        assert_eq!(ColumnKey::total().chart_label(), "Tot");
    }

    #[test]
    fn test_note_interval_inclusive() {
        let note = NoteInterval {
            start: ts(10, 0, 0, 100),
            end: ts(10, 0, 0, 300),
            action: "tirage".to_string(),
        };
        assert!(!note.contains(ts(10, 0, 0, 0)));
        assert!(note.contains(ts(10, 0, 0, 100)));
        assert!(note.contains(ts(10, 0, 0, 300)));
        assert!(!note.contains(ts(10, 0, 0, 400)));
    }

    #[test]
    fn test_table_points_skip_gaps() {
        let mut table = AggregatedTable {
            timestamps: vec![ts(10, 0, 0, 0), ts(10, 0, 0, 100), ts(10, 0, 0, 200)],
            ..Default::default()
        };
        table
            .columns
            .insert(ColumnKey::sensor(1), vec![Some(1.0), None, Some(3.0)]);

        let points = table.points(&ColumnKey::sensor(1));
        assert_eq!(points, vec![(ts(10, 0, 0, 0), 1.0), (ts(10, 0, 0, 200), 3.0)]);
        assert_eq!(table.values(&ColumnKey::sensor(1)), vec![1.0, 3.0]);
        assert!(table.values(&ColumnKey::sensor(9)).is_empty());
    }

    #[test]
    fn test_merged_series_sensor_union() {
        let mut a = TimedRow::new(ts(10, 0, 0, 0));
        a.readings.insert(1, 1.0);
        let mut b = TimedRow::new(ts(10, 0, 0, 100));
        b.readings.insert(2, 2.0);
        b.readings.insert(3, 3.0);
        let merged = MergedSeries {
            rows: vec![a, b],
            duplicates_dropped: 0,
        };
        assert_eq!(merged.sensors().into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
