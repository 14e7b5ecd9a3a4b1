//! Per-channel columns and the per-timestamp total.

use std::collections::BTreeMap;

use force_core::models::{AggregatedTable, ColumnKey, ColumnSummary, MergedSeries};
use force_core::stats;

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Stateless helper turning a merged series into an [`AggregatedTable`].
pub struct Aggregator;

impl Aggregator {
    /// Build one `(sensor, Efforts)` column per sensor seen anywhere in the
    /// series, plus `(Total, Efforts)`.
    ///
    /// A sensor without a value at some timestamp leaves a gap; the total at
    /// that timestamp sums only the sensors that are present, and is itself
    /// absent when no sensor is.
    pub fn aggregate(series: &MergedSeries) -> AggregatedTable {
        let sensors = series.sensors();
        let timestamps = series.rows.iter().map(|r| r.timestamp).collect();

        let mut columns: BTreeMap<ColumnKey, Vec<Option<f64>>> = sensors
            .iter()
            .map(|&id| {
                let values = series
                    .rows
                    .iter()
                    .map(|r| r.readings.get(&id).copied())
                    .collect();
                (ColumnKey::sensor(id), values)
            })
            .collect();

        let total: Vec<Option<f64>> = series
            .rows
            .iter()
            .map(|r| {
                if r.readings.is_empty() {
                    None
                } else {
                    Some(r.readings.values().sum::<f64>())
                }
            })
            .collect();
        columns.insert(ColumnKey::total(), total);

        AggregatedTable {
            timestamps,
            columns,
            actions: None,
        }
    }

    /// Descriptive statistics of every column, in column order.
    pub fn describe(table: &AggregatedTable) -> Vec<ColumnSummary> {
        table
            .keys()
            .map(|key| {
                let values = table.values(key);
                ColumnSummary {
                    key: *key,
                    count: values.len(),
                    mean: stats::mean(&values),
                    std: stats::sample_std(&values),
                    min: stats::min(&values),
                    max: stats::max(&values),
                }
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use force_core::models::TimedRow;

    fn ts(ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(10, 0, 0, ms)
            .unwrap()
    }

    fn row(ms: u32, readings: &[(u32, f64)]) -> TimedRow {
        let mut r = TimedRow::new(ts(ms));
        r.readings.extend(readings.iter().copied());
        r
    }

    fn series(rows: Vec<TimedRow>) -> MergedSeries {
        MergedSeries {
            rows,
            duplicates_dropped: 0,
        }
    }

    #[test]
    fn test_aggregate_two_sensors() {
        let table = Aggregator::aggregate(&series(vec![
            row(0, &[(1, 10.0), (2, 20.0)]),
            row(100, &[(1, 11.5), (2, 21.5)]),
        ]));

        let keys: Vec<String> = table.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["1 Efforts", "2 Efforts", "Total Efforts"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.column(&ColumnKey::total()).unwrap(),
            &[Some(30.0), Some(33.0)]
        );
        assert!(!table.is_annotated());
    }

    #[test]
    fn test_total_equals_sum_of_sensors() {
        let rows: Vec<TimedRow> = (0..10)
            .map(|i| {
                let v = i as f64 * 0.1;
                row(i * 100, &[(1, v), (2, 3.3 * v), (3, -v / 7.0)])
            })
            .collect();
        let table = Aggregator::aggregate(&series(rows));

        for i in 0..table.len() {
            let sum: f64 = table
                .sensor_keys()
                .iter()
                .filter_map(|k| table.column(k).unwrap()[i])
                .sum();
            let total = table.column(&ColumnKey::total()).unwrap()[i].unwrap();
            assert!((total - sum).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_sensor_excluded_from_total() {
        let table = Aggregator::aggregate(&series(vec![
            row(0, &[(1, 5.0)]),
            row(100, &[(1, 5.0), (2, 7.0)]),
        ]));

        assert_eq!(
            table.column(&ColumnKey::sensor(2)).unwrap(),
            &[None, Some(7.0)]
        );
        assert_eq!(
            table.column(&ColumnKey::total()).unwrap(),
            &[Some(5.0), Some(12.0)]
        );
    }

    #[test]
    fn test_row_without_readings_has_no_total() {
        let table = Aggregator::aggregate(&series(vec![row(0, &[]), row(100, &[(1, 1.0)])]));
        assert_eq!(
            table.column(&ColumnKey::total()).unwrap(),
            &[None, Some(1.0)]
        );
    }

    #[test]
    fn test_aggregate_many_sensors() {
        let readings: Vec<(u32, f64)> = (1..=5).map(|s| (s, s as f64)).collect();
        let table = Aggregator::aggregate(&series(vec![row(0, &readings)]));
        assert_eq!(table.sensor_keys().len(), 5);
        assert_eq!(table.column(&ColumnKey::total()).unwrap(), &[Some(15.0)]);
    }

    #[test]
    fn test_aggregate_empty_series() {
        let table = Aggregator::aggregate(&series(Vec::new()));
        assert!(table.is_empty());
        assert!(table.sensor_keys().is_empty());
        assert!(table.column(&ColumnKey::total()).unwrap().is_empty());
    }

    #[test]
    fn test_describe() {
        let table = Aggregator::aggregate(&series(vec![
            row(0, &[(1, 1.0), (2, 10.0)]),
            row(100, &[(1, 3.0)]),
        ]));
        let summary = Aggregator::describe(&table);

        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].key, ColumnKey::sensor(1));
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].mean, Some(2.0));
        assert!((summary[0].std.unwrap() - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert_eq!(summary[1].count, 1);
        assert!(summary[1].std.is_none());
        assert_eq!(summary[2].max, Some(11.0));
        assert_eq!(summary[2].min, Some(3.0));
    }
}
