//! Layout of the flattened readings inside a raw Datafficheur record.
//!
//! After the three header columns (line number, date, time) the device writes
//! `frequency` samples for sensor 1, then `frequency` samples for sensor 2,
//! and so on. Reading `x` therefore lives at sub-second index
//! `x % frequency` of sensor `x / frequency + 1`.

use crate::error::{ForceError, Result};
use crate::models::ColumnSlot;

/// Samples per second written by the device.
pub const DEFAULT_ACQUISITION_FREQUENCY: u32 = 10;

/// Header columns preceding the readings: line number, date, time.
pub const HEADER_COLUMNS: usize = 3;

/// Map reading index `index` to its `(fraction, sensor)` slot.
///
/// Fails with [`ForceError::InvalidArgument`] when `index` is negative or
/// `frequency` is not strictly positive.
pub fn column_slot(index: i64, frequency: i64) -> Result<ColumnSlot> {
    if index < 0 || frequency <= 0 {
        return Err(ForceError::InvalidArgument(format!(
            "column index must be >= 0 and acquisition frequency > 0 (got index {}, frequency {})",
            index, frequency
        )));
    }
    let fraction = u32::try_from(index % frequency)
        .map_err(|_| ForceError::InvalidArgument(format!("frequency {} too large", frequency)))?;
    let sensor = u32::try_from(index / frequency + 1)
        .map_err(|_| ForceError::InvalidArgument(format!("column index {} too large", index)))?;
    Ok(ColumnSlot { fraction, sensor })
}

/// Number of sensors encoded by `readings` flattened values.
///
/// Fails when the count is zero or not a whole number of seconds of samples.
pub fn sensor_count(readings: usize, frequency: u32) -> Result<u32> {
    if frequency == 0 {
        return Err(ForceError::InvalidArgument(
            "acquisition frequency must be > 0".to_string(),
        ));
    }
    let frequency = frequency as usize;
    if readings == 0 || readings % frequency != 0 {
        return Err(ForceError::InvalidArgument(format!(
            "{} readings is not a multiple of the acquisition frequency {}",
            readings, frequency
        )));
    }
    u32::try_from(readings / frequency)
        .map_err(|_| ForceError::InvalidArgument(format!("{} readings is too many", readings)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_column_slot_first_sensor() {
        let slot = column_slot(0, 10).unwrap();
        assert_eq!(slot, ColumnSlot { fraction: 0, sensor: 1 });
        let slot = column_slot(9, 10).unwrap();
        assert_eq!(slot, ColumnSlot { fraction: 9, sensor: 1 });
    }

    #[test]
    fn test_column_slot_second_sensor() {
        let slot = column_slot(10, 10).unwrap();
        assert_eq!(slot, ColumnSlot { fraction: 0, sensor: 2 });
        let slot = column_slot(17, 10).unwrap();
        assert_eq!(slot, ColumnSlot { fraction: 7, sensor: 2 });
    }

    #[test]
    fn test_column_slot_is_injective() {
        for sensors in 1..=4i64 {
            let slots: HashSet<ColumnSlot> = (0..10 * sensors)
                .map(|x| column_slot(x, 10).unwrap())
                .collect();
            assert_eq!(slots.len() as i64, 10 * sensors);
            assert!(slots.iter().all(|s| s.fraction < 10));
            assert!(slots.iter().all(|s| s.sensor >= 1 && s.sensor as i64 <= sensors));
        }
    }

    #[test]
    fn test_column_slot_other_frequency() {
        let slot = column_slot(7, 5).unwrap();
        assert_eq!(slot, ColumnSlot { fraction: 2, sensor: 2 });
    }

    #[test]
    fn test_column_slot_rejects_negative_index() {
        assert!(matches!(
            column_slot(-1, 10),
            Err(ForceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_column_slot_rejects_non_positive_frequency() {
        assert!(matches!(column_slot(5, 0), Err(ForceError::InvalidArgument(_))));
        assert!(matches!(column_slot(5, -10), Err(ForceError::InvalidArgument(_))));
    }

    #[test]
    fn test_sensor_count() {
        assert_eq!(sensor_count(20, 10).unwrap(), 2);
        assert_eq!(sensor_count(10, 10).unwrap(), 1);
        assert!(sensor_count(0, 10).is_err());
        assert!(sensor_count(15, 10).is_err());
        assert!(sensor_count(10, 0).is_err());
    }
}
