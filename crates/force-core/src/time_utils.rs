use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use tracing::warn;

/// Date column format of raw records.
pub const RECORD_DATE_FORMAT: &str = "%d/%m/%Y";
/// Time column format of raw records.
pub const RECORD_TIME_FORMAT: &str = "%H:%M:%S";
/// Timezone used when none is given.
pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";

const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ── Record timestamps ─────────────────────────────────────────────────────────

pub fn parse_record_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), RECORD_DATE_FORMAT).ok()
}

pub fn parse_record_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), RECORD_TIME_FORMAT).ok()
}

/// Offset of sub-second sample `fraction` when sampling at `frequency` Hz.
///
/// At the default 10 Hz this is `fraction` deciseconds. Computed in
/// nanoseconds so frequencies that do not divide 1000 stay distinct.
pub fn sub_second_offset(fraction: u32, frequency: u32) -> Duration {
    if frequency == 0 {
        return Duration::zero();
    }
    Duration::nanoseconds(i64::from(fraction) * NANOS_PER_SECOND / i64::from(frequency))
}

/// Combine a record's date, time and sample index into one timestamp.
pub fn compose_timestamp(
    date: NaiveDate,
    time: NaiveTime,
    fraction: u32,
    frequency: u32,
) -> NaiveDateTime {
    date.and_time(time) + sub_second_offset(fraction, frequency)
}

/// Inverse of [`compose_timestamp`]: `(date, whole-second time, fraction)`.
pub fn decompose_timestamp(ts: NaiveDateTime, frequency: u32) -> (NaiveDate, NaiveTime, u32) {
    let nanos = i64::from(ts.nanosecond());
    let whole = ts.time().with_nanosecond(0).unwrap_or_else(|| ts.time());
    // Round to the nearest sample: the offset was truncated when composed.
    let fraction = (nanos * i64::from(frequency) + NANOS_PER_SECOND / 2) / NANOS_PER_SECOND;
    (ts.date(), whole, fraction as u32)
}

// ── Output formatting ─────────────────────────────────────────────────────────

/// `YYYY-MM-DD` date column of the exported table.
pub fn format_date(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// `HH:MM:SS.d` time column of the exported table, truncated (not rounded)
/// to the decisecond.
pub fn format_heure(ts: NaiveDateTime) -> String {
    let full = ts.format("%H:%M:%S%.3f").to_string();
    full.chars().take(10).collect()
}

// ── Note timestamps ───────────────────────────────────────────────────────────

const NOTE_SECOND_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
];
const NOTE_MINUTE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%d/%m/%Y %H:%M"];

/// Parse a note boundary together with the span its written precision covers:
/// a minute, a second, or nothing when fractional seconds are given.
fn parse_note_period(s: &str) -> Option<(NaiveDateTime, Duration)> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(ts) = NOTE_SECOND_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        let span = if s.contains('.') {
            Duration::zero()
        } else {
            Duration::seconds(1)
        };
        return Some((ts, span));
    }
    NOTE_MINUTE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ts| (ts, Duration::minutes(1)))
}

/// Parse a note start. Accepts ISO-like and device (`DD/MM/YYYY`) layouts,
/// with or without fractional seconds.
pub fn parse_note_timestamp(s: &str) -> Option<NaiveDateTime> {
    parse_note_period(s).map(|(ts, _)| ts)
}

/// Parse a note end as the last instant of the period it names: `10:00:00`
/// covers the whole second, `10:00` the whole minute.
pub fn parse_note_end(s: &str) -> Option<NaiveDateTime> {
    parse_note_period(s).map(|(ts, span)| {
        if span == Duration::zero() {
            ts
        } else {
            ts + span - Duration::nanoseconds(1)
        }
    })
}

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Attaches the session's timezone to the device's naive wall-clock times.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the IANA timezone `tz_name`.
    ///
    /// `"auto"` resolves to the system timezone. An unknown name falls back to
    /// UTC and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let name = if tz_name.eq_ignore_ascii_case("auto") {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                name
            );
            Tz::UTC
        });
        Self { tz }
    }

    /// Validate that `tz_name` is `"auto"` or a recognised IANA identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.eq_ignore_ascii_case("auto") || tz_name.parse::<Tz>().is_ok()
    }

    /// Interpret a device wall-clock time in the handler's timezone.
    ///
    /// Ambiguous times (DST fall-back) take the earlier instant; times inside
    /// a DST gap are read as UTC.
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<Tz> {
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .unwrap_or_else(|| self.tz.from_utc_datetime(&naive))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
