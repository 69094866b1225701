use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Result, TrendError};

/// Timestamp layout used by both supported exports (`05-01-2024 08:15`).
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Reject a strftime layout chrono cannot interpret.
pub fn check_timestamp_format(format: &str) -> Result<()> {
    let invalid = format.trim().is_empty()
        || StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    if invalid {
        return Err(TrendError::TimestampParse(format.to_string()));
    }
    Ok(())
}

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Parses export timestamps into local wall-clock time.
///
/// Timestamps without an offset are taken as-is. Timestamps carrying an
/// offset (Apple Health writes `2024-01-05 08:15:00 +0100`) are converted to
/// the handler's timezone first, so every reading lands on the calendar day
/// the user experienced it.
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler with the given IANA timezone name.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Expose the configured timezone.
    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }

    /// Parse `s`, trying `primary_format` before the built-in fallbacks.
    ///
    /// Returns `None` for empty strings or unrecognised formats.
    pub fn parse_timestamp(&self, s: &str, primary_format: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, primary_format) {
            return Some(naive);
        }

        // Offset-bearing layouts.
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&self.default_tz).naive_local());
        }
        const OFFSET_FMTS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"];
        for fmt in OFFSET_FMTS {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Some(dt.with_timezone(&self.default_tz).naive_local());
            }
        }

        // Naive layouts seen in exports and spreadsheets.
        const NAIVE_FMTS: &[&str] = &[
            "%d-%m-%Y %H:%M",
            "%d-%m-%Y %H:%M:%S",
            "%d.%m.%Y %H:%M",
            "%d.%m.%Y %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ];
        NAIVE_FMTS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }
}

// ── Calendar helpers ──────────────────────────────────────────────────────────

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}

/// `(year, month)` key of `date`.
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Milliseconds since the Unix epoch, treating `ts` as UTC wall time.
pub fn to_epoch_millis(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_millis()
}

/// Inverse of [`to_epoch_millis`].
pub fn from_epoch_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
