use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrendError};

/// Default trailing window, in days, of the weekly moving average.
pub const DEFAULT_WEEKLY_WINDOW: usize = 7;
/// Longest accepted weekly window, in days.
pub const MAX_WEEKLY_WINDOW: usize = 31;
/// Default minimum number of days with data for a weekly value to be emitted.
pub const DEFAULT_WEEKLY_MIN_PERIODS: usize = 1;
/// Default Tukey fence multiplier applied to the IQR.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
/// Default number of samples drawn from each fitted curve.
pub const DEFAULT_SAMPLE_COUNT: usize = 500;

/// A single glucose measurement as it came out of the export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Local wall-clock time of the measurement.
    pub timestamp: NaiveDateTime,
    /// Concentration in mg/dL, or `None` when the row held no measurement.
    pub value: Option<f64>,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

// ── TimeSeries ────────────────────────────────────────────────────────────────

/// Readings ordered by strictly increasing timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    readings: Vec<Reading>,
}

impl TimeSeries {
    /// Wrap `readings`, rejecting any that are not strictly increasing.
    pub fn new(readings: Vec<Reading>) -> Result<Self> {
        if let Some(pos) = readings
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(TrendError::UnorderedSeries { index: pos + 1 });
        }
        Ok(Self { readings })
    }

    /// Sort `readings` and merge duplicate timestamps.
    ///
    /// When several readings share a timestamp the first one carrying a value
    /// wins, so a blank row never shadows a real measurement.
    pub fn from_unsorted(mut readings: Vec<Reading>) -> Self {
        readings.sort_by_key(|r| r.timestamp);

        let mut merged: Vec<Reading> = Vec::with_capacity(readings.len());
        for reading in readings {
            match merged.last_mut() {
                Some(last) if last.timestamp == reading.timestamp => {
                    if last.value.is_none() {
                        last.value = reading.value;
                    }
                }
                _ => merged.push(reading),
            }
        }

        Self { readings: merged }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// All values that are present, in timestamp order.
    pub fn present_values(&self) -> Vec<f64> {
        self.readings.iter().filter_map(|r| r.value).collect()
    }

    /// Number of readings that carry a value.
    pub fn present_count(&self) -> usize {
        self.readings.iter().filter(|r| r.has_value()).count()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.first().map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.last().map(|r| r.timestamp)
    }

    /// Build a new series holding only the readings for which `keep` is true.
    ///
    /// A subsequence of an ordered series is itself ordered, so no validation
    /// is needed.
    pub fn retain_where(&self, keep: impl Fn(&Reading) -> bool) -> TimeSeries {
        TimeSeries {
            readings: self.readings.iter().filter(|r| keep(r)).copied().collect(),
        }
    }
}

// ── AggregatedSeries ──────────────────────────────────────────────────────────

/// The regular grid an [`AggregatedSeries`] is laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grid {
    /// One point per calendar day.
    Day,
    /// One point per calendar month, labelled with the month's last day.
    Month,
}

/// One grid slot of an aggregated series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    /// `None` marks a grid slot without data.
    pub value: Option<f64>,
}

/// A series resampled onto a regular calendar grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    pub grid: Grid,
    pub points: Vec<SeriesPoint>,
}

impl AggregatedSeries {
    pub fn new(grid: Grid, points: Vec<SeriesPoint>) -> Self {
        Self { grid, points }
    }

    pub fn empty(grid: Grid) -> Self {
        Self::new(grid, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of grid slots that carry a value.
    pub fn present_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    /// `(date, value)` pairs for slots that carry a value.
    pub fn present_points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|p| p.value.map(|v| (p.date, v)))
    }

    /// Value stored for `date`, if the slot exists and carries one.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .and_then(|i| self.points[i].value)
    }

    /// View the grid as a plain time series stamped at midnight of each slot.
    pub fn to_time_series(&self) -> TimeSeries {
        TimeSeries {
            readings: self
                .points
                .iter()
                .map(|p| Reading::new(p.date.and_time(chrono::NaiveTime::MIN), p.value))
                .collect(),
        }
    }
}

// ── SmoothCurve ───────────────────────────────────────────────────────────────

/// Which aggregation level a smooth curve was fitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    Weekly,
    Monthly,
}

impl std::fmt::Display for CurveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveKind::Weekly => write!(f, "weekly"),
            CurveKind::Monthly => write!(f, "monthly"),
        }
    }
}

/// One evaluated point of a smooth curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// A densely sampled trend curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothCurve {
    pub kind: CurveKind,
    pub samples: Vec<CurveSample>,
}

impl SmoothCurve {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// `(min, max)` of the sampled values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.samples.iter().map(|s| s.value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

// ── Notices ───────────────────────────────────────────────────────────────────

/// Pipeline step a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Daily,
    WeeklyCurve,
    MonthlyCurve,
}

/// A non-fatal degradation recorded while running the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineNotice {
    /// A step had fewer usable points than it needs; its output is absent.
    InsufficientData { stage: Stage, points: usize },
    /// Q1 equals Q3, so the outlier bounds collapsed onto a single value.
    DegenerateDistribution { value: f64 },
}

// ── TrendConfig ───────────────────────────────────────────────────────────────

/// Tunables of the trend pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Trailing window of the weekly moving average, in days.
    pub weekly_window: usize,
    /// Days with data required inside the window before a value is emitted.
    pub weekly_min_periods: usize,
    /// Multiplier applied to the IQR when building outlier bounds.
    pub iqr_multiplier: f64,
    /// Samples drawn from each smooth curve.
    pub sample_count: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            weekly_window: DEFAULT_WEEKLY_WINDOW,
            weekly_min_periods: DEFAULT_WEEKLY_MIN_PERIODS,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }
}

impl TrendConfig {
    /// The stricter variant that only emits weekly values for full windows.
    pub fn strict_weekly() -> Self {
        Self {
            weekly_min_periods: DEFAULT_WEEKLY_WINDOW,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.weekly_window == 0 || self.weekly_window > MAX_WEEKLY_WINDOW {
            return Err(TrendError::Config(format!(
                "weekly window must be between 1 and {MAX_WEEKLY_WINDOW} days"
            )));
        }
        if self.weekly_min_periods == 0 || self.weekly_min_periods > self.weekly_window {
            return Err(TrendError::Config(format!(
                "weekly min periods must be between 1 and {}",
                self.weekly_window
            )));
        }
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(TrendError::Config(
                "IQR multiplier must be a non-negative number".to_string(),
            ));
        }
        if self.sample_count < 2 {
            return Err(TrendError::Config(
                "curve sample count must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
