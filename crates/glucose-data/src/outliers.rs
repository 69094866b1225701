//! IQR-based outlier rejection.

use glucose_core::models::TimeSeries;
use glucose_core::stats::Quartiles;
use serde::Serialize;
use tracing::debug;

/// Result of one outlier-filter pass.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Readings that survived, plus every absent reading.
    pub series: TimeSeries,
    /// Bounds applied, or `None` when quartiles could not be computed.
    pub bounds: Option<OutlierBounds>,
    /// Number of readings dropped.
    pub removed: usize,
    /// Q1 equals Q3, so the bounds collapsed onto a single value.
    pub degenerate: bool,
}

/// Inclusive acceptance interval computed from the filter's input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Drop readings outside `[Q1 - k·IQR, Q3 + k·IQR]`.
///
/// Absent readings are never treated as outliers. When no value is present
/// the input is returned unchanged.
pub fn filter_outliers(series: &TimeSeries, multiplier: f64) -> FilterOutcome {
    let Some(quartiles) = Quartiles::from_values(&series.present_values()) else {
        return FilterOutcome {
            series: series.clone(),
            bounds: None,
            removed: 0,
            degenerate: false,
        };
    };

    let (lower, upper) = quartiles.fences(multiplier);
    let bounds = OutlierBounds { lower, upper };
    let kept = series.retain_where(|r| r.value.map_or(true, |v| bounds.contains(v)));
    let removed = series.len() - kept.len();

    debug!(
        "Outlier bounds [{:.1}, {:.1}] removed {} of {} points",
        lower,
        upper,
        removed,
        series.len()
    );

    FilterOutcome {
        series: kept,
        bounds: Some(bounds),
        removed,
        degenerate: quartiles.is_degenerate(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
