//! Main trend pipeline.
//!
//! Runs daily averaging, outlier rejection, weekly/monthly resampling and
//! spline smoothing, returning a [`TrendReport`] ready for output.

use std::path::{Path, PathBuf};

use chrono::Utc;
use glucose_core::error::{Result, TrendError};
use glucose_core::models::{
    AggregatedSeries, CurveKind, Grid, PipelineNotice, SeriesPoint, SmoothCurve, Stage,
    TimeSeries, TrendConfig,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::TrendAggregator;
use crate::outliers::{filter_outliers, OutlierBounds};
use crate::reader::{load_readings, ExportSchema, IngestStats, ReaderOptions};
use crate::smoother::smooth_curve;

// ── Public types ──────────────────────────────────────────────────────────────

/// Where the analysed readings came from.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub schema: ExportSchema,
    pub ingest: IngestStats,
}

/// Metadata produced alongside the trend series.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Readings handed to the pipeline.
    pub readings_processed: usize,
    /// Of those, readings carrying a value.
    pub readings_with_value: usize,
    /// Slots on the daily grid.
    pub days_covered: usize,
    /// Daily slots with a value after outlier rejection.
    pub days_with_data: usize,
    /// Daily means rejected as outliers.
    pub outliers_removed: usize,
    /// Outlier bounds, when they could be computed.
    pub outlier_bounds: Option<OutlierBounds>,
    pub config: TrendConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
}

/// The complete output of the trend pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    /// Daily means after outlier rejection; `None` marks days without data.
    pub daily: AggregatedSeries,
    /// Trailing weekly moving average on the daily grid.
    pub weekly: AggregatedSeries,
    /// Monthly means of the densified daily series.
    pub monthly: AggregatedSeries,
    pub weekly_curve: Option<SmoothCurve>,
    pub monthly_curve: Option<SmoothCurve>,
    /// Degradations met along the way.
    pub notices: Vec<PipelineNotice>,
    pub metadata: ReportMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the trend pipeline over an in-memory series.
///
/// 1. Average readings per calendar day.
/// 2. Reject daily means outside the IQR fences.
/// 3. Build the weekly moving average and the densified monthly means.
/// 4. Fit and sample a smooth curve for the weekly and monthly series.
///
/// Fails only on an invalid config or an empty series; every other shortfall
/// yields absent outputs and a [`PipelineNotice`].
pub fn analyze_series(series: &TimeSeries, config: &TrendConfig) -> Result<TrendReport> {
    config.validate()?;
    if series.is_empty() {
        return Err(TrendError::EmptyInput);
    }

    let mut notices: Vec<PipelineNotice> = Vec::new();

    // ── Step 1: Daily means ───────────────────────────────────────────────────
    let raw_daily = TrendAggregator::aggregate_daily(series);
    debug!(
        "Daily grid: {} days, {} with data",
        raw_daily.len(),
        raw_daily.present_count()
    );

    // ── Step 2: Outlier rejection ─────────────────────────────────────────────
    let filtered = filter_outliers(&raw_daily.to_time_series(), config.iqr_multiplier);
    if let Some(bounds) = filtered.bounds.filter(|_| filtered.degenerate) {
        notices.push(PipelineNotice::DegenerateDistribution {
            value: bounds.lower,
        });
    }
    let daily = regrid(&raw_daily, &TrendAggregator::aggregate_daily(&filtered.series));
    if daily.present_count() == 0 {
        notices.push(PipelineNotice::InsufficientData {
            stage: Stage::Daily,
            points: 0,
        });
    }

    // ── Step 3: Weekly and monthly series ─────────────────────────────────────
    let weekly = TrendAggregator::weekly_moving_average(
        &daily,
        config.weekly_window,
        config.weekly_min_periods,
    );
    let monthly = TrendAggregator::monthly_trend(&daily);

    // ── Step 4: Smooth curves ─────────────────────────────────────────────────
    let weekly_curve = smooth_curve(&weekly, CurveKind::Weekly, config.sample_count);
    if weekly_curve.is_none() {
        notices.push(PipelineNotice::InsufficientData {
            stage: Stage::WeeklyCurve,
            points: weekly.present_count(),
        });
    }
    let monthly_curve = smooth_curve(&monthly, CurveKind::Monthly, config.sample_count);
    if monthly_curve.is_none() {
        notices.push(PipelineNotice::InsufficientData {
            stage: Stage::MonthlyCurve,
            points: monthly.present_count(),
        });
    }

    for notice in &notices {
        warn!("Trend degraded: {:?}", notice);
    }

    let metadata = ReportMetadata {
        generated_at: Utc::now().to_rfc3339(),
        readings_processed: series.len(),
        readings_with_value: series.present_count(),
        days_covered: daily.len(),
        days_with_data: daily.present_count(),
        outliers_removed: filtered.removed,
        outlier_bounds: filtered.bounds,
        config: config.clone(),
        source: None,
    };

    info!(
        "Trends computed: {} days, {} weekly values, {} months, {} outliers removed",
        metadata.days_covered,
        weekly.present_count(),
        monthly.len(),
        metadata.outliers_removed
    );

    Ok(TrendReport {
        daily,
        weekly,
        monthly,
        weekly_curve,
        monthly_curve,
        notices,
        metadata,
    })
}

/// Load the export at `path` and run the pipeline over it.
pub fn analyze_export(
    path: &Path,
    options: &ReaderOptions,
    config: &TrendConfig,
) -> Result<TrendReport> {
    let ingest = load_readings(path, options)?;
    let mut report = analyze_series(&ingest.series, config)?;
    report.metadata.source = Some(SourceInfo {
        path: path.to_path_buf(),
        schema: ingest.schema,
        ingest: ingest.stats,
    });
    Ok(report)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Lay `values` onto the slots of `grid`; slots `values` lacks become `None`.
fn regrid(grid: &AggregatedSeries, values: &AggregatedSeries) -> AggregatedSeries {
    AggregatedSeries::new(
        Grid::Day,
        grid.points
            .iter()
            .map(|p| SeriesPoint {
                date: p.date,
                value: values.value_on(p.date),
            })
            .collect(),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
