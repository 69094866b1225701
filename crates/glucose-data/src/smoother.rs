//! Spline smoothing of aggregated series into dense display curves.

use glucose_core::models::{AggregatedSeries, CurveKind, CurveSample, SmoothCurve};
use glucose_core::spline::CubicSpline;
use glucose_core::time_utils::{from_epoch_millis, to_epoch_millis};
use tracing::debug;

/// Fit a natural cubic spline through the present points of `series` and
/// sample it `sample_count` times, evenly spaced over the same time span.
///
/// Returns `None` when fewer than two control points exist. Samples never
/// fall outside the first and last control point.
pub fn smooth_curve(
    series: &AggregatedSeries,
    kind: CurveKind,
    sample_count: usize,
) -> Option<SmoothCurve> {
    let (x, y): (Vec<f64>, Vec<f64>) = series
        .present_points()
        .map(|(date, value)| {
            let millis = to_epoch_millis(date.and_time(chrono::NaiveTime::MIN));
            (millis as f64, value)
        })
        .unzip();

    if x.len() < 2 {
        debug!("{} curve skipped: {} control point(s)", kind, x.len());
        return None;
    }

    let spline = CubicSpline::fit(&x, &y)?;
    let (lo, hi) = spline.domain();
    let (lo, hi) = (lo as i64, hi as i64);
    let n = sample_count.max(2);
    let step = (hi - lo) as f64 / (n - 1) as f64;

    let samples = (0..n)
        .map(|i| {
            let t = (lo + (step * i as f64).round() as i64).clamp(lo, hi);
            Some(CurveSample {
                timestamp: from_epoch_millis(t)?,
                value: spline.evaluate(t as f64)?,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    debug!(
        "{} curve: {} control points, {} samples",
        kind,
        spline.knot_count(),
        samples.len()
    );

    Some(SmoothCurve { kind, samples })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
