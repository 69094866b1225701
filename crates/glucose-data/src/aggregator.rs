//! Resampling of glucose readings onto daily, weekly and monthly grids.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use glucose_core::models::{AggregatedSeries, Grid, SeriesPoint, TimeSeries};
use glucose_core::stats::mean;
use glucose_core::time_utils::{month_end, month_key};

/// Stateless helper that resamples series onto calendar grids.
pub struct TrendAggregator;

impl TrendAggregator {
    /// Mean of each calendar day between the first and last reading.
    ///
    /// Days without any present value get a `None` slot, never a zero.
    pub fn aggregate_daily(series: &TimeSeries) -> AggregatedSeries {
        let (Some(first), Some(last)) = (series.first_timestamp(), series.last_timestamp()) else {
            return AggregatedSeries::empty(Grid::Day);
        };

        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for reading in series.readings() {
            if let Some(v) = reading.value {
                by_day.entry(reading.timestamp.date()).or_default().push(v);
            }
        }

        let points = first
            .date()
            .iter_days()
            .take_while(|d| *d <= last.date())
            .map(|date| SeriesPoint {
                date,
                value: by_day.get(&date).and_then(|values| mean(values)),
            })
            .collect();

        AggregatedSeries::new(Grid::Day, points)
    }

    /// Trailing moving average over `window` calendar days ending at each slot.
    ///
    /// A slot gets a value when at least `min_periods` days inside its window
    /// carry data; the window is never padded with days before the series
    /// start.
    pub fn weekly_moving_average(
        daily: &AggregatedSeries,
        window: usize,
        min_periods: usize,
    ) -> AggregatedSeries {
        // A span chrono cannot represent leaves the window unbounded.
        let span = i64::try_from(window.max(1))
            .ok()
            .and_then(Duration::try_days);
        let points = &daily.points;
        let mut left = 0;

        let averaged = points
            .iter()
            .enumerate()
            .map(|(k, point)| {
                if let Some(window_start) = span.and_then(|s| point.date.checked_sub_signed(s)) {
                    while left < k && points[left].date <= window_start {
                        left += 1;
                    }
                }
                let values: Vec<f64> = points[left..=k].iter().filter_map(|p| p.value).collect();
                let value = if values.len() >= min_periods.max(1) {
                    mean(&values)
                } else {
                    None
                };
                SeriesPoint {
                    date: point.date,
                    value,
                }
            })
            .collect();

        AggregatedSeries::new(Grid::Day, averaged)
    }

    /// Materialise every day between the first and last day with data,
    /// filling gaps by linear interpolation between the nearest present
    /// neighbours.
    ///
    /// Days outside that range are never produced.
    pub fn densify(daily: &AggregatedSeries) -> AggregatedSeries {
        let anchors: Vec<(NaiveDate, f64)> = daily.present_points().collect();
        let (Some(&(first, _)), Some(&(last, _))) = (anchors.first(), anchors.last()) else {
            return AggregatedSeries::empty(Grid::Day);
        };

        let mut next = 0;
        let points = first
            .iter_days()
            .take_while(|d| *d <= last)
            .map(|date| {
                while anchors[next].0 < date {
                    next += 1;
                }
                let (next_date, next_value) = anchors[next];
                let value = if next_date == date || next == 0 {
                    next_value
                } else {
                    let (prev_date, prev_value) = anchors[next - 1];
                    let span = (next_date - prev_date).num_days() as f64;
                    let offset = (date - prev_date).num_days() as f64;
                    prev_value + (next_value - prev_value) * offset / span
                };
                SeriesPoint {
                    date,
                    value: Some(value),
                }
            })
            .collect();

        AggregatedSeries::new(Grid::Day, points)
    }

    /// Mean per calendar month, labelled with the month's last day.
    pub fn aggregate_monthly(daily: &AggregatedSeries) -> AggregatedSeries {
        let mut by_month: BTreeMap<(i32, u32), (NaiveDate, Vec<f64>)> = BTreeMap::new();
        for (date, value) in daily.present_points() {
            by_month
                .entry(month_key(date))
                .or_insert_with(|| (month_end(date), Vec::new()))
                .1
                .push(value);
        }

        let points = by_month
            .into_values()
            .map(|(date, values)| SeriesPoint {
                date,
                value: mean(&values),
            })
            .collect();

        AggregatedSeries::new(Grid::Month, points)
    }

    /// Densify `daily`, then average it per calendar month.
    pub fn monthly_trend(daily: &AggregatedSeries) -> AggregatedSeries {
        Self::aggregate_monthly(&Self::densify(daily))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
