// ── Percentile helper ─────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using standard linear
/// interpolation (the same algorithm used by NumPy's `percentile` function).
///
/// Returns `0.0` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let len = sorted_data.len();
    if len == 1 {
        return sorted_data[0];
    }
    let rank = (p / 100.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted_data[lo];
    }
    let frac = rank - lo as f64;
    sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo])
}

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

// ── Quartiles ─────────────────────────────────────────────────────────────────

/// First and third quartile of a value distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub q3: f64,
}

impl Quartiles {
    /// Compute quartiles of `values` (any order).
    ///
    /// Returns `None` when no finite value is available.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            q1: percentile(&sorted, 25.0),
            q3: percentile(&sorted, 75.0),
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Tukey fences `[Q1 - k·IQR, Q3 + k·IQR]`.
    pub fn fences(&self, multiplier: f64) -> (f64, f64) {
        let spread = multiplier * self.iqr();
        (self.q1 - spread, self.q3 + spread)
    }

    /// Whether the bounds collapse onto a single value.
    pub fn is_degenerate(&self) -> bool {
        self.iqr() == 0.0
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── percentile ───────────────────────────────────────────────────────────

    #[test]
    fn test_percentile_empty_returns_zero() {
        assert_eq!(percentile(&[], 25.0), 0.0);
    }

    #[test]
    fn test_percentile_single_element() {
        assert_eq!(percentile(&[42.0], 25.0), 42.0);
        assert_eq!(percentile(&[42.0], 75.0), 42.0);
    }

    #[test]
    fn test_percentile_p50_even() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        // rank = 0.5 * 3 = 1.5 → interpolate between data[1]=2 and data[2]=3
        assert!((percentile(&data, 50.0) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_bounds() {
        let data = vec![10.0, 20.0, 30.0];
        assert!((percentile(&data, 0.0) - 10.0).abs() < 1e-9);
        assert!((percentile(&data, 100.0) - 30.0).abs() < 1e-9);
    }

    // ── mean ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[90.0, 110.0]), Some(100.0));
    }

    // ── Quartiles ────────────────────────────────────────────────────────────

    #[test]
    fn test_quartiles_linear_interpolation() {
        // 1..=8: ranks 1.75 and 5.25 interpolate to 2.75 and 6.25
        let values: Vec<f64> = (1..=8).map(|x| x as f64).collect();
        let q = Quartiles::from_values(&values).unwrap();
        assert!((q.q1 - 2.75).abs() < 1e-9, "q1 = {}", q.q1);
        assert!((q.q3 - 6.25).abs() < 1e-9, "q3 = {}", q.q3);
        assert!((q.iqr() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_quartiles_unsorted_input() {
        let q = Quartiles::from_values(&[8.0, 1.0, 5.0, 3.0, 7.0, 2.0, 6.0, 4.0]).unwrap();
        assert!((q.q1 - 2.75).abs() < 1e-9);
    }

    #[test]
    fn test_quartiles_empty_is_none() {
        assert!(Quartiles::from_values(&[]).is_none());
        assert!(Quartiles::from_values(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_fences() {
        let q = Quartiles { q1: 90.0, q3: 130.0 };
        let (lo, hi) = q.fences(1.5);
        assert!((lo - 30.0).abs() < 1e-9);
        assert!((hi - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_distribution() {
        let q = Quartiles::from_values(&[100.0; 10]).unwrap();
        assert!(q.is_degenerate());
        assert_eq!(q.fences(1.5), (100.0, 100.0));
    }
}
