//! Natural cubic spline interpolation.
//!
//! The spline passes through every control point and is continuous in value,
//! slope and curvature. Both ends use the natural boundary condition
//! (second derivative zero), which for two control points reduces to the
//! straight line between them.

/// A fitted natural cubic spline over strictly increasing knots.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivative at each knot.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline through `(x[i], y[i])`.
    ///
    /// Returns `None` when fewer than two points are given, the slices differ
    /// in length, any coordinate is not finite, or `x` is not strictly
    /// increasing.
    pub fn fit(x: &[f64], y: &[f64]) -> Option<Self> {
        let n = x.len();
        if n < 2 || y.len() != n {
            return None;
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return None;
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let mut m = vec![0.0; n];

        if n > 2 {
            // Tridiagonal system for the interior second derivatives,
            // solved with the Thomas algorithm.
            let interior = n - 2;
            let mut diag = Vec::with_capacity(interior);
            let mut upper = Vec::with_capacity(interior);
            let mut rhs = Vec::with_capacity(interior);
            for i in 1..n - 1 {
                diag.push(2.0 * (h[i - 1] + h[i]));
                upper.push(h[i]);
                rhs.push(6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]));
            }

            for k in 1..interior {
                // Sub-diagonal entry of row k is h[k] (the knot spacing left of knot k+1).
                let w = h[k] / diag[k - 1];
                diag[k] -= w * upper[k - 1];
                rhs[k] -= w * rhs[k - 1];
            }

            let mut solution = vec![0.0; interior];
            solution[interior - 1] = rhs[interior - 1] / diag[interior - 1];
            for k in (0..interior - 1).rev() {
                solution[k] = (rhs[k] - upper[k] * solution[k + 1]) / diag[k];
            }
            m[1..n - 1].copy_from_slice(&solution);
        }

        Some(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    /// `(min, max)` of the knot coordinates.
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn knot_count(&self) -> usize {
        self.x.len()
    }

    /// Evaluate the spline at `t`.
    ///
    /// Returns `None` outside the knot range; the spline never extrapolates.
    pub fn evaluate(&self, t: f64) -> Option<f64> {
        let (lo, hi) = self.domain();
        if !t.is_finite() || t < lo || t > hi {
            return None;
        }

        let last_segment = self.x.len() - 2;
        let i = self
            .x
            .partition_point(|&k| k <= t)
            .saturating_sub(1)
            .min(last_segment);

        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - t) / h;
        let b = (t - self.x[i]) / h;
        let curvature = ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / 6.0;
        Some(a * self.y[i] + b * self.y[i + 1] + curvature)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── fit ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_fit_requires_two_points() {
        assert!(CubicSpline::fit(&[], &[]).is_none());
        assert!(CubicSpline::fit(&[1.0], &[100.0]).is_none());
    }

    #[test]
    fn test_fit_rejects_mismatched_lengths() {
        assert!(CubicSpline::fit(&[0.0, 1.0], &[1.0]).is_none());
    }

    #[test]
    fn test_fit_rejects_unordered_knots() {
        assert!(CubicSpline::fit(&[0.0, 0.0], &[1.0, 2.0]).is_none());
        assert!(CubicSpline::fit(&[1.0, 0.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_fit_rejects_non_finite() {
        assert!(CubicSpline::fit(&[0.0, 1.0], &[1.0, f64::NAN]).is_none());
    }

    // ── evaluate ─────────────────────────────────────────────────────────────

    #[test]
    fn test_two_points_is_linear() {
        let spline = CubicSpline::fit(&[0.0, 10.0], &[100.0, 120.0]).unwrap();
        assert!((spline.evaluate(5.0).unwrap() - 110.0).abs() < 1e-9);
        assert!((spline.evaluate(2.5).unwrap() - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_passes_through_control_points() {
        let x = [0.0, 2_592_000_000.0, 5_270_400_000.0];
        let y = [90.0, 110.0, 100.0];
        let spline = CubicSpline::fit(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            let v = spline.evaluate(*xi).unwrap();
            assert!((v - yi).abs() < 1e-9, "s({xi}) = {v}, expected {yi}");
        }
    }

    #[test]
    fn test_no_extrapolation() {
        let spline = CubicSpline::fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 2.0]).unwrap();
        assert!(spline.evaluate(-0.001).is_none());
        assert!(spline.evaluate(2.001).is_none());
        assert!(spline.evaluate(f64::NAN).is_none());
        assert!(spline.evaluate(0.0).is_some());
        assert!(spline.evaluate(2.0).is_some());
    }

    #[test]
    fn test_natural_spline_known_value() {
        // Natural spline through (0,0), (1,1), (2,0): M1 = -3, so
        // s(0.5) = 0.5 + (0.125 - 0.5) * (-3) / 6 = 0.6875
        let spline = CubicSpline::fit(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]).unwrap();
        assert!((spline.evaluate(0.5).unwrap() - 0.6875).abs() < 1e-12);
        assert!((spline.evaluate(1.5).unwrap() - 0.6875).abs() < 1e-12);
    }

    #[test]
    fn test_reproduces_straight_line() {
        let x: Vec<f64> = (0..6).map(|i| i as f64 * 3.0).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let spline = CubicSpline::fit(&x, &y).unwrap();
        for t in [0.7, 4.2, 9.9, 14.5] {
            assert!((spline.evaluate(t).unwrap() - (2.0 * t + 1.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uneven_spacing_is_continuous_at_knots() {
        let x = [0.0, 1.0, 4.0, 5.0, 9.0];
        let y = [100.0, 140.0, 95.0, 120.0, 110.0];
        let spline = CubicSpline::fit(&x, &y).unwrap();
        for &k in &x[1..x.len() - 1] {
            let left = spline.evaluate(k - 1e-7).unwrap();
            let right = spline.evaluate(k + 1e-7).unwrap();
            assert!((left - right).abs() < 1e-4, "jump at {k}: {left} vs {right}");
        }
    }

    #[test]
    fn test_domain_and_knots() {
        let spline = CubicSpline::fit(&[3.0, 4.0, 8.0], &[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(spline.domain(), (3.0, 8.0));
        assert_eq!(spline.knot_count(), 3);
    }
}
