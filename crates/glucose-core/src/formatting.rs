use chrono::NaiveDate;

/// Fixed-point rendering with comma-grouped thousands.
///
/// Ties round away from zero.
///
/// ```
/// use glucose_core::formatting::format_number;
///
/// assert_eq!(format_number(104.25, 1), "104.3");
/// assert_eq!(format_number(12500.0, 0), "12,500");
/// assert_eq!(format_number(-0.04, 1), "0.0");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let scale = 10_f64.powi(decimals as i32);
    let rounded = (value.abs() * scale).round() / scale;
    let fixed = format!("{:.*}", decimals as usize, rounded);

    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + whole.len() / 3 + 1);
    if value < 0.0 && rounded != 0.0 {
        out.push('-');
    }
    out.push_str(&group_digits(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Row and reading counts, grouped like [`format_number`].
pub fn format_count(count: usize) -> String {
    group_digits(&count.to_string())
}

/// A glucose concentration in mg/dL, or `n/a` when absent.
///
/// ```
/// use glucose_core::formatting::format_glucose;
///
/// assert_eq!(format_glucose(Some(104.25)), "104.3 mg/dL");
/// assert_eq!(format_glucose(None), "n/a");
/// ```
pub fn format_glucose(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{} mg/dL", format_number(v, 1)),
        None => "n/a".to_string(),
    }
}

pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM` of the month `date` falls in.
pub fn format_month(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Share of `part` in `whole` as a percentage, rounded to `decimal_places`.
/// An empty `whole` yields `0.0`.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let scale = 10_f64.powi(decimal_places as i32);
    (part / whole * 100.0 * scale).round() / scale
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_small_values() {
        assert_eq!(format_number(0.0, 1), "0.0");
        assert_eq!(format_number(98.0, 1), "98.0");
        assert_eq!(format_number(7.0, 0), "7");
    }

    #[test]
    fn test_format_number_ties_round_away_from_zero() {
        assert_eq!(format_number(110.25, 1), "110.3");
        assert_eq!(format_number(0.5, 0), "1");
    }

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(1_000.0, 0), "1,000");
        assert_eq!(format_number(999.96, 1), "1,000.0");
        assert_eq!(format_number(2_345_678.9, 1), "2,345,678.9");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-12.34, 1), "-12.3");
        assert_eq!(format_number(-0.01, 1), "0.0");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(35_040), "35,040");
    }

    // ── format_glucose ───────────────────────────────────────────────────────

    #[test]
    fn test_format_glucose() {
        assert_eq!(format_glucose(Some(98.0)), "98.0 mg/dL");
        assert_eq!(format_glucose(Some(143.96)), "144.0 mg/dL");
        assert_eq!(format_glucose(None), "n/a");
    }

    // ── dates ────────────────────────────────────────────────────────────────

    #[test]
    fn test_format_day_and_month() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_day(date), "2024-03-07");
        assert_eq!(format_month(date), "2024-03");
    }

    // ── percentage ───────────────────────────────────────────────────────────

    #[test]
    fn test_percentage_coverage() {
        assert_eq!(percentage(118.0, 120.0, 1), 98.3);
        assert_eq!(percentage(30.0, 30.0, 1), 100.0);
    }

    #[test]
    fn test_percentage_of_nothing() {
        assert_eq!(percentage(0.0, 0.0, 1), 0.0);
    }
}
