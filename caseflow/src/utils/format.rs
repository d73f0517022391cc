//! Number formatting for report display strings.

/// Formats a value rounded to whole units with `,` thousands separators.
///
/// ```
/// use caseflow::utils::format_thousands;
///
/// assert_eq!(format_thousands(600_000.0), "600,000");
/// assert_eq!(format_thousands(-1234.4), "-1,234");
/// ```
#[must_use]
pub fn format_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0.0 && grouped != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Formats an integer with `,` thousands separators.
#[must_use]
pub fn format_count(value: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let value = value as f64;
    format_thousands(value)
}

/// Formats a dollar amount, e.g. `$600,000`.
#[must_use]
pub fn format_currency(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", format_thousands(-value))
    } else {
        format!("${}", format_thousands(value))
    }
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(15_000.0), "15,000");
        assert_eq!(format_thousands(1_234_567.8), "1,234,568");
        assert_eq!(format_thousands(-0.2), "0");
    }

    #[test]
    fn test_format_currency_and_count() {
        assert_eq!(format_currency(600_000.0), "$600,000");
        assert_eq!(format_currency(-50.0), "-$50");
        assert_eq!(format_count(1000), "1,000");
    }

    #[test]
    fn test_round2() {
        assert!((round2(266.666_666) - 266.67).abs() < 1e-9);
        assert!((round2(4.5) - 4.5).abs() < 1e-9);
    }
}
