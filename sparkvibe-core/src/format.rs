//! Display formatting for table cells and metric cards.
//!
//! Every formatter takes `Option<f64>` and renders missing or NaN input as
//! `"N/A"`.

use chrono::NaiveDate;

/// Decimal places used throughout the dashboard.
pub const DECIMAL_PRECISION: usize = 1;

pub const NOT_AVAILABLE: &str = "N/A";

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// `$X.XB` at or above one billion, `$X.XM` at or above one million,
/// otherwise `$1,234.5`.
pub fn format_currency(value: Option<f64>) -> String {
    let Some(v) = present(value) else {
        return NOT_AVAILABLE.to_string();
    };
    if v >= 1e9 {
        format!("${:.*}B", DECIMAL_PRECISION, v / 1e9)
    } else if v >= 1e6 {
        format!("${:.*}M", DECIMAL_PRECISION, v / 1e6)
    } else {
        format!("${}", with_thousands(v, DECIMAL_PRECISION))
    }
}

/// Volume in millions, `X.XM`.
pub fn format_volume(value: Option<f64>) -> String {
    match present(value) {
        Some(v) => format!("{:.*}M", DECIMAL_PRECISION, v / 1e6),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Price with a dollar sign, `$X.X`.
pub fn format_price(value: Option<f64>) -> String {
    match present(value) {
        Some(v) => format!("${:.*}", DECIMAL_PRECISION, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Signed percentage, `+X.X%` / `-X.X%`.
pub fn format_pct_change(value: Option<f64>) -> String {
    match present(value) {
        Some(v) if v >= 0.0 => format!("+{:.*}%", DECIMAL_PRECISION, v),
        Some(v) => format!("{:.*}%", DECIMAL_PRECISION, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Signed absolute change, `+X.X` / `-X.X`.
pub fn format_change(value: Option<f64>) -> String {
    match present(value) {
        Some(v) if v >= 0.0 => format!("+{:.*}", DECIMAL_PRECISION, v),
        Some(v) => format!("{:.*}", DECIMAL_PRECISION, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Plain ratio, `X.X`.
pub fn format_ratio(value: Option<f64>) -> String {
    match present(value) {
        Some(v) => format!("{:.*}", DECIMAL_PRECISION, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Multiplier, `X.Xx`.
pub fn format_multiple(value: Option<f64>) -> String {
    match present(value) {
        Some(v) => format!("{:.*}x", DECIMAL_PRECISION, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `YYYY-MM-DD`.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Fixed-point number with comma thousands separators.
fn with_thousands(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
