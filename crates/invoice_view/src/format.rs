//! Display formatters for the invoice sheet
//!
//! Plain helpers, not a locale engine: `.` groups thousands and `,` marks
//! decimals.

use chrono::{DateTime, NaiveDate};

/// Group the digits of `n` in threes with `.`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `120000` -> `$120.000`. Amounts are rounded to whole units; non-finite
/// input renders as `$0`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        tracing::warn!("format_currency received non-finite amount {}", amount);
        return "$0".to_string();
    }
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("${}{}", sign, group_thousands(rounded.abs() as u64))
}

/// Quantity with exactly one decimal, e.g. `1,5` or `1.200,0`
pub fn format_quantity(quantity: f64) -> String {
    if !quantity.is_finite() {
        return "0,0".to_string();
    }
    let tenths = (quantity.abs() * 10.0).round() as u64;
    let sign = if quantity < 0.0 && tenths > 0 { "-" } else { "" };
    format!("{}{},{}", sign, group_thousands(tenths / 10), tenths % 10)
}

/// `2025-11-20` -> `20/11/2025`.
///
/// RFC 3339 timestamps are accepted too. Anything unparseable is returned
/// unchanged, and an empty date renders as `N/A`.
pub fn format_date(date: &str) -> String {
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return "N/A".to_string();
    }
    let parsed = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|d| d.date_naive()));
    match parsed {
        Some(day) => day.format("%d/%m/%Y").to_string(),
        None => date.to_string(),
    }
}
