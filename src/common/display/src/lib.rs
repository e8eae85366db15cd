//! Display and formatting utilities for Tally.
//!
//! Provides number/currency formatting and plain-text tables for reports.

mod table;

pub use table::{Align, TextTable};

/// Format a value for display with optional truncation.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Keep the first `len` characters of an identifier.
///
/// Used to make opaque hash-like customer ids readable in rankings.
pub fn short_id(id: &str, len: usize) -> String {
    id.chars().take(len).collect()
}

/// Indent a multi-line string.
pub fn indent(s: &str, prefix: &str) -> String {
    s.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Group the integer part of a number with thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format an amount as `"<CODE> 1,234.56"`.
pub fn format_currency(value: f64, currency: &str) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{currency} {sign}{}.{:02}",
        group_thousands(cents / 100),
        cents % 100
    )
}
