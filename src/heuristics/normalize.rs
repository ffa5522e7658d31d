// src/heuristics/normalize.rs

use once_cell::sync::Lazy;
use regex::Regex;
use time::{Date, Month, OffsetDateTime};

static DATE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-/\s]+").unwrap());

/// Currency symbols, the `Rs`/`INR` prefixes and the Indian `/-` suffix.
static CURRENCY_MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)₹|inr|rs\.?|/-").unwrap());

static PLAIN_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+(?:\.\d*)?|\.\d+)$").unwrap());

/// Round to paise.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a `D-M-Y` / `D/M/YY` / `D M Y` token into an ISO `YYYY-MM-DD` string.
///
/// Two-digit years below 50 land in the 2000s, the rest in the 1900s.
/// Calendar-invalid dates (`31-02-23`) are rejected along with out-of-range parts.
pub fn parse_date(token: &str) -> Option<String> {
    let parts: Vec<&str> = DATE_SEPARATORS
        .split(token.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }

    let day: u8 = parts[0].parse().ok()?;
    let month: u8 = parts[1].parse().ok()?;
    let mut year: i32 = parts[2].parse().ok()?;
    if year < 100 {
        year += if year < 50 { 2000 } else { 1900 };
    }

    if !(1..=31).contains(&day) || !(1..=12).contains(&month) || year < 1900 {
        return None;
    }

    let month = Month::try_from(month).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(format_iso(date))
}

pub fn format_iso(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// The processing date used when a receipt carries no readable bill date.
pub fn today_iso() -> String {
    format_iso(OffsetDateTime::now_utc().date())
}

/// Parse a decimal-point currency amount such as `₹339.50` or `Rs. 1,234.00`.
///
/// Returns 0 for anything that is not a plain amount once the currency
/// markers, thousands separators and whitespace are stripped.
pub fn parse_currency(token: &str) -> f64 {
    let stripped = CURRENCY_MARKERS.replace_all(token, "");
    let cleaned: String = stripped
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.trim_start_matches(':');

    if !PLAIN_AMOUNT.is_match(cleaned) {
        return 0.0;
    }
    cleaned
        .trim_end_matches('.')
        .parse::<f64>()
        .map(round2)
        .unwrap_or(0.0)
}

/// Decode an OCR-glued amount whose decimal point was lost: `237400` -> 2374.00.
///
/// Only an isolated six-digit run qualifies. Callers must only apply this where
/// the context says a price is expected, since ordinary 3-5 digit prices are
/// whole-rupee amounts.
pub fn parse_glued_amount(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.len() != 6 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<u32>().ok().map(|v| round2(v as f64 / 100.0))
}

/// Parse a numeric table cell (`25.00`, `1.000`, `17`).
pub fn parse_number(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_symbols() {
        assert_eq!(parse_currency("₹339.50"), 339.50);
        assert_eq!(parse_currency("Rs. 1,234.00"), 1234.00);
        assert_eq!(parse_currency("INR 99"), 99.0);
        assert_eq!(parse_currency("7607.05 /-"), 7607.05);
        assert_eq!(parse_currency("885.16"), 885.16);
        assert_eq!(parse_currency(":Rs.250"), 250.0);
    }

    #[test]
    fn test_parse_currency_leading_decimal_point() {
        assert_eq!(parse_currency("₹.50"), 0.50);
        assert_eq!(parse_currency("Rs. .75"), 0.75);
        assert_eq!(parse_currency("."), 0.0);
    }

    #[test]
    fn test_parse_currency_garbage_is_zero() {
        assert_eq!(parse_currency("garbage"), 0.0);
        assert_eq!(parse_currency(""), 0.0);
        assert_eq!(parse_currency("12.5.3"), 0.0);
    }

    #[test]
    fn test_parse_date_bounds() {
        assert_eq!(parse_date("31-12-23").as_deref(), Some("2023-12-31"));
        assert_eq!(parse_date("32-01-23"), None);
        assert_eq!(parse_date("15-13-23"), None);
        assert_eq!(parse_date("0-01-23"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("24/07/2023").as_deref(), Some("2023-07-24"));
        assert_eq!(parse_date("5 3 99").as_deref(), Some("1999-03-05"));
        assert_eq!(parse_date("01-01-49").as_deref(), Some("2049-01-01"));
        assert_eq!(parse_date("01-01-1850"), None);
        assert_eq!(parse_date("31-02-23"), None);
        assert_eq!(parse_date("12-2023"), None);
        assert_eq!(parse_date("aa-bb-cc"), None);
    }

    #[test]
    fn test_today_is_iso() {
        let today = today_iso();
        assert_eq!(today.len(), 10);
        assert!(parse_date(&today.split('-').rev().collect::<Vec<_>>().join("-")).is_some());
    }

    #[test]
    fn test_glued_amount_needs_six_digits() {
        assert_eq!(parse_glued_amount("237400"), Some(2374.00));
        assert_eq!(parse_glued_amount("9850"), None);
        assert_eq!(parse_glued_amount("23740a"), None);
        assert_eq!(parse_glued_amount("1234567"), None);
    }
}
