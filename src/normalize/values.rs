//! Cell value parsers.
//!
//! Spreadsheet exports render the same value many ways: dates as
//! `2025-05-12`, `12/05/2025` or serial day numbers, money as `35`, `35,00` or
//! `R$ 1.234,50`. These functions accept the forms seen in practice and reject
//! everything else.

use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Day zero of spreadsheet serial dates (the 1900 date system).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Largest serial accepted (9999-12-31).
const MAX_SERIAL: i64 = 2_958_465;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parses a date cell.
///
/// # Example
///
/// ```
/// use vr_engine::normalize::parse_date;
/// use chrono::NaiveDate;
///
/// let may_12 = NaiveDate::from_ymd_opt(2025, 5, 12);
/// assert_eq!(parse_date("2025-05-12"), may_12);
/// assert_eq!(parse_date("12/05/2025"), may_12);
/// assert_eq!(parse_date("2025-05-12 00:00:00"), may_12);
/// assert_eq!(parse_date("45789"), may_12);
/// assert_eq!(parse_date("31/02/2025"), None);
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }

    parse_serial_date(raw)
}

fn parse_serial_date(raw: &str) -> Option<NaiveDate> {
    let days = match raw.split_once('.') {
        Some((int, frac)) if frac.bytes().all(|b| b.is_ascii_digit()) => int,
        Some(_) => return None,
        None => raw,
    };
    if days.is_empty() || !days.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let days: i64 = days.parse().ok()?;
    if !(1..=MAX_SERIAL).contains(&days) {
        return None;
    }

    let (y, m, d) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(days))
}

/// Normalizes Brazilian and plain decimal renderings to a `.`-decimal string.
fn normalize_decimal_text(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    }
}

/// Parses a monetary value with at most two decimal places.
///
/// The result always carries scale 2.
///
/// # Errors
///
/// Returns a description of the problem for non-numeric, negative or
/// over-precise values.
///
/// # Example
///
/// ```
/// use vr_engine::normalize::parse_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_money("35").unwrap().to_string(), "35.00");
/// assert_eq!(parse_money("R$ 1.234,50").unwrap(), Decimal::new(123450, 2));
/// assert!(parse_money("37.505").is_err());
/// ```
pub fn parse_money(raw: &str) -> Result<Decimal, String> {
    let text = normalize_decimal_text(raw);
    if text.is_empty() {
        return Err("empty value".to_string());
    }

    let value = Decimal::from_str(&text).map_err(|_| "not a number".to_string())?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err("negative value".to_string());
    }

    let mut value = value.normalize();
    if value.scale() > 2 {
        return Err("more than two decimal places".to_string());
    }
    value.rescale(2);
    Ok(value)
}

/// Parses a non-negative whole day count (`5`, `5.0`, `5,0`).
///
/// # Errors
///
/// Returns a description of the problem for fractions, negatives and text.
pub fn parse_day_count(raw: &str) -> Result<u32, String> {
    let text = normalize_decimal_text(raw);
    let value = Decimal::from_str(&text).map_err(|_| "not a number".to_string())?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err("negative day count".to_string());
    }
    if !value.fract().is_zero() {
        return Err("fractional day count".to_string());
    }
    value
        .to_u32()
        .ok_or_else(|| "day count out of range".to_string())
}

/// Parses a percentage as a fraction of one.
///
/// Accepts `0.8`, `0,80`, `80%` and `80`; values above one are read as
/// percent.
///
/// # Errors
///
/// Returns a description of the problem for text and values above 100.
pub fn parse_percentage(raw: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim();
    let (text, is_percent) = match trimmed.strip_suffix('%') {
        Some(rest) => (rest, true),
        None => (trimmed, false),
    };

    let value = Decimal::from_str(&normalize_decimal_text(text))
        .map_err(|_| "not a number".to_string())?;
    let hundred = Decimal::ONE_HUNDRED;

    let fraction = if is_percent || value > Decimal::ONE {
        value / hundred
    } else {
        value
    };
    if fraction > Decimal::ONE || (fraction.is_sign_negative() && !fraction.is_zero()) {
        return Err("percentage outside 0-100".to_string());
    }
    Ok(fraction.normalize())
}

/// Canonicalizes a union code.
///
/// Uppercases, collapses whitespace and keeps the part before the first
/// ` - ` separator, so the short code and the long descriptive name denote
/// the same union.
///
/// # Example
///
/// ```
/// use vr_engine::normalize::canonical_union_code;
///
/// assert_eq!(
///     canonical_union_code("SINDPD SP - SIND.TRAB.EM PROC DADOS").as_deref(),
///     Some("SINDPD SP")
/// );
/// assert_eq!(canonical_union_code("  sindpd   sp ").as_deref(), Some("SINDPD SP"));
/// assert_eq!(canonical_union_code("  "), None);
/// ```
pub fn canonical_union_code(raw: &str) -> Option<String> {
    let head = raw.split(" - ").next().unwrap_or_default();
    let code = head
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    if code.is_empty() { None } else { Some(code) }
}

/// Returns the trimmed cell text, or `None` when blank.
pub fn non_blank(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
