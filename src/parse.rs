//! Field parsers: normalize raw cells into typed values.
//!
//! None of these functions fail. Unparseable input degrades to "no date",
//! a zero amount or an empty string, and the rules treat those as
//! non-triggering.

use crate::amount::Amount;
use crate::cell::CellValue;
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Numbers and four-digit strings in this range are bare fiscal years.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Text date layouts, tried in order: chrono format, separator and the
/// position of the year group. The first match wins.
const DATE_FORMATS: [(&str, char, usize); 3] = [
    ("%d/%m/%Y", '/', 2),
    ("%Y-%m-%d", '-', 0),
    ("%d-%m-%Y", '-', 2),
];

/// Currency marker stripped from amount strings.
const CURRENCY_MARKER: &str = "R$";

/// Day zero of the 1900 spreadsheet date system. Starting on Dec 30
/// absorbs the phantom 1900-02-29, so serials from March 1900 on are exact.
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Parses a due-date cell.
///
/// Accepts native dates, bare years (number or four-digit string),
/// spreadsheet serial numbers and the `DD/MM/YYYY`, `YYYY-MM-DD`,
/// `DD-MM-YYYY` text layouts.
pub fn parse_date(raw: &CellValue) -> Option<NaiveDate> {
    match raw {
        CellValue::Empty => None,
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => parse_date_number(*n),
        CellValue::Text(s) => parse_date_text(s),
    }
}

fn parse_date_number(n: f64) -> Option<NaiveDate> {
    if !n.is_finite() {
        return None;
    }
    let whole = n.trunc();
    if whole >= f64::from(*YEAR_RANGE.start()) && whole <= f64::from(*YEAR_RANGE.end()) {
        return NaiveDate::from_ymd_opt(whole as i32, 1, 1);
    }
    date_from_serial(whole)
}

/// Converts a 1900-system spreadsheet serial to a date, dropping the time
/// of day. Serials before the epoch or past year 9999 yield `None`.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    let whole = serial.trunc();
    if !(0.0..=2_958_465.0).contains(&whole) {
        return None;
    }
    serial_epoch()?.checked_add_signed(Duration::days(whole as i64))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(year) = s.parse::<i32>() {
            if YEAR_RANGE.contains(&year) {
                return NaiveDate::from_ymd_opt(year, 1, 1);
            }
        }
    }

    DATE_FORMATS
        .iter()
        .filter(|(_, sep, year_idx)| has_four_digit_year(s, *sep, *year_idx))
        .find_map(|(fmt, _, _)| NaiveDate::parse_from_str(s, fmt).ok())
}

/// chrono's `%Y` takes any digit count, so "31/01/20" would be year 20.
fn has_four_digit_year(s: &str, sep: char, year_idx: usize) -> bool {
    let groups: Vec<&str> = s.split(sep).collect();
    groups.len() == 3
        && groups[year_idx].len() == 4
        && groups[year_idx].bytes().all(|b| b.is_ascii_digit())
}

/// Parses an amount cell, returning zero for anything unparseable.
///
/// Strings follow the Brazilian convention: when both `,` and `.` appear,
/// `.` groups thousands and `,` is the decimal mark; a lone `,` is the
/// decimal mark. Malformed amounts silently become zero.
pub fn parse_amount(raw: &CellValue) -> Amount {
    match raw {
        CellValue::Number(n) => Amount::from_f64(*n),
        CellValue::Text(s) => parse_amount_text(s).unwrap_or(Amount::ZERO),
        CellValue::Empty | CellValue::Date(_) => Amount::ZERO,
    }
}

fn parse_amount_text(s: &str) -> Option<Amount> {
    let s = s.trim();
    let s = s.strip_prefix(CURRENCY_MARKER).unwrap_or(s);
    let mut cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }

    if cleaned.contains(',') && cleaned.contains('.') {
        cleaned = cleaned.replace('.', "").replace(',', ".");
    } else if cleaned.contains(',') {
        cleaned = cleaned.replace(',', ".");
    }

    match Decimal::from_str(&cleaned) {
        Ok(d) => Some(Amount::new(d)),
        // Exponent notation ("1.5e3") is not accepted by Decimal::from_str.
        Err(_) => cleaned
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Amount::from_f64),
    }
}

/// Taxpayer name: trimmed and uppercased.
pub fn normalize_name(raw: &CellValue) -> String {
    raw.to_string().trim().to_uppercase()
}

/// Tribute type: uppercased for case-insensitive equality.
pub fn normalize_tribute(raw: &CellValue) -> String {
    raw.to_string().to_uppercase()
}

/// Keeps only the ASCII digits of a CPF/CNPJ cell.
pub fn digits_only(raw: &CellValue) -> String {
    raw.to_string().chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Fiscal year of a `tax_year` cell, if it holds a plausible year.
pub fn parse_year(raw: &CellValue) -> Option<i32> {
    match raw {
        CellValue::Date(d) => Some(d.year()),
        CellValue::Empty => None,
        other => {
            let text = other.to_string();
            let year = text.trim().parse::<i32>().ok()?;
            YEAR_RANGE.contains(&year).then_some(year)
        }
    }
}
