// src/coerce/mod.rs
//! Per-field-type cell coercion. Every function here is total: malformed
//! input yields `None`, never an error. Upstream data is known to be
//! inconsistent, so partial records are expected and valid.

use chrono::NaiveDate;

use crate::table::RawCell;

/// Integer coercion: `round(float(x))`. Non-numeric input yields `None`.
pub fn to_int(cell: &RawCell) -> Option<i64> {
    match cell {
        RawCell::Number(n) if n.is_finite() => Some(n.round() as i64),
        RawCell::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(|n| n.round() as i64)
        }
        _ => None,
    }
}

/// Decimal coercion with locale repair: currency symbols and spaces are
/// stripped, a comma decimal separator becomes a dot, and when several dots
/// remain all but the last are treated as thousands separators. The result
/// is rounded to 2 fractional digits; negative zero normalizes to zero.
pub fn to_decimal(cell: &RawCell) -> Option<f64> {
    let number = match cell {
        RawCell::Number(n) => *n,
        RawCell::Text(s) => parse_decimal_text(s)?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    let rounded = (number * 100.0).round() / 100.0;
    Some(if rounded == 0.0 { 0.0 } else { rounded })
}

fn parse_decimal_text(raw: &str) -> Option<f64> {
    let text = raw
        .replace('€', "")
        .replace("EUR", "")
        .replace(' ', "")
        .replace(',', ".");
    if text.is_empty() {
        return None;
    }
    let cleaned = if text.matches('.').count() > 1 {
        let (head, tail) = text.rsplit_once('.')?;
        format!("{}.{}", head.replace('.', ""), tail)
    } else {
        text
    };
    cleaned.parse::<f64>().ok()
}

/// Date coercion with day-before-month precedence. Native date cells pass
/// through; strings are tried against day-first formats before ISO.
pub fn to_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Date(dt) => Some(dt.date()),
        RawCell::Text(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    // ignore any trailing time component
    let date_part = text.split_whitespace().next()?;
    const DAY_FIRST: &[&str] = &["%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%d/%m/%y"];
    for format in DAY_FIRST {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
