//! Date parsing for heterogeneous price files.
//!
//! Formats are tried in a fixed order; the first one that parses wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Primary formats, tried in order after the two-digit-year form.
const PRIMARY_FORMATS: [&str; 3] = ["%d-%b-%Y", "%b %d, %Y", "%Y-%m-%d"];

/// Generic fallback formats.
const FALLBACK_FORMATS: [&str; 4] = ["%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y", "%Y%m%d"];

/// Parse a date string, returning `None` when no known format matches.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = parse_two_digit_year(s) {
        return Some(date);
    }

    PRIMARY_FORMATS
        .iter()
        .chain(FALLBACK_FORMATS.iter())
        .find_map(|fmt| parse_full_year(s, fmt))
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// `%d-%b-%y`, e.g. `20-May-87`. Years 69..=99 map to 19xx, 00..=68 to 20xx.
fn parse_two_digit_year(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('-');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let yy: i32 = year.parse().ok()?;
    let full_year = if yy >= 69 { 1900 + yy } else { 2000 + yy };
    NaiveDate::parse_from_str(&format!("{day}-{month}-{full_year}"), "%d-%b-%Y").ok()
}

/// chrono's `%Y` accepts short years ("87" parses as year 87), so formats
/// with a four-digit year require one.
fn parse_full_year(s: &str, fmt: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(s, fmt).ok()?;
    (1000..=9999).contains(&chrono::Datelike::year(&date)).then_some(date)
}
