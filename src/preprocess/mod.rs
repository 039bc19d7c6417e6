//! Normalization of raw (date, price) rows into an analysis-ready series.
//!
//! Rows that cannot be parsed are dropped and counted, never fatal on their
//! own. The clean series is sorted by date; when a date occurs more than
//! once the last occurrence in input order is kept.

mod dates;

pub use dates::parse_date;

use crate::core::{PricePoint, PriceSeries, ReturnSeries};
use crate::error::{RegimeError, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One unparsed input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservation {
    pub date: String,
    pub price: String,
}

impl RawObservation {
    pub fn new(date: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            price: price.into(),
        }
    }
}

/// Row accounting for one preprocessing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub bad_date: usize,
    pub bad_price: usize,
    pub duplicates_dropped: usize,
    pub rows_kept: usize,
}

impl CleaningReport {
    pub fn rows_dropped(&self) -> usize {
        self.bad_date + self.bad_price + self.duplicates_dropped
    }
}

/// Clean prices plus the returns derived from them.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub prices: PriceSeries,
    pub log_returns: ReturnSeries,
    pub simple_returns: ReturnSeries,
    pub cleaning: CleaningReport,
}

impl PreparedSeries {
    /// Derive returns from an already validated price series.
    pub fn from_prices(prices: PriceSeries) -> Self {
        let cleaning = CleaningReport {
            rows_read: prices.len(),
            rows_kept: prices.len(),
            ..Default::default()
        };
        Self {
            log_returns: prices.log_returns(),
            simple_returns: prices.simple_returns(),
            prices,
            cleaning,
        }
    }
}

/// Parse a price string: trimmed, thousands separators removed, finite and
/// strictly positive.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|&c| c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// Clean raw rows into a [`PreparedSeries`].
///
/// # Errors
/// `EmptySeries` when no row survives cleaning.
pub fn preprocess(rows: &[RawObservation]) -> Result<PreparedSeries> {
    let mut report = CleaningReport {
        rows_read: rows.len(),
        ..Default::default()
    };

    let mut parsed = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(date) = parse_date(&row.date) else {
            report.bad_date += 1;
            continue;
        };
        let Some(price) = parse_price(&row.price) else {
            report.bad_price += 1;
            continue;
        };
        parsed.push(PricePoint::new(date, price));
    }

    // Stable sort keeps input order within a date, so the last of each run wins.
    parsed.sort_by_key(|p| p.date);
    let mut points: Vec<PricePoint> = Vec::with_capacity(parsed.len());
    for point in parsed {
        match points.last_mut() {
            Some(last) if last.date == point.date => {
                *last = point;
                report.duplicates_dropped += 1;
            }
            _ => points.push(point),
        }
    }
    report.rows_kept = points.len();

    if report.bad_date > 0 || report.bad_price > 0 {
        warn!(
            bad_date = report.bad_date,
            bad_price = report.bad_price,
            "dropped unparseable price rows"
        );
    }
    if report.duplicates_dropped > 0 {
        warn!(
            duplicates = report.duplicates_dropped,
            "duplicate dates found; kept the last occurrence of each"
        );
    }

    if points.is_empty() {
        return Err(RegimeError::EmptySeries);
    }

    let prices = PriceSeries::new(points)?;
    info!(
        observations = prices.len(),
        start = %prices.start(),
        end = %prices.end(),
        "price series prepared"
    );

    Ok(PreparedSeries {
        log_returns: prices.log_returns(),
        simple_returns: prices.simple_returns(),
        prices,
        cleaning: report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn row(date: &str, price: &str) -> RawObservation {
        RawObservation::new(date, price)
    }

    #[test]
    fn parse_price_strips_separators() {
        assert_eq!(parse_price(" 1,234.5 "), Some(1234.5));
        assert_eq!(parse_price("0"), None);
        assert_eq!(parse_price("-3"), None);
        assert_eq!(parse_price("NaN"), None);
        assert_eq!(parse_price("inf"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn drops_and_counts_bad_rows() {
        let rows = vec![
            row("20-May-87", "18.63"),
            row("garbage", "18.45"),
            row("22-May-87", "n/a"),
            row("21-May-87", "18.45"),
        ];

        let prepared = preprocess(&rows).unwrap();

        assert_eq!(prepared.prices.len(), 2);
        assert_eq!(prepared.cleaning.bad_date, 1);
        assert_eq!(prepared.cleaning.bad_price, 1);
        assert_eq!(prepared.cleaning.rows_kept, 2);
        assert_eq!(prepared.cleaning.rows_dropped(), 2);
    }

    #[test]
    fn sorts_and_keeps_last_duplicate() {
        let rows = vec![
            row("2020-01-03", "30"),
            row("2020-01-01", "10"),
            row("2020-01-03", "33"),
            row("2020-01-02", "20"),
        ];

        let prepared = preprocess(&rows).unwrap();
        let prices = prepared.prices.prices();

        assert_eq!(prices, vec![10.0, 20.0, 33.0]);
        assert_eq!(prepared.cleaning.duplicates_dropped, 1);
        assert_eq!(
            prepared.prices.end(),
            NaiveDate::from_ymd_opt(2020, 1, 3).unwrap()
        );
    }

    #[test]
    fn returns_match_prices() {
        let rows = vec![
            row("2020-01-01", "100"),
            row("2020-01-02", "110"),
            row("2020-01-03", "121"),
        ];

        let prepared = preprocess(&rows).unwrap();

        assert_eq!(prepared.log_returns.len(), prepared.prices.len() - 1);
        assert_relative_eq!(prepared.simple_returns.values()[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(
            prepared.log_returns.values()[0],
            1.1_f64.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn all_bad_rows_is_empty_series() {
        let rows = vec![row("x", "1"), row("2020-01-01", "bad")];
        assert_eq!(preprocess(&rows).unwrap_err(), RegimeError::EmptySeries);
        assert_eq!(preprocess(&[]).unwrap_err(), RegimeError::EmptySeries);
    }
}
