//! Price and return series.
//!
//! A [`PriceSeries`] is the validated output of preprocessing: strictly
//! increasing dates and finite positive prices. Returns are derived from it
//! and dated at the later price of each adjacent pair.

use crate::error::{RegimeError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Chronologically ordered price observations.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, checking ordering and price validity.
    ///
    /// # Errors
    /// `EmptySeries` for no points, `InvalidParameter` for non-increasing
    /// dates or non-positive / non-finite prices.
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(RegimeError::EmptySeries);
        }

        if let Some(bad) = points.iter().find(|p| !(p.price.is_finite() && p.price > 0.0)) {
            return Err(RegimeError::InvalidParameter(format!(
                "price on {} must be finite and positive, got {}",
                bad.date, bad.price
            )));
        }

        if let Some(w) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(RegimeError::InvalidParameter(format!(
                "dates must be strictly increasing: {} followed by {}",
                w[0].date, w[1].date
            )));
        }

        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// First date of the series.
    pub fn start(&self) -> NaiveDate {
        self.points[0].date
    }

    /// Last date of the series.
    pub fn end(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    /// Position of an exact trading date.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.points.binary_search_by_key(&date, |p| p.date).ok()
    }

    /// Observations with `start <= date <= end`; open bounds are unbounded.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> &[PricePoint] {
        let lo = start.map_or(0, |d| self.points.partition_point(|p| p.date < d));
        let hi = end.map_or(self.points.len(), |d| {
            self.points.partition_point(|p| p.date <= d)
        });
        if lo >= hi {
            &[]
        } else {
            &self.points[lo..hi]
        }
    }

    /// Log returns `ln(p[i] / p[i-1])`, one shorter than the series.
    pub fn log_returns(&self) -> ReturnSeries {
        self.derive_returns(|prev, cur| (cur / prev).ln())
    }

    /// Simple returns `p[i] / p[i-1] - 1`, one shorter than the series.
    pub fn simple_returns(&self) -> ReturnSeries {
        self.derive_returns(|prev, cur| cur / prev - 1.0)
    }

    fn derive_returns(&self, f: impl Fn(f64, f64) -> f64) -> ReturnSeries {
        let (dates, values) = self
            .points
            .windows(2)
            .map(|w| (w[1].date, f(w[0].price, w[1].price)))
            .unzip();
        ReturnSeries { dates, values }
    }
}

/// Immutable dated sequence of returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Build a return series from parallel vectors.
    ///
    /// # Errors
    /// `InvalidParameter` when lengths differ, dates are not strictly
    /// increasing or a value is not finite.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(RegimeError::InvalidParameter(format!(
                "{} dates for {} return values",
                dates.len(),
                values.len()
            )));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RegimeError::InvalidParameter(
                "return dates must be strictly increasing".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RegimeError::InvalidParameter(
                "return values must be finite".to_string(),
            ));
        }
        Ok(Self { dates, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    /// Date at `index`, or an `IndexOutOfBounds` error.
    pub fn try_date_at(&self, index: usize) -> Result<NaiveDate> {
        self.date_at(index).ok_or(RegimeError::IndexOutOfBounds {
            index,
            size: self.len(),
        })
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> PriceSeries {
        PriceSeries::new(vec![
            PricePoint::new(d(2020, 1, 1), 100.0),
            PricePoint::new(d(2020, 1, 2), 110.0),
            PricePoint::new(d(2020, 1, 3), 99.0),
            PricePoint::new(d(2020, 1, 6), 99.0),
        ])
        .unwrap()
    }

    #[test]
    fn returns_are_one_shorter_and_dated_at_later_price() {
        let series = sample();
        let returns = series.log_returns();

        assert_eq!(returns.len(), series.len() - 1);
        assert_eq!(returns.start(), Some(d(2020, 1, 2)));
        assert_eq!(returns.end(), Some(d(2020, 1, 6)));
        assert_relative_eq!(returns.values()[0], 1.1_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(returns.values()[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn simple_returns() {
        let returns = sample().simple_returns();
        assert_relative_eq!(returns.values()[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[1], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn single_point_has_no_returns() {
        let series = PriceSeries::new(vec![PricePoint::new(d(2020, 1, 1), 50.0)]).unwrap();
        let returns = series.log_returns();
        assert!(returns.is_empty());
        assert_eq!(returns.start(), None);
    }

    #[test]
    fn rejects_unordered_dates() {
        let result = PriceSeries::new(vec![
            PricePoint::new(d(2020, 1, 2), 1.0),
            PricePoint::new(d(2020, 1, 1), 1.0),
        ]);
        assert!(matches!(result, Err(RegimeError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_non_positive_price() {
        let result = PriceSeries::new(vec![PricePoint::new(d(2020, 1, 1), 0.0)]);
        assert!(matches!(result, Err(RegimeError::InvalidParameter(_))));
        assert_eq!(PriceSeries::new(vec![]), Err(RegimeError::EmptySeries));
    }

    #[test]
    fn position_and_between() {
        let series = sample();
        assert_eq!(series.position(d(2020, 1, 3)), Some(2));
        assert_eq!(series.position(d(2020, 1, 4)), None);

        let window = series.between(Some(d(2020, 1, 2)), Some(d(2020, 1, 4)));
        assert_eq!(window.len(), 2);
        assert_eq!(series.between(None, None).len(), 4);
        assert!(series.between(Some(d(2021, 1, 1)), None).is_empty());
    }

    #[test]
    fn return_series_validation() {
        assert!(ReturnSeries::new(vec![d(2020, 1, 1)], vec![]).is_err());
        assert!(ReturnSeries::new(vec![d(2020, 1, 1)], vec![f64::NAN]).is_err());
        let r = ReturnSeries::new(vec![d(2020, 1, 1)], vec![0.01]).unwrap();
        assert_eq!(
            r.try_date_at(3),
            Err(RegimeError::IndexOutOfBounds { index: 3, size: 1 })
        );
    }
}
