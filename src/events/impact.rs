//! Short-horizon price reaction around catalog events.
//!
//! For an event dated on a trading day, the mean price over the
//! `pre_window` observations before it is compared with the mean over the
//! `post_window` observations starting at it.

use crate::core::{Event, EventCategory, ImpactDirection, PriceSeries};
use crate::error::{RegimeError, Result};
use crate::utils::{mean, nan_as_null, std_dev};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings of [`event_impacts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    /// Observations averaged before the event.
    pub pre_window: usize,
    /// Observations averaged from the event onward.
    pub post_window: usize,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            pre_window: 5,
            post_window: 5,
        }
    }
}

impl ImpactConfig {
    pub fn windows(mut self, pre: usize, post: usize) -> Self {
        self.pre_window = pre;
        self.post_window = post;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.pre_window == 0 || self.post_window == 0 {
            return Err(RegimeError::InvalidParameter(format!(
                "impact windows must be at least 1, got pre {} post {}",
                self.pre_window, self.post_window
            )));
        }
        Ok(())
    }
}

/// Measured reaction to one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventImpact {
    pub date: NaiveDate,
    pub description: String,
    pub category: EventCategory,
    pub expected_direction: ImpactDirection,
    pub pre_mean_price: f64,
    pub post_mean_price: f64,
    /// `(post - pre) / pre * 100`.
    pub impact_pct: f64,
}

/// Mean reaction of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryImpact {
    pub category: EventCategory,
    pub count: usize,
    pub mean_impact_pct: f64,
}

/// All measurable impacts and their summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub impacts: Vec<EventImpact>,
    pub count: usize,
    #[serde(with = "nan_as_null")]
    pub mean_impact_pct: f64,
    #[serde(with = "nan_as_null")]
    pub std_impact_pct: f64,
    /// Categories in order of first appearance among the impacts.
    pub by_category: Vec<CategoryImpact>,
}

/// Measure the price reaction to every event that has full windows.
///
/// Events off the trading calendar or too close to either end of the series
/// are skipped.
pub fn event_impacts(prices: &PriceSeries, catalog: &[Event], config: &ImpactConfig) -> Result<ImpactSummary> {
    config.validate()?;
    let points = prices.points();

    let impacts: Vec<EventImpact> = catalog
        .iter()
        .filter_map(|event| {
            let at = prices.position(event.date)?;
            if at < config.pre_window || at + config.post_window > points.len() {
                debug!(date = %event.date, "event lacks a full impact window");
                return None;
            }
            let pre: Vec<f64> = points[at - config.pre_window..at].iter().map(|p| p.price).collect();
            let post: Vec<f64> = points[at..at + config.post_window].iter().map(|p| p.price).collect();
            let (pre_mean, post_mean) = (mean(&pre), mean(&post));
            Some(EventImpact {
                date: event.date,
                description: event.description.clone(),
                category: event.category.clone(),
                expected_direction: event.impact_direction,
                pre_mean_price: pre_mean,
                post_mean_price: post_mean,
                impact_pct: (post_mean - pre_mean) / pre_mean * 100.0,
            })
        })
        .collect();

    let mut by_category: Vec<CategoryImpact> = Vec::new();
    for impact in &impacts {
        if by_category.iter().any(|c| c.category == impact.category) {
            continue;
        }
        let values: Vec<f64> = impacts
            .iter()
            .filter(|i| i.category == impact.category)
            .map(|i| i.impact_pct)
            .collect();
        by_category.push(CategoryImpact {
            category: impact.category.clone(),
            count: values.len(),
            mean_impact_pct: mean(&values),
        });
    }

    let pct: Vec<f64> = impacts.iter().map(|i| i.impact_pct).collect();
    Ok(ImpactSummary {
        count: impacts.len(),
        mean_impact_pct: mean(&pct),
        std_impact_pct: std_dev(&pct),
        by_category,
        impacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PricePoint;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn prices(values: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(start + Duration::days(i as i64), p))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 1, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn measures_step_in_price() {
        let mut values = vec![50.0; 10];
        values.extend(vec![60.0; 10]);
        let series = prices(&values);
        let catalog = vec![Event::new(day(10), EventCategory::OpecPolicy, "cut")];

        let summary = event_impacts(&series, &catalog, &ImpactConfig::default()).unwrap();
        assert_eq!(summary.count, 1);
        assert_relative_eq!(summary.impacts[0].pre_mean_price, 50.0);
        assert_relative_eq!(summary.impacts[0].post_mean_price, 60.0);
        assert_relative_eq!(summary.impacts[0].impact_pct, 20.0, epsilon = 1e-12);
        assert!(summary.std_impact_pct.is_nan());
    }

    #[test]
    fn skips_events_without_full_windows() {
        let series = prices(&[10.0; 12]);
        let catalog = vec![
            Event::new(day(4), EventCategory::Economic, "too early"),
            Event::new(day(5), EventCategory::Economic, "first usable"),
            Event::new(day(7), EventCategory::Economic, "last usable"),
            Event::new(day(8), EventCategory::Economic, "too late"),
            Event::new(day(100), EventCategory::Economic, "off calendar"),
        ];
        let summary = event_impacts(&series, &catalog, &ImpactConfig::default()).unwrap();
        let kept: Vec<&str> = summary.impacts.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(kept, vec!["first usable", "last usable"]);
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let values: Vec<f64> = (0..40).map(|i| 50.0 + i as f64).collect();
        let series = prices(&values);
        let catalog = vec![
            Event::new(day(10), EventCategory::Conflict, "a"),
            Event::new(day(15), EventCategory::Economic, "b"),
            Event::new(day(20), EventCategory::Conflict, "c"),
        ];
        let summary = event_impacts(&series, &catalog, &ImpactConfig::default()).unwrap();
        let order: Vec<&EventCategory> = summary.by_category.iter().map(|c| &c.category).collect();
        assert_eq!(order, vec![&EventCategory::Conflict, &EventCategory::Economic]);
        assert_eq!(summary.by_category[0].count, 2);
        assert!(summary.mean_impact_pct > 0.0);
    }

    #[test]
    fn empty_catalog_gives_empty_summary() {
        let summary = event_impacts(&prices(&[1.0, 2.0]), &[], &ImpactConfig::default()).unwrap();
        assert_eq!(summary.count, 0);
        assert!(summary.by_category.is_empty());
        assert!(summary.mean_impact_pct.is_nan());
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = ImpactConfig::default().windows(0, 5);
        assert!(event_impacts(&prices(&[1.0]), &[], &config).is_err());
    }
}
