//! Read-only query facade over input data and a finished analysis.
//!
//! A [`ResultStore`] may be missing any of its sources. Queries against a
//! missing source return empty or zero-valued results instead of errors.

use crate::changepoint::ChangePoint;
use crate::core::{Event, EventCategory, ImpactDirection, PricePoint, PriceSeries};
use crate::regime::Regime;
use crate::report::AnalysisArtifact;
use crate::utils::{mean, nan_as_null, std_dev};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Filter for [`ResultStore::price_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Keep only the most recent `limit` rows.
    pub limit: Option<usize>,
}

/// Filter for [`ResultStore::events`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    pub category: Option<EventCategory>,
    pub impact_direction: Option<ImpactDirection>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventQuery {
    pub events: Vec<Event>,
    /// Distinct categories of the whole catalog, first-seen order.
    pub categories: Vec<EventCategory>,
    /// Distinct directions of the whole catalog, first-seen order.
    pub impact_directions: Vec<ImpactDirection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangePointQuery {
    pub change_points: Vec<ChangePoint>,
    pub regimes: Vec<Regime>,
    pub count: usize,
}

/// Price statistics on one side of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    #[serde(with = "nan_as_null")]
    pub mean_price: f64,
    #[serde(with = "nan_as_null")]
    pub std_price: f64,
    pub data_points: usize,
}

impl WindowStats {
    fn of(points: &[&PricePoint]) -> Self {
        let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
        Self {
            mean_price: mean(&prices),
            std_price: std_dev(&prices),
            data_points: prices.len(),
        }
    }
}

/// Prices around one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWindowImpact {
    pub event: Event,
    pub window_days: i64,
    /// Prices strictly before the event date.
    pub pre_event: WindowStats,
    /// Prices on or after the event date.
    pub post_event: WindowStats,
    /// Present when both sides have data.
    pub absolute_change: Option<f64>,
    pub percentage_change: Option<f64>,
    pub window_data: Vec<PricePoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub total_records: usize,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(with = "nan_as_null")]
    pub mean: f64,
    #[serde(with = "nan_as_null")]
    pub std: f64,
    #[serde(with = "nan_as_null")]
    pub min: f64,
    #[serde(with = "nan_as_null")]
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub prices: PriceStats,
    pub total_events: usize,
    /// Event count per category, first-seen order.
    pub events_by_category: Vec<(EventCategory, usize)>,
    pub events_by_direction: Vec<(ImpactDirection, usize)>,
    pub change_points: usize,
    pub regimes: usize,
}

fn count_distinct<T: PartialEq + Clone>(items: impl Iterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

fn within(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
}

/// Query facade.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    prices: Option<PriceSeries>,
    events: Vec<Event>,
    artifact: Option<AnalysisArtifact>,
}

impl ResultStore {
    pub fn new(
        prices: Option<PriceSeries>,
        events: Option<Vec<Event>>,
        artifact: Option<AnalysisArtifact>,
    ) -> Self {
        Self {
            prices,
            events: events.unwrap_or_default(),
            artifact,
        }
    }

    pub fn price_data(&self, filter: &PriceFilter) -> Vec<PricePoint> {
        let Some(prices) = &self.prices else {
            return Vec::new();
        };
        let rows = prices.between(filter.start, filter.end);
        let skip = filter.limit.map_or(0, |limit| rows.len().saturating_sub(limit));
        rows[skip..].to_vec()
    }

    pub fn events(&self, filter: &EventFilter) -> EventQuery {
        let events = self
            .events
            .iter()
            .filter(|e| filter.category.as_ref().map_or(true, |c| &e.category == c))
            .filter(|e| filter.impact_direction.map_or(true, |d| e.impact_direction == d))
            .filter(|e| within(e.date, filter.start, filter.end))
            .cloned()
            .collect();

        EventQuery {
            events,
            categories: count_distinct(self.events.iter().map(|e| e.category.clone()))
                .into_iter()
                .map(|(c, _)| c)
                .collect(),
            impact_directions: count_distinct(self.events.iter().map(|e| e.impact_direction))
                .into_iter()
                .map(|(d, _)| d)
                .collect(),
        }
    }

    pub fn change_points(&self) -> ChangePointQuery {
        let Some(artifact) = &self.artifact else {
            return ChangePointQuery::default();
        };
        ChangePointQuery {
            change_points: artifact.change_points().to_vec(),
            regimes: artifact.regimes.clone(),
            count: artifact.change_points().len(),
        }
    }

    /// Prices within `±window_days` of the catalog event at `event_id`
    /// (its position in the catalog). `None` when the event is unknown or
    /// the window holds no prices.
    pub fn event_impact(&self, event_id: usize, window_days: i64) -> Option<EventWindowImpact> {
        let event = self.events.get(event_id)?;
        let prices = self.prices.as_ref()?;
        let window = Duration::days(window_days.max(0));
        let window_data = prices.between(Some(event.date - window), Some(event.date + window));
        if window_data.is_empty() {
            return None;
        }

        let (pre, post): (Vec<&PricePoint>, Vec<&PricePoint>) =
            window_data.iter().partition(|p| p.date < event.date);
        let pre_event = WindowStats::of(&pre);
        let post_event = WindowStats::of(&post);
        let both = !pre.is_empty() && !post.is_empty();
        let absolute_change = both.then(|| post_event.mean_price - pre_event.mean_price);
        let percentage_change = absolute_change.map(|d| d / pre_event.mean_price * 100.0);

        Some(EventWindowImpact {
            event: event.clone(),
            window_days,
            pre_event,
            post_event,
            absolute_change,
            percentage_change,
            window_data: window_data.to_vec(),
        })
    }

    pub fn stats(&self) -> DashboardStats {
        let prices = self.prices.as_ref().map_or_else(
            || PriceStats {
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                ..Default::default()
            },
            |series| {
                let values = series.prices();
                PriceStats {
                    total_records: series.len(),
                    start: Some(series.start()),
                    end: Some(series.end()),
                    mean: mean(&values),
                    std: std_dev(&values),
                    min: values.iter().copied().fold(f64::INFINITY, f64::min),
                    max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                }
            },
        );

        DashboardStats {
            prices,
            total_events: self.events.len(),
            events_by_category: count_distinct(self.events.iter().map(|e| e.category.clone())),
            events_by_direction: count_distinct(self.events.iter().map(|e| e.impact_direction)),
            change_points: self.artifact.as_ref().map_or(0, |a| a.change_points().len()),
            regimes: self.artifact.as_ref().map_or(0, |a| a.regimes.len()),
        }
    }
}
