//! Proximity matching of catalog events to change points.

use crate::changepoint::ChangePoint;
use crate::core::Event;
use crate::error::{RegimeError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Settings of [`associate_events`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    /// Maximum `|event date - change point date|` in calendar days, inclusive.
    pub window_days: i64,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self { window_days: 30 }
    }
}

impl AssociationConfig {
    pub fn window_days(mut self, days: i64) -> Self {
        self.window_days = days;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_days < 0 {
            return Err(RegimeError::InvalidParameter(format!(
                "window_days must be non-negative, got {}",
                self.window_days
            )));
        }
        Ok(())
    }
}

/// One event near a change point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyEvent {
    pub event: Event,
    /// `event.date - change_point.date` in days; negative means before.
    pub days_offset: i64,
}

/// Events ranked by proximity to one change point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub change_point_index: usize,
    pub change_point_date: NaiveDate,
    pub events: Vec<NearbyEvent>,
}

impl Association {
    pub fn closest(&self) -> Option<&NearbyEvent> {
        self.events.first()
    }
}

/// Match every change point against the catalog.
///
/// Produces exactly one [`Association`] per change point, in change-point
/// order. Events are sorted by absolute offset; equal distances keep catalog
/// order.
///
/// # Errors
/// `InvalidParameter` for a negative window.
pub fn associate_events(
    change_points: &[ChangePoint],
    catalog: &[Event],
    config: &AssociationConfig,
) -> Result<Vec<Association>> {
    config.validate()?;

    Ok(change_points
        .iter()
        .map(|cp| {
            let mut events: Vec<NearbyEvent> = catalog
                .iter()
                .filter_map(|event| {
                    let days_offset = (event.date - cp.date).num_days();
                    (days_offset.abs() <= config.window_days).then(|| NearbyEvent {
                        event: event.clone(),
                        days_offset,
                    })
                })
                .collect();
            events.sort_by_key(|e| e.days_offset.abs());

            Association {
                change_point_index: cp.index,
                change_point_date: cp.date,
                events,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changepoint::LocationUncertainty;
    use crate::core::EventCategory;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cp(index: usize, date: NaiveDate) -> ChangePoint {
        ChangePoint {
            index,
            date,
            uncertainty: LocationUncertainty::Unknown,
        }
    }

    fn event(date: NaiveDate, text: &str) -> Event {
        Event::new(date, EventCategory::Conflict, text)
    }

    #[test]
    fn window_is_inclusive_and_symmetric() {
        let at = date(2008, 9, 15);
        let catalog = vec![
            event(at + Duration::days(30), "late edge"),
            event(at - Duration::days(30), "early edge"),
            event(at + Duration::days(31), "too late"),
            event(at - Duration::days(31), "too early"),
        ];
        let result = associate_events(&[cp(10, at)], &catalog, &AssociationConfig::default()).unwrap();

        let found: Vec<&str> = result[0]
            .events
            .iter()
            .map(|e| e.event.description.as_str())
            .collect();
        assert_eq!(found, vec!["late edge", "early edge"]);
        assert_eq!(result[0].events[0].days_offset, 30);
        assert_eq!(result[0].events[1].days_offset, -30);
    }

    #[test]
    fn ranked_by_absolute_offset() {
        let at = date(2020, 3, 9);
        let catalog = vec![
            event(at + Duration::days(12), "b"),
            event(at - Duration::days(2), "a"),
            event(at + Duration::days(2), "a2"),
            event(at, "same day"),
        ];
        let result = associate_events(&[cp(5, at)], &catalog, &AssociationConfig::default()).unwrap();
        let order: Vec<i64> = result[0].events.iter().map(|e| e.days_offset).collect();
        assert_eq!(order, vec![0, -2, 2, 12]);
        assert_eq!(result[0].closest().unwrap().event.description, "same day");
    }

    #[test]
    fn empty_catalog_gives_one_entry_per_change_point() {
        let cps = vec![cp(100, date(2001, 1, 1)), cp(300, date(2005, 1, 1))];
        let result = associate_events(&cps, &[], &AssociationConfig::default()).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|a| a.events.is_empty()));
        assert_eq!(result[1].change_point_index, 300);
    }

    #[test]
    fn zero_window_matches_same_day_only() {
        let at = date(2014, 11, 27);
        let catalog = vec![event(at, "OPEC meeting"), event(at + Duration::days(1), "next day")];
        let config = AssociationConfig::default().window_days(0);
        let result = associate_events(&[cp(1, at)], &catalog, &config).unwrap();
        assert_eq!(result[0].events.len(), 1);
    }

    #[test]
    fn negative_window_is_rejected() {
        let config = AssociationConfig::default().window_days(-1);
        let err = associate_events(&[], &[], &config).unwrap_err();
        assert!(err.is_configuration());
    }
}
