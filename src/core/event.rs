//! Catalog events that may explain a regime change.

use crate::error::{RegimeError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event classification with an escape hatch for unlisted tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventCategory {
    Geopolitical,
    Economic,
    OpecPolicy,
    Conflict,
    Sanctions,
    Pandemic,
    NaturalDisaster,
    Other(String),
}

impl EventCategory {
    pub fn label(&self) -> &str {
        match self {
            EventCategory::Geopolitical => "Geopolitical",
            EventCategory::Economic => "Economic",
            EventCategory::OpecPolicy => "OPEC Policy",
            EventCategory::Conflict => "Conflict",
            EventCategory::Sanctions => "Sanctions",
            EventCategory::Pandemic => "Pandemic",
            EventCategory::NaturalDisaster => "Natural Disaster",
            EventCategory::Other(tag) => tag,
        }
    }
}

impl From<String> for EventCategory {
    fn from(raw: String) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "geopolitical" | "geopolitics" => EventCategory::Geopolitical,
            "economic" | "economy" | "financial" => EventCategory::Economic,
            "opec" | "opecpolicy" | "opecdecision" => EventCategory::OpecPolicy,
            "conflict" | "war" | "military" => EventCategory::Conflict,
            "sanctions" | "sanction" => EventCategory::Sanctions,
            "pandemic" | "health" => EventCategory::Pandemic,
            "naturaldisaster" | "weather" => EventCategory::NaturalDisaster,
            _ => EventCategory::Other(raw.trim().to_string()),
        }
    }
}

impl From<EventCategory> for String {
    fn from(category: EventCategory) -> Self {
        category.label().to_string()
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Expected direction of the price reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactDirection {
    Positive,
    Negative,
    Neutral,
}

impl FromStr for ImpactDirection {
    type Err = RegimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "up" | "increase" | "+" => Ok(ImpactDirection::Positive),
            "negative" | "down" | "decrease" | "-" => Ok(ImpactDirection::Negative),
            "neutral" | "mixed" | "none" => Ok(ImpactDirection::Neutral),
            other => Err(RegimeError::Parse(format!("unknown impact direction '{other}'"))),
        }
    }
}

impl fmt::Display for ImpactDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImpactDirection::Positive => "Positive",
            ImpactDirection::Negative => "Negative",
            ImpactDirection::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// Expected size of the price reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImpactMagnitude {
    Low,
    Medium,
    High,
    Severe,
}

impl FromStr for ImpactMagnitude {
    type Err = RegimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "minor" => Ok(ImpactMagnitude::Low),
            "medium" | "moderate" => Ok(ImpactMagnitude::Medium),
            "high" | "major" => Ok(ImpactMagnitude::High),
            "severe" | "extreme" | "critical" | "very high" => Ok(ImpactMagnitude::Severe),
            other => Err(RegimeError::Parse(format!("unknown impact magnitude '{other}'"))),
        }
    }
}

impl fmt::Display for ImpactMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImpactMagnitude::Low => "Low",
            ImpactMagnitude::Medium => "Medium",
            ImpactMagnitude::High => "High",
            ImpactMagnitude::Severe => "Severe",
        };
        f.write_str(label)
    }
}

/// An externally supplied, read-only catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub date: NaiveDate,
    pub category: EventCategory,
    pub description: String,
    pub impact_direction: ImpactDirection,
    pub impact_magnitude: ImpactMagnitude,
    /// Confidence exactly as supplied by the catalog.
    pub confidence_level: String,
}

impl Event {
    pub fn new(date: NaiveDate, category: EventCategory, description: impl Into<String>) -> Self {
        Self {
            date,
            category,
            description: description.into(),
            impact_direction: ImpactDirection::Neutral,
            impact_magnitude: ImpactMagnitude::Medium,
            confidence_level: String::new(),
        }
    }

    pub fn direction(mut self, direction: ImpactDirection) -> Self {
        self.impact_direction = direction;
        self
    }

    pub fn magnitude(mut self, magnitude: ImpactMagnitude) -> Self {
        self.impact_magnitude = magnitude;
        self
    }

    pub fn confidence(mut self, confidence: impl Into<String>) -> Self {
        self.confidence_level = confidence.into();
        self
    }
}

/// Events read from one catalog file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCatalog {
    pub events: Vec<Event>,
    /// Rows that could not be decoded or parsed.
    pub rows_dropped: usize,
}

impl EventCatalog {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            rows_dropped: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<Vec<Event>> for EventCatalog {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parsing_is_lenient() {
        assert_eq!(
            EventCategory::from("OPEC_Policy".to_string()),
            EventCategory::OpecPolicy
        );
        assert_eq!(
            EventCategory::from(" geopolitical ".to_string()),
            EventCategory::Geopolitical
        );
        assert_eq!(
            EventCategory::from("Technology ".to_string()),
            EventCategory::Other("Technology".to_string())
        );
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_string(&EventCategory::OpecPolicy).unwrap();
        assert_eq!(json, "\"OPEC Policy\"");
        let back: EventCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EventCategory::OpecPolicy);
    }

    #[test]
    fn direction_and_magnitude_parse() {
        assert_eq!("Negative".parse::<ImpactDirection>().unwrap(), ImpactDirection::Negative);
        assert_eq!("HIGH".parse::<ImpactMagnitude>().unwrap(), ImpactMagnitude::High);
        assert!("sideways".parse::<ImpactDirection>().is_err());
        assert!(ImpactMagnitude::Severe > ImpactMagnitude::Low);
    }
}
