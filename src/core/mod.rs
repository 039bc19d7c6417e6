//! Core data structures: price/return series and catalog events.

mod event;
mod series;

pub use event::{Event, EventCatalog, EventCategory, ImpactDirection, ImpactMagnitude};
pub use series::{PricePoint, PriceSeries, ReturnSeries};
