//! Linking detected breaks to the event catalog.
//!
//! - [`associate_events`]: events within a calendar-day window of each
//!   change point, ranked by proximity.
//! - [`event_impacts`]: mean price before and after each event.

pub mod association;
pub mod impact;

pub use association::{associate_events, Association, AssociationConfig, NearbyEvent};
pub use impact::{event_impacts, CategoryImpact, EventImpact, ImpactConfig, ImpactSummary};
