//! # brent-regimes
//!
//! Change-point detection and regime quantification for daily crude oil
//! prices.
//!
//! The crate cleans a raw price series, checks that log returns are the
//! right substrate, locates structural breaks with either a Bayesian
//! multiple change-point sampler or penalized segmentation, describes each
//! resulting regime, and links breaks to a catalog of market events.
//!
//! ```no_run
//! use brent_regimes::prelude::*;
//!
//! let rows = brent_regimes::io::load_price_rows("data/BrentOilPrices.csv")?;
//! let artifact = run_analysis(&rows, None, &AnalysisConfig::default())?;
//! println!("{}", render_report(&artifact));
//! # Ok::<(), RegimeError>(())
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod changepoint;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod io;
pub mod pipeline;
pub mod preprocess;
pub mod regime;
pub mod report;
pub mod serving;
pub mod utils;
pub mod validation;

pub use error::{RegimeError, Result};

pub mod prelude {
    pub use crate::changepoint::{
        run_detection, ChangePoint, ChangePointDetector, Detection, DetectorStrategy,
        LocationUncertainty,
    };
    pub use crate::config::AnalysisConfig;
    pub use crate::core::{Event, EventCatalog, EventCategory, PriceSeries, ReturnSeries};
    pub use crate::error::{RegimeError, Result};
    pub use crate::events::{associate_events, Association};
    pub use crate::pipeline::{analyze, run_analysis};
    pub use crate::preprocess::{preprocess, PreparedSeries, RawObservation};
    pub use crate::regime::{quantify_regimes, transitions, Regime};
    pub use crate::report::{render_report, AnalysisArtifact};
}
