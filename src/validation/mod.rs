//! Advisory diagnostics on price and return series.
//!
//! Nothing here changes the behaviour of later stages; results are carried
//! into the report.
//!
//! # Example
//!
//! ```
//! use brent_regimes::validation::{adf_test, kpss_test, TestConclusion};
//!
//! let series: Vec<f64> = (0..200)
//!     .map(|i| ((i * 17 + 13) % 97) as f64 / 50.0 - 1.0)
//!     .collect();
//! let adf = adf_test(&series, None);
//! let kpss = kpss_test(&series, None);
//! assert_ne!(adf.conclusion, TestConclusion::Inconclusive);
//! assert!(kpss.statistic.is_finite());
//! ```

pub mod stationarity;
pub mod volatility;

pub use stationarity::{
    adf_test, kpss_test, test_stationarity, CriticalValues, StationarityReport,
    StationarityResult, SubstrateDiagnostics, TestConclusion,
};
pub use volatility::{volatility_clustering, VolatilityClustering, VolatilityConfig};
