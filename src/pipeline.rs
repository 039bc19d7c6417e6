//! End-to-end analysis: raw rows in, [`AnalysisArtifact`] out.
//!
//! Stages run in a fixed order and each consumes the previous stage's
//! output by reference:
//!
//! 1. preprocessing into prices and returns
//! 2. stationarity and volatility diagnostics (advisory)
//! 3. change-point detection on log returns
//! 4. regime quantification
//! 5. event association and price impact, when a catalog is present

use crate::changepoint::run_detection;
use crate::config::AnalysisConfig;
use crate::core::EventCatalog;
use crate::error::Result;
use crate::events::{associate_events, event_impacts};
use crate::preprocess::{preprocess, PreparedSeries, RawObservation};
use crate::regime::{quantify_regimes, transitions};
use crate::report::AnalysisArtifact;
use crate::utils::SeriesSummary;
use crate::validation::{volatility_clustering, SubstrateDiagnostics, TestConclusion};
use tracing::{info, warn};

/// Warning used when no event catalog was supplied.
pub const NO_EVENT_CATALOG: &str = "event catalog unavailable; event association skipped";

/// Clean `rows` and analyze them.
///
/// # Errors
/// `EmptySeries` when nothing survives cleaning, configuration errors for
/// invalid settings or a series too short for them.
pub fn run_analysis(
    rows: &[RawObservation],
    events: Option<&EventCatalog>,
    config: &AnalysisConfig,
) -> Result<AnalysisArtifact> {
    config.validate()?;
    let prepared = preprocess(rows)?;
    analyze(&prepared, events, config)
}

/// Analyze an already prepared series.
pub fn analyze(
    prepared: &PreparedSeries,
    events: Option<&EventCatalog>,
    config: &AnalysisConfig,
) -> Result<AnalysisArtifact> {
    config.validate()?;
    let prices = &prepared.prices;
    let returns = &prepared.log_returns;
    config.detector.validate_for(returns.len())?;

    let mut warnings = Vec::new();

    let price_values = prices.prices();
    let stationarity = SubstrateDiagnostics::assess(&price_values, returns.values());
    info!(
        prices = %stationarity.prices.verdict,
        log_returns = %stationarity.log_returns.verdict,
        "stationarity diagnostics complete"
    );
    if stationarity.log_returns.verdict != TestConclusion::Stationary {
        let note = format!(
            "log returns are not clearly stationary (verdict: {})",
            stationarity.log_returns.verdict
        );
        warn!("{note}");
        warnings.push(note);
    }

    let volatility = volatility_clustering(&prepared.simple_returns, &config.volatility);

    let mut detection = run_detection(
        returns,
        &config.detector,
        &config.bayesian,
        &config.segmentation,
    )?;
    // The artifact carries all warnings at the top level only.
    warnings.append(&mut detection.warnings);

    let regime_analysis = quantify_regimes(returns, &detection.indices())?;
    warnings.extend(regime_analysis.warnings.iter().cloned());
    let regimes = regime_analysis.regimes;
    let regime_transitions = transitions(&regimes);
    info!(regimes = regimes.len(), "regimes quantified");

    let (associations, event_impact) = match events {
        Some(catalog) => {
            if catalog.rows_dropped > 0 {
                warnings.push(format!(
                    "{} event catalog rows could not be parsed and were dropped",
                    catalog.rows_dropped
                ));
            }
            let events = catalog.events.as_slice();
            let associations =
                associate_events(&detection.change_points, events, &config.association)?;
            let impact = event_impacts(prices, events, &config.impact)?;
            info!(
                events = events.len(),
                matched = associations.iter().map(|a| a.events.len()).sum::<usize>(),
                "events associated"
            );
            (Some(associations), Some(impact))
        }
        None => {
            warn!("{NO_EVENT_CATALOG}");
            warnings.push(NO_EVENT_CATALOG.to_string());
            (None, None)
        }
    };

    Ok(AnalysisArtifact {
        version: env!("CARGO_PKG_VERSION").to_string(),
        analysis_start: prices.start(),
        analysis_end: prices.end(),
        total_observations: prices.len(),
        return_observations: returns.len(),
        cleaning: prepared.cleaning.clone(),
        price_summary: SeriesSummary::of(&price_values),
        return_summary: SeriesSummary::of(prepared.simple_returns.values()),
        stationarity,
        volatility,
        detection,
        regimes,
        transitions: regime_transitions,
        associations,
        event_impact,
        warnings,
        config: config.clone(),
    })
}
