//! Plain-text rendering of an [`AnalysisArtifact`].

use super::artifact::AnalysisArtifact;
use crate::changepoint::LocationUncertainty;
use crate::validation::{StationarityReport, StationarityResult};

const TITLE: &str = "BRENT OIL PRICE CHANGE POINT ANALYSIS REPORT";
const RULE_WIDTH: usize = 72;

/// Render the report. Output depends only on the artifact.
pub fn render_report(artifact: &AnalysisArtifact) -> String {
    let mut out = Vec::new();
    out.push("=".repeat(RULE_WIDTH));
    out.push(TITLE.to_string());
    out.push("=".repeat(RULE_WIDTH));

    executive_summary(&mut out, artifact);
    warnings(&mut out, artifact);
    stationarity(&mut out, artifact);
    change_points(&mut out, artifact);
    regimes(&mut out, artifact);
    posterior_regimes(&mut out, artifact);
    associations(&mut out, artifact);
    impact(&mut out, artifact);
    convergence(&mut out, artifact);

    out.push(String::new());
    out.push("=".repeat(RULE_WIDTH));
    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn heading(out: &mut Vec<String>, title: &str) {
    out.push(String::new());
    out.push(title.to_string());
    out.push("-".repeat(title.len()));
}

fn executive_summary(out: &mut Vec<String>, a: &AnalysisArtifact) {
    heading(out, "EXECUTIVE SUMMARY");
    out.push(format!(
        "Analysis Period: {} to {} ({} days)",
        a.analysis_start,
        a.analysis_end,
        a.span_days()
    ));
    out.push(format!("Total Observations: {}", a.total_observations));
    out.push(format!("Return Observations: {}", a.return_observations));
    if a.cleaning.rows_dropped() > 0 {
        out.push(format!(
            "Rows Dropped: {} (bad date {}, bad price {}, duplicate date {})",
            a.cleaning.rows_dropped(),
            a.cleaning.bad_date,
            a.cleaning.bad_price,
            a.cleaning.duplicates_dropped
        ));
    }
    out.push(format!("Detection Method: {}", a.detection.method));
    out.push(format!("Change Points Detected: {}", a.change_points().len()));
    out.push(format!("Regimes Identified: {}", a.regimes.len()));
    out.push(format!(
        "Price Range: {:.2} to {:.2} (mean {:.2})",
        a.price_summary.min, a.price_summary.max, a.price_summary.mean
    ));
}

fn warnings(out: &mut Vec<String>, a: &AnalysisArtifact) {
    heading(out, "WARNINGS");
    if a.warnings.is_empty() {
        out.push("None".to_string());
    }
    for warning in &a.warnings {
        out.push(format!("- {warning}"));
    }
}

fn test_line(name: &str, result: &StationarityResult) -> String {
    if !result.is_conclusive() {
        return format!("  {name}: could not be computed");
    }
    format!(
        "  {name}: statistic {:.4}, p-value {:.4}, lags {} -> {}",
        result.statistic, result.p_value, result.lags, result.conclusion
    )
}

fn stationarity_block(out: &mut Vec<String>, label: &str, report: &StationarityReport) {
    out.push(format!("{label}:"));
    out.push(test_line("ADF", &report.adf));
    out.push(test_line("KPSS", &report.kpss));
    out.push(format!("  Verdict: {}", report.verdict));
}

fn stationarity(out: &mut Vec<String>, a: &AnalysisArtifact) {
    heading(out, "STATIONARITY DIAGNOSTICS");
    stationarity_block(out, "Prices", &a.stationarity.prices);
    stationarity_block(out, "Log returns", &a.stationarity.log_returns);
    if a.stationarity.favours_returns() {
        out.push("Returns are stationary while prices are not; detection runs on log returns.".to_string());
    }

    let vol = &a.volatility;
    out.push(format!(
        "Volatility clustering: lag-1 autocorrelation of absolute returns {:.4} ({})",
        vol.first_order_acf(),
        if vol.strong { "strong" } else { "weak" }
    ));
    if let Some(date) = vol.peak_date {
        out.push(format!(
            "Peak {}-day rolling volatility: {:.6} on {}",
            vol.rolling_window, vol.peak_rolling_volatility, date
        ));
    }
}

fn change_points(out: &mut Vec<String>, a: &AnalysisArtifact) {
    heading(out, "DETECTED CHANGE POINTS");
    if a.change_points().is_empty() {
        out.push("No change points detected.".to_string());
    }
    for (i, cp) in a.change_points().iter().enumerate() {
        out.push(format!("Change Point {}:", i + 1));
        out.push(format!("  Date: {} (index {})", cp.date, cp.index));
        match &cp.uncertainty {
            LocationUncertainty::Posterior(p) => {
                out.push(format!("  Median Date: {}", p.median_date));
                out.push(format!(
                    "  Confidence Interval: {} to {} ({:.0}% HDI)",
                    p.hdi_lower_date,
                    p.hdi_upper_date,
                    p.probability * 100.0
                ));
                out.push(format!("  Uncertainty: ±{:.1} days", p.std));
            }
            LocationUncertainty::Unknown => {
                out.push("  Uncertainty: unavailable (point estimate)".to_string());
            }
        }
    }
}

fn regimes(out: &mut Vec<String>, a: &AnalysisArtifact) {
    heading(out, "REGIME ANALYSIS");
    for regime in &a.regimes {
        out.push(format!("Regime {}:", regime.ordinal + 1));
        out.push(format!("  Period: {} to {}", regime.start_date, regime.end_date));
        out.push(format!(
            "  Duration: {} days ({} observations)",
            regime.duration_days, regime.observations
        ));
        out.push(format!("  Mean Daily Return: {:.6}", regime.mean_return));
        out.push(format!("  Daily Volatility: {:.6}", regime.return_std));
        out.push(format!(
            "  Annualized Volatility: {:.2}%",
            regime.annualized_volatility
        ));
    }
}

fn posterior_regimes(out: &mut Vec<String>, a: &AnalysisArtifact) {
    if a.detection.regime_posteriors.is_empty() {
        return;
    }
    heading(out, "POSTERIOR REGIME PARAMETERS");
    for p in &a.detection.regime_posteriors {
        out.push(format!(
            "Regime {}: mu {:.6} ± {:.6}, sigma {:.6} ± {:.6}, annualized volatility {:.2}%",
            p.regime + 1,
            p.mu_mean,
            p.mu_std,
            p.sigma_mean,
            p.sigma_std,
            p.annualized_volatility
        ));
    }
}

fn associations(out: &mut Vec<String>, a: &AnalysisArtifact) {
    heading(out, "EVENT ASSOCIATIONS");
    let Some(associations) = &a.associations else {
        out.push("WARNING: event catalog unavailable; no events were associated.".to_string());
        return;
    };
    for (i, assoc) in associations.iter().enumerate() {
        out.push(format!(
            "Change Point {} ({}):",
            i + 1,
            assoc.change_point_date
        ));
        if assoc.events.is_empty() {
            out.push("  No associated events found".to_string());
        }
        for nearby in &assoc.events {
            let event = &nearby.event;
            out.push(format!("  {:+} days: {}", nearby.days_offset, event.description));
            out.push(format!(
                "    Category: {}, Impact: {} ({})",
                event.category, event.impact_direction, event.impact_magnitude
            ));
        }
    }
}

fn impact(out: &mut Vec<String>, a: &AnalysisArtifact) {
    heading(out, "QUANTITATIVE IMPACT ANALYSIS");
    if a.transitions.is_empty() {
        out.push("Single regime: no transitions to compare.".to_string());
    }
    for t in &a.transitions {
        out.push(format!(
            "Transition from Regime {} to Regime {} ({}):",
            t.from + 1,
            t.to + 1,
            t.date
        ));
        out.push(format!("  Mean Return Change: {:+.6}", t.mean_change));
        out.push(format!("  Volatility Change: {:+.6}", t.std_change));
        out.push(format!(
            "  Annualized Volatility Change: {:+.2}%",
            t.annualized_volatility_change
        ));
    }

    let Some(summary) = a.event_impact.as_ref().filter(|s| s.count > 0) else {
        return;
    };
    out.push(String::new());
    out.push(format!(
        "Event price impact over {} events: mean {:.2}%, std {:.2}%",
        summary.count, summary.mean_impact_pct, summary.std_impact_pct
    ));
    for category in &summary.by_category {
        out.push(format!(
            "  {}: {:.2}% (n={})",
            category.category, category.mean_impact_pct, category.count
        ));
    }
}

fn convergence(out: &mut Vec<String>, a: &AnalysisArtifact) {
    let Some(c) = &a.detection.convergence else {
        return;
    };
    heading(out, "CONVERGENCE DIAGNOSTICS");
    out.push(format!(
        "Chains: {}, draws per chain: {}, tuning: {}",
        c.chains, c.draws, c.tune
    ));
    out.push(format!(
        "Max R-hat: {:.4} (threshold {}) -> {}",
        c.max_rhat,
        c.threshold,
        if c.converged { "converged" } else { "NOT converged" }
    ));
    out.push(format!("Sigma acceptance rate: {:.3}", c.sigma_acceptance_rate));
    for p in &c.rhat {
        out.push(format!("  {}: {:.4}", p.name, p.rhat));
    }
}
