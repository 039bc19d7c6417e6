//! The structured result of one analysis run.
//!
//! This is the machine-readable contract written to `analysis.json`. The text
//! report is rendered from it and never parsed back.

use crate::changepoint::{ChangePoint, Detection};
use crate::config::AnalysisConfig;
use crate::events::{Association, ImpactSummary};
use crate::preprocess::CleaningReport;
use crate::regime::{Regime, RegimeTransition};
use crate::utils::SeriesSummary;
use crate::validation::{SubstrateDiagnostics, VolatilityClustering};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything one run produced, in stage order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisArtifact {
    /// Crate version that wrote the artifact.
    pub version: String,
    pub analysis_start: NaiveDate,
    pub analysis_end: NaiveDate,
    /// Clean price observations.
    pub total_observations: usize,
    pub return_observations: usize,
    pub cleaning: CleaningReport,
    pub price_summary: SeriesSummary,
    pub return_summary: SeriesSummary,
    pub stationarity: SubstrateDiagnostics,
    pub volatility: VolatilityClustering,
    pub detection: Detection,
    pub regimes: Vec<Regime>,
    pub transitions: Vec<RegimeTransition>,
    /// `None` when no event catalog was supplied.
    pub associations: Option<Vec<Association>>,
    pub event_impact: Option<ImpactSummary>,
    /// Pipeline-level warnings, detection warnings included.
    pub warnings: Vec<String>,
    pub config: AnalysisConfig,
}

impl AnalysisArtifact {
    pub fn change_points(&self) -> &[ChangePoint] {
        &self.detection.change_points
    }

    /// Calendar days covered by the analysis.
    pub fn span_days(&self) -> i64 {
        (self.analysis_end - self.analysis_start).num_days()
    }
}
