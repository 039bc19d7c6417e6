//! Analysis artifact and its text rendering.

pub mod artifact;
pub mod render;

pub use artifact::AnalysisArtifact;
pub use render::render_report;
