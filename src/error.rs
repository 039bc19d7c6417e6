//! Error types for the regime analysis pipeline.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, RegimeError>;

/// Errors that can occur while analyzing a price series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegimeError {
    /// No usable observations survived cleaning.
    #[error("empty series: no valid observations after cleaning")]
    EmptySeries,

    /// The series is too short for the requested analysis.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid configuration or argument value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Posterior inference could not be carried out.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// A file or record could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl RegimeError {
    /// Whether this error belongs to the configuration class, which must be
    /// reported before any sampling or segmentation starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RegimeError::InvalidParameter(_) | RegimeError::InsufficientData { .. }
        )
    }
}

impl From<std::io::Error> for RegimeError {
    fn from(err: std::io::Error) -> Self {
        RegimeError::Io(err.to_string())
    }
}

impl From<csv::Error> for RegimeError {
    fn from(err: csv::Error) -> Self {
        RegimeError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for RegimeError {
    fn from(err: serde_json::Error) -> Self {
        RegimeError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = RegimeError::EmptySeries;
        assert_eq!(
            err.to_string(),
            "empty series: no valid observations after cleaning"
        );

        let err = RegimeError::InsufficientData {
            needed: 400,
            got: 120,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 400, got 120"
        );

        let err = RegimeError::InvalidParameter("window_days must be >= 0".to_string());
        assert_eq!(err.to_string(), "invalid parameter: window_days must be >= 0");

        let err = RegimeError::Inference("non-finite log density".to_string());
        assert_eq!(err.to_string(), "inference failed: non-finite log density");
    }

    #[test]
    fn configuration_class() {
        assert!(RegimeError::InvalidParameter("k".into()).is_configuration());
        assert!(RegimeError::InsufficientData { needed: 2, got: 1 }.is_configuration());
        assert!(!RegimeError::Inference("x".into()).is_configuration());
        assert!(!RegimeError::EmptySeries.is_configuration());
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = RegimeError::EmptySeries;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: RegimeError = io.into();
        assert!(matches!(err, RegimeError::Io(msg) if msg.contains("missing.csv")));
    }
}
