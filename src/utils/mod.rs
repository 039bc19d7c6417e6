//! Numerical helpers shared by the analysis stages.

pub mod ols;
pub mod stats;

pub use ols::{ols_fit, OLSResult};
pub use stats::{
    autocorrelation, kurtosis, mean, median, rolling_std, skewness, std_dev, std_dev_or_zero,
    variance, SeriesSummary,
};

/// Serde adapter encoding non-finite floats as `null`.
///
/// JSON has no NaN, and `serde_json` writes `null` for it but refuses to read
/// `null` back into an `f64`. Fields that may legitimately be undefined go
/// through this module so artifacts round-trip.
pub mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// [`nan_as_null`] for every element of a `Vec<f64>`.
pub mod nan_vec_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        values
            .iter()
            .map(|v| v.is_finite().then_some(*v))
            .collect::<Vec<Option<f64>>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Ok(Vec::<Option<f64>>::deserialize(deserializer)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }
}
