//! Error types for layer assembly.

use covjson::CovJsonError;
use thiserror::Error;

/// Errors that can occur while turning coverages into layers.
#[derive(Error, Debug)]
pub enum LayerError {
    /// Error raised by the document model or domain classifier.
    #[error(transparent)]
    Document(#[from] CovJsonError),

    /// Range shape disagrees with its axis names, value count or domain.
    #[error(
        "range shape mismatch for `{parameter}` in coverage {coverage_index}: expected {expected}, observed {observed}"
    )]
    RangeShapeMismatch {
        parameter: String,
        coverage_index: usize,
        expected: String,
        observed: String,
    },

    /// Axis coordinates are not evenly spaced.
    #[error("axis `{axis}` is not uniformly spaced: {detail}")]
    NonUniformGrid { axis: String, detail: String },

    /// Every value of a range is missing.
    #[error("parameter `{0}` has no valid values")]
    EmptyRange(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LayerError {
    /// Create a RangeShapeMismatch error.
    pub fn shape_mismatch(
        parameter: impl Into<String>,
        coverage_index: usize,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self::RangeShapeMismatch {
            parameter: parameter.into(),
            coverage_index,
            expected: expected.into(),
            observed: observed.into(),
        }
    }

    /// Create a NonUniformGrid error.
    pub fn non_uniform(axis: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NonUniformGrid {
            axis: axis.into(),
            detail: detail.into(),
        }
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the caller may skip the failing parameter or coverage and
    /// keep producing the remaining layers.
    pub fn is_recoverable(&self) -> bool {
        match self {
            LayerError::Document(e) => e.is_recoverable(),
            LayerError::RangeShapeMismatch { .. }
            | LayerError::NonUniformGrid { .. }
            | LayerError::EmptyRange(_) => true,
            LayerError::Config(_) => false,
        }
    }
}

impl From<serde_yaml::Error> for LayerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for LayerError {
    fn from(err: std::io::Error) -> Self {
        Self::Document(CovJsonError::Io(err))
    }
}

/// Result type for layer operations.
pub type LayerResult<T> = std::result::Result<T, LayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = LayerError::shape_mismatch("TMP", 2, "[13, 14, 16]", "[13, 16, 14]");
        let msg = err.to_string();
        assert!(msg.contains("TMP"));
        assert!(msg.contains("coverage 2"));
        assert!(msg.contains("[13, 16, 14]"));
    }

    #[test]
    fn test_recoverability() {
        assert!(LayerError::EmptyRange("v".into()).is_recoverable());
        assert!(LayerError::non_uniform("x", "gap").is_recoverable());
        assert!(!LayerError::config("bad").is_recoverable());
        assert!(!LayerError::from(CovJsonError::malformed("x")).is_recoverable());
        assert!(LayerError::from(CovJsonError::ParameterNotFound("p".into())).is_recoverable());
    }
}
