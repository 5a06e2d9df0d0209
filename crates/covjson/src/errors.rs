//! CoverageJSON decoding error types.

use thiserror::Error;

/// Result type alias using CovJsonError.
pub type CovJsonResult<T> = Result<T, CovJsonError>;

/// Errors raised while reading and classifying CoverageJSON documents.
#[derive(Debug, Error)]
pub enum CovJsonError {
    /// Unparsable JSON or missing required structure.
    #[error("Malformed CoverageJSON: {0}")]
    MalformedDocument(String),

    /// Domain type recognised but not handled, or not recognised at all.
    #[error("Unsupported domain type `{domain_type}` (coverage {coverage_index})")]
    UnsupportedDomainType {
        domain_type: String,
        coverage_index: usize,
    },

    /// Range encoding other than an inline NdArray.
    #[error("Unsupported range type `{range_type}` for parameter `{parameter}`")]
    UnsupportedRange { parameter: String, range_type: String },

    /// Parameter requested that has no range in the coverage.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Failed to read the document from disk.
    #[error("Failed to read CoverageJSON: {0}")]
    Io(#[from] std::io::Error),
}

impl CovJsonError {
    /// Create a MalformedDocument error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDocument(msg.into())
    }

    /// Whether a caller iterating coverages or parameters may skip the
    /// failing item and continue with the rest of the document.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CovJsonError::MalformedDocument(_) | CovJsonError::Io(_) => false,
            CovJsonError::UnsupportedDomainType { .. }
            | CovJsonError::UnsupportedRange { .. }
            | CovJsonError::ParameterNotFound(_) => true,
        }
    }
}

impl From<serde_json::Error> for CovJsonError {
    fn from(err: serde_json::Error) -> Self {
        CovJsonError::MalformedDocument(err.to_string())
    }
}
