//! Error types for the SITS coverage pipeline.

use thiserror::Error;

/// Result type alias using SitsError.
pub type SitsResult<T> = Result<T, SitsError>;

/// Primary error type for pipeline operations.
#[derive(Debug, Error)]
pub enum SitsError {
    // === Coverage Service Errors ===
    /// Structured OWS exception returned by the coverage service.
    #[error("{code}{}: {text}", locator_suffix(.locator))]
    Ows {
        code: String,
        locator: String,
        text: String,
    },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid service response: {0}")]
    InvalidResponse(String),

    // === Input Errors ===
    #[error("Empty satellite image time series: no coverages to process")]
    EmptySits,

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    // === Data Errors ===
    #[error("Raster shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Unresolvable reference: {0}")]
    UnresolvedReference(String),

    #[error("Singular matrix: determinant is zero")]
    SingularMatrix,

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Raster error: {0}")]
    Raster(String),

    #[error("Vector data error: {0}")]
    Vector(String),

    #[error("Algorithm failed: {0}")]
    Algorithm(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SitsError {
    /// True for faults reported by the remote coverage service itself.
    pub fn is_protocol_fault(&self) -> bool {
        matches!(self, SitsError::Ows { .. })
    }

    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            SitsError::Ows { .. } => "protocol_fault",
            SitsError::Transport(_) | SitsError::InvalidResponse(_) => "transport",
            SitsError::EmptySits => "empty_input",
            SitsError::InvalidParameter { .. } | SitsError::InvalidSelection(_) => {
                "invalid_input"
            }
            SitsError::ShapeMismatch(_) => "shape_mismatch",
            SitsError::LayerNotFound(_)
            | SitsError::UnresolvedReference(_)
            | SitsError::SingularMatrix => "unresolvable_reference",
            SitsError::Projection(_) => "projection",
            SitsError::Raster(_) | SitsError::Vector(_) => "data",
            SitsError::Algorithm(_) => "algorithm",
            SitsError::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for SitsError {
    fn from(err: serde_json::Error) -> Self {
        SitsError::InvalidSelection(format!("JSON error: {}", err))
    }
}

/// `(locator)` or nothing when the service did not name one.
pub fn locator_suffix(locator: &str) -> String {
    if locator.is_empty() {
        String::new()
    } else {
        format!("({})", locator)
    }
}
