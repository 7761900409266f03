//! Error types for WCS protocol handling.

use thiserror::Error;

use crate::exceptions::OwsException;

/// Result type alias using WcsError.
pub type WcsResult<T> = Result<T, WcsError>;

#[derive(Debug, Error)]
pub enum WcsError {
    /// The service answered with an OWS exception report.
    #[error("{0}")]
    Ows(OwsException),

    /// Connection failure or an HTTP error without a parseable exception.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The response body could not be understood.
    #[error("Invalid {document}: {message}")]
    InvalidDocument {
        document: &'static str,
        message: String,
    },

    #[error("Invalid request option '{option}': {message}")]
    InvalidOption { option: String, message: String },
}

impl WcsError {
    pub(crate) fn document(document: &'static str, message: impl Into<String>) -> Self {
        WcsError::InvalidDocument {
            document,
            message: message.into(),
        }
    }
}

impl From<WcsError> for sits_common::SitsError {
    fn from(err: WcsError) -> Self {
        use sits_common::SitsError;
        match err {
            WcsError::Ows(e) => SitsError::Ows {
                code: e.code,
                locator: e.locator,
                text: e.text,
            },
            WcsError::Transport(message) => SitsError::Transport(message),
            WcsError::InvalidDocument { .. } => SitsError::InvalidResponse(err.to_string()),
            WcsError::InvalidOption { option, message } => SitsError::InvalidParameter {
                param: option,
                message,
            },
        }
    }
}
