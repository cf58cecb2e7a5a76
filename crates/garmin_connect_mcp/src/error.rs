//! Error type returned by every facade operation.

use garmin_connect_client::GarminError;
use thiserror::Error;

/// One error per failed operation.
///
/// The variant tells callers what went wrong; the message always carries the
/// description of the underlying failure.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("provider error: {message}")]
    Provider { message: String, transient: bool },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl OperationError {
    /// Stable tag used in logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            OperationError::Configuration(_) => "configuration",
            OperationError::Authentication(_) => "authentication",
            OperationError::Provider { .. } => "provider",
            OperationError::InvalidArgument(_) => "invalid_argument",
        }
    }

    /// True when repeating the call later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OperationError::Provider {
                transient: true,
                ..
            }
        )
    }

    /// Classify a failure raised during the login handshake.
    pub fn from_login(err: GarminError) -> Self {
        match err {
            GarminError::Config(msg) => OperationError::Configuration(msg),
            other => OperationError::Authentication(other.to_string()),
        }
    }
}

/// Classify a failure raised by a data call.
impl From<GarminError> for OperationError {
    fn from(err: GarminError) -> Self {
        match err {
            GarminError::Config(msg) => OperationError::Configuration(msg),
            GarminError::Auth(_) => OperationError::Authentication(err.to_string()),
            GarminError::InvalidInput(_) => OperationError::InvalidArgument(err.to_string()),
            other => OperationError::Provider {
                transient: other.is_transient(),
                message: other.to_string(),
            },
        }
    }
}

impl From<OperationError> for String {
    fn from(err: OperationError) -> Self {
        err.to_string()
    }
}

/// Result type alias for facade operations.
pub type OperationResult<T> = Result<T, OperationError>;
