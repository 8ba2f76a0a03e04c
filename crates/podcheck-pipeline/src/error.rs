use std::time::Duration;

use podcheck_core::PipelineError;

/// Authenticated fetch errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    #[error("{0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Login collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("provider discovery failed: {0}")]
    Discovery(String),

    #[error("client registration failed: {0}")]
    Registration(String),

    #[error("invalid redirect callback: {0}")]
    InvalidCallback(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid ID token: {0}")]
    IdToken(String),
}

impl From<FetchError> for PipelineError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUri(detail) => PipelineError::InvalidInput(detail),
            other => PipelineError::NetworkFailure(other.to_string()),
        }
    }
}

impl From<AuthError> for PipelineError {
    fn from(err: AuthError) -> Self {
        PipelineError::AuthFailure(err.to_string())
    }
}
