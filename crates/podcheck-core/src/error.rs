use crate::session_state::{SessionEvent, SessionState};
use crate::types::Field;

/// Errors a verification pipeline run can end in.
///
/// Every lower-layer failure (fetch, parse, login) is converted into one of
/// these before it reaches a [`crate::VerificationResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Malformed URI or missing required parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The fetch was rejected, failed in transit, or timed out.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The document is not valid Turtle or XML.
    #[error("parse failure: {0}")]
    ParseFailure(String),

    /// The document parsed but lacks a required field.
    #[error("{0} missing")]
    FieldMissing(Field),

    /// The login handshake failed.
    #[error("authentication failed: {0}")]
    AuthFailure(String),
}

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid session transition from {from} on {event:?}")]
    InvalidStateTransition {
        from: SessionState,
        event: SessionEvent,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
