//! Podcheck Core: Fundamental types, errors, and configuration for
//! verifying pod-hosted personal attributes against authority attestations.

pub mod config;
pub mod error;
pub mod session_state;
pub mod types;

pub use config::{AuthorityConfig, FetchConfig, PipelineConfig, DIGEST_PLACEHOLDER};
pub use error::{CoreError, PipelineError};
pub use session_state::{SessionEvent, SessionState, SessionStateMachine};
pub use types::{
    DocumentFormat, Field, ParsedDocument, Verdict, VerificationKind, VerificationRequest,
    VerificationResult,
};
