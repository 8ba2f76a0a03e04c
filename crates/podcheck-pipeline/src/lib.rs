//! Podcheck verification pipeline.
//!
//! A subject's claimed attribute (date of birth, credit score) is read from a
//! document in their pod, the authority's attestation is located from the
//! host of that document, and the two are compared by digest.
//!
//! The [`Orchestrator`] owns the session; each [`Pipeline::run`] works on its
//! own request-local context.

pub mod auth;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod orchestrator;
pub mod pipeline;
pub mod resolver;
pub mod verifier;

pub use auth::{LoginInfo, LoginProvider, OidcLogin};
pub use error::{AuthError, FetchError};
pub use extract::{extract_attestation, extract_claim, Claim};
pub use fetch::{
    accept_header, AuthenticatedFetch, Credentials, FetchedDocument, HttpFetcher, MemoryFetcher,
};
pub use orchestrator::{LoginOutcome, Orchestrator, PipelineStatus, StatusSnapshot, RESOURCE_PROMPT};
pub use pipeline::Pipeline;
pub use resolver::{host_digest, resolve, resolve_with_template, AuthorityResolver};
pub use verifier::{verify, verify_request};
