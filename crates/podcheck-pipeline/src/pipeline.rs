//! The generic verification pipeline, parametrized by [`VerificationKind`].
//!
//! fetch subject → parse → extract claim → resolve authority → fetch
//! authority → parse → extract attestation → verify.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use podcheck_core::{
    DocumentFormat, PipelineConfig, PipelineError, SessionEvent, SessionState,
    SessionStateMachine, VerificationKind, VerificationResult,
};

use crate::error::FetchError;
use crate::extract::{extract_attestation, extract_claim};
use crate::fetch::{AuthenticatedFetch, Credentials, FetchedDocument};
use crate::resolver::AuthorityResolver;
use crate::verifier::verify;

/// Where in the run a failure happened. Authority-side failures all read
/// as "missing in authority record" to the user.
#[derive(Debug)]
enum Failure {
    Subject { resource: String, error: PipelineError },
    Authority(PipelineError),
}

impl Failure {
    fn reason(&self, kind: VerificationKind) -> String {
        match self {
            Self::Subject { resource, error } => match error {
                PipelineError::InvalidInput(detail) => format!(
                    "resource to fetch must be a valid URL - got an error parsing [{}]: {}",
                    resource, detail
                ),
                PipelineError::NetworkFailure(detail) | PipelineError::AuthFailure(detail) => {
                    format!("failed to fetch from resource [{}]: {}", resource, detail)
                }
                PipelineError::ParseFailure(detail) => {
                    format!("subject document could not be parsed: {}", detail)
                }
                PipelineError::FieldMissing(field) => {
                    format!("{} missing in subject document", field)
                }
            },
            Self::Authority(_) => format!("{} missing in authority record", kind.label()),
        }
    }

    fn error(&self) -> &PipelineError {
        match self {
            Self::Subject { error, .. } => error,
            Self::Authority(error) => error,
        }
    }
}

/// Request-local working state of one run.
struct RunContext<'a> {
    kind: VerificationKind,
    resource: &'a str,
    credentials: Option<&'a Credentials>,
    state: SessionState,
}

impl<'a> RunContext<'a> {
    fn new(kind: VerificationKind, resource: &'a str, credentials: Option<&'a Credentials>) -> Self {
        Self {
            kind,
            resource,
            credentials,
            state: SessionState::Authenticated,
        }
    }

    fn advance(&mut self, event: SessionEvent) {
        match SessionStateMachine::transition(self.state, event) {
            Ok(next) => self.state = next,
            Err(e) => tracing::warn!(error = %e, "unexpected pipeline transition"),
        }
    }

    fn subject_failure(&self, error: PipelineError) -> Failure {
        Failure::Subject {
            resource: self.resource.to_string(),
            error,
        }
    }
}

/// Runs verification pipelines against one fetch capability.
pub struct Pipeline {
    fetcher: Arc<dyn AuthenticatedFetch>,
    resolver: AuthorityResolver,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn AuthenticatedFetch>, config: &PipelineConfig) -> Self {
        Self {
            fetcher,
            resolver: AuthorityResolver::new(config.authorities.clone()),
            timeout: config.fetch.timeout(),
        }
    }

    /// Run one complete pipeline. Never fails: every failure becomes
    /// [`VerificationResult::Unavailable`].
    pub async fn run(
        &self,
        kind: VerificationKind,
        resource: &str,
        credentials: Option<&Credentials>,
    ) -> VerificationResult {
        let run_id = Uuid::now_v7();
        let span = tracing::info_span!("pipeline", %run_id, %kind);

        async move {
            let mut ctx = RunContext::new(kind, resource, credentials);
            ctx.advance(SessionEvent::Fetch);

            let result = match self.execute(&mut ctx).await {
                Ok(result) => {
                    ctx.advance(SessionEvent::Computed);
                    result
                }
                Err(failure) => {
                    ctx.advance(SessionEvent::Fail);
                    tracing::warn!(error = %failure.error(), "pipeline run unavailable");
                    VerificationResult::unavailable(failure.reason(kind))
                }
            };

            ctx.advance(SessionEvent::Complete);
            tracing::info!(
                verified = result.is_verified(),
                unavailable = result.is_unavailable(),
                "pipeline run reported"
            );
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, ctx: &mut RunContext<'_>) -> Result<VerificationResult, Failure> {
        let kind = ctx.kind;

        let subject_uri = Url::parse(ctx.resource)
            .map_err(|e| ctx.subject_failure(PipelineError::InvalidInput(e.to_string())))?;

        tracing::info!(uri = %subject_uri, "fetching subject document");
        let subject = self
            .fetch(&subject_uri, kind.subject_format(), ctx.credentials)
            .await
            .map_err(|e| ctx.subject_failure(e.into()))?;

        let subject_doc =
            podcheck_documents::parse(&subject.body, kind.subject_format(), Some(&subject.uri))
                .map_err(|e| ctx.subject_failure(e.into()))?;
        let claim = extract_claim(kind, &subject_doc).map_err(|e| ctx.subject_failure(e))?;

        let authority_uri = self
            .resolver
            .resolve(kind, &subject.uri)
            .map_err(|e| ctx.subject_failure(e))?;

        tracing::info!(uri = %authority_uri, "fetching authority document");
        let authority = self
            .fetch(&authority_uri, kind.authority_format(), ctx.credentials)
            .await
            .map_err(|e| Failure::Authority(e.into()))?;
        ctx.advance(SessionEvent::Fetched);

        let authority_doc = podcheck_documents::parse(
            &authority.body,
            kind.authority_format(),
            Some(&authority.uri),
        )
        .map_err(|e| Failure::Authority(e.into()))?;
        let attested = extract_attestation(kind, &authority_doc).map_err(Failure::Authority)?;

        let verdict = verify(&claim.value, &attested);
        tracing::debug!(?verdict, "claim compared");
        Ok(VerificationResult::from_verdict(
            verdict,
            claim.display_name,
            claim.value,
        ))
    }

    /// Fetch with the configured upper bound.
    async fn fetch(
        &self,
        uri: &Url,
        format: DocumentFormat,
        credentials: Option<&Credentials>,
    ) -> Result<FetchedDocument, FetchError> {
        let fetch = self.fetcher.fetch(uri, format, credentials);
        match tokio::time::timeout(self.timeout, fetch).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}
