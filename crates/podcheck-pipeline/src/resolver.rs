//! Authority Resolver: derives the authority's attestation URI from the
//! subject document's host.
//!
//! The digest makes the address pseudonymous, not private: anyone who knows
//! a subject's host can compute where its attestation lives.

use url::Url;

use podcheck_core::{AuthorityConfig, PipelineError, VerificationKind, DIGEST_PLACEHOLDER};
use podcheck_crypto::digest_hex;

/// Maps subject documents to authority attestation documents.
#[derive(Debug, Clone)]
pub struct AuthorityResolver {
    authorities: AuthorityConfig,
}

impl AuthorityResolver {
    pub fn new(authorities: AuthorityConfig) -> Self {
        Self { authorities }
    }

    /// The attestation URI for `subject_document` under the template
    /// configured for `kind`.
    pub fn resolve(
        &self,
        kind: VerificationKind,
        subject_document: &Url,
    ) -> Result<Url, PipelineError> {
        resolve_with_template(subject_document, self.authorities.template_for(kind))
    }
}

impl Default for AuthorityResolver {
    fn default() -> Self {
        Self::new(AuthorityConfig::default())
    }
}

/// Digest of the host component, without port.
pub fn host_digest(subject_document: &Url) -> Result<String, PipelineError> {
    let host = subject_document.host_str().ok_or_else(|| {
        PipelineError::InvalidInput(format!("{} has no host component", subject_document))
    })?;
    Ok(digest_hex(host))
}

/// Substitute the host digest of `subject_document` into `template`.
pub fn resolve_with_template(subject_document: &Url, template: &str) -> Result<Url, PipelineError> {
    let digest = host_digest(subject_document)?;
    let resolved = template.replace(DIGEST_PLACEHOLDER, &digest);
    let uri = Url::parse(&resolved).map_err(|e| {
        PipelineError::InvalidInput(format!("authority URI [{}] is invalid: {}", resolved, e))
    })?;

    tracing::debug!(subject = %subject_document, authority = %uri, "resolved authority record");
    Ok(uri)
}

/// String-accepting form of [`resolve_with_template`].
pub fn resolve(subject_document_uri: &str, template: &str) -> Result<Url, PipelineError> {
    let subject = Url::parse(subject_document_uri).map_err(|e| {
        PipelineError::InvalidInput(format!(
            "[{}] is not a valid URL: {}",
            subject_document_uri, e
        ))
    })?;
    resolve_with_template(&subject, template)
}
