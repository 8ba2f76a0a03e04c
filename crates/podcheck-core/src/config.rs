use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::VerificationKind;

/// Placeholder substituted with the host digest in authority URI templates.
pub const DIGEST_PLACEHOLDER: &str = "{digest}";

/// Settings that shape a verification pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Authority URI templates, one per verification kind.
    #[serde(default)]
    pub authorities: AuthorityConfig,

    /// Fetch settings shared by both fetch steps.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Resource pre-filled for the credit-score pipeline after login.
    #[serde(default)]
    pub default_credit_resource: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// Template for date-of-birth attestations.
    #[serde(default = "default_date_of_birth_template")]
    pub date_of_birth: String,
    /// Template for credit-score attestations.
    #[serde(default = "default_credit_score_template")]
    pub credit_score: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Upper bound for each fetch, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_date_of_birth_template() -> String {
    "https://ava.solidcommunity.net/public/{digest}.rdf".into()
}
fn default_credit_score_template() -> String {
    "https://schufa.solidcommunity.net/public/{digest}.rdf".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            date_of_birth: default_date_of_birth_template(),
            credit_score: default_credit_score_template(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AuthorityConfig {
    /// The template used for the given kind.
    pub fn template_for(&self, kind: VerificationKind) -> &str {
        match kind {
            VerificationKind::DateOfBirth => &self.date_of_birth,
            VerificationKind::CreditScore => &self.credit_score,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        for kind in VerificationKind::ALL {
            let template = self.authorities.template_for(kind);
            if !template.contains(DIGEST_PLACEHOLDER) {
                return Err(CoreError::InvalidConfig(format!(
                    "{} authority template '{}' has no {} placeholder",
                    kind, template, DIGEST_PLACEHOLDER
                )));
            }
        }
        if self.fetch.timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "fetch timeout must be at least one second".into(),
            ));
        }
        Ok(())
    }
}
