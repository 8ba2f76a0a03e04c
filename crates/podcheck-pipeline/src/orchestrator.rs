//! Pipeline Orchestrator: owns the session and the user-visible status, and
//! sequences login, redirect handling, pipeline runs and logout.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use podcheck_core::{
    PipelineError, SessionEvent, SessionState, SessionStateMachine, VerificationKind,
    VerificationResult,
};

use crate::auth::{LoginInfo, LoginProvider};
use crate::fetch::Credentials;
use crate::pipeline::Pipeline;

/// Placeholder resource shown before the subject picks one.
pub const RESOURCE_PROMPT: &str = "...but enter any resource URI to attempt to read it...";

const NOT_RUN: &str = "Not run yet.";
const DUPLICATE_REDIRECT: &str = "Redirect already handled, session unchanged.";

/// Status of one verification kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStatus {
    /// Resource the next run will read.
    pub resource: String,
    /// Rendered status text.
    pub status: String,
    /// Result of the last completed run.
    pub result: Option<VerificationResult>,
}

impl PipelineStatus {
    fn prompt() -> Self {
        Self {
            resource: RESOURCE_PROMPT.to_string(),
            status: NOT_RUN.to_string(),
            result: None,
        }
    }
}

/// Everything the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub issuer: String,
    pub state: SessionState,
    pub subject: Option<Url>,
    pub login_status: String,
    pub logout_status: String,
    pub date_of_birth: PipelineStatus,
    pub credit_score: PipelineStatus,
    pub updated_at: DateTime<Utc>,
}

impl StatusSnapshot {
    pub fn pipeline(&self, kind: VerificationKind) -> &PipelineStatus {
        match kind {
            VerificationKind::DateOfBirth => &self.date_of_birth,
            VerificationKind::CreditScore => &self.credit_score,
        }
    }
}

/// What a login request produced.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Send the browser here.
    Redirect(Url),
    /// No redirect needed; show the status.
    Status(StatusSnapshot),
}

struct Inner {
    subject: Option<Url>,
    credentials: Option<Credentials>,
    /// Bumped on every login and logout; a run only writes back into the
    /// session it started in.
    generation: u64,
    status: StatusSnapshot,
}

impl Inner {
    fn new(issuer: String) -> Self {
        Self {
            subject: None,
            credentials: None,
            generation: 0,
            status: StatusSnapshot {
                issuer,
                state: SessionState::Idle,
                subject: None,
                login_status: "Not logged in.".to_string(),
                logout_status: String::new(),
                date_of_birth: PipelineStatus::prompt(),
                credit_score: PipelineStatus::prompt(),
                updated_at: Utc::now(),
            },
        }
    }

    fn state(&self) -> SessionState {
        self.status.state
    }

    /// Apply `event`; an invalid transition leaves the state as is.
    fn apply(&mut self, event: SessionEvent) -> bool {
        match SessionStateMachine::transition(self.status.state, event) {
            Ok(next) => {
                self.status.state = next;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "session transition refused");
                false
            }
        }
    }

    fn pipeline_mut(&mut self, kind: VerificationKind) -> &mut PipelineStatus {
        match kind {
            VerificationKind::DateOfBirth => &mut self.status.date_of_birth,
            VerificationKind::CreditScore => &mut self.status.credit_score,
        }
    }

    fn touch(&mut self) -> StatusSnapshot {
        self.status.updated_at = Utc::now();
        self.status.clone()
    }

    fn subject_label(&self) -> String {
        self.subject
            .as_ref()
            .map(Url::to_string)
            .unwrap_or_default()
    }
}

/// The single serialized writer over the session.
///
/// The lock is only held between awaits on the login collaborator and the
/// pipeline, never across them.
pub struct Orchestrator {
    pipeline: Pipeline,
    login: Arc<dyn LoginProvider>,
    redirect_target: Url,
    default_credit_resource: Option<String>,
    inner: Mutex<Inner>,
}

impl Orchestrator {
    pub fn new(pipeline: Pipeline, login: Arc<dyn LoginProvider>, redirect_target: Url) -> Self {
        Self {
            pipeline,
            login,
            redirect_target,
            default_credit_resource: None,
            inner: Mutex::new(Inner::new(String::new())),
        }
    }

    /// Issuer pre-filled in the status before any login.
    pub fn with_default_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.inner = Mutex::new(Inner::new(issuer.into()));
        self
    }

    /// Resource pre-filled for the credit-score pipeline after login.
    pub fn with_default_credit_resource(mut self, resource: Option<String>) -> Self {
        self.default_credit_resource = resource;
        self
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.inner.lock().await.status.clone()
    }

    /// Start a login at `issuer`.
    pub async fn login(&self, issuer: &str) -> Result<LoginOutcome, PipelineError> {
        let issuer = issuer.trim();
        if issuer.is_empty() {
            return Err(PipelineError::InvalidInput("no issuer given".into()));
        }
        let issuer_url = Url::parse(issuer).map_err(|e| {
            PipelineError::InvalidInput(format!("issuer [{}] is not a valid URL: {}", issuer, e))
        })?;

        {
            let mut inner = self.inner.lock().await;
            if inner.state().is_authenticated() {
                inner.status.login_status =
                    format!("Already logged in with WebID [{}].", inner.subject_label());
                return Ok(LoginOutcome::Status(inner.touch()));
            }
        }

        let outcome = self.login.login(&issuer_url, &self.redirect_target).await;

        let mut inner = self.inner.lock().await;
        inner.status.issuer = issuer.to_string();
        match outcome {
            Ok(authorize) => {
                if !inner.apply(SessionEvent::Login) {
                    return Ok(LoginOutcome::Status(inner.touch()));
                }
                inner.status.login_status =
                    "Login called, expecting redirect function to redirect the user's browser now..."
                        .to_string();
                inner.touch();
                tracing::info!(%issuer, "redirecting to identity provider");
                Ok(LoginOutcome::Redirect(authorize))
            }
            Err(e) => {
                tracing::warn!(%issuer, error = %e, "login could not start");
                inner.status.login_status = PipelineError::from(e).to_string();
                Ok(LoginOutcome::Status(inner.touch()))
            }
        }
    }

    /// Complete a login from the provider's callback URL.
    pub async fn handle_redirect(&self, callback: &str) -> StatusSnapshot {
        let callback = match Url::parse(callback) {
            Ok(url) => url,
            Err(e) => {
                let mut inner = self.inner.lock().await;
                inner.status.login_status = format!(
                    "Redirected, but failed to handle this as an OAuth2 redirect: [{}]",
                    e
                );
                return inner.touch();
            }
        };

        {
            let mut inner = self.inner.lock().await;
            if inner.state() != SessionState::Authenticating {
                tracing::debug!(state = %inner.state(), "redirect outside a login attempt");
                inner.status.login_status = DUPLICATE_REDIRECT.to_string();
                return inner.touch();
            }
        }

        let outcome = self.login.handle_incoming_redirect(&callback).await;

        let mut inner = self.inner.lock().await;
        match outcome {
            Ok(None) => {
                inner.status.login_status = DUPLICATE_REDIRECT.to_string();
            }
            Ok(Some(info)) if info.is_logged_in => self.complete_login(&mut inner, info),
            Ok(Some(_)) => {
                inner.apply(SessionEvent::LoginRejected);
                inner.status.login_status = "Got redirect, but not logged in.".to_string();
            }
            Err(e) => {
                tracing::warn!(error = %e, "redirect handling failed");
                inner.apply(SessionEvent::LoginRejected);
                inner.status.login_status = format!(
                    "Redirected, but failed to handle this as an OAuth2 redirect: [{}]",
                    e
                );
            }
        }
        inner.touch()
    }

    fn complete_login(&self, inner: &mut Inner, info: LoginInfo) {
        if !inner.apply(SessionEvent::LoginSucceeded) {
            return;
        }
        inner.generation += 1;
        inner.subject = info.subject;
        inner.credentials = info.credentials;
        inner.status.subject = inner.subject.clone();
        inner.status.logout_status.clear();

        let subject = inner.subject_label();
        inner.status.date_of_birth.resource = if subject.is_empty() {
            RESOURCE_PROMPT.to_string()
        } else {
            subject.clone()
        };
        inner.status.credit_score.resource = self
            .default_credit_resource
            .clone()
            .unwrap_or_else(|| RESOURCE_PROMPT.to_string());
        inner.status.login_status = format!("Successfully logged in with WebID: [{}].", subject);
        tracing::info!(%subject, "logged in");
    }

    /// Run the `kind` pipeline against `resource`.
    pub async fn run_pipeline(&self, kind: VerificationKind, resource: &str) -> StatusSnapshot {
        let resource = resource.trim();
        let (generation, credentials) = {
            let mut inner = self.inner.lock().await;
            inner.pipeline_mut(kind).resource = resource.to_string();

            if resource == RESOURCE_PROMPT {
                if inner.state().is_authenticated() {
                    inner.apply(SessionEvent::Prompt);
                }
                inner.pipeline_mut(kind).status =
                    format!("Enter a resource URI to verify your {}.", kind.label());
                return inner.touch();
            }
            if !inner.state().is_authenticated() {
                inner.pipeline_mut(kind).status =
                    format!("Log in before verifying your {}.", kind.label());
                return inner.touch();
            }
            (inner.generation, inner.credentials.clone())
        };

        let result = self.pipeline.run(kind, resource, credentials.as_ref()).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation || !inner.state().is_authenticated() {
            tracing::debug!(%kind, "session changed during run, discarding result");
            return inner.touch();
        }
        let status = inner.pipeline_mut(kind);
        status.status = result.render(kind);
        status.result = Some(result);
        inner.touch()
    }

    /// End the session. Local state is reset even if the provider fails.
    pub async fn logout(&self) -> StatusSnapshot {
        let outcome = self.login.logout().await;

        let mut inner = self.inner.lock().await;
        inner.apply(SessionEvent::Logout);
        inner.generation += 1;
        inner.subject = None;
        inner.credentials = None;
        inner.status.subject = None;
        inner.status.date_of_birth = PipelineStatus::prompt();
        inner.status.credit_score = PipelineStatus::prompt();
        inner.status.login_status = "Not logged in.".to_string();
        inner.status.logout_status = match outcome {
            Ok(()) => "Logged out successfully.".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "provider logout failed");
                format!("Logout processing failed: [{}]", e)
            }
        };
        inner.apply(SessionEvent::Reset);
        tracing::info!("logged out");
        inner.touch()
    }
}
