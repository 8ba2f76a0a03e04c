use std::fmt;

use crate::error::CoreError;

/// The states of the verification session.
///
/// `Fetching`, `Verifying` and `Reported` are the phases of a single
/// pipeline run; each run tracks them on its own copy of the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SessionState {
    /// No login attempted yet, or the last one was rejected.
    Idle,
    /// Waiting for the identity provider's redirect callback.
    Authenticating,
    /// Logged in; pipelines can run.
    Authenticated,
    /// Fetching the subject or authority document.
    Fetching,
    /// Both documents fetched; extracting and comparing.
    Verifying,
    /// A result has been rendered for the current request.
    Reported,
    /// Logout completed; resets to `Idle`.
    LoggedOut,
}

impl SessionState {
    /// Whether the subject is logged in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Fetching | Self::Verifying | Self::Reported)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::Fetching => write!(f, "Fetching"),
            Self::Verifying => write!(f, "Verifying"),
            Self::Reported => write!(f, "Reported"),
            Self::LoggedOut => write!(f, "LoggedOut"),
        }
    }
}

/// Events that drive session transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login was started with an issuer.
    Login,
    /// The redirect callback reported a logged-in session.
    LoginSucceeded,
    /// The redirect callback reported no login.
    LoginRejected,
    /// A run was requested with the placeholder resource.
    Prompt,
    /// A run was requested with a concrete resource.
    Fetch,
    /// Both documents were fetched and parsed.
    Fetched,
    /// A verdict was computed.
    Computed,
    /// A network, parse, or missing-field failure ended the run early.
    Fail,
    /// The rendered result was written back.
    Complete,
    /// The user logged out.
    Logout,
    /// Logout cleanup finished.
    Reset,
}

/// Manages session transitions.
///
/// Valid transitions:
/// - Idle → Authenticating (Login)
/// - Authenticating → Authenticating (Login, replaces the pending attempt)
/// - Authenticating → Authenticated (LoginSucceeded)
/// - Authenticating → Idle (LoginRejected)
/// - Authenticated → Authenticated (Prompt)
/// - Authenticated → Fetching (Fetch)
/// - Fetching → Verifying (Fetched)
/// - Verifying → Reported (Computed)
/// - Fetching | Verifying → Reported (Fail)
/// - Reported → Authenticated (Complete)
/// - any → LoggedOut (Logout)
/// - LoggedOut → Idle (Reset)
pub struct SessionStateMachine;

impl SessionStateMachine {
    /// Attempt a transition. Returns the new state, or an error for
    /// transitions the session does not allow.
    pub fn transition(current: SessionState, event: SessionEvent) -> Result<SessionState, CoreError> {
        use SessionEvent as E;
        use SessionState as S;

        let new_state = match (current, event) {
            (_, E::Logout) => S::LoggedOut,
            (S::LoggedOut, E::Reset) => S::Idle,

            (S::Idle, E::Login) => S::Authenticating,
            (S::Authenticating, E::Login) => S::Authenticating,
            (S::Authenticating, E::LoginSucceeded) => S::Authenticated,
            (S::Authenticating, E::LoginRejected) => S::Idle,

            (S::Authenticated, E::Prompt) => S::Authenticated,
            (S::Authenticated, E::Fetch) => S::Fetching,
            (S::Fetching, E::Fetched) => S::Verifying,
            (S::Verifying, E::Computed) => S::Reported,
            (S::Fetching | S::Verifying, E::Fail) => S::Reported,
            (S::Reported, E::Complete) => S::Authenticated,

            _ => {
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    event,
                })
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "session state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: SessionState, event: SessionEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
