//! Integration test: login, redirect, prompt and logout handling.

use std::sync::Arc;

use podcheck_core::{SessionState, VerificationKind};
use podcheck_integration_tests::*;
use podcheck_pipeline::{LoginOutcome, MemoryFetcher, RESOURCE_PROMPT};

#[tokio::test]
async fn test_login_redirects_to_provider() {
    let orch = orchestrator(Arc::new(MemoryFetcher::new()), ScriptedLogin::accepting());
    let outcome = orch.login("https://solidcommunity.net/").await.unwrap();
    let LoginOutcome::Redirect(url) = outcome else {
        panic!("expected a redirect");
    };
    assert_eq!(url.as_str(), "https://solidcommunity.net/authorize");
    assert_eq!(orch.snapshot().await.state, SessionState::Authenticating);
}

#[tokio::test]
async fn test_second_callback_is_idempotent() {
    let orch = orchestrator(Arc::new(MemoryFetcher::new()), ScriptedLogin::accepting());
    orch.login("https://solidcommunity.net/").await.unwrap();

    let first = orch.handle_redirect(CALLBACK).await;
    assert_eq!(first.state, SessionState::Authenticated);
    assert_eq!(first.subject.as_ref().map(|s| s.as_str()), Some(WEBID));

    let second = orch.handle_redirect(CALLBACK).await;
    assert_eq!(second.state, first.state);
    assert_eq!(second.subject, first.subject);
    assert_eq!(second.date_of_birth, first.date_of_birth);
    assert_ne!(second.login_status, first.login_status);
}

#[tokio::test]
async fn test_callback_without_login_attempt() {
    let orch = orchestrator(Arc::new(MemoryFetcher::new()), ScriptedLogin::accepting());
    let snap = orch.handle_redirect(CALLBACK).await;
    assert_eq!(snap.state, SessionState::Idle);
    assert!(snap.subject.is_none());
}

#[tokio::test]
async fn test_refused_login_returns_to_idle() {
    let orch = orchestrator(Arc::new(MemoryFetcher::new()), ScriptedLogin::refusing());
    orch.login("https://solidcommunity.net/").await.unwrap();
    let snap = orch.handle_redirect(CALLBACK).await;
    assert_eq!(snap.state, SessionState::Idle);
    assert_eq!(snap.login_status, "Got redirect, but not logged in.");
}

#[tokio::test]
async fn test_prompt_resource_never_fetches() {
    let fetcher = Arc::new(MemoryFetcher::new());
    let orch = orchestrator(fetcher.clone(), ScriptedLogin::accepting());
    orch.login("https://solidcommunity.net/").await.unwrap();
    orch.handle_redirect(CALLBACK).await;

    for kind in VerificationKind::ALL {
        let snap = orch.run_pipeline(kind, RESOURCE_PROMPT).await;
        assert_eq!(snap.state, SessionState::Authenticated);
        assert!(snap.pipeline(kind).result.is_none());
    }
    assert_eq!(fetcher.total_requests(), 0);
}

#[tokio::test]
async fn test_run_before_login_never_fetches() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert(CARD, profile_card("Alice", "10-20-1998"));
    let orch = orchestrator(fetcher.clone(), ScriptedLogin::accepting());

    let snap = orch.run_pipeline(VerificationKind::DateOfBirth, CARD).await;
    assert!(snap.date_of_birth.result.is_none());
    assert_eq!(fetcher.total_requests(), 0);
}

#[tokio::test]
async fn test_logout_then_login_again() {
    let orch = orchestrator(Arc::new(MemoryFetcher::new()), ScriptedLogin::accepting());
    orch.login("https://solidcommunity.net/").await.unwrap();
    orch.handle_redirect(CALLBACK).await;

    let out = orch.logout().await;
    assert_eq!(out.state, SessionState::Idle);
    assert!(out.subject.is_none());
    assert_eq!(out.credit_score.resource, RESOURCE_PROMPT);

    // The old callback does not resurrect the session.
    let replay = orch.handle_redirect(CALLBACK).await;
    assert_eq!(replay.state, SessionState::Idle);

    orch.login("https://solidcommunity.net/").await.unwrap();
    let back = orch.handle_redirect(CALLBACK).await;
    assert_eq!(back.state, SessionState::Authenticated);
}
