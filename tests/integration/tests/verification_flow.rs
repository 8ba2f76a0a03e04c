//! Integration test: pipeline runs across resolver, parser, extractors and
//! verifier, driven through the orchestrator.

use std::sync::Arc;

use podcheck_core::{SessionState, VerificationKind, VerificationResult};
use podcheck_integration_tests::*;
use podcheck_pipeline::{MemoryFetcher, Orchestrator};

async fn log_in(orch: &Orchestrator) {
    orch.login("https://solidcommunity.net/").await.unwrap();
    let status = orch.handle_redirect(CALLBACK).await;
    assert_eq!(status.state, SessionState::Authenticated);
}

// =========================================================================
// Date of birth
// =========================================================================

#[tokio::test]
async fn test_date_of_birth_verified() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert(CARD, profile_card("Alice", "10-20-1998"));
    fetcher.insert(
        &authority_for(VerificationKind::DateOfBirth, CARD),
        birth_attestation("10-20-1998"),
    );

    let orch = orchestrator(fetcher.clone(), ScriptedLogin::accepting());
    log_in(&orch).await;

    let snap = orch.run_pipeline(VerificationKind::DateOfBirth, CARD).await;
    assert_eq!(
        snap.date_of_birth.status,
        "Name: [Alice]\nDate of birth: [10-20-1998]\nDate of birth has been verified"
    );
    assert_eq!(
        snap.date_of_birth.result,
        Some(VerificationResult::Verified {
            display_name: "Alice".into(),
            claimed_value: "10-20-1998".into(),
        })
    );
    assert_eq!(fetcher.request_count(CARD), 1);
    assert_eq!(fetcher.total_requests(), 2);
}

#[tokio::test]
async fn test_date_of_birth_invalid() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert(CARD, profile_card("Alice", "10-20-1998"));
    fetcher.insert(
        &authority_for(VerificationKind::DateOfBirth, CARD),
        birth_attestation("01-01-1970"),
    );

    let orch = orchestrator(fetcher, ScriptedLogin::accepting());
    log_in(&orch).await;

    let snap = orch.run_pipeline(VerificationKind::DateOfBirth, CARD).await;
    assert_eq!(
        snap.date_of_birth.status,
        "Name: [Alice]\nDate of birth: [10-20-1998]\nDate of birth is not valid"
    );
}

#[tokio::test]
async fn test_authority_unreachable_is_unavailable() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert(CARD, profile_card("Alice", "10-20-1998"));
    fetcher.fail(
        &authority_for(VerificationKind::DateOfBirth, CARD),
        "connection refused",
    );

    let orch = orchestrator(fetcher, ScriptedLogin::accepting());
    log_in(&orch).await;

    let snap = orch.run_pipeline(VerificationKind::DateOfBirth, CARD).await;
    assert_eq!(
        snap.date_of_birth.status,
        "date of birth missing in authority record"
    );
    assert!(snap.date_of_birth.result.unwrap().is_unavailable());
}

#[tokio::test]
async fn test_missing_fields_are_never_a_verdict() {
    let attested = birth_attestation("10-20-1998");
    let authority = authority_for(VerificationKind::DateOfBirth, CARD);

    let without_birthday = "@prefix vcard: <http://www.w3.org/2006/vcard/ns#> .\n\
                            <#me> vcard:fn \"Alice\" .\n";
    let without_name = "@prefix vcard: <http://www.w3.org/2006/vcard/ns#> .\n\
                        <#me> vcard:bday \"10-20-1998\" .\n";
    let empty_authority = attestation("dc:Unrelated", "x");

    let cases = [
        (without_birthday.to_string(), attested.clone()),
        (without_name.to_string(), attested.clone()),
        (profile_card("Alice", "10-20-1998"), empty_authority),
    ];

    for (subject, authority_body) in cases {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert(CARD, subject);
        fetcher.insert(&authority, authority_body);

        let orch = orchestrator(fetcher, ScriptedLogin::accepting());
        log_in(&orch).await;
        let snap = orch.run_pipeline(VerificationKind::DateOfBirth, CARD).await;
        let result = snap.date_of_birth.result.unwrap();
        assert!(result.is_unavailable(), "got {:?}", result);
    }
}

#[tokio::test]
async fn test_authority_depends_only_on_subject_host() {
    let other_document = "https://alice.solidcommunity.net/public/other.ttl";
    assert_eq!(
        authority_for(VerificationKind::DateOfBirth, CARD),
        authority_for(VerificationKind::DateOfBirth, other_document)
    );
    assert_ne!(
        authority_for(VerificationKind::DateOfBirth, CARD),
        authority_for(
            VerificationKind::DateOfBirth,
            "https://bob.solidcommunity.net/profile/card"
        )
    );

    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert(other_document, profile_card("Alice", "10-20-1998"));
    fetcher.insert(
        &authority_for(VerificationKind::DateOfBirth, CARD),
        birth_attestation("10-20-1998"),
    );
    let orch = orchestrator(fetcher, ScriptedLogin::accepting());
    log_in(&orch).await;

    let snap = orch
        .run_pipeline(VerificationKind::DateOfBirth, other_document)
        .await;
    assert!(snap.date_of_birth.result.unwrap().is_verified());
}

// =========================================================================
// Credit score
// =========================================================================

#[tokio::test]
async fn test_credit_score_uses_prefilled_resource() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert(SCHUFA, credit_record("Alice", "97"));
    fetcher.insert(
        &authority_for(VerificationKind::CreditScore, SCHUFA),
        score_attestation("97"),
    );

    let orch = orchestrator(fetcher, ScriptedLogin::accepting());
    log_in(&orch).await;

    let resource = orch.snapshot().await.credit_score.resource;
    assert_eq!(resource, SCHUFA);

    let snap = orch
        .run_pipeline(VerificationKind::CreditScore, &resource)
        .await;
    assert_eq!(
        snap.credit_score.status,
        "Name: [Alice]\nCredit score: [97]\nCredit score has been verified"
    );
    // The other pipeline is untouched.
    assert_eq!(snap.date_of_birth.result, None);
}

#[tokio::test]
async fn test_credit_score_mismatch() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert(SCHUFA, credit_record("Alice", "97"));
    fetcher.insert(
        &authority_for(VerificationKind::CreditScore, SCHUFA),
        score_attestation("42"),
    );

    let orch = orchestrator(fetcher, ScriptedLogin::accepting());
    log_in(&orch).await;

    let snap = orch.run_pipeline(VerificationKind::CreditScore, SCHUFA).await;
    assert!(snap.credit_score.status.ends_with("Credit score is not valid"));
}

#[tokio::test]
async fn test_subject_failures_name_the_resource() {
    let fetcher = Arc::new(MemoryFetcher::new());
    let orch = orchestrator(fetcher, ScriptedLogin::accepting());
    log_in(&orch).await;

    let snap = orch.run_pipeline(VerificationKind::CreditScore, SCHUFA).await;
    assert!(snap
        .credit_score
        .status
        .starts_with(&format!("failed to fetch from resource [{}]", SCHUFA)));

    let snap = orch
        .run_pipeline(VerificationKind::CreditScore, "not a uri")
        .await;
    assert!(snap
        .credit_score
        .status
        .starts_with("resource to fetch must be a valid URL - got an error parsing [not a uri]"));
}

// =========================================================================
// Documents
// =========================================================================

#[test]
fn test_fixture_documents_parse_deterministically() {
    use podcheck_core::{DocumentFormat, Field};

    let base = url::Url::parse(CARD).unwrap();
    let card = profile_card("Alice", "10-20-1998");
    let first = podcheck_documents::parse(&card, DocumentFormat::Triples, Some(&base)).unwrap();
    let second = podcheck_documents::parse(&card, DocumentFormat::Triples, Some(&base)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.get(Field::BirthDate), Some("10-20-1998"));

    // A credit record handed over with the wrong hint still parses.
    let record = credit_record("Alice", "97");
    let doc = podcheck_documents::parse(&record, DocumentFormat::Triples, Some(&base)).unwrap();
    assert_eq!(doc.format(), DocumentFormat::Tags);
    assert_eq!(doc.get(Field::CreditScore), Some("97"));
}
