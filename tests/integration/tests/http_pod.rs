//! Integration test: the pipeline over real HTTP against a local pod and a
//! local authority.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use url::Url;

use podcheck_core::{AuthorityConfig, FetchConfig, PipelineConfig, VerificationKind};
use podcheck_crypto::digest_hex;
use podcheck_integration_tests::{birth_attestation, profile_card};
use podcheck_pipeline::{AuthenticatedFetch, Credentials, HttpFetcher, Pipeline};

/// The authority record as a Solid server converts it to Turtle.
fn birth_attestation_turtle(birthday: &str) -> String {
    format!(
        "<> <http://purl.org/dc/elements/1.1/DateOfBirth> \"{}\" .\n",
        digest_hex(birthday)
    )
}

/// How the pod answers requests for the authority record.
#[derive(Clone, Copy)]
enum Negotiation {
    /// Turtle when the client prefers it, the stored RDF/XML otherwise.
    ByAccept,
    /// Turtle regardless of the Accept header.
    AlwaysTurtle,
}

/// Serves a private profile at `/alice/card` and the authority record for
/// host `127.0.0.1` at `/authority/<digest>.rdf`.
async fn spawn_pod() -> Url {
    spawn_negotiating_pod(Negotiation::ByAccept).await
}

async fn spawn_negotiating_pod(negotiation: Negotiation) -> Url {
    let record = format!("/authority/{}.rdf", digest_hex("127.0.0.1"));
    let router = Router::new()
        .route(
            "/alice/card",
            get(|headers: HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer alice-token") => {
                        (StatusCode::OK, profile_card("Alice", "10-20-1998"))
                    }
                    _ => (StatusCode::UNAUTHORIZED, String::new()),
                }
            }),
        )
        .route(
            &record,
            get(move |headers: HeaderMap| async move {
                let accept = headers
                    .get("accept")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                match negotiation {
                    Negotiation::ByAccept if !accept.starts_with("text/turtle") => {
                        birth_attestation("10-20-1998")
                    }
                    _ => birth_attestation_turtle("10-20-1998"),
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

fn local_config(base: &Url) -> PipelineConfig {
    let template = format!("{}authority/{{digest}}.rdf", base);
    PipelineConfig {
        authorities: AuthorityConfig {
            date_of_birth: template.clone(),
            credit_score: template,
        },
        fetch: FetchConfig { timeout_secs: 5 },
        default_credit_resource: None,
    }
}

#[tokio::test]
async fn test_verified_over_http_with_credentials() {
    let base = spawn_pod().await;
    let config = local_config(&base);
    config.validate().unwrap();

    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap());
    let pipeline = Pipeline::new(fetcher, &config);
    let credentials = Credentials::bearer("alice-token");

    let resource = base.join("alice/card").unwrap();
    let result = pipeline
        .run(
            VerificationKind::DateOfBirth,
            resource.as_str(),
            Some(&credentials),
        )
        .await;
    assert!(result.is_verified(), "got {:?}", result);
}

#[tokio::test]
async fn test_unauthorized_subject_fetch() {
    let base = spawn_pod().await;
    let config = local_config(&base);

    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap());
    let pipeline = Pipeline::new(fetcher, &config);

    let resource = base.join("alice/card").unwrap();
    let result = pipeline
        .run(VerificationKind::DateOfBirth, resource.as_str(), None)
        .await;
    let reason = result.render(VerificationKind::DateOfBirth);
    assert!(
        reason.starts_with(&format!("failed to fetch from resource [{}]", resource)),
        "got {}",
        reason
    );
    assert!(reason.contains("401"));
}

#[tokio::test]
async fn test_authority_record_keeps_stored_format() {
    // A pod that converts to Turtle for Turtle-preferring clients must still
    // hand the RDF/XML record to the verifier.
    let base = spawn_negotiating_pod(Negotiation::ByAccept).await;
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let record = base
        .join(&format!("authority/{}.rdf", digest_hex("127.0.0.1")))
        .unwrap();

    let doc = fetcher
        .fetch(&record, VerificationKind::DateOfBirth.authority_format(), None)
        .await
        .unwrap();
    assert!(doc.body.starts_with("<?xml"), "got {}", doc.body);
}

#[tokio::test]
async fn test_verified_when_authority_served_as_turtle() {
    let base = spawn_negotiating_pod(Negotiation::AlwaysTurtle).await;
    let config = local_config(&base);

    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap());
    let pipeline = Pipeline::new(fetcher, &config);
    let credentials = Credentials::bearer("alice-token");

    let resource = base.join("alice/card").unwrap();
    let result = pipeline
        .run(
            VerificationKind::DateOfBirth,
            resource.as_str(),
            Some(&credentials),
        )
        .await;
    assert!(result.is_verified(), "got {:?}", result);
}
