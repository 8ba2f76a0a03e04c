//! Authenticated fetch: the capability to GET a pod resource with the
//! subject's credentials.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::ACCEPT;
use url::Url;
use zeroize::Zeroizing;

use podcheck_core::DocumentFormat;

use crate::error::FetchError;

const ACCEPT_TRIPLES: &str = "text/turtle, application/rdf+xml;q=0.5, */*;q=0.1";
const ACCEPT_TAGS: &str =
    "application/rdf+xml, application/xml;q=0.9, text/xml;q=0.9, */*;q=0.1";

/// `Accept` header value preferring the `format` family.
pub fn accept_header(format: DocumentFormat) -> &'static str {
    match format {
        DocumentFormat::Triples => ACCEPT_TRIPLES,
        DocumentFormat::Tags => ACCEPT_TAGS,
    }
}

/// Access credentials obtained from the login collaborator.
#[derive(Clone)]
pub struct Credentials {
    access_token: Zeroizing<String>,
}

impl Credentials {
    /// Credentials presented as an OAuth2 bearer token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Zeroizing::new(access_token.into()),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// A successfully fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Final URI after redirects.
    pub uri: Url,
    pub body: String,
}

/// Performs GET requests on behalf of the subject.
#[async_trait]
pub trait AuthenticatedFetch: Send + Sync {
    /// Fetch `uri` asking for the `format` family, presenting `credentials`
    /// when given.
    async fn fetch(
        &self,
        uri: &Url,
        format: DocumentFormat,
        credentials: Option<&Credentials>,
    ) -> Result<FetchedDocument, FetchError>;
}

/// Fetches over HTTP(S) with reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("podcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_builder() {
            FetchError::InvalidUri(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl AuthenticatedFetch for HttpFetcher {
    async fn fetch(
        &self,
        uri: &Url,
        format: DocumentFormat,
        credentials: Option<&Credentials>,
    ) -> Result<FetchedDocument, FetchError> {
        if !matches!(uri.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUri(format!(
                "unsupported scheme '{}' in {}",
                uri.scheme(),
                uri
            )));
        }

        let mut request = self
            .client
            .get(uri.as_str())
            .header(ACCEPT, accept_header(format));
        if let Some(credentials) = credentials {
            request = request.bearer_auth(credentials.access_token());
        }

        tracing::debug!(%uri, %format, authenticated = credentials.is_some(), "GET");
        let response = request.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {} from {}", status, uri)));
        }

        let final_uri = response.url().clone();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        tracing::debug!(uri = %final_uri, bytes = body.len(), "fetched document");

        Ok(FetchedDocument {
            uri: final_uri,
            body,
        })
    }
}

/// Serves documents from an in-memory table, for offline runs and tests.
#[derive(Default)]
pub struct MemoryFetcher {
    documents: DashMap<String, String>,
    failures: DashMap<String, String>,
    requests: DashMap<String, usize>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `uri`.
    pub fn insert(&self, uri: &str, body: impl Into<String>) {
        self.documents.insert(uri.to_string(), body.into());
    }

    /// Fail requests for `uri` with a network error.
    pub fn fail(&self, uri: &str, detail: impl Into<String>) {
        self.failures.insert(uri.to_string(), detail.into());
    }

    /// How many times `uri` was requested.
    pub fn request_count(&self, uri: &str) -> usize {
        self.requests.get(uri).map(|n| *n).unwrap_or(0)
    }

    /// Total number of requests served or refused.
    pub fn total_requests(&self) -> usize {
        self.requests.iter().map(|entry| *entry.value()).sum()
    }
}

#[async_trait]
impl AuthenticatedFetch for MemoryFetcher {
    async fn fetch(
        &self,
        uri: &Url,
        _format: DocumentFormat,
        _credentials: Option<&Credentials>,
    ) -> Result<FetchedDocument, FetchError> {
        *self.requests.entry(uri.to_string()).or_insert(0) += 1;

        if let Some(detail) = self.failures.get(uri.as_str()) {
            return Err(FetchError::Network(detail.clone()));
        }

        self.documents
            .get(uri.as_str())
            .map(|body| FetchedDocument {
                uri: uri.clone(),
                body: body.clone(),
            })
            .ok_or_else(|| FetchError::Network(format!("HTTP 404 Not Found from {}", uri)))
    }
}
