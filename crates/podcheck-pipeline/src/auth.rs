//! Login collaborator: authorization-code flow with PKCE against an
//! OpenID provider.
//!
//! Without a configured client id the client registers itself at the
//! provider's `registration_endpoint` (RFC 7591) as a public client. The
//! access token is used as a plain bearer token; it is not DPoP-bound.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use url::Url;
use zeroize::Zeroizing;

use crate::error::AuthError;
use crate::fetch::Credentials;

/// What a completed redirect reports about the session.
#[derive(Debug, Clone)]
pub struct LoginInfo {
    pub is_logged_in: bool,
    /// The subject's WebID.
    pub subject: Option<Url>,
    pub credentials: Option<Credentials>,
}

impl LoginInfo {
    /// The provider answered, but without a login.
    pub fn rejected() -> Self {
        Self {
            is_logged_in: false,
            subject: None,
            credentials: None,
        }
    }
}

/// The identity provider handshake.
#[async_trait]
pub trait LoginProvider: Send + Sync {
    /// Start a login at `issuer`. Returns the URL the user's browser must be
    /// sent to; the provider later calls back at `redirect_target`.
    async fn login(&self, issuer: &Url, redirect_target: &Url) -> Result<Url, AuthError>;

    /// Complete a login from the full callback URL.
    ///
    /// Returns `None` when the callback does not belong to an outstanding
    /// attempt (a duplicate or an unrelated redirect).
    async fn handle_incoming_redirect(&self, callback: &Url)
        -> Result<Option<LoginInfo>, AuthError>;

    /// Drop any login state held by the provider.
    async fn logout(&self) -> Result<(), AuthError>;
}

#[derive(Debug, Deserialize)]
struct ProviderMetadata {
    authorization_endpoint: Url,
    token_endpoint: Url,
    #[serde(default)]
    registration_endpoint: Option<Url>,
}

/// Dynamic client registration request for a public client.
#[derive(Serialize)]
struct RegistrationRequest<'a> {
    client_name: &'a str,
    redirect_uris: [&'a str; 1],
    grant_types: [&'a str; 2],
    response_types: [&'a str; 1],
    token_endpoint_auth_method: &'a str,
    application_type: &'a str,
}

#[derive(Deserialize)]
struct RegistrationResponse {
    client_id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    webid: Option<String>,
    sub: String,
}

struct PendingLogin {
    state: String,
    verifier: Zeroizing<String>,
    token_endpoint: Url,
    redirect_target: Url,
    client_id: String,
}

/// OpenID Connect login with PKCE (S256).
///
/// At most one login is outstanding; its pending state is consumed by the
/// first matching callback.
pub struct OidcLogin {
    client: reqwest::Client,
    client_name: String,
    client_id: Option<String>,
    scope: String,
    /// Registered client ids by (registration endpoint, redirect target).
    registered: Mutex<HashMap<(String, String), String>>,
    pending: Mutex<Option<PendingLogin>>,
}

impl OidcLogin {
    /// A client that registers itself as `client_name` at each provider.
    pub fn new(client: reqwest::Client, client_name: impl Into<String>) -> Self {
        Self {
            client,
            client_name: client_name.into(),
            client_id: None,
            scope: "openid webid offline_access".into(),
            registered: Mutex::new(HashMap::new()),
            pending: Mutex::new(None),
        }
    }

    /// Use a client id registered out of band instead of dynamic
    /// registration.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// The configured client id, or the one registered at this provider for
    /// `redirect_target`.
    async fn client_id_for(
        &self,
        metadata: &ProviderMetadata,
        redirect_target: &Url,
    ) -> Result<String, AuthError> {
        if let Some(client_id) = &self.client_id {
            return Ok(client_id.clone());
        }
        let endpoint = metadata.registration_endpoint.as_ref().ok_or_else(|| {
            AuthError::Registration(
                "provider has no registration_endpoint and no client id is configured".into(),
            )
        })?;

        let key = (endpoint.to_string(), redirect_target.to_string());
        if let Some(client_id) = self.registered.lock().await.get(&key) {
            return Ok(client_id.clone());
        }

        let request = RegistrationRequest {
            client_name: &self.client_name,
            redirect_uris: [redirect_target.as_str()],
            grant_types: ["authorization_code", "refresh_token"],
            response_types: ["code"],
            token_endpoint_auth_method: "none",
            application_type: "web",
        };
        tracing::debug!(%endpoint, "registering client");

        let registration = self
            .client
            .post(endpoint.as_str())
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::Registration(e.to_string()))?
            .json::<RegistrationResponse>()
            .await
            .map_err(|e| AuthError::Registration(e.to_string()))?;

        tracing::info!(client_id = %registration.client_id, "client registered");
        self.registered
            .lock()
            .await
            .insert(key, registration.client_id.clone());
        Ok(registration.client_id)
    }

    async fn discover(&self, issuer: &Url) -> Result<ProviderMetadata, AuthError> {
        let discovery = format!(
            "{}/.well-known/openid-configuration",
            issuer.as_str().trim_end_matches('/')
        );
        tracing::debug!(%discovery, "fetching provider metadata");

        self.client
            .get(&discovery)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::Discovery(e.to_string()))?
            .json::<ProviderMetadata>()
            .await
            .map_err(|e| AuthError::Discovery(e.to_string()))
    }

    async fn exchange_code(
        &self,
        pending: &PendingLogin,
        code: &str,
    ) -> Result<TokenResponse, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", pending.redirect_target.as_str()),
            ("client_id", pending.client_id.as_str()),
            ("code_verifier", pending.verifier.as_str()),
        ];

        self.client
            .post(pending.token_endpoint.as_str())
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))
    }
}

#[async_trait]
impl LoginProvider for OidcLogin {
    async fn login(&self, issuer: &Url, redirect_target: &Url) -> Result<Url, AuthError> {
        let metadata = self.discover(issuer).await?;
        let client_id = self.client_id_for(&metadata, redirect_target).await?;

        let verifier = Zeroizing::new(random_token(32));
        let challenge = pkce_challenge(&verifier);
        let state = random_token(16);

        let mut authorize = metadata.authorization_endpoint.clone();
        authorize
            .query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &client_id)
            .append_pair("redirect_uri", redirect_target.as_str())
            .append_pair("scope", &self.scope)
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", state.as_str());

        let mut pending = self.pending.lock().await;
        if pending.is_some() {
            tracing::info!("replacing an outstanding login attempt");
        }
        *pending = Some(PendingLogin {
            state,
            verifier,
            token_endpoint: metadata.token_endpoint,
            redirect_target: redirect_target.clone(),
            client_id,
        });

        tracing::info!(%issuer, "login started");
        Ok(authorize)
    }

    async fn handle_incoming_redirect(
        &self,
        callback: &Url,
    ) -> Result<Option<LoginInfo>, AuthError> {
        let params: HashMap<String, String> = callback.query_pairs().into_owned().collect();

        let pending = {
            let mut guard = self.pending.lock().await;
            let belongs = match (guard.as_ref(), params.get("state")) {
                (Some(pending), Some(state)) => pending.state == *state,
                _ => false,
            };
            if !belongs {
                tracing::debug!("redirect does not belong to an outstanding login");
                return Ok(None);
            }
            guard.take()
        };
        let Some(pending) = pending else {
            return Ok(None);
        };

        if let Some(error) = params.get("error") {
            tracing::warn!(%error, "provider refused the login");
            return Ok(Some(LoginInfo::rejected()));
        }

        let code = params
            .get("code")
            .ok_or_else(|| AuthError::InvalidCallback("no authorization code".into()))?;

        let tokens = self.exchange_code(&pending, code).await?;
        let id_token = tokens
            .id_token
            .as_deref()
            .ok_or_else(|| AuthError::IdToken("token response has no id_token".into()))?;
        let subject = subject_from_id_token(id_token)?;

        tracing::info!(%subject, "login completed");
        Ok(Some(LoginInfo {
            is_logged_in: true,
            subject: Some(subject),
            credentials: Some(Credentials::bearer(tokens.access_token)),
        }))
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.pending.lock().await.take();
        Ok(())
    }
}

fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `BASE64URL(SHA256(verifier))`, per RFC 7636.
fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// The subject WebID carried by an ID token.
///
/// The token comes straight from the token endpoint over TLS, so its
/// signature is not checked here.
fn subject_from_id_token(id_token: &str) -> Result<Url, AuthError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::IdToken("not a JWT".into()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::IdToken(e.to_string()))?;
    let claims: IdTokenClaims =
        serde_json::from_slice(&bytes).map_err(|e| AuthError::IdToken(e.to_string()))?;

    let subject = claims.webid.unwrap_or(claims.sub);
    Url::parse(&subject).map_err(|e| AuthError::IdToken(format!("subject '{}': {}", subject, e)))
}
