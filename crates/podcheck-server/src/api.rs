//! HTTP surface of the podcheck server.
//!
//! Every handler answers with the current status as JSON, except `/login`,
//! which redirects the browser to the identity provider.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use podcheck_core::{PipelineError, VerificationKind};
use podcheck_pipeline::{LoginOutcome, Orchestrator, StatusSnapshot};

/// Shared handler state.
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Base of the callback URLs the provider sends back.
    pub redirect_target: Url,
}

// --- Request / response types ---

#[derive(Deserialize)]
pub struct LoginParams {
    #[serde(rename = "oidcIssuer")]
    pub oidc_issuer: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyParams {
    pub resource: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.orchestrator.snapshot().await)
}

async fn handle_login(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LoginParams>,
) -> Result<Response, ApiError> {
    let issuer = params
        .oidc_issuer
        .filter(|issuer| !issuer.trim().is_empty())
        .ok_or_else(|| bad_request("missing oidcIssuer parameter"))?;

    match state.orchestrator.login(&issuer).await {
        Ok(LoginOutcome::Redirect(authorize)) => {
            Ok((StatusCode::FOUND, [(header::LOCATION, authorize.to_string())]).into_response())
        }
        Ok(LoginOutcome::Status(status)) => Ok(Json(status).into_response()),
        Err(e) => Err(bad_request(e.to_string())),
    }
}

async fn handle_redirect(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Json<StatusSnapshot> {
    let mut callback = state.redirect_target.clone();
    callback.set_query(uri.query());
    Json(state.orchestrator.handle_redirect(callback.as_str()).await)
}

async fn handle_verify(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<StatusSnapshot>, ApiError> {
    let kind: VerificationKind = kind.parse().map_err(|e: PipelineError| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    let resource = match params.resource {
        Some(resource) => resource,
        None => state
            .orchestrator
            .snapshot()
            .await
            .pipeline(kind)
            .resource
            .clone(),
    };

    Ok(Json(state.orchestrator.run_pipeline(kind, &resource).await))
}

async fn handle_logout(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.orchestrator.logout().await)
}

// --- Server ---

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_status))
        .route("/login", get(handle_login))
        .route("/redirect", get(handle_redirect))
        .route("/verify/{kind}", get(handle_verify))
        .route("/logout", get(handle_logout))
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    tracing::info!(addr = %listener.local_addr()?, "HTTP server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
