//! Admission decision service for callers outside this process.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderName, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::guard::{admission_guard, rate_limited_response, GuardState};
use crate::ratelimit::{AdmissionController, Quota, Verdict};

/// Body of `POST /v1/check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub subject: String,
    pub scope: String,
}

/// Body returned for an admitted check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub allowed: bool,
    pub remaining: Quota,
}

/// Query of `GET /v1/quota`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaQuery {
    pub subject: String,
    pub scope: String,
}

/// Build the decision service routes over a shared controller.
///
/// Besides the JSON endpoints, `/v1/authorize/<path>` serves forward-auth
/// proxies: the guard runs with `<path>` as the scope and the subject taken
/// from `subject_header`, answering `204` or `429`.
pub fn router(controller: Arc<AdmissionController>, subject_header: HeaderName) -> Router {
    let guard = GuardState::new(Arc::clone(&controller), subject_header);
    let authorize = Router::new()
        .route("/{*scope}", any(|| async { StatusCode::NO_CONTENT }))
        .layer(from_fn_with_state(guard, admission_guard));

    Router::new()
        .route("/v1/check", post(check))
        .route("/v1/quota", get(quota))
        .route("/health", get(health))
        .with_state(controller)
        .nest("/v1/authorize", authorize)
}

fn invalid_argument(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_argument",
            "message": message,
        })),
    )
        .into_response()
}

fn validate(subject: &str, scope: &str) -> Option<Response> {
    if subject.trim().is_empty() {
        warn!("Received admission request with empty subject");
        return Some(invalid_argument("subject is required"));
    }
    if scope.trim().is_empty() {
        warn!("Received admission request with empty scope");
        return Some(invalid_argument("scope is required"));
    }
    None
}

/// Decide whether the subject may call the scope now, counting it if so.
#[instrument(skip_all, fields(subject = %req.subject, scope = %req.scope))]
async fn check(
    State(controller): State<Arc<AdmissionController>>,
    Json(req): Json<CheckRequest>,
) -> Response {
    if let Some(rejection) = validate(&req.subject, &req.scope) {
        return rejection;
    }

    let verdict = controller.check_limit(&req.subject, &req.scope, Utc::now());

    info!(allowed = verdict.is_allowed(), "Admission decision made");

    match verdict {
        Verdict::Allowed => Json(CheckResponse {
            allowed: true,
            remaining: controller.remaining_quota(&req.subject, &req.scope),
        })
        .into_response(),
        Verdict::Denied(denial) => rate_limited_response(&denial),
    }
}

/// Report the remaining quota without counting anything.
#[instrument(skip_all, fields(subject = %query.subject, scope = %query.scope))]
async fn quota(
    State(controller): State<Arc<AdmissionController>>,
    Query(query): Query<QuotaQuery>,
) -> Response {
    if let Some(rejection) = validate(&query.subject, &query.scope) {
        return rejection;
    }

    Json(controller.remaining_quota(&query.subject, &query.scope)).into_response()
}

async fn health(State(controller): State<Arc<AdmissionController>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "tracked_keys": controller.store().len(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
