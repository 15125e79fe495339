//! Axum middleware asking the admission controller before a request proceeds.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::ratelimit::{AdmissionController, Denial, Quota, Verdict};

/// Response header carrying the remaining hourly quota for the endpoint.
pub const REMAINING_HOURLY_HEADER: &str = "x-ratelimit-remaining-hourly";
/// Response header carrying the remaining daily quota for the subject.
pub const REMAINING_DAILY_HEADER: &str = "x-ratelimit-remaining-daily";

/// State shared by every invocation of [`admission_guard`].
#[derive(Debug, Clone)]
pub struct GuardState {
    controller: Arc<AdmissionController>,
    subject_header: HeaderName,
}

impl GuardState {
    pub fn new(controller: Arc<AdmissionController>, subject_header: HeaderName) -> Self {
        Self {
            controller,
            subject_header,
        }
    }
}

/// Guard a router with the admission controller.
///
/// The caller identity comes from the configured subject header and the
/// scope is the request path. Denied requests get `429 Too Many Requests`
/// with a `Retry-After` header; admitted ones pass through with the
/// remaining quota attached as response headers.
///
/// Install with `axum::middleware::from_fn_with_state(state, admission_guard)`.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn admission_guard(
    State(state): State<GuardState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(subject) = subject_from(request.headers(), &state.subject_header) else {
        warn!(header = %state.subject_header, "Request without subject identity");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "missing_subject",
                "message": format!("{} header is required", state.subject_header),
            })),
        )
            .into_response();
    };
    let scope = request.uri().path().to_string();

    match state.controller.check_limit(&subject, &scope, Utc::now()) {
        Verdict::Denied(denial) => {
            debug!(subject = %subject, scope = %scope, reason = denial.reason.code(), "Request denied");
            rate_limited_response(&denial)
        }
        Verdict::Allowed => {
            let quota = state.controller.remaining_quota(&subject, &scope);
            let mut response = next.run(request).await;
            insert_quota_headers(response.headers_mut(), quota);
            response
        }
    }
}

fn subject_from(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn insert_quota_headers(headers: &mut HeaderMap, quota: Quota) {
    headers.insert(REMAINING_HOURLY_HEADER, HeaderValue::from(quota.hourly));
    headers.insert(REMAINING_DAILY_HEADER, HeaderValue::from(quota.daily));
}

/// `429` response for a denial, shared with the decision service.
pub(crate) fn rate_limited_response(denial: &Denial) -> Response {
    let body = Json(json!({
        "allowed": false,
        "error": "rate_limited",
        "code": denial.reason.code(),
        "reason": denial.reason.to_string(),
        "retry_after_seconds": denial.retry_after_secs,
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(denial.retry_after_secs));
    response
}
