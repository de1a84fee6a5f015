//! Rate-limit gate for the `/api` routes.

use super::AppState;
use crate::ratelimit::Decision;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Admits or rejects the request before it reaches the handler.
///
/// Both outcomes carry the `X-RateLimit-*` headers; a rejection is a 429
/// with a JSON error body and `Retry-After`.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = (state.identity)(request.headers());
    let decision = state.limiter.admit(&client);

    let mut response = match decision {
        Decision::Allow { .. } => next.run(request).await,
        Decision::Reject { reset_at, .. } => {
            tracing::debug!(client = %client, reset_at = %reset_at, "Rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "Rate limit exceeded",
                    "message": "Too many requests, please try again later.",
                })),
            )
                .into_response();
            let retry_after = retry_after_secs(reset_at - state.limiter.now());
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    };

    insert_headers(response.headers_mut(), &decision);
    response
}

/// Whole seconds until the window ends, rounded up. At least 1, since a
/// request made exactly at the reset instant still counts in the old window.
fn retry_after_secs(until_reset: chrono::TimeDelta) -> i64 {
    let millis = until_reset.num_milliseconds();
    ((millis + 999) / 1000).max(1)
}

fn insert_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(decision.limit()));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(decision.remaining()));
    headers.insert(
        RATE_LIMIT_RESET,
        HeaderValue::from(decision.reset_at().timestamp()),
    );
}
