//! axum middleware applying the admission controller to a router.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::controller::{AdmissionController, AdmissionDecision};

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Reject the request with `429` once its route's quota is spent.
///
/// Install with `axum::middleware::from_fn_with_state` as a `route_layer` so
/// only matched routes are counted.
pub async fn admit_request(
    State(controller): State<Arc<AdmissionController>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request.uri().path().to_string();

    let Some(decision) = controller.decide(&route).await else {
        return next.run(request).await;
    };

    if !decision.allowed {
        tracing::warn!(
            "Rejecting request to '{}': quota of {} exhausted",
            route,
            decision.limit
        );
        let mut response = (StatusCode::TOO_MANY_REQUESTS, "limit exceeded\n").into_response();
        apply_headers(response.headers_mut(), &decision);
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(reset_secs(&decision)));
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), &decision);
    response
}

fn reset_secs(decision: &AdmissionDecision) -> u64 {
    decision.reset_after.as_millis().div_ceil(1000) as u64
}

fn apply_headers(headers: &mut HeaderMap, decision: &AdmissionDecision) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(reset_secs(decision)));
}
