//! Cross-site request check for state-changing requests.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, StatusCode, Uri,
        header::{HOST, ORIGIN, REFERER},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Rejects unsafe requests that do not come from the server's own origin.
///
/// Disabled in load-test mode together with the admission controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginGuard {
    enabled: bool,
}

impl OriginGuard {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// `true` when `Origin` (or, failing that, `Referer`) names the same host as `Host`.
///
/// Requests carrying neither header are treated as cross-site.
pub fn is_same_origin(headers: &HeaderMap) -> bool {
    let Some(host) = headers.get(HOST).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let source = headers
        .get(ORIGIN)
        .or_else(|| headers.get(REFERER))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uri>().ok());

    source
        .as_ref()
        .and_then(Uri::authority)
        .is_some_and(|authority| authority.as_str().eq_ignore_ascii_case(host))
}

/// Reject cross-site `POST`/`PUT`/`DELETE`/... with `403`.
///
/// Install with `axum::middleware::from_fn_with_state` as a `route_layer`.
pub async fn verify_origin(
    State(guard): State<OriginGuard>,
    request: Request,
    next: Next,
) -> Response {
    if !guard.enabled || request.method().is_safe() || is_same_origin(request.headers()) {
        return next.run(request).await;
    }

    tracing::warn!(
        "Rejecting cross-site {} to '{}'",
        request.method(),
        request.uri().path()
    );
    (StatusCode::FORBIDDEN, "cross-site request rejected\n").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(axum::http::HeaderName, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(name.clone(), HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_matching_origin_is_same_origin() {
        // テスト項目: Origin のホストが Host と一致すれば同一オリジン
        // given (前提条件):
        let headers = headers(&[
            (HOST, "bookcycle.example:8080"),
            (ORIGIN, "http://bookcycle.example:8080"),
        ]);

        // when / then:
        assert!(is_same_origin(&headers));
    }

    #[test]
    fn test_referer_is_used_when_origin_is_absent() {
        // テスト項目: Origin がなければ Referer のホストで判定する
        // given (前提条件):
        let same = headers(&[
            (HOST, "bookcycle.example"),
            (REFERER, "https://bookcycle.example/messages/2"),
        ]);
        let other = headers(&[
            (HOST, "bookcycle.example"),
            (REFERER, "https://evil.example/bookcycle.example"),
        ]);

        // when / then:
        assert!(is_same_origin(&same));
        assert!(!is_same_origin(&other));
    }

    #[test]
    fn test_foreign_or_missing_origin_is_cross_site() {
        // テスト項目: 別ホストの Origin、または Origin / Referer がない場合は別オリジン
        // given (前提条件):
        let foreign = headers(&[(HOST, "bookcycle.example"), (ORIGIN, "http://evil.example")]);
        let missing = headers(&[(HOST, "bookcycle.example")]);
        let opaque = headers(&[(HOST, "bookcycle.example"), (ORIGIN, "null")]);

        // when / then:
        assert!(!is_same_origin(&foreign));
        assert!(!is_same_origin(&missing));
        assert!(!is_same_origin(&opaque));
    }
}
