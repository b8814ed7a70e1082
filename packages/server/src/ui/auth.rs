//! Session cookie lookup.

use axum::http::{HeaderMap, header::COOKIE};

use crate::domain::{SessionStore, SessionToken, UserId};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "bookcycle";

/// Extract the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionToken::new(value.to_string()).ok())
}

/// Resolve the logged-in user for a request, if any.
pub async fn current_user(sessions: &dyn SessionStore, headers: &HeaderMap) -> Option<UserId> {
    let token = session_token(headers)?;
    sessions.current_user(&token).await
}

/// `Set-Cookie` value that stores `token` in the session cookie.
pub fn session_cookie(token: &SessionToken) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        token.as_str()
    )
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_found_among_other_cookies() {
        // テスト項目: 複数の Cookie の中からセッション Cookie を取り出せる
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("lang=en; bookcycle=abc-123"));

        // when (操作):
        let token = session_token(&headers);

        // then (期待する結果):
        assert_eq!(token.map(|t| t.as_str().to_string()), Some("abc-123".to_string()));
    }

    #[test]
    fn test_session_token_missing_or_empty() {
        // テスト項目: セッション Cookie がない、または空なら None
        // given (前提条件):
        let none = HeaderMap::new();
        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, HeaderValue::from_static("bookcycle="));

        // when / then:
        assert!(session_token(&none).is_none());
        assert!(session_token(&empty).is_none());
    }

    #[test]
    fn test_session_cookie_round_trips_through_cookie_header() {
        // テスト項目: 発行した Cookie をそのまま送り返すと同じトークンが取り出せる
        // given (前提条件):
        let token = SessionToken::generate();
        let set_cookie = session_cookie(&token);
        let pair = set_cookie.split(';').next().unwrap().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&pair).unwrap());

        // when (操作):
        let parsed = session_token(&headers);

        // then (期待する結果):
        assert_eq!(parsed, Some(token));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(expired_session_cookie().contains("Max-Age=0"));
    }
}
