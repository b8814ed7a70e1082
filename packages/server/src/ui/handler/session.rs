//! Login / logout handlers.

use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    http::{
        HeaderMap, StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};

use crate::{
    infrastructure::dto::http::LoginForm,
    ui::{
        auth::{expired_session_cookie, session_cookie, session_token},
        state::AppState,
    },
};

/// Log a user in and redirect to `/`.
///
/// # Errors
///
/// * `401 Unauthorized` - unknown email or wrong password (same message for both)
/// * `500 Internal Server Error` - the user directory failed
pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    let user_id = match state.users.authenticate(&form.email, &form.password).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            tracing::warn!("Failed login attempt for {}", form.email);
            return (StatusCode::UNAUTHORIZED, "Email or password is incorrect").into_response();
        }
        Err(e) => {
            tracing::error!("User directory error: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let token = state.sessions.create_session(user_id).await;
    tracing::info!("User {} logged in", user_id);

    (
        StatusCode::FOUND,
        [(LOCATION, "/".to_string()), (SET_COOKIE, session_cookie(&token))],
    )
        .into_response()
}

/// Log the current user out and redirect to `/`.
///
/// Answers `401` when there is no live session.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(token) = session_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "You are not logged in").into_response();
    };
    let Some(user_id) = state.sessions.current_user(&token).await else {
        return (StatusCode::UNAUTHORIZED, "You are not logged in").into_response();
    };

    state.sessions.destroy_session(&token).await;
    tracing::info!("User {} logged out", user_id);

    (
        StatusCode::FOUND,
        [(LOCATION, "/".to_string()), (SET_COOKIE, expired_session_cookie())],
    )
        .into_response()
}
