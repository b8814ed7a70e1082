//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};

use crate::{
    domain::{CourseId, UserId},
    infrastructure::dto::{
        http::{CourseDto, MarkReadDto},
        websocket::MessageDto,
    },
    ui::{auth::current_user, state::AppState},
};

/// Unread messages returned per request.
const UNREAD_LIMIT: usize = 10;
/// Conversation history returned per request.
const CONVERSATION_LIMIT: usize = 20;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get a course by ID
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseDto>, StatusCode> {
    let course_id = CourseId::new(course_id).map_err(|_| StatusCode::NOT_FOUND)?;

    match state.courses.find(course_id).await {
        Ok(Some(course)) => Ok(Json(course.into())),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to load course {}: {}", course_id.value(), e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Unread messages addressed to the logged-in user, newest first
pub async fn unread_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageDto>>, StatusCode> {
    let user_id = current_user(state.sessions.as_ref(), &headers)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let messages = state
        .messages
        .unread_for_receiver(user_id, UNREAD_LIMIT)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load unread messages for {}: {}", user_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}

/// Conversation between the logged-in user and `{id}`, newest first
pub async fn past_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(other_id): Path<i64>,
) -> Result<Json<Vec<MessageDto>>, StatusCode> {
    let other_id = UserId::new(other_id).map_err(|_| StatusCode::NOT_FOUND)?;
    let user_id = current_user(state.sessions.as_ref(), &headers)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let messages = state
        .messages
        .conversation_between(user_id, other_id, CONVERSATION_LIMIT)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load conversation {} <-> {}: {}", user_id, other_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}

/// Mark every unread message from `{id}` to the logged-in user as read
pub async fn mark_conversation_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(other_id): Path<i64>,
) -> Result<Json<MarkReadDto>, (StatusCode, &'static str)> {
    let other_id = UserId::new(other_id).map_err(|_| (StatusCode::NOT_FOUND, "unknown user"))?;
    let user_id = current_user(state.sessions.as_ref(), &headers)
        .await
        .ok_or((StatusCode::NOT_FOUND, "not logged in"))?;

    if user_id == other_id {
        return Err((StatusCode::UNAUTHORIZED, "You cannot message yourself"));
    }

    let updated = state
        .messages
        .mark_read_from(other_id, user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark messages read for {}: {}", user_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        })?;

    Ok(Json(MarkReadDto { updated }))
}
