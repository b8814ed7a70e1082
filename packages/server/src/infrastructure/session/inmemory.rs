//! InMemory Session Store 実装
//!
//! プロセス再起動でセッションは失われる。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{SessionStore, SessionToken, UserId};

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionToken, UserId>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, user_id: UserId) -> SessionToken {
        let token = SessionToken::generate();
        self.sessions.lock().await.insert(token.clone(), user_id);
        tracing::debug!("Session created for user {}", user_id);
        token
    }

    async fn current_user(&self, token: &SessionToken) -> Option<UserId> {
        self.sessions.lock().await.get(token).copied()
    }

    async fn destroy_session(&self, token: &SessionToken) {
        if let Some(user_id) = self.sessions.lock().await.remove(token) {
            tracing::debug!("Session destroyed for user {}", user_id);
        }
    }
}
