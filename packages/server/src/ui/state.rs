//! Server state shared by every handler.

use std::sync::Arc;

use crate::{
    admission::AdmissionController,
    config::ServerConfig,
    domain::{CourseCatalog, MessageRepository, SessionStore, UserDirectory},
    hub::HubHandle,
};

/// Shared application state
pub struct AppState {
    /// ハブへの送信口
    pub hub: HubHandle,
    /// メッセージ履歴（ハブと同じストレージ）
    pub messages: Arc<dyn MessageRepository>,
    pub courses: Arc<dyn CourseCatalog>,
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<dyn UserDirectory>,
    pub admission: Arc<AdmissionController>,
    pub config: ServerConfig,
}
