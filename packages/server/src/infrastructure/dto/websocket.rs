//! WebSocket でやり取りされるメッセージの JSON 表現

use serde::{Deserialize, Serialize};

/// クライアントから受信するメッセージ
///
/// `read` と `created_at` はサーバー側で決定するため受信時には読み取らない
/// （未知のフィールドとして無視される）。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "senderId")]
    pub sender_id: i64,
    #[serde(rename = "receiverId")]
    pub receiver_id: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// クライアントへ配送・履歴 API で返却されるメッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    #[serde(rename = "senderId")]
    pub sender_id: i64,
    #[serde(rename = "receiverId")]
    pub receiver_id: i64,
    pub message: String,
    pub latitude: f64,
    pub longitude: f64,
    pub read: bool,
    /// RFC 3339 (UTC)
    pub created_at: String,
}
