//! Conversion logic between DTOs and domain entities.

use bookcycle_shared::time::timestamp_to_rfc3339;
use thiserror::Error;

use crate::domain::{
    Coordinates, Course, CourseId, Message, Timestamp, UserAccount, UserId, ValueObjectError,
};
use crate::infrastructure::dto::{http, websocket as dto};

/// 受信ペイロードのデコードエラー
///
/// 送信者へ返す経路がないため、ハブはこのエラーをログに残して破棄する。
#[derive(Debug, Error)]
pub enum MessageDecodeError {
    #[error("payload is not a valid message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid conversation participant: {0}")]
    Participant(#[from] ValueObjectError),
}

// ========================================
// DTO → Domain Entity
// ========================================

/// 受信した生のバイト列をドメインの `Message` にデコードする
///
/// `created_at` はクライアントの値を使わず、呼び出し側が与えたサーバー時刻を使う。
pub fn decode_inbound_message(
    raw: &[u8],
    created_at: Timestamp,
) -> Result<Message, MessageDecodeError> {
    let inbound: dto::InboundMessage = serde_json::from_slice(raw)?;
    let sender_id = UserId::new(inbound.sender_id)?;
    let receiver_id = UserId::new(inbound.receiver_id)?;
    let location = Coordinates::from_pair(inbound.latitude, inbound.longitude);

    Ok(Message::new(
        sender_id,
        receiver_id,
        inbound.message,
        location,
        created_at,
    ))
}

impl TryFrom<http::CourseDto> for Course {
    type Error = ValueObjectError;

    fn try_from(dto: http::CourseDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CourseId::new(dto.id)?,
            department: dto.department,
            number: dto.number,
            title: dto.title,
        })
    }
}

impl TryFrom<http::UserAccountDto> for UserAccount {
    type Error = ValueObjectError;

    fn try_from(dto: http::UserAccountDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(dto.id)?,
            email: dto.email,
            password_hash: dto.password_hash,
        })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Message> for dto::MessageDto {
    fn from(model: &Message) -> Self {
        let (latitude, longitude) = model
            .location
            .map(|c| (c.latitude(), c.longitude()))
            .unwrap_or((0.0, 0.0));
        Self {
            sender_id: model.sender_id.value(),
            receiver_id: model.receiver_id.value(),
            message: model.content.clone(),
            latitude,
            longitude,
            read: model.read,
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

impl From<Course> for http::CourseDto {
    fn from(model: Course) -> Self {
        Self {
            id: model.id.value(),
            department: model.department,
            number: model.number,
            title: model.title,
        }
    }
}

/// 配送用に `Message` を JSON 文字列へエンコードする
pub fn encode_message(message: &Message) -> Result<String, serde_json::Error> {
    serde_json::to_string(&dto::MessageDto::from(message))
}
