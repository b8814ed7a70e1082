//! Routing pass
//!
//! 受信ペイロード 1 件に対して、デコード → 送信者の確認 → 時刻の付与 → 配送 → 既読判定 を行う。
//! 永続化は呼び出し側（ハブの制御ループ）が結果の `message` に対して一度だけ行う。

use thiserror::Error;

use crate::{
    domain::{Message, Timestamp, UserId},
    infrastructure::dto::{MessageDecodeError, decode_inbound_message, encode_message},
};

use super::registry::{DeliveryReport, Registry};

/// ルーティングできなかった理由（いずれも送信者には通知されない）
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Malformed(#[from] MessageDecodeError),

    /// 接続の認証済みユーザー以外を送信者として名乗った
    #[error("connection of user {actual} claimed to send as user {claimed}")]
    SenderMismatch { claimed: UserId, actual: UserId },

    #[error("failed to encode message for delivery: {0}")]
    Encode(serde_json::Error),
}

/// 配送済みで永続化待ちのメッセージ
#[derive(Debug)]
pub struct RoutedMessage {
    /// `read` は配送結果を反映済み
    pub message: Message,
    pub report: DeliveryReport,
}

/// `from` の接続で受信したペイロード 1 件をレジストリのスナップショットに対して配送する
///
/// `senderId` が `from` と一致しない場合は配送しない。
/// `read` は配送対象の全員（ダイレクトなら受信者、地図なら送受信者）に
/// このパスで届いたときだけ `true` になる。
pub fn route_message(
    registry: &mut Registry,
    from: UserId,
    raw: &[u8],
    now: Timestamp,
) -> Result<RoutedMessage, RouteError> {
    let mut message = decode_inbound_message(raw, now)?;
    if message.sender_id != from {
        return Err(RouteError::SenderMismatch {
            claimed: message.sender_id,
            actual: from,
        });
    }
    let payload = encode_message(&message).map_err(RouteError::Encode)?;

    let report = registry.deliver(&message, &payload);
    if report.covers(&message.audience()) {
        message.mark_read();
    }

    Ok(RoutedMessage { message, report })
}
