//! Entities
//!
//! ハブが扱うメッセージと、HTTP 側で参照されるコース・アカウントのドメインモデル。

use super::value_object::{Coordinates, CourseId, Timestamp, UserId};

/// メッセージの種別
///
/// 配送ルールが種別ごとに異なる:
/// - `Direct`: 受信者のみに配送
/// - `Location`: 受信者と送信者の両方に配送（地図の共同編集）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Direct,
    Location,
}

/// 会話の中で送受信されるメッセージ
///
/// `location` が `Some` のとき地図メッセージ、`None` のときダイレクトメッセージ。
/// `read` は永続化前に一度だけ `mark_read` で立てられる。
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub location: Option<Coordinates>,
    pub read: bool,
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        location: Option<Coordinates>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            sender_id,
            receiver_id,
            content,
            location,
            read: false,
            created_at,
        }
    }

    pub fn kind(&self) -> MessageKind {
        if self.location.is_some() {
            MessageKind::Location
        } else {
            MessageKind::Direct
        }
    }

    /// このメッセージをライブ配送すべきユーザーの一覧（重複なし）
    pub fn audience(&self) -> Vec<UserId> {
        match self.kind() {
            MessageKind::Direct => vec![self.receiver_id],
            MessageKind::Location if self.sender_id == self.receiver_id => vec![self.receiver_id],
            MessageKind::Location => vec![self.receiver_id, self.sender_id],
        }
    }

    /// 指定ユーザーの接続がこのメッセージの配送対象かどうか
    pub fn is_delivered_to(&self, user_id: UserId) -> bool {
        match self.kind() {
            MessageKind::Direct => user_id == self.receiver_id,
            MessageKind::Location => user_id == self.receiver_id || user_id == self.sender_id,
        }
    }

    /// 2 ユーザー間の会話に属するかどうか（方向は問わない）
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

/// 履修コース（マーケットプレイスの教科書検索で参照される）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: CourseId,
    pub department: String,
    pub number: String,
    pub title: String,
}

/// ログイン可能なユーザーのアカウント
///
/// `password_hash` は bcrypt のハッシュ。平文のパスワードは保持しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
}
