//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! Vec をインメモリ DB として使用します。挿入順は永続化順と一致します。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Message, MessageRepository, RepositoryError, UserId};

/// インメモリ Message Repository 実装
#[derive(Default)]
pub struct InMemoryMessageRepository {
    /// 永続化されたメッセージ（永続化順）
    messages: Mutex<Vec<Message>>,
}

impl InMemoryMessageRepository {
    /// 新しい InMemoryMessageRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 永続化済みメッセージのスナップショットを永続化順で取得
    pub async fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }

    /// 永続化済みメッセージ数
    pub async fn count(&self) -> usize {
        self.messages.lock().await.len()
    }
}

/// 新しい順に並べる（同時刻なら後から永続化されたものを先に）
fn newest_first<'a>(
    messages: impl DoubleEndedIterator<Item = &'a Message>,
    limit: usize,
) -> Vec<Message> {
    let mut selected: Vec<Message> = messages.rev().cloned().collect();
    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    selected.truncate(limit);
    selected
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: Message) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().await;
        messages.push(message);
        Ok(())
    }

    async fn unread_for_receiver(
        &self,
        receiver_id: UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(newest_first(
            messages
                .iter()
                .filter(|m| m.receiver_id == receiver_id && !m.read),
            limit,
        ))
    }

    async fn conversation_between(
        &self,
        a: UserId,
        b: UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(newest_first(
            messages.iter().filter(|m| m.is_between(a, b)),
            limit,
        ))
    }

    async fn mark_read_from(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Result<usize, RepositoryError> {
        let mut messages = self.messages.lock().await;
        let mut updated = 0;
        for message in messages
            .iter_mut()
            .filter(|m| m.sender_id == sender_id && m.receiver_id == receiver_id && !m.read)
        {
            message.mark_read();
            updated += 1;
        }
        Ok(updated)
    }
}
