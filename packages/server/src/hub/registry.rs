//! Live connection registry
//!
//! ハブの制御ループだけが `&mut Registry` を持つ。

use std::collections::{HashMap, HashSet};

use crate::domain::{Message, UserId};

use super::connection::{Connection, ConnectionId, DeliveryError};

/// 1 回の配送パスの結果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// 送信キューへの投入に成功した接続数
    pub delivered: usize,
    /// 1 本以上の接続に投入できたユーザー
    pub reached: HashSet<UserId>,
    /// 投入に失敗してレジストリから外された接続
    pub evicted: Vec<ConnectionId>,
}

impl DeliveryReport {
    /// `audience` の全員に届いたかどうか
    pub fn covers(&self, audience: &[UserId]) -> bool {
        !audience.is_empty() && audience.iter().all(|user| self.reached.contains(user))
    }
}

/// ライブ接続の集合
#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Connection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection: Connection) {
        tracing::debug!(
            "Connection {} registered for user {}",
            connection.id(),
            connection.user_id()
        );
        self.connections.insert(connection.id(), connection);
    }

    /// 接続を外して送信キューを閉じる。存在しなければ何もしない
    ///
    /// 外した場合は `true`
    pub fn unregister(&mut self, id: ConnectionId) -> bool {
        match self.connections.remove(&id) {
            Some(mut connection) => {
                connection.close();
                tracing::debug!(
                    "Connection {} unregistered for user {}",
                    id,
                    connection.user_id()
                );
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// `message` の配送対象に該当する全接続へ `payload` をブロックせずに投入する
    ///
    /// 投入できなかった接続は遅い・停止したピアとみなし、その場で外して閉じる。
    pub fn deliver(&mut self, message: &Message, payload: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (id, connection) in self
            .connections
            .iter()
            .filter(|(_, c)| message.is_delivered_to(c.user_id()))
        {
            match connection.try_deliver(payload) {
                Ok(()) => {
                    report.delivered += 1;
                    report.reached.insert(connection.user_id());
                }
                Err(DeliveryError::QueueFull) => {
                    tracing::warn!(
                        "Outbound queue full for connection {} (user {}); evicting slow consumer",
                        id,
                        connection.user_id()
                    );
                    report.evicted.push(*id);
                }
                Err(DeliveryError::Closed) => {
                    tracing::debug!("Connection {} already gone; evicting", id);
                    report.evicted.push(*id);
                }
            }
        }

        for id in &report.evicted {
            self.unregister(*id);
        }

        report
    }

    /// 全接続の送信キューを閉じてレジストリを空にする。閉じた数を返す
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        for (_, mut connection) in self.connections.drain() {
            if connection.close() {
                closed += 1;
            }
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, Timestamp};
    use crate::hub::ConnectionState;

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn direct(sender: i64, receiver: i64) -> Message {
        Message::new(
            user(sender),
            user(receiver),
            "hello".to_string(),
            None,
            Timestamp::new(0),
        )
    }

    fn location(sender: i64, receiver: i64) -> Message {
        Message::new(
            user(sender),
            user(receiver),
            String::new(),
            Coordinates::from_pair(43.07, -89.40),
            Timestamp::new(0),
        )
    }

    #[tokio::test]
    async fn test_unregister_twice_closes_once() {
        // テスト項目: 同じ接続を 2 回登録解除しても、キューは一度だけ閉じられ panic しない
        // given (前提条件):
        let mut registry = Registry::new();
        let (connection, mut endpoint) = Connection::open(user(1), 4);
        let id = connection.id();
        registry.register(connection);

        // when (操作):
        let first = registry.unregister(id);
        let second = registry.unregister(id);

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(registry.is_empty());
        assert_eq!(endpoint.outbound.recv().await, None);
        assert_eq!(endpoint.state.get(), ConnectionState::Closed);
    }

    #[test]
    fn test_unregister_absent_connection_is_noop() {
        // テスト項目: 登録されていない接続の登録解除は何もしない
        // given (前提条件):
        let mut registry = Registry::new();
        let (connection, _endpoint) = Connection::open(user(1), 4);
        let (other, _other_endpoint) = Connection::open(user(2), 4);
        registry.register(connection);

        // when (操作):
        let removed = registry.unregister(other.id());

        // then (期待する結果):
        assert!(!removed);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_direct_message_reaches_only_receiver() {
        // テスト項目: ダイレクトメッセージは受信者の接続にのみ届く
        // given (前提条件):
        let mut registry = Registry::new();
        let (sender, mut sender_endpoint) = Connection::open(user(1), 4);
        let (receiver, mut receiver_endpoint) = Connection::open(user(2), 4);
        registry.register(sender);
        registry.register(receiver);

        // when (操作):
        let report = registry.deliver(&direct(1, 2), "payload");

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert!(report.covers(&[user(2)]));
        assert_eq!(
            receiver_endpoint.outbound.recv().await,
            Some("payload".to_string())
        );
        assert!(sender_endpoint.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_location_message_reaches_both_participants() {
        // テスト項目: 地図メッセージは送信者と受信者の両方に届き、第三者には届かない
        // given (前提条件):
        let mut registry = Registry::new();
        let (sender, mut sender_endpoint) = Connection::open(user(1), 4);
        let (receiver, mut receiver_endpoint) = Connection::open(user(2), 4);
        let (bystander, mut bystander_endpoint) = Connection::open(user(3), 4);
        registry.register(sender);
        registry.register(receiver);
        registry.register(bystander);

        // when (操作):
        let message = location(1, 2);
        let report = registry.deliver(&message, "map");

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        assert!(report.covers(&message.audience()));
        assert_eq!(sender_endpoint.outbound.recv().await, Some("map".to_string()));
        assert_eq!(
            receiver_endpoint.outbound.recv().await,
            Some("map".to_string())
        );
        assert!(bystander_endpoint.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_queue_evicts_connection_without_affecting_others() {
        // テスト項目: キューが満杯の接続は外され、他の接続への配送には影響しない
        // given (前提条件):
        let mut registry = Registry::new();
        let (slow, mut slow_endpoint) = Connection::open(user(2), 1);
        let (fast, mut fast_endpoint) = Connection::open(user(2), 8);
        let slow_id = slow.id();
        let fast_id = fast.id();
        registry.register(slow);
        registry.register(fast);
        registry.deliver(&direct(1, 2), "first");

        // when (操作):
        let report = registry.deliver(&direct(1, 2), "second");

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(report.evicted, vec![slow_id]);
        assert!(!registry.contains(slow_id));
        assert!(registry.contains(fast_id));
        assert_eq!(slow_endpoint.outbound.recv().await, Some("first".to_string()));
        assert_eq!(slow_endpoint.outbound.recv().await, None);
        assert_eq!(fast_endpoint.outbound.recv().await, Some("first".to_string()));
        assert_eq!(fast_endpoint.outbound.recv().await, Some("second".to_string()));
    }

    #[test]
    fn test_close_all_empties_registry() {
        // テスト項目: close_all で全ての接続が閉じられる
        // given (前提条件):
        let mut registry = Registry::new();
        let (a, a_endpoint) = Connection::open(user(1), 1);
        let (b, b_endpoint) = Connection::open(user(2), 1);
        registry.register(a);
        registry.register(b);

        // when (操作):
        let closed = registry.close_all();

        // then (期待する結果):
        assert_eq!(closed, 2);
        assert!(registry.is_empty());
        assert_eq!(a_endpoint.state.get(), ConnectionState::Closed);
        assert_eq!(b_endpoint.state.get(), ConnectionState::Closed);
    }

    #[test]
    fn test_empty_audience_is_never_covered() {
        // テスト項目: 空の配送対象は「全員に届いた」とみなさない
        // given (前提条件):
        let report = DeliveryReport::default();

        // when / then:
        assert!(!report.covers(&[]));
    }
}
