//! Live connection
//!
//! `Connection::open` は 2 つの片割れを返す:
//! - `Connection`: ハブのレジストリが所有する側。送信キューの送信端を持つ
//! - `ConnectionEndpoint`: ソケットのタスクが所有する側。送信キューの受信端を持つ
//!
//! 送信キューを閉じる操作は送信端を drop することで表現され、
//! `Connection::close` が送信端を `take` するため 2 回目以降は何もしない。

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::domain::UserId;

/// レジストリ内で接続を識別するハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 接続の状態
///
/// `Active → Closing → Closed`、または `Active → Closed`。`Closed` は終端。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// 送受信中
    Active = 0,
    /// ソケット側が切断を検知し、ハブへ登録解除を依頼した
    Closing = 1,
    /// ハブが送信キューを閉じた
    Closed = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Active,
            1 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// ハブ側とソケット側で共有される接続状態
#[derive(Debug, Clone)]
pub struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(ConnectionState::Active as u8)))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `Active` のときだけ `Closing` に遷移させる。遷移したら `true`
    pub fn begin_closing(&self) -> bool {
        self.0
            .compare_exchange(
                ConnectionState::Active as u8,
                ConnectionState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn mark_closed(&self) {
        self.0.store(ConnectionState::Closed as u8, Ordering::Release);
    }
}

/// 送信キューへの非ブロッキング投入の失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// キューが満杯（消費が遅い・停止したピア）
    #[error("outbound queue is full")]
    QueueFull,

    /// キューが閉じている（ソケット側がすでに終了）
    #[error("outbound queue is closed")]
    Closed,
}

/// ハブのレジストリが所有する接続
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    outbound: Option<mpsc::Sender<String>>,
    state: SharedState,
}

/// ソケットのタスクが所有する接続の片割れ
pub struct ConnectionEndpoint {
    pub id: ConnectionId,
    pub user_id: UserId,
    /// 配送されたシリアライズ済みメッセージ
    pub outbound: mpsc::Receiver<String>,
    pub state: SharedState,
}

impl Connection {
    /// 認証済みユーザーの新しい接続を作成
    ///
    /// `queue_capacity` は送信キューの上限（0 は 1 として扱う）。
    pub fn open(user_id: UserId, queue_capacity: usize) -> (Connection, ConnectionEndpoint) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let id = ConnectionId::generate();
        let state = SharedState::new();

        let connection = Connection {
            id,
            user_id,
            outbound: Some(tx),
            state: state.clone(),
        };
        let endpoint = ConnectionEndpoint {
            id,
            user_id,
            outbound: rx,
            state,
        };
        (connection, endpoint)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// 送信キューへブロックせずに投入する
    pub fn try_deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        let Some(outbound) = &self.outbound else {
            return Err(DeliveryError::Closed);
        };
        outbound
            .try_send(payload.to_string())
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::QueueFull,
                TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }

    /// 送信キューを閉じる。実際に閉じたときだけ `true`
    pub fn close(&mut self) -> bool {
        match self.outbound.take() {
            Some(outbound) => {
                drop(outbound);
                self.state.mark_closed();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_try_deliver_enqueues_payload() {
        // テスト項目: 送信キューに空きがあれば投入でき、ソケット側で受信できる
        // given (前提条件):
        let (connection, mut endpoint) = Connection::open(user(1), 4);

        // when (操作):
        let result = connection.try_deliver("hello");

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(endpoint.outbound.recv().await, Some("hello".to_string()));
        assert_eq!(endpoint.user_id, user(1));
        assert_eq!(endpoint.id, connection.id());
    }

    #[test]
    fn test_try_deliver_reports_full_queue() {
        // テスト項目: 送信キューが満杯なら待たずに QueueFull が返される
        // given (前提条件):
        let (connection, _endpoint) = Connection::open(user(1), 1);
        connection.try_deliver("first").unwrap();

        // when (操作):
        let result = connection.try_deliver("second");

        // then (期待する結果):
        assert_eq!(result, Err(DeliveryError::QueueFull));
    }

    #[test]
    fn test_try_deliver_reports_dropped_endpoint() {
        // テスト項目: ソケット側が終了していれば Closed が返される
        // given (前提条件):
        let (connection, endpoint) = Connection::open(user(1), 1);
        drop(endpoint);

        // when (操作):
        let result = connection.try_deliver("hello");

        // then (期待する結果):
        assert_eq!(result, Err(DeliveryError::Closed));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        // テスト項目: close は一度だけキューを閉じ、2 回目は何もしない
        // given (前提条件):
        let (mut connection, mut endpoint) = Connection::open(user(1), 1);

        // when (操作):
        let first = connection.close();
        let second = connection.close();

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(endpoint.outbound.recv().await, None);
        assert_eq!(endpoint.state.get(), ConnectionState::Closed);
        assert_eq!(connection.try_deliver("late"), Err(DeliveryError::Closed));
    }

    #[test]
    fn test_begin_closing_only_from_active() {
        // テスト項目: Closing への遷移は Active からのみ可能で、Closed は終端
        // given (前提条件):
        let (mut connection, endpoint) = Connection::open(user(1), 1);

        // when (操作):
        let first = endpoint.state.begin_closing();
        let second = endpoint.state.begin_closing();
        connection.close();
        let after_close = endpoint.state.begin_closing();

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(!after_close);
        assert_eq!(connection.state(), ConnectionState::Closed);
    }
}
