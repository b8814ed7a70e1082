//! Hub control loop
//!
//! `Hub::spawn` で制御ループを起動し、以下の 2 つを返す:
//! - `HubHandle`: 接続のタスクや HTTP ハンドラに配る送信口（Clone 可）
//! - `HubTask`: 停止用のハンドル。`shutdown` するか drop すると制御ループが終了する
//!
//! register / unregister / submit は 1 本のチャネルに積まれ、送った順に処理される。
//! 制御ループは接続ごとの送信では決してブロックせず、永続化にも上限時間を設ける。

use std::{sync::Arc, time::Duration};

use bookcycle_shared::time::Clock;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::domain::{MessageRepository, Timestamp, UserId};

use super::{
    connection::{Connection, ConnectionId},
    registry::Registry,
    router::{RouteError, route_message},
};

/// 永続化 1 件あたりの上限時間の既定値
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);

/// 制御ループが処理するイベント
enum HubEvent {
    Register(Connection),
    Unregister(ConnectionId),
    /// `from` は送信元の接続の認証済みユーザー
    Submit { from: UserId, raw: Vec<u8> },
}

/// ハブへの送信口
///
/// どのメソッドも呼び出し側をブロックしない。ハブ停止後の呼び出しは無視される。
/// 同じ送信口から送ったイベントは送った順に処理される。
#[derive(Clone)]
pub struct HubHandle {
    events_tx: mpsc::UnboundedSender<HubEvent>,
}

impl HubHandle {
    /// 接続をライブ集合に加える
    pub fn register(&self, connection: Connection) {
        let id = connection.id();
        if self.events_tx.send(HubEvent::Register(connection)).is_err() {
            // 戻ってきた Connection はここで drop され、送信キューも閉じる
            tracing::warn!("Hub is stopped; dropping connection {}", id);
        }
    }

    /// 接続をライブ集合から外し、送信キューを閉じる
    pub fn unregister(&self, id: ConnectionId) {
        if self.events_tx.send(HubEvent::Unregister(id)).is_err() {
            tracing::debug!("Hub is stopped; ignoring unregister for {}", id);
        }
    }

    /// `from` の接続で受信した生のペイロードをルーティング待ちに積む
    pub fn submit(&self, from: UserId, raw: impl Into<Vec<u8>>) {
        let event = HubEvent::Submit {
            from,
            raw: raw.into(),
        };
        if self.events_tx.send(event).is_err() {
            tracing::warn!("Hub is stopped; dropping payload from user {}", from);
        }
    }
}

/// 制御ループの停止用ハンドル
pub struct HubTask {
    shutdown_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl HubTask {
    /// 制御ループを止め、全てのライブ接続の送信キューを閉じるまで待つ
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.join.await {
            tracing::error!("Hub control loop terminated abnormally: {}", e);
        }
    }
}

/// ライブ接続の集合を排他的に所有する制御ループ
pub struct Hub {
    registry: Registry,
    events_rx: mpsc::UnboundedReceiver<HubEvent>,
    shutdown_rx: oneshot::Receiver<()>,
    repository: Arc<dyn MessageRepository>,
    clock: Arc<dyn Clock>,
    persist_timeout: Duration,
}

impl Hub {
    /// 制御ループを tokio タスクとして起動する
    ///
    /// # Arguments
    ///
    /// * `repository` - メッセージの永続化先
    /// * `clock` - `created_at` を付与する時計
    pub fn spawn(
        repository: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
    ) -> (HubHandle, HubTask) {
        Self::spawn_with_persist_timeout(repository, clock, DEFAULT_PERSIST_TIMEOUT)
    }

    /// 永続化の上限時間を指定して起動する
    ///
    /// 上限を超えた永続化は諦めてログに残し、次のイベントへ進む。
    pub fn spawn_with_persist_timeout(
        repository: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
        persist_timeout: Duration,
    ) -> (HubHandle, HubTask) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let hub = Hub {
            registry: Registry::new(),
            events_rx,
            shutdown_rx,
            repository,
            clock,
            persist_timeout,
        };
        let join = tokio::spawn(hub.run());

        (HubHandle { events_tx }, HubTask { shutdown_tx, join })
    }

    async fn run(mut self) {
        tracing::info!("Hub control loop started");

        loop {
            tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => break,
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
            }
        }

        // 停止前に届いていた登録も閉じる対象に含める
        self.events_rx.close();
        while let Ok(event) = self.events_rx.try_recv() {
            if let HubEvent::Register(connection) = event {
                self.registry.register(connection);
            }
        }
        let closed = self.registry.close_all();
        tracing::info!("Hub control loop stopped; closed {} live connection(s)", closed);
    }

    async fn handle_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::Register(connection) => self.registry.register(connection),
            HubEvent::Unregister(id) => {
                self.registry.unregister(id);
            }
            HubEvent::Submit { from, raw } => self.handle_submit(from, raw).await,
        }
    }

    async fn handle_submit(&mut self, from: UserId, raw: Vec<u8>) {
        let now = Timestamp::new(self.clock.now_millis());

        let routed = match route_message(&mut self.registry, from, &raw, now) {
            Ok(routed) => routed,
            Err(RouteError::Malformed(e)) => {
                tracing::debug!("Dropping malformed payload: {}", e);
                return;
            }
            Err(e @ RouteError::SenderMismatch { .. }) => {
                tracing::warn!("Dropping message: {}", e);
                return;
            }
            Err(e) => {
                tracing::error!("Dropping message: {}", e);
                return;
            }
        };

        tracing::debug!(
            "Routed message {} -> {}: delivered={}, evicted={}, read={}",
            routed.message.sender_id,
            routed.message.receiver_id,
            routed.report.delivered,
            routed.report.evicted.len(),
            routed.message.read
        );

        let persist = self.repository.create(routed.message);
        match tokio::time::timeout(self.persist_timeout, persist).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("Failed to persist message: {}", e),
            Err(_) => tracing::error!(
                "Persisting message timed out after {:?}; message dropped",
                self.persist_timeout
            ),
        }
    }
}
