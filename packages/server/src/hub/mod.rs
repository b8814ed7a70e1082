//! Real-time messaging hub
//!
//! 単一の制御ループ（`Hub`）がライブ接続の集合（`Registry`）を排他的に所有し、
//! 1 本のチャネルに積まれた register / unregister / submit のイベントを届いた順に処理します。
//! 他のタスクはチャネル経由でのみハブとやり取りするため、レジストリにロックは不要です。
//!
//! - `connection`: 1 本のライブ接続と、その送信キュー
//! - `registry`: ライブ接続の集合と配送
//! - `router`: デコード → 配送 → 既読判定の 1 パス
//! - `actor`: 制御ループと、外部に渡すハンドル

mod actor;
mod connection;
mod registry;
mod router;

pub use actor::{DEFAULT_PERSIST_TIMEOUT, Hub, HubHandle, HubTask};
pub use connection::{
    Connection, ConnectionEndpoint, ConnectionId, ConnectionState, DeliveryError, SharedState,
};
pub use registry::{DeliveryReport, Registry};
pub use router::{RouteError, RoutedMessage, route_message};
