//! Infrastructure layer
//!
//! - `dto`: ワイヤーフォーマット（WebSocket / HTTP JSON）と変換
//! - `repository`: Repository trait の具体的な実装
//! - `session`: SessionStore trait の具体的な実装

pub mod dto;
pub mod repository;
pub mod session;
