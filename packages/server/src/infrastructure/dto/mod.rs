//! Data Transfer Objects
//!
//! ドメインモデルと外部表現（JSON）を分離するための型。

pub mod conversion;
pub mod http;
pub mod websocket;

pub use conversion::{MessageDecodeError, decode_inbound_message, encode_message};
