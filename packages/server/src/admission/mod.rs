//! Admission control (per-route rate limiting)
//!
//! CRUD ルートの手前で、ルート（パス）ごとに固定ウィンドウ内のリクエスト数を数え、
//! 上限を超えたリクエストをハンドラに届く前に `429 Too Many Requests` で拒否します。
//! 状態を変更するリクエストは同一オリジンからのものだけを通します（CSRF 対策）。
//! 負荷試験モードではどちらも無効化され、カウントも行いません。

mod controller;
mod middleware;
mod origin;

pub use controller::{AdmissionConfig, AdmissionController, AdmissionDecision};
pub use middleware::admit_request;
pub use origin::{OriginGuard, is_same_origin, verify_origin};
