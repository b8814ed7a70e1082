//! Server configuration.

use std::{path::PathBuf, time::Duration};

use crate::admission::{AdmissionConfig, OriginGuard};

/// Default per-route quota for admission control.
pub const REQUESTS_PER_MINUTE: u32 = 30;

/// Runtime configuration for the Bookcycle server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests admitted per route within `rate_limit_window`.
    pub requests_per_window: u32,
    pub rate_limit_window: Duration,
    /// Upper bound on route keys tracked by the admission controller.
    pub rate_limit_max_keys: usize,
    /// Load-test mode: disables admission control and the cross-site check.
    pub load_test: bool,
    /// Capacity of each live connection's outbound queue.
    pub outbound_queue_capacity: usize,
    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_size: usize,
    /// Interval between keepalive pings.
    pub ping_period: Duration,
    /// How long a connection may stay silent before it is considered dead.
    pub pong_wait: Duration,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            requests_per_window: REQUESTS_PER_MINUTE,
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max_keys: 1000,
            load_test: false,
            outbound_queue_capacity: 256,
            max_message_size: 512,
            ping_period: Duration::from_secs(54),
            pong_wait: Duration::from_secs(60),
            static_dir: PathBuf::from("./static"),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn admission(&self) -> AdmissionConfig {
        AdmissionConfig {
            quota: self.requests_per_window,
            window: self.rate_limit_window,
            max_keys: self.rate_limit_max_keys,
            enabled: !self.load_test,
        }
    }

    pub fn origin_guard(&self) -> OriginGuard {
        OriginGuard::new(!self.load_test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_test_mode_disables_admission() {
        // テスト項目: 負荷試験モードではアドミッション制御と CSRF チェックが無効になる
        // given (前提条件):
        let config = ServerConfig {
            load_test: true,
            ..ServerConfig::default()
        };

        // when (操作):
        let admission = config.admission();

        // then (期待する結果):
        assert!(!admission.enabled);
        assert_eq!(admission.quota, REQUESTS_PER_MINUTE);
        assert!(!config.origin_guard().is_enabled());
        assert!(ServerConfig::default().origin_guard().is_enabled());
    }

    #[test]
    fn test_bind_addr() {
        // テスト項目: host と port からバインドアドレスが組み立てられる
        // given (前提条件):
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..ServerConfig::default()
        };

        // when / then:
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }
}
