//! Logging setup utilities for the Bookcycle binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled at the default level.
const LOGGED_CRATES: [&str; 3] = ["bookcycle_server", "bookcycle_shared", "tower_http"];

/// Build the default filter directive string.
///
/// `bookcycle-server` style binary names are normalized to their target
/// form (`bookcycle_server`), matching how `tracing` names module targets.
pub fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut directives: Vec<String> = LOGGED_CRATES
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect();
    if !LOGGED_CRATES.contains(&binary_target.as_str()) {
        directives.push(format!("{}={}", binary_target, default_log_level));
    }
    directives.join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "bookcycle-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use bookcycle_shared::logger::setup_logger;
///
/// setup_logger("bookcycle-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_includes_binary_target() {
        // テスト項目: バイナリ名がターゲット形式に正規化されてフィルタに含まれる
        // given (前提条件):
        let binary_name = "load-tester";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert!(filter.contains("bookcycle_server=debug"));
        assert!(filter.contains("tower_http=debug"));
        assert!(filter.ends_with("load_tester=debug"));
    }

    #[test]
    fn test_default_filter_does_not_duplicate_server_target() {
        // テスト項目: サーバーバイナリ名はライブラリのターゲットと重複しない
        // given (前提条件):
        let binary_name = "bookcycle-server";

        // when (操作):
        let filter = default_filter(binary_name, "info");

        // then (期待する結果):
        assert_eq!(filter.matches("bookcycle_server=info").count(), 1);
    }
}
