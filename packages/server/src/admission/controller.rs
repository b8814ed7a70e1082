//! Fixed-window admission counter keyed by route.

use std::{collections::HashMap, sync::Arc, time::Duration};

use bookcycle_shared::time::Clock;
use tokio::sync::Mutex;

/// Admission controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// Requests admitted per route within one window.
    pub quota: u32,
    /// Window length.
    pub window: Duration,
    /// Upper bound on tracked route keys.
    pub max_keys: usize,
    /// `false` in load-test mode: every request is admitted without bookkeeping.
    pub enabled: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            quota: crate::config::REQUESTS_PER_MINUTE,
            window: Duration::from_secs(60),
            max_keys: 1000,
            enabled: true,
        }
    }
}

/// Outcome of counting one request against its route's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window rolls over.
    pub reset_after: Duration,
}

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    count: u32,
    started_at: i64,
}

/// Per-route request counter.
///
/// Counters live behind a single mutex so that concurrent requests to the
/// same route never lose an increment.
pub struct AdmissionController {
    config: AdmissionConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, WindowCounter>>,
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Count a request for `route` and report whether it may proceed.
    pub async fn admit(&self, route: &str) -> bool {
        self.decide(route).await.is_none_or(|decision| decision.allowed)
    }

    /// Count a request for `route`.
    ///
    /// Returns `None` when the controller is disabled.
    pub async fn decide(&self, route: &str) -> Option<AdmissionDecision> {
        if !self.config.enabled {
            return None;
        }

        let now = self.clock.now_millis();
        let window_millis = self.window_millis();
        let mut windows = self.windows.lock().await;

        if !windows.contains_key(route) && windows.len() >= self.config.max_keys.max(1) {
            Self::evict(&mut windows, now, window_millis);
        }

        let counter = windows
            .entry(route.to_string())
            .or_insert(WindowCounter {
                count: 0,
                started_at: now,
            });
        if now - counter.started_at >= window_millis {
            counter.count = 0;
            counter.started_at = now;
        }
        counter.count = counter.count.saturating_add(1);

        let elapsed = (now - counter.started_at).max(0);
        let reset_after = Duration::from_millis((window_millis - elapsed).max(0) as u64);

        Some(AdmissionDecision {
            allowed: counter.count <= self.config.quota,
            limit: self.config.quota,
            remaining: self.config.quota.saturating_sub(counter.count),
            reset_after,
        })
    }

    /// Number of route keys currently tracked.
    pub async fn tracked_routes(&self) -> usize {
        self.windows.lock().await.len()
    }

    fn window_millis(&self) -> i64 {
        i64::try_from(self.config.window.as_millis()).unwrap_or(i64::MAX)
    }

    /// Drop expired windows; if none expired, drop the oldest one.
    fn evict(windows: &mut HashMap<String, WindowCounter>, now: i64, window_millis: i64) {
        let before = windows.len();
        windows.retain(|_, counter| now - counter.started_at < window_millis);
        if windows.len() < before {
            return;
        }

        let oldest = windows
            .iter()
            .min_by_key(|(_, counter)| counter.started_at)
            .map(|(route, _)| route.clone());
        if let Some(route) = oldest {
            tracing::debug!("Admission store full; evicting window for '{}'", route);
            windows.remove(&route);
        }
    }
}
