//! Failure injection for the mock server
//!
//! Failures are keyed by method and route (path without query string).

use std::collections::HashMap;
use std::time::Duration;

use portal_protocol::Method;

/// What an injected failure does to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureMode {
    /// Answer with this status and an optional `detail` error body
    Status { status: u16, detail: Option<String> },
    /// Fail the exchange at the transport level
    Transport,
    /// Serve normally after a pause
    Delay,
}

/// Failure configuration for a route
#[derive(Debug, Clone)]
pub struct FailureConfig {
    pub mode: FailureMode,
    /// Delay to add before responding
    pub delay: Option<Duration>,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Answer with a status code
    pub fn status(status: u16) -> Self {
        Self {
            mode: FailureMode::Status {
                status,
                detail: None,
            },
            delay: None,
            fail_count: None,
        }
    }

    /// Answer with a status code and `{"detail": ...}` body
    pub fn status_with_detail(status: u16, detail: impl Into<String>) -> Self {
        Self {
            mode: FailureMode::Status {
                status,
                detail: Some(detail.into()),
            },
            delay: None,
            fail_count: None,
        }
    }

    /// Fail without a response
    pub fn transport() -> Self {
        Self {
            mode: FailureMode::Transport,
            delay: None,
            fail_count: None,
        }
    }

    /// Respond normally after `duration`
    pub fn delay(duration: Duration) -> Self {
        Self {
            mode: FailureMode::Delay,
            delay: Some(duration),
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

type RouteKey = (Method, String);

/// Failure injector for the mock server
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<RouteKey, FailureConfig>,
    /// Call counts per route (for fail_count tracking)
    call_counts: HashMap<RouteKey, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for a route
    pub fn inject(&mut self, method: Method, route: &str, config: FailureConfig) {
        let key = (method, route.to_string());
        self.call_counts.insert(key.clone(), 0);
        self.configs.insert(key, config);
    }

    /// Clear all failure injections
    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Clear the injection for one route
    pub fn clear_route(&mut self, method: Method, route: &str) {
        let key = (method, route.to_string());
        self.configs.remove(&key);
        self.call_counts.remove(&key);
    }

    /// Count a call and return the failure that applies to it, if any
    pub fn check(&mut self, method: Method, route: &str) -> Option<FailureConfig> {
        let key = (method, route.to_string());
        let config = self.configs.get(&key)?;
        let count = self.call_counts.entry(key).or_insert(0);
        *count += 1;

        match config.fail_count {
            Some(limit) if *count > limit => None,
            _ => Some(config.clone()),
        }
    }
}
