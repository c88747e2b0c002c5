//! Validation rule source
//!
//! Fetches the rule set from `GET /validation-rules` at most once per
//! source and hands out the cached copy afterwards.
//!
//! State machine: `Unset -> Fetching -> Ready`. A failed fetch returns to
//! `Unset`, so the next caller tries again. Callers arriving while a fetch
//! is in flight wait for it and share its outcome.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{info, warn};

use portal_protocol::ValidationRuleSet;

use crate::host::{ClientError, ErrorKind, PortalClient};

/// Notice shown when validation cannot run for lack of rules
pub const RULES_UNAVAILABLE: &str = "Validation rules are unavailable. Please try again later.";

/// Observable phase of a [`RuleSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStatus {
    Unset,
    Fetching,
    Ready,
}

/// Rule fetch errors
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// This caller's fetch failed
    #[error("validation rules unavailable: {0}")]
    Fetch(#[from] ClientError),

    /// The fetch this caller waited on failed
    #[error("validation rules unavailable: {0}")]
    Shared(String),
}

impl RulesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RulesError::Fetch(e) => e.kind(),
            RulesError::Shared(_) => ErrorKind::Transport,
        }
    }
}

enum Phase {
    Unset,
    Fetching,
    Ready(Arc<ValidationRuleSet>),
}

struct Inner {
    phase: Phase,
    /// Completed failed fetches
    failures: u64,
    last_error: Option<String>,
}

/// Lazily fetched, cached rule set
pub struct RuleSource {
    client: PortalClient,
    inner: Mutex<Inner>,
    settled: Notify,
}

impl RuleSource {
    pub fn new(client: PortalClient) -> Self {
        Self {
            client,
            inner: Mutex::new(Inner {
                phase: Phase::Unset,
                failures: 0,
                last_error: None,
            }),
            settled: Notify::new(),
        }
    }

    /// A source that is already `Ready` and never touches the network
    pub fn preloaded(client: PortalClient, rules: ValidationRuleSet) -> Self {
        let source = Self::new(client);
        source.lock().phase = Phase::Ready(Arc::new(rules));
        source
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> RuleStatus {
        match self.lock().phase {
            Phase::Unset => RuleStatus::Unset,
            Phase::Fetching => RuleStatus::Fetching,
            Phase::Ready(_) => RuleStatus::Ready,
        }
    }

    /// The rule set, fetching it on first use
    pub async fn rules(&self) -> Result<Arc<ValidationRuleSet>, RulesError> {
        loop {
            let (settled, seen_failures) = {
                let mut inner = self.lock();
                if let Phase::Ready(rules) = &inner.phase {
                    return Ok(rules.clone());
                }
                if matches!(inner.phase, Phase::Unset) {
                    inner.phase = Phase::Fetching;
                    break;
                }
                // Registered under the lock so the settle cannot be missed.
                (self.settled.notified(), inner.failures)
            };
            settled.await;

            let inner = self.lock();
            if matches!(inner.phase, Phase::Unset) && inner.failures > seen_failures {
                return Err(RulesError::Shared(
                    inner.last_error.clone().unwrap_or_default(),
                ));
            }
        }

        let guard = FetchGuard {
            source: self,
            settled: false,
        };
        info!("fetching validation rules");
        match self.client.validation_rules().await {
            Ok(rules) => {
                let rules = Arc::new(rules);
                guard.settle(Phase::Ready(rules.clone()), None);
                Ok(rules)
            }
            Err(e) => {
                warn!(error = %e, "validation rules fetch failed");
                guard.settle(Phase::Unset, Some(e.to_string()));
                Err(RulesError::Fetch(e))
            }
        }
    }
}

/// Owns the `Fetching` phase; dropping it unsettled returns the source to `Unset`
struct FetchGuard<'a> {
    source: &'a RuleSource,
    settled: bool,
}

impl FetchGuard<'_> {
    fn settle(mut self, phase: Phase, error: Option<String>) {
        self.publish(phase, error);
        self.settled = true;
    }

    fn publish(&self, phase: Phase, error: Option<String>) {
        {
            let mut inner = self.source.lock();
            inner.phase = phase;
            if let Some(error) = error {
                inner.failures += 1;
                inner.last_error = Some(error);
            }
        }
        self.source.settled.notify_waiters();
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.publish(Phase::Unset, Some("rule fetch abandoned".to_string()));
        }
    }
}
