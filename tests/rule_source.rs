//! Rule Source Tests
//!
//! The validation rule set is fetched lazily, once, and shared by every
//! caller; a failed fetch is shared by the callers waiting on it and leaves
//! the source ready to try again.

use std::sync::Arc;
use std::time::Duration;

use account_portal::host::{MockTransport, PortalClient};
use account_portal::mock::{FailureConfig, MockServer};
use account_portal::rules::{RuleSource, RuleStatus, RulesError};
use account_portal::ErrorKind;
use portal_protocol::{Method, ValidationRuleSet};

const RULES_ROUTE: &str = "/validation-rules";

fn source(server: &MockServer) -> RuleSource {
    RuleSource::new(PortalClient::new(Arc::new(MockTransport::with_server(
        server.clone(),
    ))))
}

fn slow(config: FailureConfig, millis: u64) -> FailureConfig {
    FailureConfig {
        delay: Some(Duration::from_millis(millis)),
        ..config
    }
}

// =============================================================================
// Single flight
// =============================================================================

#[tokio::test]
async fn test_concurrent_callers_share_one_fetch() {
    let server = MockServer::new();
    server.inject_failure(
        Method::Get,
        RULES_ROUTE,
        FailureConfig::delay(Duration::from_millis(50)),
    );
    let rules = source(&server);

    let (a, b, c) = tokio::join!(rules.rules(), rules.rules(), rules.rules());

    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
    assert_eq!(*a, ValidationRuleSet::default());
    assert_eq!(server.request_count(Method::Get, RULES_ROUTE), 1);
    assert_eq!(rules.state(), RuleStatus::Ready);
}

#[tokio::test]
async fn test_state_is_fetching_while_in_flight() {
    let server = MockServer::new();
    server.inject_failure(
        Method::Get,
        RULES_ROUTE,
        FailureConfig::delay(Duration::from_millis(50)),
    );
    let rules = source(&server);
    assert_eq!(rules.state(), RuleStatus::Unset);

    let observe = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        rules.state()
    };
    let (fetched, during) = tokio::join!(rules.rules(), observe);

    assert!(fetched.is_ok());
    assert_eq!(during, RuleStatus::Fetching);
    assert_eq!(rules.state(), RuleStatus::Ready);
}

#[tokio::test]
async fn test_cached_after_first_fetch() {
    let server = MockServer::new();
    let rules = source(&server);

    rules.rules().await.unwrap();
    rules.rules().await.unwrap();

    assert_eq!(server.request_count(Method::Get, RULES_ROUTE), 1);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_waiters_share_a_failed_fetch() {
    let server = MockServer::new();
    server.inject_failure(Method::Get, RULES_ROUTE, slow(FailureConfig::transport(), 30));
    let rules = source(&server);

    let (first, second) = tokio::join!(rules.rules(), rules.rules());

    // Whichever caller ran the fetch sees its error; the other shares it.
    let errors = [first.unwrap_err(), second.unwrap_err()];
    let fetched = errors
        .iter()
        .filter(|e| matches!(e, RulesError::Fetch(_)))
        .count();
    assert_eq!(fetched, 1);
    let shared = errors
        .iter()
        .find(|e| matches!(e, RulesError::Shared(_)))
        .unwrap();
    assert_eq!(shared.kind(), ErrorKind::Transport);
    assert_eq!(server.request_count(Method::Get, RULES_ROUTE), 1);
    assert_eq!(rules.state(), RuleStatus::Unset);
}

#[tokio::test]
async fn test_failed_fetch_is_retried_later() {
    let server = MockServer::new();
    server.inject_failure(
        Method::Get,
        RULES_ROUTE,
        FailureConfig::status(500).with_fail_count(1),
    );
    let rules = source(&server);

    let err = rules.rules().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerRejection);
    assert_eq!(rules.state(), RuleStatus::Unset);

    assert!(rules.rules().await.is_ok());
    assert_eq!(rules.state(), RuleStatus::Ready);
    assert_eq!(server.request_count(Method::Get, RULES_ROUTE), 2);
}

#[tokio::test]
async fn test_abandoned_fetch_returns_to_unset() {
    let server = MockServer::new();
    server.inject_failure(
        Method::Get,
        RULES_ROUTE,
        FailureConfig::delay(Duration::from_millis(200)),
    );
    let rules = source(&server);

    let cut_short = tokio::time::timeout(Duration::from_millis(10), rules.rules()).await;
    assert!(cut_short.is_err());
    assert_eq!(rules.state(), RuleStatus::Unset);

    server.clear_failures();
    assert!(rules.rules().await.is_ok());
}

#[tokio::test]
async fn test_served_rules_are_used() {
    let server = MockServer::new();
    let mut served = ValidationRuleSet::default();
    served.username.min_length = 5;
    served.password.require_special_chars = false;
    server.set_rules(served.clone());
    let rules = source(&server);

    assert_eq!(*rules.rules().await.unwrap(), served);
}
