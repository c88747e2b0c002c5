//! Persisted Client State Tests
//!
//! The state file carries the admin edit draft and the session cookie from
//! one process to the next. Each test opens the file twice to stand in for
//! two consecutive CLI invocations.

use std::fs;
use std::sync::Arc;

use account_portal::host::http::{persist_cookies, restore_cookies};
use account_portal::host::{MockTransport, PortalClient, SESSION_COOKIE_KEY};
use account_portal::mock::{MockServer, RecordingUi};
use account_portal::pages::{admin, PageContext};
use account_portal::storage::{FileStore, KeyValueStore, StorageError};
use portal_protocol::Role;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use tempfile::TempDir;

fn portal_url() -> Url {
    Url::parse("http://127.0.0.1:8000/").unwrap()
}

// =============================================================================
// Admin edit draft
// =============================================================================

#[tokio::test]
async fn test_draft_survives_restart_and_is_consumed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("portal/state.json");

    let server = MockServer::new();
    server.seed_user("root", "rootpass1!", Role::Admin);
    let bob = server.seed_user("bob", "bobpass1!", Role::Member);
    server.login_as("root");

    {
        let ui = Arc::new(RecordingUi::new());
        let client = PortalClient::new(Arc::new(MockTransport::with_server(server.clone())));
        let ctx = PageContext::new(client, ui, Arc::new(FileStore::open(&path)));
        let form = admin::modify_form(&bob.to_string(), "role", "str", "manager");
        assert!(admin::modify(&ctx, &form).await.is_success());
    }
    assert!(path.exists());

    let store = FileStore::open(&path);
    let mut form = admin::modify_form(&bob.to_string(), "", "", "");
    assert!(admin::restore_draft(&store, &mut form).unwrap());
    assert_eq!(form.value("attr"), Some("role"));
    assert_eq!(form.value("attr_type"), Some("str"));
    assert_eq!(form.value("value"), Some("manager"));

    let reopened = FileStore::open(&path);
    let mut again = admin::modify_form(&bob.to_string(), "", "", "");
    assert!(!admin::restore_draft(&reopened, &mut again).unwrap());
}

#[test]
fn test_state_file_is_a_json_object() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("state.json"));
    store.set("admin.edit.attr", "username").unwrap();
    store.set(SESSION_COOKIE_KEY, "access_token=abc").unwrap();

    let raw = fs::read_to_string(store.path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["admin.edit.attr"], "username");
    assert_eq!(parsed[SESSION_COOKIE_KEY], "access_token=abc");
    assert!(!dir.path().join("state.json.tmp").exists());
}

#[test]
fn test_corrupt_state_file_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "not json").unwrap();

    let err = FileStore::open(&path).get("admin.edit.attr").unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));
}

// =============================================================================
// Session cookie
// =============================================================================

#[test]
fn test_session_cookie_shared_across_processes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    let first = Jar::default();
    first.add_cookie_str("access_token=tok123; Path=/; HttpOnly", &portal_url());
    persist_cookies(&first, &FileStore::open(&path), &portal_url()).unwrap();

    let second = Jar::default();
    restore_cookies(&second, &FileStore::open(&path), &portal_url()).unwrap();
    let header = second.cookies(&portal_url()).unwrap();
    assert_eq!(header.to_str().unwrap(), "access_token=tok123");
}

#[test]
fn test_cleared_session_removes_cookie() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("state.json"));
    store.set(SESSION_COOKIE_KEY, "access_token=old").unwrap();
    store.set("admin.edit.value", "manager").unwrap();

    persist_cookies(&Jar::default(), &store, &portal_url()).unwrap();

    assert_eq!(store.get(SESSION_COOKIE_KEY).unwrap(), None);
    assert_eq!(
        store.get("admin.edit.value").unwrap().as_deref(),
        Some("manager")
    );
}

#[test]
fn test_restore_without_saved_cookie_is_noop() {
    let dir = TempDir::new().unwrap();
    let jar = Jar::default();

    restore_cookies(&jar, &FileStore::open(dir.path().join("state.json")), &portal_url())
        .unwrap();

    assert!(jar.cookies(&portal_url()).is_none());
}
