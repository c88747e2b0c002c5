//! Mock portal backend
//!
//! Serves every portal endpoint from in-memory state, with the status codes
//! and error bodies the real backend uses.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use portal_protocol::{
    AdminEdit, ApiMessage, AttrType, ChangePassword, Credentials, Endpoint, ErrorBody, Method,
    Role, SessionUser, UserList, ValidationRuleSet,
};
use portal_validation::{validate_password, validate_user_credentials};

use super::failure::{FailureConfig, FailureInjector, FailureMode};
use super::state::{MockState, MockUser};
use crate::host::{HttpRequest, HttpResponse, TransportError};

/// Attributes the admin edit endpoint refuses to touch
const PROTECTED_ATTRS: &[&str] = &["id", "password"];

/// Attributes the admin edit endpoint accepts
const EDITABLE_ATTRS: &[&str] = &["username", "role"];

/// In-process portal backend. Clones share state.
#[derive(Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<FailureInjector>>,
}

impl MockServer {
    /// Create a server with no accounts and the default rule set
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn failures(&self) -> MutexGuard<'_, FailureInjector> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Test configuration ===

    /// Create an account, returning its id
    pub fn seed_user(&self, username: &str, password: &str, role: Role) -> u64 {
        self.state().add_user(username, password, role)
    }

    /// Start a session for an existing account
    pub fn login_as(&self, username: &str) -> bool {
        let mut state = self.state();
        let id = state.find_by_username(username).map(|u| u.id);
        state.session = id;
        id.is_some()
    }

    /// Replace the served rule set
    pub fn set_rules(&self, rules: ValidationRuleSet) {
        self.state().rules = rules;
    }

    /// Inject a failure for a route
    pub fn inject_failure(&self, method: Method, route: &str, config: FailureConfig) {
        self.failures().inject(method, route, config);
    }

    /// Answer every request to a route with `status` and an empty body
    pub fn inject_status(&self, method: Method, route: &str, status: u16) {
        self.inject_failure(method, route, FailureConfig::status(status));
    }

    /// Fail every request to a route without a response
    pub fn inject_transport_failure(&self, method: Method, route: &str) {
        self.inject_failure(method, route, FailureConfig::transport());
    }

    pub fn clear_failures(&self) {
        self.failures().clear();
    }

    // === Inspection ===

    /// Every request received so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().requests.clone()
    }

    /// Number of requests received for a method and route
    pub fn request_count(&self, method: Method, route: &str) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|r| r.method == method && r.route() == route)
            .count()
    }

    /// Accounts, ordered by id
    pub fn users(&self) -> Vec<MockUser> {
        self.state().users.values().cloned().collect()
    }

    pub fn find_user(&self, username: &str) -> Option<MockUser> {
        self.state().find_by_username(username).cloned()
    }

    /// Account the session belongs to
    pub fn session_user(&self) -> Option<MockUser> {
        self.state().current_user().cloned()
    }

    // === Request handling ===

    /// Serve one request
    pub async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let failure = {
            self.state().requests.push(request.clone());
            self.failures().check(request.method, request.route())
        };

        if let Some(failure) = failure {
            if let Some(delay) = failure.delay {
                tokio::time::sleep(delay).await;
            }
            match failure.mode {
                FailureMode::Transport => {
                    return Err(TransportError::ConnectionFailed(format!(
                        "injected failure for {} {}",
                        request.method,
                        request.route()
                    )))
                }
                FailureMode::Status { status, detail } => {
                    return Ok(match detail {
                        Some(detail) => error(status, detail),
                        None => HttpResponse::new(status, ""),
                    })
                }
                FailureMode::Delay => {}
            }
        }

        let response = self.route(&request);
        debug!(method = %request.method, path = %request.path, status = response.status, "mock served");
        Ok(response)
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        let Some(endpoint) = Endpoint::from_path(&request.path) else {
            return error(404, "Not Found");
        };
        if !endpoint.methods().contains(&request.method) {
            return error(405, "Method Not Allowed");
        }

        let mut state = self.state();
        match (endpoint, request.method) {
            (Endpoint::ValidationRules, _) => HttpResponse::json_body(200, &state.rules),
            (Endpoint::Login, _) => login(&mut state, request),
            (Endpoint::Register, _) => register(&mut state, request),
            (Endpoint::ChangePassword, _) => change_password(&mut state, request),
            (Endpoint::DeleteAccount, _) => delete_account(&mut state),
            (Endpoint::Me, _) => match state.current_user() {
                Some(user) => HttpResponse::json_body(
                    200,
                    &SessionUser {
                        username: user.username.clone(),
                        role: user.role,
                    },
                ),
                None => error(401, "Please login"),
            },
            (Endpoint::Logout, _) => {
                state.session = None;
                HttpResponse::json_body(200, &ApiMessage::success("Logout successful"))
            }
            (Endpoint::AdminUser, method) => {
                if let Err(denied) = require_admin(&state) {
                    return denied;
                }
                match method {
                    Method::Get => HttpResponse::json_body(
                        200,
                        &UserList {
                            users: state.users.values().map(MockUser::summary).collect(),
                        },
                    ),
                    Method::Put => admin_modify(&mut state, request),
                    _ => admin_delete(&mut state, request),
                }
            }
        }
    }
}

fn login(state: &mut MockState, request: &HttpRequest) -> HttpResponse {
    let creds: Credentials = match body(request) {
        Ok(c) => c,
        Err(response) => return response,
    };
    let id = state
        .find_by_username(&creds.username)
        .filter(|u| u.password == creds.password)
        .map(|u| u.id);

    match id {
        Some(id) => {
            state.session = Some(id);
            HttpResponse::json_body(200, &ApiMessage::success("Login successful"))
        }
        None => error(400, "Invalid username or password"),
    }
}

fn register(state: &mut MockState, request: &HttpRequest) -> HttpResponse {
    let creds: Credentials = match body(request) {
        Ok(c) => c,
        Err(response) => return response,
    };
    if state.find_by_username(&creds.username).is_some() {
        return error(400, "Username already exists");
    }
    if let Err(reasons) = validate_user_credentials(&creds.username, &creds.password, &state.rules)
    {
        let joined: Vec<String> = reasons.iter().map(ToString::to_string).collect();
        return error(400, joined.join("; "));
    }

    let id = state.add_user(&creds.username, &creds.password, Role::Member);
    state.session = Some(id);
    HttpResponse::json_body(201, &ApiMessage::success("User created successfully"))
}

fn change_password(state: &mut MockState, request: &HttpRequest) -> HttpResponse {
    let Some(id) = state.current_user().map(|u| u.id) else {
        return error(401, "Please login");
    };
    let change: ChangePassword = match body(request) {
        Ok(c) => c,
        Err(response) => return response,
    };
    if let Err(reason) = validate_password(&change.new_password, &state.rules) {
        return error(400, reason.to_string());
    }

    match state.users.get_mut(&id) {
        Some(user) if user.password == change.current_password => {
            user.password = change.new_password;
            HttpResponse::json_body(200, &ApiMessage::success("Password changed successfully"))
        }
        Some(_) => error(400, "Current password is incorrect"),
        None => error(400, "User not found"),
    }
}

fn delete_account(state: &mut MockState) -> HttpResponse {
    match state.current_user().map(|u| u.id) {
        Some(id) => {
            state.remove_user(id);
            HttpResponse::json_body(200, &ApiMessage::success("Account deleted successfully"))
        }
        None => error(401, "Please login"),
    }
}

fn require_admin(state: &MockState) -> Result<(), HttpResponse> {
    match state.current_user() {
        None => Err(error(401, "Please login")),
        Some(user) if user.role != Role::Admin => Err(error(403, "You are not admin")),
        Some(_) => Ok(()),
    }
}

fn admin_modify(state: &mut MockState, request: &HttpRequest) -> HttpResponse {
    let edit: AdminEdit = match body(request) {
        Ok(e) => e,
        Err(response) => return response,
    };

    if PROTECTED_ATTRS.contains(&edit.attr.as_str()) {
        return field_error(format!(
            "Value error, Attribute '{}' is protected and cannot be modified.",
            edit.attr
        ));
    }
    if !EDITABLE_ATTRS.contains(&edit.attr.as_str()) {
        return field_error(format!(
            "Value error, Invalid attribute '{}'. Must be one of {:?}.",
            edit.attr, EDITABLE_ATTRS
        ));
    }
    let value = match edit.attr_type.coerce(&edit.value) {
        Ok(v) => v,
        Err(e) => return field_error(format!("Value error, {}", e)),
    };
    let Ok(id) = edit.userid.parse::<u64>() else {
        return error(404, "User not found");
    };

    let duplicate = edit.attr == "username"
        && state
            .find_by_username(&edit.value)
            .map(|u| u.id != id)
            .unwrap_or(false);
    let Some(user) = state.users.get_mut(&id) else {
        return error(404, "User not found");
    };

    match (edit.attr.as_str(), edit.attr_type, value) {
        ("username", AttrType::Str, Value::String(name)) => {
            if duplicate {
                return error(400, "Username already exists");
            }
            user.username = name;
        }
        ("role", AttrType::Str, role) => match serde_json::from_value::<Role>(role) {
            Ok(role) if role != Role::Unknown => user.role = role,
            _ => return error(400, format!("Invalid role '{}'", edit.value)),
        },
        (attr, attr_type, _) => {
            return error(
                400,
                format!("Attribute '{}' cannot be set from type '{}'", attr, attr_type),
            )
        }
    }

    HttpResponse::json_body(
        200,
        &ApiMessage::success(format!(
            "User {} updated successfully with {} = {}",
            edit.userid, edit.attr, edit.value
        )),
    )
}

fn admin_delete(state: &mut MockState, request: &HttpRequest) -> HttpResponse {
    let Some(raw) = request.query_param("userid") else {
        return field_error("Field required: userid".to_string());
    };
    let removed = raw.parse::<u64>().ok().and_then(|id| state.remove_user(id));
    match removed {
        Some(_) => HttpResponse::json_body(
            200,
            &ApiMessage::success(format!("User {} deleted successfully", raw)),
        ),
        None => error(404, "User not found"),
    }
}

fn body<T: DeserializeOwned>(request: &HttpRequest) -> Result<T, HttpResponse> {
    request
        .json()
        .map_err(|e| field_error(format!("Invalid request body: {}", e)))
}

fn error(status: u16, detail: impl Into<String>) -> HttpResponse {
    HttpResponse::json_body(status, &ErrorBody::detail(detail))
}

/// 422 with a list-shaped `detail`, as request validation failures are reported
fn field_error(msg: String) -> HttpResponse {
    HttpResponse::json_body(
        422,
        &json!({"detail": [{"loc": ["body"], "msg": msg, "type": "value_error"}]}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(path: &str, body: Value) -> HttpRequest {
        HttpRequest::new(Method::Post, path).with_json(&body).unwrap()
    }

    #[tokio::test]
    async fn test_register_then_me() {
        let server = MockServer::new();
        let response = server
            .handle(post("/register", json!({"username": "new-user", "password": "abcdef1!"})))
            .await
            .unwrap();
        assert_eq!(response.status, 201);

        let me = server
            .handle(HttpRequest::new(Method::Get, "/me"))
            .await
            .unwrap();
        let user: SessionUser = me.json().unwrap();
        assert_eq!(user.username, "new-user");
        assert_eq!(user.role, Role::Member);
    }

    #[tokio::test]
    async fn test_register_duplicate_and_weak_password() {
        let server = MockServer::new();
        server.seed_user("taken", "abcdef1!", Role::Member);

        let dup = server
            .handle(post("/register", json!({"username": "taken", "password": "abcdef1!"})))
            .await
            .unwrap();
        assert_eq!(dup.status, 400);
        assert_eq!(dup.error_message().as_deref(), Some("Username already exists"));

        let weak = server
            .handle(post("/register", json!({"username": "fresh", "password": "abcdefgh"})))
            .await
            .unwrap();
        assert_eq!(weak.status, 400);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let server = MockServer::new();
        server.seed_user("bob", "abcdef1!", Role::Member);

        let response = server
            .handle(post("/login", json!({"username": "bob", "password": "nope"})))
            .await
            .unwrap();
        assert_eq!(response.status, 400);
        assert!(server.session_user().is_none());
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin() {
        let server = MockServer::new();
        server.seed_user("bob", "abcdef1!", Role::Member);

        let anon = server
            .handle(HttpRequest::new(Method::Get, "/admin/user"))
            .await
            .unwrap();
        assert_eq!(anon.status, 401);

        server.login_as("bob");
        let member = server
            .handle(HttpRequest::new(Method::Get, "/admin/user"))
            .await
            .unwrap();
        assert_eq!(member.status, 403);
    }

    #[tokio::test]
    async fn test_admin_modify_protected_attr() {
        let server = MockServer::new();
        server.seed_user("root", "abcdef1!", Role::Admin);
        let bob = server.seed_user("bob", "abcdef1!", Role::Member);
        server.login_as("root");

        let edit = AdminEdit {
            userid: bob.to_string(),
            attr: "password".to_string(),
            attr_type: AttrType::Str,
            value: "x".to_string(),
        };
        let request = HttpRequest::new(Method::Put, "/admin/user")
            .with_json(&edit)
            .unwrap();
        let response = server.handle(request).await.unwrap();

        assert_eq!(response.status, 422);
        assert!(response.error_message().unwrap().contains("protected"));
    }

    #[tokio::test]
    async fn test_admin_modify_role() {
        let server = MockServer::new();
        server.seed_user("root", "abcdef1!", Role::Admin);
        let bob = server.seed_user("bob", "abcdef1!", Role::Member);
        server.login_as("root");

        let edit = AdminEdit {
            userid: bob.to_string(),
            attr: "role".to_string(),
            attr_type: AttrType::Str,
            value: "manager".to_string(),
        };
        let request = HttpRequest::new(Method::Put, "/admin/user")
            .with_json(&edit)
            .unwrap();
        assert_eq!(server.handle(request).await.unwrap().status, 200);
        assert_eq!(server.find_user("bob").unwrap().role, Role::Manager);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let server = MockServer::new();
        server.inject_transport_failure(Method::Get, "/me");
        assert!(server
            .handle(HttpRequest::new(Method::Get, "/me"))
            .await
            .is_err());

        server.clear_failures();
        server.inject_failure(
            Method::Get,
            "/me",
            FailureConfig::status_with_detail(503, "maintenance"),
        );
        let response = server
            .handle(HttpRequest::new(Method::Get, "/me"))
            .await
            .unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.error_message().as_deref(), Some("maintenance"));
        assert_eq!(server.request_count(Method::Get, "/me"), 2);
    }

    #[tokio::test]
    async fn test_unknown_route_and_method() {
        let server = MockServer::new();
        let missing = server
            .handle(HttpRequest::new(Method::Get, "/nope"))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);

        let wrong = server
            .handle(HttpRequest::new(Method::Post, "/changepw"))
            .await
            .unwrap();
        assert_eq!(wrong.status, 405);
    }
}
