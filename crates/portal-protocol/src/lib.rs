//! Account Portal Protocol Types
//!
//! Defines the JSON bodies and endpoint table for client↔server
//! communication with the account portal backend.

pub mod endpoint;
pub mod error;
pub mod rules;
pub mod user;

pub use endpoint::{admin_user_path, Endpoint, Method};
pub use error::{ErrorBody, ProtocolError};
pub use rules::{PasswordRules, UsernameRules, ValidationRuleSet};
pub use user::{
    AdminEdit, ApiMessage, AttrType, ChangePassword, Credentials, Role, SessionUser, UserList,
    UserSummary,
};

/// Content type declared on every request body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Location the client returns to after most successful actions.
pub const ROOT_PATH: &str = "/";
