//! Endpoint table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// HTTP methods used by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Returns the canonical upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Returns true if requests with this method carry a body.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(ProtocolError::UnknownMethod(other.to_string())),
        }
    }
}

/// REST endpoints exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET` the username/password rule set
    ValidationRules,
    /// `POST` credentials to start a session
    Login,
    /// `POST` credentials to create an account
    Register,
    /// `PUT` current and new password
    ChangePassword,
    /// `DELETE` the signed-in account
    DeleteAccount,
    /// `GET` list, `PUT` edit, `DELETE ?userid=` remove
    AdminUser,
    /// `GET` the current session's user
    Me,
    /// `POST` to end the session
    Logout,
}

impl Endpoint {
    /// Every endpoint, in routing order.
    pub const ALL: [Endpoint; 8] = [
        Endpoint::ValidationRules,
        Endpoint::Login,
        Endpoint::Register,
        Endpoint::ChangePassword,
        Endpoint::DeleteAccount,
        Endpoint::AdminUser,
        Endpoint::Me,
        Endpoint::Logout,
    ];

    /// Path relative to the server root.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::ValidationRules => "/validation-rules",
            Endpoint::Login => "/login",
            Endpoint::Register => "/register",
            Endpoint::ChangePassword => "/changepw",
            Endpoint::DeleteAccount => "/delete_account",
            Endpoint::AdminUser => "/admin/user",
            Endpoint::Me => "/me",
            Endpoint::Logout => "/logout",
        }
    }

    /// Resolve a request path (query string ignored) to an endpoint.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split('?').next().unwrap_or(path);
        Self::ALL.into_iter().find(|e| e.path() == path)
    }

    /// Methods the backend routes for this endpoint.
    pub fn methods(&self) -> &'static [Method] {
        match self {
            Endpoint::ValidationRules | Endpoint::Me => &[Method::Get],
            Endpoint::Login | Endpoint::Register | Endpoint::Logout => &[Method::Post],
            Endpoint::ChangePassword => &[Method::Put],
            Endpoint::DeleteAccount => &[Method::Delete],
            Endpoint::AdminUser => &[Method::Get, Method::Put, Method::Delete],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Path for deleting a single user from the admin panel.
pub fn admin_user_path(userid: &str) -> String {
    let encoded: String = userid
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect();
    format!("{}?userid={}", Endpoint::AdminUser.path(), encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_ignores_query() {
        assert_eq!(
            Endpoint::from_path("/admin/user?userid=7"),
            Some(Endpoint::AdminUser)
        );
        assert_eq!(Endpoint::from_path("/login"), Some(Endpoint::Login));
        assert_eq!(Endpoint::from_path("/nope"), None);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("put".parse::<Method>().unwrap(), Method::Put);
        assert!("PATCH".parse::<Method>().is_err());
        assert!(!Method::Get.carries_body());
        assert!(!Method::Delete.carries_body());
        assert!(Method::Put.carries_body());
    }

    #[test]
    fn test_admin_user_path_encodes_id() {
        assert_eq!(admin_user_path("42"), "/admin/user?userid=42");
        assert_eq!(admin_user_path("a b&c"), "/admin/user?userid=a%20b%26c");
    }

    #[test]
    fn test_change_password_is_put() {
        assert_eq!(Endpoint::ChangePassword.methods(), &[Method::Put]);
    }
}
