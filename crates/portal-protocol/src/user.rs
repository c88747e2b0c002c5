//! Account and admin request/response bodies.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Body of `POST /login` and `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of `PUT /changepw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Member,
    /// Any role this client does not know about
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the admin user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Integer ids and UUIDs both arrive here as text.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Body of `GET /admin/user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserList {
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

/// Body of `GET /me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Member
}

/// Declared type of the value in an admin edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    Bool,
    Int,
    Str,
}

impl AttrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrType::Bool => "bool",
            AttrType::Int => "int",
            AttrType::Str => "str",
        }
    }

    /// Convert the raw form value into the JSON value the backend stores.
    ///
    /// Booleans follow the backend: `true`/`1` (any case) are true, anything
    /// else is false.
    pub fn coerce(&self, raw: &str) -> Result<Value, ProtocolError> {
        match self {
            AttrType::Bool => Ok(Value::Bool(matches!(
                raw.to_ascii_lowercase().as_str(),
                "true" | "1"
            ))),
            AttrType::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| ProtocolError::InvalidValue {
                    attr_type: "int",
                    value: raw.to_string(),
                }),
            AttrType::Str => Ok(Value::String(raw.to_string())),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttrType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bool" => Ok(AttrType::Bool),
            "int" => Ok(AttrType::Int),
            "str" => Ok(AttrType::Str),
            other => Err(ProtocolError::UnknownAttrType(other.to_string())),
        }
    }
}

/// Body of `PUT /admin/user`: an attribute-type-tagged update of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminEdit {
    pub userid: String,
    pub attr: String,
    pub attr_type: AttrType,
    pub value: String,
}

/// Success body most mutation endpoints answer with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub status: String,
    pub message: String,
}

impl ApiMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "user id must be a string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_list_accepts_numeric_and_uuid_ids() {
        let json = r#"{"users": [
            {"id": 1, "username": "root", "role": "admin"},
            {"id": "2c1f7c1e-8a1b-4c7e-9d7e-0b3b9f1f2a10", "username": "bob", "role": "member"}
        ]}"#;

        let list: UserList = serde_json::from_str(json).unwrap();
        assert_eq!(list.users[0].id, "1");
        assert_eq!(list.users[0].role, Role::Admin);
        assert_eq!(list.users[1].id, "2c1f7c1e-8a1b-4c7e-9d7e-0b3b9f1f2a10");
    }

    #[test]
    fn test_unknown_role() {
        let user: SessionUser =
            serde_json::from_str(r#"{"username": "x", "role": "auditor"}"#).unwrap();
        assert_eq!(user.role, Role::Unknown);
    }

    #[test]
    fn test_change_password_wire_names() {
        let body = ChangePassword {
            current_password: "old".to_string(),
            new_password: "new".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["currentPassword"], "old");
        assert_eq!(json["newPassword"], "new");
    }

    #[test]
    fn test_attr_type_coerce() {
        assert_eq!(AttrType::Bool.coerce("TRUE").unwrap(), Value::Bool(true));
        assert_eq!(AttrType::Bool.coerce("yes").unwrap(), Value::Bool(false));
        assert_eq!(AttrType::Int.coerce(" 12 ").unwrap(), Value::from(12));
        assert!(AttrType::Int.coerce("twelve").is_err());
        assert_eq!(AttrType::Str.coerce("a b").unwrap(), Value::from("a b"));
    }

    #[test]
    fn test_admin_edit_wire_shape() {
        let edit = AdminEdit {
            userid: "3".to_string(),
            attr: "role".to_string(),
            attr_type: "str".parse().unwrap(),
            value: "manager".to_string(),
        };
        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(json["attr_type"], "str");
        assert_eq!(json["userid"], "3");
    }
}
