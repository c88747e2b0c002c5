//! Mock server state
//!
//! Accounts, the current session and the request log.

use std::collections::BTreeMap;

use portal_protocol::{Role, UserSummary, ValidationRuleSet};

use crate::host::HttpRequest;

/// An account held by the mock server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockUser {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl MockUser {
    /// Row as served by the admin user list
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.to_string(),
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Complete mock server state
#[derive(Debug)]
pub struct MockState {
    /// Accounts by id
    pub users: BTreeMap<u64, MockUser>,
    next_id: u64,
    /// Id of the signed-in account, if any
    pub session: Option<u64>,
    /// Rule set served by `GET /validation-rules`
    pub rules: ValidationRuleSet,
    /// Every request received, in order
    pub requests: Vec<HttpRequest>,
}

impl MockState {
    pub fn new() -> Self {
        Self {
            users: BTreeMap::new(),
            next_id: 1,
            session: None,
            rules: ValidationRuleSet::default(),
            requests: Vec::new(),
        }
    }

    /// Create an account, returning its id
    pub fn add_user(&mut self, username: &str, password: &str, role: Role) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.users.insert(
            id,
            MockUser {
                id,
                username: username.to_string(),
                password: password.to_string(),
                role,
            },
        );
        id
    }

    pub fn find_by_username(&self, username: &str) -> Option<&MockUser> {
        self.users.values().find(|u| u.username == username)
    }

    /// The signed-in account, if the session still refers to one
    pub fn current_user(&self) -> Option<&MockUser> {
        self.session.and_then(|id| self.users.get(&id))
    }

    /// Remove an account; a session pointing at it ends too
    pub fn remove_user(&mut self, id: u64) -> Option<MockUser> {
        if self.session == Some(id) {
            self.session = None;
        }
        self.users.remove(&id)
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut state = MockState::new();
        assert_eq!(state.add_user("root", "pw", Role::Admin), 1);
        assert_eq!(state.add_user("bob", "pw", Role::Member), 2);
        assert_eq!(state.find_by_username("bob").unwrap().id, 2);
    }

    #[test]
    fn test_removing_signed_in_user_ends_session() {
        let mut state = MockState::new();
        let id = state.add_user("bob", "pw", Role::Member);
        state.session = Some(id);
        assert_eq!(state.current_user().unwrap().username, "bob");

        state.remove_user(id);
        assert!(state.session.is_none());
        assert!(state.current_user().is_none());
    }
}
