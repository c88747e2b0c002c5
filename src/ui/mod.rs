//! User interface surface
//!
//! Everything the portal shows or asks goes through [`Ui`]. The terminal
//! implementation lives in [`terminal`]; tests use
//! [`RecordingUi`](crate::mock::RecordingUi).

mod terminal;

pub use terminal::TerminalUi;

use portal_protocol::{Role, SessionUser, UserSummary};
use serde::Serialize;

/// Session header state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionView {
    /// No session: show the login/register links
    Anonymous,
    /// Signed in: show the username and the links the role unlocks
    SignedIn {
        user: SessionUser,
        show_admin_links: bool,
        show_manager_links: bool,
    },
}

impl SessionView {
    /// Header for a signed-in user
    pub fn signed_in(user: SessionUser) -> Self {
        let show_admin_links = user.role == Role::Admin;
        let show_manager_links = user.role == Role::Manager;
        SessionView::SignedIn {
            user,
            show_admin_links,
            show_manager_links,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            SessionView::Anonymous => None,
            SessionView::SignedIn { user, .. } => Some(&user.username),
        }
    }
}

/// Output surface for page controllers
pub trait Ui: Send + Sync {
    /// Show a blocking message to the user
    fn notice(&self, message: &str);

    /// Move to another page
    fn navigate(&self, path: &str);

    /// Ask a yes/no question
    fn confirm(&self, prompt: &str) -> bool;

    /// Replace the admin user list
    fn render_users(&self, users: &[UserSummary]);

    /// Replace the session header
    fn render_session(&self, session: &SessionView);
}
