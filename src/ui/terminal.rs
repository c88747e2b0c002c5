//! Terminal front-end

use std::io::{self, BufRead, Write};

use portal_protocol::UserSummary;
use serde_json::json;
use tracing::info;

use super::{SessionView, Ui};

/// Ui that writes to stdout and reads confirmations from stdin
#[derive(Debug, Clone, Default)]
pub struct TerminalUi {
    /// Emit one JSON object per line instead of prose
    pub json: bool,
    /// Answer every confirmation with yes
    pub assume_yes: bool,
}

impl TerminalUi {
    pub fn new(json: bool, assume_yes: bool) -> Self {
        Self { json, assume_yes }
    }

    fn emit(&self, value: serde_json::Value) {
        println!("{}", value);
    }
}

impl Ui for TerminalUi {
    fn notice(&self, message: &str) {
        if self.json {
            self.emit(json!({"notice": message}));
        } else {
            println!("{}", message);
        }
    }

    fn navigate(&self, path: &str) {
        info!(path, "navigate");
        if self.json {
            self.emit(json!({"navigate": path}));
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", prompt);
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn render_users(&self, users: &[UserSummary]) {
        if self.json {
            self.emit(json!({"users": users}));
            return;
        }
        if users.is_empty() {
            println!("No users.");
            return;
        }
        let width = users.iter().map(|u| u.id.len()).max().unwrap_or(2).max(2);
        println!("{:<width$}  {:<20}  ROLE", "ID", "USERNAME", width = width);
        for user in users {
            println!(
                "{:<width$}  {:<20}  {}",
                user.id,
                user.username,
                user.role,
                width = width
            );
        }
    }

    fn render_session(&self, session: &SessionView) {
        if self.json {
            self.emit(json!({"session": session}));
            return;
        }
        match session {
            SessionView::Anonymous => {
                println!("Not signed in. Use `portal login` or `portal register`.")
            }
            SessionView::SignedIn {
                user,
                show_admin_links,
                show_manager_links,
            } => {
                println!("Signed in as {} ({})", user.username, user.role);
                if *show_admin_links {
                    println!("  admin: portal admin list | modify | delete");
                }
                if *show_manager_links {
                    println!("  manager tools available");
                }
            }
        }
    }
}
