//! Recording Ui for tests

use std::sync::{Mutex, MutexGuard, PoisonError};

use portal_protocol::UserSummary;

use crate::ui::{SessionView, Ui};

/// One call made on the Ui
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Notice(String),
    Navigate(String),
    Confirm { prompt: String, answer: bool },
    RenderUsers(Vec<UserSummary>),
    RenderSession(SessionView),
}

/// Ui that records every call and answers confirmations with a fixed value
#[derive(Debug)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
    confirm_answer: Mutex<bool>,
}

impl RecordingUi {
    /// A recorder that confirms every question
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            confirm_answer: Mutex::new(true),
        }
    }

    /// A recorder that declines every question
    pub fn declining() -> Self {
        let ui = Self::new();
        ui.set_confirm_answer(false);
        ui
    }

    pub fn set_confirm_answer(&self, answer: bool) {
        *self
            .confirm_answer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = answer;
    }

    fn log(&self) -> MutexGuard<'_, Vec<UiEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.log().clone()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    pub fn notices(&self) -> Vec<String> {
        self.log()
            .iter()
            .filter_map(|e| match e {
                UiEvent::Notice(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log()
            .iter()
            .filter_map(|e| match e {
                UiEvent::Navigate(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn confirmations(&self) -> usize {
        self.log()
            .iter()
            .filter(|e| matches!(e, UiEvent::Confirm { .. }))
            .count()
    }

    /// Most recently rendered user list
    pub fn last_users(&self) -> Option<Vec<UserSummary>> {
        self.log().iter().rev().find_map(|e| match e {
            UiEvent::RenderUsers(users) => Some(users.clone()),
            _ => None,
        })
    }

    /// Most recently rendered session header
    pub fn last_session(&self) -> Option<SessionView> {
        self.log().iter().rev().find_map(|e| match e {
            UiEvent::RenderSession(view) => Some(view.clone()),
            _ => None,
        })
    }
}

impl Default for RecordingUi {
    fn default() -> Self {
        Self::new()
    }
}

impl Ui for RecordingUi {
    fn notice(&self, message: &str) {
        self.log().push(UiEvent::Notice(message.to_string()));
    }

    fn navigate(&self, path: &str) {
        self.log().push(UiEvent::Navigate(path.to_string()));
    }

    fn confirm(&self, prompt: &str) -> bool {
        let answer = *self
            .confirm_answer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.log().push(UiEvent::Confirm {
            prompt: prompt.to_string(),
            answer,
        });
        answer
    }

    fn render_users(&self, users: &[UserSummary]) {
        self.log().push(UiEvent::RenderUsers(users.to_vec()));
    }

    fn render_session(&self, session: &SessionView) {
        self.log().push(UiEvent::RenderSession(session.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let ui = RecordingUi::declining();
        ui.notice("hello");
        assert!(!ui.confirm("sure?"));
        ui.navigate("/");

        assert_eq!(ui.notices(), vec!["hello"]);
        assert_eq!(ui.navigations(), vec!["/"]);
        assert_eq!(ui.confirmations(), 1);
        assert_eq!(ui.events().len(), 3);
        assert!(ui.last_users().is_none());
    }
}
