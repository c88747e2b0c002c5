//! Forms and their submit control
//!
//! A [`Form`] is an ordered set of named string fields plus the
//! [`SubmitButton`] that triggers it. [`Form::collect`] snapshots the
//! fields into a trimmed [`FormPayload`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Label a submit button shows while idle
pub const DEFAULT_IDLE_LABEL: &str = "Submit";

/// Trimmed snapshot of a form's fields, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
}

impl FormPayload {
    /// Value of a field, if the form has it
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a field, or the empty string
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for FormPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.as_ref().trim().to_string()))
                .collect(),
        }
    }
}

impl Serialize for FormPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Debug)]
struct ButtonState {
    disabled: bool,
    label: String,
    locks: usize,
    releases: usize,
}

/// The control that triggers a form's submission
///
/// Clones share one underlying control.
#[derive(Debug, Clone)]
pub struct SubmitButton {
    state: Arc<Mutex<ButtonState>>,
}

impl SubmitButton {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ButtonState {
                disabled: false,
                label: label.into(),
                locks: 0,
                releases: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ButtonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_disabled(&self) -> bool {
        self.state().disabled
    }

    pub fn label(&self) -> String {
        self.state().label.clone()
    }

    /// Times the button has been locked
    pub fn lock_count(&self) -> usize {
        self.state().locks
    }

    /// Times a lock has been released
    pub fn release_count(&self) -> usize {
        self.state().releases
    }

    /// Disable the button and show `busy_label` until the lock drops
    pub fn lock(&self, busy_label: &str) -> ButtonLock {
        let mut state = self.state();
        let saved = ButtonLock {
            button: self.clone(),
            was_disabled: state.disabled,
            label: std::mem::replace(&mut state.label, busy_label.to_string()),
        };
        state.disabled = true;
        state.locks += 1;
        saved
    }
}

impl Default for SubmitButton {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_LABEL)
    }
}

/// Restores the button's enabled state and label when dropped
#[derive(Debug)]
#[must_use = "the button unlocks as soon as the lock is dropped"]
pub struct ButtonLock {
    button: SubmitButton,
    was_disabled: bool,
    label: String,
}

impl Drop for ButtonLock {
    fn drop(&mut self) {
        let mut state = self.button.state();
        state.disabled = self.was_disabled;
        state.label = std::mem::take(&mut self.label);
        state.releases += 1;
    }
}

/// A named form
#[derive(Debug, Clone)]
pub struct Form {
    name: String,
    fields: Vec<(String, String)>,
    button: SubmitButton,
}

impl Form {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            button: SubmitButton::default(),
        }
    }

    /// Declare a field with an initial value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Use a specific submit control
    pub fn with_button(mut self, button: SubmitButton) -> Self {
        self.button = button;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a field's raw value, declaring it if needed
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Raw (untrimmed) value of a field
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn button(&self) -> &SubmitButton {
        &self.button
    }

    /// Snapshot every field, trimmed
    pub fn collect(&self) -> FormPayload {
        self.fields.iter().map(|(k, v)| (k.clone(), v)).collect()
    }
}
