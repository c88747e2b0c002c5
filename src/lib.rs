//! Account Portal client
//!
//! Client-side layer of a small user-management portal: login,
//! registration, password change, account deletion, an admin user panel
//! and a session header. Every action runs through one form submission
//! workflow backed by server-fed validation rules.

pub mod config;
pub mod form;
pub mod host;
pub mod mock;
pub mod pages;
pub mod rules;
pub mod storage;
pub mod ui;
pub mod workflow;

pub use form::{ButtonLock, Form, FormPayload, SubmitButton};
pub use host::{ClientError, ErrorKind, HttpTransport, MockTransport, PortalClient, Transport};
pub use pages::PageContext;
pub use rules::{RuleSource, RuleStatus, RulesError};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use ui::{SessionView, TerminalUi, Ui};
pub use workflow::{Submission, SubmissionOutcome, ValidationFailure};
