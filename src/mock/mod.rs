//! In-process test doubles
//!
//! - [`MockServer`]: the portal backend served from memory, with failure
//!   injection per route and a request log
//! - [`RecordingUi`]: a Ui that records every call
//!
//! Use [`MockTransport`](crate::host::MockTransport) to point a client at a
//! [`MockServer`].

mod failure;
mod server;
mod state;
mod ui;

pub use failure::{FailureConfig, FailureInjector, FailureMode};
pub use server::MockServer;
pub use state::{MockState, MockUser};
pub use ui::{RecordingUi, UiEvent};
