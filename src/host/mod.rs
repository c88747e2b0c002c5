//! Talking to the portal backend
//!
//! - [`Transport`]: one HTTP exchange, real ([`HttpTransport`]) or
//!   in-process ([`MockTransport`])
//! - [`PortalClient`]: typed calls and the error taxonomy

pub mod client;
pub mod http;
pub mod transport;

pub use client::{ClientError, ClientResult, ErrorKind, PortalClient};
pub use http::{HttpConfig, HttpTransport, SESSION_COOKIE_KEY};
pub use transport::{HttpRequest, HttpResponse, MockTransport, Transport, TransportError};
