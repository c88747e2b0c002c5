//! Form submission workflow
//!
//! One submission runs strictly in order:
//!
//! 1. Lock: disable the submit control and show the busy label
//! 2. Collect: snapshot the form into a trimmed payload
//! 3. Validate: optional; a refusal ends the submission without a request
//! 4. Transmit: one JSON request, never retried
//! 5. Branch: success handler, error handler, or the defaults
//! 6. Unlock: the control is restored however the submission ended

mod handlers;

pub use handlers::{
    ErrorFn, ErrorHandler, Failure, FormValidator, SuccessFn, SuccessHandler, ValidationFailure,
    ValidatorFn,
};

use tracing::{debug, info, warn};

use portal_protocol::{Endpoint, Method, ROOT_PATH};

use crate::form::{Form, FormPayload};
use crate::host::{ClientError, ErrorKind, HttpRequest, HttpResponse, Transport, TransportError};
use crate::ui::Ui;

/// Label shown on a locked submit control unless configured otherwise
pub const DEFAULT_BUSY_LABEL: &str = "Processing...";

/// Notice for a rejection with no usable message
pub const REQUEST_FAILED: &str = "Request failed.";

/// Notice for a request that did not complete
pub const REQUEST_ERROR: &str = "An error occurred during the request. Please try again later.";

/// How a submission ended
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// 2xx, and the success handler (if any) succeeded
    Success(HttpResponse),
    /// Non-2xx response
    Rejected(HttpResponse),
    /// The request did not complete, or the success handler failed
    NetworkFailure(ClientError),
    /// The validator refused; nothing was sent
    Invalid(ValidationFailure),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_))
    }

    /// Failure kind, or `None` on success
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SubmissionOutcome::Success(_) => None,
            SubmissionOutcome::Rejected(_) => Some(ErrorKind::ServerRejection),
            SubmissionOutcome::NetworkFailure(_) => Some(ErrorKind::Transport),
            SubmissionOutcome::Invalid(_) => Some(ErrorKind::Validation),
        }
    }

    /// CLI exit code: 0 on success
    pub fn exit_code(&self) -> i32 {
        self.kind().map(|k| k.exit_code()).unwrap_or(0)
    }

    /// The response, if one arrived
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            SubmissionOutcome::Success(r) | SubmissionOutcome::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

/// A configured form submission
pub struct Submission<'a> {
    method: Method,
    path: String,
    busy_label: String,
    validator: Option<Box<dyn FormValidator + 'a>>,
    on_success: Option<Box<dyn SuccessHandler + 'a>>,
    on_error: Option<Box<dyn ErrorHandler + 'a>>,
}

impl<'a> Submission<'a> {
    pub fn new(method: Method, endpoint: Endpoint) -> Self {
        Self {
            method,
            path: endpoint.path().to_string(),
            busy_label: DEFAULT_BUSY_LABEL.to_string(),
            validator: None,
            on_success: None,
            on_error: None,
        }
    }

    /// Send to `path` (which may carry a query string) instead of the bare endpoint
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn busy_label(mut self, label: impl Into<String>) -> Self {
        self.busy_label = label.into();
        self
    }

    pub fn validator(mut self, validator: impl FormValidator + 'a) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Validate with a synchronous closure
    pub fn validate_with<F>(self, f: F) -> Self
    where
        F: Fn(&FormPayload, &dyn Ui) -> Result<(), ValidationFailure> + Send + Sync + 'a,
    {
        self.validator(ValidatorFn(f))
    }

    pub fn on_success(mut self, handler: impl SuccessHandler + 'a) -> Self {
        self.on_success = Some(Box::new(handler));
        self
    }

    /// Handle success with a synchronous closure
    pub fn on_success_with<F>(self, f: F) -> Self
    where
        F: Fn(&HttpResponse, &dyn Ui) -> Result<(), ClientError> + Send + Sync + 'a,
    {
        self.on_success(SuccessFn(f))
    }

    pub fn on_error(mut self, handler: impl ErrorHandler + 'a) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Handle errors with a synchronous closure
    pub fn on_error_with<F>(self, f: F) -> Self
    where
        F: Fn(Failure<'_>, &dyn Ui) + Send + Sync + 'a,
    {
        self.on_error(ErrorFn(f))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run the submission once
    pub async fn submit(
        &self,
        form: &Form,
        transport: &dyn Transport,
        ui: &dyn Ui,
    ) -> SubmissionOutcome {
        let _lock = form.button().lock(&self.busy_label);
        debug!(form = form.name(), method = %self.method, path = %self.path, "submission locked");

        let payload = form.collect();

        if let Some(validator) = &self.validator {
            if let Err(failure) = validator.validate(&payload, ui).await {
                info!(form = form.name(), %failure, "submission refused by validator");
                return SubmissionOutcome::Invalid(failure);
            }
        }

        let result = match self.request(&payload) {
            Ok(request) => transport.send(request).await,
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(response) if response.is_success() => self.succeeded(response, ui).await,
            Ok(response) => {
                warn!(form = form.name(), status = response.status, "submission rejected");
                match &self.on_error {
                    Some(handler) => handler.on_error(Failure::Rejected(&response), ui).await,
                    None => ui.notice(
                        response
                            .error_message()
                            .as_deref()
                            .unwrap_or(REQUEST_FAILED),
                    ),
                }
                SubmissionOutcome::Rejected(response)
            }
            Err(e) => self.transport_failed(ClientError::from(e), ui).await,
        };

        debug!(form = form.name(), "submission unlocked");
        outcome
    }

    fn request(&self, payload: &FormPayload) -> Result<HttpRequest, TransportError> {
        let request = HttpRequest::new(self.method, self.path.clone());
        if self.method.carries_body() {
            request.with_json(payload)
        } else {
            Ok(request)
        }
    }

    async fn succeeded(&self, response: HttpResponse, ui: &dyn Ui) -> SubmissionOutcome {
        match &self.on_success {
            Some(handler) => match handler.on_success(&response, ui).await {
                Ok(()) => SubmissionOutcome::Success(response),
                Err(e) => {
                    warn!(error = %e, "success handler failed");
                    self.transport_failed(e, ui).await
                }
            },
            None => {
                ui.navigate(ROOT_PATH);
                SubmissionOutcome::Success(response)
            }
        }
    }

    async fn transport_failed(&self, error: ClientError, ui: &dyn Ui) -> SubmissionOutcome {
        warn!(method = %self.method, path = %self.path, error = %error, "submission failed");
        match &self.on_error {
            Some(handler) => handler.on_error(Failure::Transport(&error), ui).await,
            None => ui.notice(REQUEST_ERROR),
        }
        SubmissionOutcome::NetworkFailure(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockTransport;
    use crate::mock::{MockServer, RecordingUi};
    use portal_protocol::Role;
    use portal_validation::Reason;

    fn login_form(username: &str, password: &str) -> Form {
        Form::new("login")
            .with_field("username", username)
            .with_field("password", password)
    }

    #[tokio::test]
    async fn test_default_success_navigates_home() {
        let server = MockServer::new();
        server.seed_user("bob", "abcdef1!", Role::Member);
        let transport = MockTransport::with_server(server.clone());
        let ui = RecordingUi::new();
        let form = login_form(" bob ", "abcdef1!");

        let outcome = Submission::new(Method::Post, Endpoint::Login)
            .submit(&form, &transport, &ui)
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(ui.navigations(), vec!["/"]);
        assert_eq!(
            server.requests()[0].body.as_deref(),
            Some(r#"{"username":"bob","password":"abcdef1!"}"#)
        );
        assert!(!form.button().is_disabled());
    }

    #[tokio::test]
    async fn test_default_rejection_shows_detail() {
        let transport = MockTransport::new();
        let ui = RecordingUi::new();

        let outcome = Submission::new(Method::Post, Endpoint::Login)
            .submit(&login_form("ghost", "abcdef1!"), &transport, &ui)
            .await;

        assert!(matches!(outcome, SubmissionOutcome::Rejected(ref r) if r.status == 400));
        assert_eq!(outcome.kind(), Some(ErrorKind::ServerRejection));
        assert_eq!(ui.notices(), vec!["Invalid username or password"]);
    }

    #[tokio::test]
    async fn test_default_rejection_without_body() {
        let server = MockServer::new();
        server.inject_status(Method::Post, "/login", 500);
        let ui = RecordingUi::new();

        Submission::new(Method::Post, Endpoint::Login)
            .submit(
                &login_form("a", "b"),
                &MockTransport::with_server(server),
                &ui,
            )
            .await;

        assert_eq!(ui.notices(), vec![REQUEST_FAILED]);
    }

    #[tokio::test]
    async fn test_validator_refusal_sends_nothing() {
        let server = MockServer::new();
        let ui = RecordingUi::new();
        let form = login_form("", "");

        let outcome = Submission::new(Method::Post, Endpoint::Login)
            .validate_with(|_, ui| {
                Err(ValidationFailure::surface(vec![Reason::ConfirmationMismatch], ui))
            })
            .submit(&form, &MockTransport::with_server(server.clone()), &ui)
            .await;

        assert!(matches!(outcome, SubmissionOutcome::Invalid(_)));
        assert_eq!(outcome.exit_code(), 2);
        assert!(server.requests().is_empty());
        assert_eq!(form.button().release_count(), 1);
        assert!(!form.button().is_disabled());
    }

    #[tokio::test]
    async fn test_get_sends_no_body() {
        let server = MockServer::new();
        server.seed_user("bob", "abcdef1!", Role::Member);
        server.login_as("bob");
        let ui = RecordingUi::new();

        Submission::new(Method::Get, Endpoint::Me)
            .submit(&Form::new("me"), &MockTransport::with_server(server.clone()), &ui)
            .await;

        assert_eq!(server.requests()[0].body, None);
    }

    #[tokio::test]
    async fn test_custom_busy_label_restored() {
        let ui = RecordingUi::new();
        let form = login_form("a", "b");
        let label = form.button().label();

        Submission::new(Method::Post, Endpoint::Login)
            .busy_label("Signing in")
            .submit(&form, &MockTransport::new(), &ui)
            .await;

        assert_eq!(form.button().label(), label);
        assert_eq!(form.button().lock_count(), 1);
    }
}
