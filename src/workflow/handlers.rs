//! Submission hooks
//!
//! A submission can be customised at three points: before sending
//! ([`FormValidator`]), after a 2xx ([`SuccessHandler`]) and after anything
//! else ([`ErrorHandler`]). Plain closures fit through [`ValidatorFn`],
//! [`SuccessFn`] and [`ErrorFn`].

use async_trait::async_trait;

use portal_validation::Reason;

use crate::form::FormPayload;
use crate::host::{ClientError, HttpResponse};
use crate::ui::Ui;

/// Why a validator refused a payload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("{}", join_reasons(.0))]
    Invalid(Vec<Reason>),

    #[error("validation rules unavailable: {0}")]
    RulesUnavailable(String),
}

impl ValidationFailure {
    /// Show every reason as a notice and build the failure
    pub fn surface(reasons: Vec<Reason>, ui: &dyn Ui) -> Self {
        for reason in &reasons {
            ui.notice(&reason.to_string());
        }
        ValidationFailure::Invalid(reasons)
    }

    /// Reasons refused for; empty when the rules were unavailable
    pub fn reasons(&self) -> &[Reason] {
        match self {
            ValidationFailure::Invalid(reasons) => reasons,
            ValidationFailure::RulesUnavailable(_) => &[],
        }
    }
}

fn join_reasons(reasons: &[Reason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// What went wrong with a submitted request
#[derive(Debug, Clone, Copy)]
pub enum Failure<'a> {
    /// The server answered with a non-2xx status
    Rejected(&'a HttpResponse),
    /// The request did not complete, or the success handler failed
    Transport(&'a ClientError),
}

impl Failure<'_> {
    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Rejected(response) => Some(response.status),
            Failure::Transport(_) => None,
        }
    }
}

/// Checks a payload before it is sent; surfaces its own reasons
#[async_trait]
pub trait FormValidator: Send + Sync {
    async fn validate(&self, payload: &FormPayload, ui: &dyn Ui) -> Result<(), ValidationFailure>;
}

/// Runs after a 2xx response
#[async_trait]
pub trait SuccessHandler: Send + Sync {
    async fn on_success(&self, response: &HttpResponse, ui: &dyn Ui) -> Result<(), ClientError>;
}

/// Runs after a rejection or transport failure
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn on_error(&self, failure: Failure<'_>, ui: &dyn Ui);
}

/// Synchronous closure validator
pub struct ValidatorFn<F>(pub F);

#[async_trait]
impl<F> FormValidator for ValidatorFn<F>
where
    F: Fn(&FormPayload, &dyn Ui) -> Result<(), ValidationFailure> + Send + Sync,
{
    async fn validate(&self, payload: &FormPayload, ui: &dyn Ui) -> Result<(), ValidationFailure> {
        (self.0)(payload, ui)
    }
}

/// Synchronous closure success handler
pub struct SuccessFn<F>(pub F);

#[async_trait]
impl<F> SuccessHandler for SuccessFn<F>
where
    F: Fn(&HttpResponse, &dyn Ui) -> Result<(), ClientError> + Send + Sync,
{
    async fn on_success(&self, response: &HttpResponse, ui: &dyn Ui) -> Result<(), ClientError> {
        (self.0)(response, ui)
    }
}

/// Synchronous closure error handler
pub struct ErrorFn<F>(pub F);

#[async_trait]
impl<F> ErrorHandler for ErrorFn<F>
where
    F: Fn(Failure<'_>, &dyn Ui) + Send + Sync,
{
    async fn on_error(&self, failure: Failure<'_>, ui: &dyn Ui) {
        (self.0)(failure, ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingUi;
    use portal_validation::Field;

    #[test]
    fn test_surface_notices_each_reason() {
        let ui = RecordingUi::new();
        let failure = ValidationFailure::surface(
            vec![
                Reason::Empty {
                    field: Field::Username,
                },
                Reason::ConfirmationMismatch,
            ],
            &ui,
        );

        assert_eq!(ui.notices().len(), 2);
        assert_eq!(failure.reasons().len(), 2);
        assert!(failure.to_string().starts_with("Please enter a username."));
    }

    #[test]
    fn test_failure_status() {
        let response = HttpResponse::new(400, "");
        assert_eq!(Failure::Rejected(&response).status(), Some(400));

        let error = ClientError::Decode("x".to_string());
        assert_eq!(Failure::Transport(&error).status(), None);
    }
}
