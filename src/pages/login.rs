//! Login page

use portal_protocol::{Endpoint, Method};

use super::{require_fields, PageContext};
use crate::form::{Form, SubmitButton};
use crate::workflow::{Submission, SubmissionOutcome};

pub const LOGIN_FAILED: &str = "Login failed. Check your username and password.";
pub const LOGIN_REQUEST_FAILED: &str = "Login request failed.";

/// The login form
pub fn form(username: &str, password: &str) -> Form {
    Form::new("login")
        .with_field("username", username)
        .with_field("password", password)
        .with_button(SubmitButton::new("Log in"))
}

/// Submit the login form; navigates home on success
pub async fn submit(ctx: &PageContext, form: &Form) -> SubmissionOutcome {
    Submission::new(Method::Post, Endpoint::Login)
        .busy_label(ctx.busy_label.as_str())
        .validate_with(|payload, ui| require_fields(payload, &["username", "password"], ui))
        .on_error_with(|failure, ui| match failure.status() {
            Some(400) => ui.notice(LOGIN_FAILED),
            _ => ui.notice(LOGIN_REQUEST_FAILED),
        })
        .submit(form, ctx.client.transport(), ctx.ui())
        .await
}
