//! Registration page

use async_trait::async_trait;

use portal_protocol::{Endpoint, Method};
use portal_validation::{validate_password_confirmation, validate_user_credentials};

use super::{require_fields, rules_or_refuse, PageContext};
use crate::form::{Form, FormPayload, SubmitButton};
use crate::rules::RuleSource;
use crate::ui::Ui;
use crate::workflow::{FormValidator, Submission, SubmissionOutcome, ValidationFailure};

pub const USERNAME_TAKEN: &str = "That username already exists. Please choose another.";
pub const REGISTER_REQUEST_FAILED: &str = "Registration request failed.";

/// The registration form
pub fn form(username: &str, password: &str, confirm_password: &str) -> Form {
    Form::new("register")
        .with_field("username", username)
        .with_field("password", password)
        .with_field("confirmPassword", confirm_password)
        .with_button(SubmitButton::new("Sign up"))
}

/// Required fields, then both credentials against the rules, then the confirmation
pub struct RegisterValidator<'a> {
    pub rules: &'a RuleSource,
}

#[async_trait]
impl FormValidator for RegisterValidator<'_> {
    async fn validate(&self, payload: &FormPayload, ui: &dyn Ui) -> Result<(), ValidationFailure> {
        require_fields(payload, &["username", "password", "confirmPassword"], ui)?;

        let rules = rules_or_refuse(self.rules, ui).await?;
        let password = payload.value("password");
        validate_user_credentials(payload.value("username"), password, &rules)
            .map_err(|reasons| ValidationFailure::surface(reasons, ui))?;

        validate_password_confirmation(password, payload.value("confirmPassword"))
            .map_err(|reason| ValidationFailure::surface(vec![reason], ui))
    }
}

/// Submit the registration form; navigates home on success
pub async fn submit(ctx: &PageContext, form: &Form) -> SubmissionOutcome {
    Submission::new(Method::Post, Endpoint::Register)
        .busy_label(ctx.busy_label.as_str())
        .validator(RegisterValidator { rules: &ctx.rules })
        .on_error_with(|failure, ui| match failure.status() {
            Some(400) => ui.notice(USERNAME_TAKEN),
            _ => ui.notice(REGISTER_REQUEST_FAILED),
        })
        .submit(form, ctx.client.transport(), ctx.ui())
        .await
}
