//! Change password page

use async_trait::async_trait;

use portal_protocol::{Endpoint, Method, ROOT_PATH};
use portal_validation::{validate_password, validate_password_confirmation};

use super::{require_fields, rules_or_refuse, PageContext};
use crate::form::{Form, FormPayload, SubmitButton};
use crate::rules::RuleSource;
use crate::ui::Ui;
use crate::workflow::{
    Failure, FormValidator, Submission, SubmissionOutcome, ValidationFailure, REQUEST_ERROR,
};

pub const PASSWORD_CHANGED: &str = "Password changed successfully.";
pub const CHANGE_FAILED: &str = "Failed to change password. Check your current password.";

/// The change password form
pub fn form(current_password: &str, new_password: &str, confirm_password: &str) -> Form {
    Form::new("changepw")
        .with_field("currentPassword", current_password)
        .with_field("newPassword", new_password)
        .with_field("confirmPassword", confirm_password)
        .with_button(SubmitButton::new("Change password"))
}

/// Required fields, then the new password against the rules, then the confirmation
pub struct ChangePasswordValidator<'a> {
    pub rules: &'a RuleSource,
}

#[async_trait]
impl FormValidator for ChangePasswordValidator<'_> {
    async fn validate(&self, payload: &FormPayload, ui: &dyn Ui) -> Result<(), ValidationFailure> {
        require_fields(
            payload,
            &["currentPassword", "newPassword", "confirmPassword"],
            ui,
        )?;

        let rules = rules_or_refuse(self.rules, ui).await?;
        let new_password = payload.value("newPassword");
        validate_password(new_password, &rules)
            .map_err(|reason| ValidationFailure::surface(vec![reason], ui))?;

        validate_password_confirmation(new_password, payload.value("confirmPassword"))
            .map_err(|reason| ValidationFailure::surface(vec![reason], ui))
    }
}

/// Submit the change password form (`PUT /changepw`)
pub async fn submit(ctx: &PageContext, form: &Form) -> SubmissionOutcome {
    Submission::new(Method::Put, Endpoint::ChangePassword)
        .busy_label(ctx.busy_label.as_str())
        .validator(ChangePasswordValidator { rules: &ctx.rules })
        .on_success_with(|_, ui| {
            ui.notice(PASSWORD_CHANGED);
            ui.navigate(ROOT_PATH);
            Ok(())
        })
        .on_error_with(|failure, ui| match failure {
            Failure::Rejected(_) => ui.notice(CHANGE_FAILED),
            Failure::Transport(_) => ui.notice(REQUEST_ERROR),
        })
        .submit(form, ctx.client.transport(), ctx.ui())
        .await
}
