//! Account page: delete the signed-in account

use portal_protocol::{Endpoint, Method};

use super::PageContext;
use crate::form::{Form, SubmitButton};
use crate::workflow::{Failure, Submission, SubmissionOutcome, REQUEST_ERROR};

pub const CONFIRM_DELETE_ACCOUNT: &str = "Are you sure you want to delete your account?";
pub const DELETE_ACCOUNT_FAILED: &str = "Account deletion failed.";

/// The delete-account control (no fields)
pub fn delete_form() -> Form {
    Form::new("delete-account").with_button(SubmitButton::new("Delete account"))
}

/// Delete the account after confirmation.
///
/// Returns `None` when the user declines; nothing is sent and the control
/// is left untouched.
pub async fn delete(ctx: &PageContext, form: &Form) -> Option<SubmissionOutcome> {
    if !ctx.ui().confirm(CONFIRM_DELETE_ACCOUNT) {
        return None;
    }

    let outcome = Submission::new(Method::Delete, Endpoint::DeleteAccount)
        .busy_label(ctx.busy_label.as_str())
        .on_error_with(|failure, ui| match failure {
            Failure::Rejected(_) => ui.notice(DELETE_ACCOUNT_FAILED),
            Failure::Transport(_) => ui.notice(REQUEST_ERROR),
        })
        .submit(form, ctx.client.transport(), ctx.ui())
        .await;
    Some(outcome)
}
