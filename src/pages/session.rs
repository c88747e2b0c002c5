//! Session header: who is signed in, and logout

use tracing::{debug, warn};

use portal_protocol::{Endpoint, Method};

use super::PageContext;
use crate::form::{Form, SubmitButton};
use crate::host::ClientError;
use crate::ui::SessionView;
use crate::workflow::{Failure, Submission, SubmissionOutcome, REQUEST_ERROR};

pub const LOGOUT_FAILED: &str = "Logout failed.";

/// Load the session header from `GET /me` and render it.
///
/// Any non-2xx renders the signed-out header. A transport failure renders
/// nothing and is returned.
pub async fn load(ctx: &PageContext) -> Result<SessionView, ClientError> {
    let view = match ctx.client.me().await {
        Ok(user) => SessionView::signed_in(user),
        Err(ClientError::Rejected { status, .. }) => {
            debug!(status, "no session");
            SessionView::Anonymous
        }
        Err(e) => {
            warn!(error = %e, "could not load session");
            return Err(e);
        }
    };
    ctx.ui().render_session(&view);
    Ok(view)
}

/// The logout control (no fields)
pub fn logout_form() -> Form {
    Form::new("logout").with_button(SubmitButton::new("Log out"))
}

/// `POST /logout`; navigates home on success
pub async fn logout(ctx: &PageContext, form: &Form) -> SubmissionOutcome {
    Submission::new(Method::Post, Endpoint::Logout)
        .busy_label(ctx.busy_label.as_str())
        .on_error_with(|failure, ui| match failure {
            Failure::Rejected(_) => ui.notice(LOGOUT_FAILED),
            Failure::Transport(_) => ui.notice(REQUEST_ERROR),
        })
        .submit(form, ctx.client.transport(), ctx.ui())
        .await
}
