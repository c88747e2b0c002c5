//! Admin panel: list, edit and delete users
//!
//! Every successful mutation re-fetches and re-renders the user list. The
//! edit form's values are kept in transient storage across that refresh
//! so the next edit starts from them.

use async_trait::async_trait;
use tracing::warn;

use portal_protocol::{admin_user_path, AttrType, Endpoint, Method, UserSummary};
use portal_validation::{validate_required_fields, Reason};

use super::PageContext;
use crate::form::{Form, FormPayload, SubmitButton};
use crate::host::{ClientError, ClientResult, HttpResponse, PortalClient};
use crate::storage::{KeyValueStore, StorageError};
use crate::ui::Ui;
use crate::workflow::{
    Failure, Submission, SubmissionOutcome, SuccessHandler, ValidationFailure, REQUEST_ERROR,
};

pub const LIST_FAILED: &str = "Could not load the user list.";
pub const MODIFY_FAILED: &str = "Modify request failed.";
pub const DELETE_FAILED: &str = "Delete request failed. Please try again later.";
pub const CONFIRM_DELETE_USER: &str = "Are you sure you want to delete this user?";

/// Edit form fields kept across a refresh, with their storage keys
pub const DRAFT_FIELDS: [(&str, &str); 3] = [
    ("attr", "admin.edit.attr"),
    ("attr_type", "admin.edit.attr_type"),
    ("value", "admin.edit.value"),
];

/// The edit form for one user
pub fn modify_form(userid: &str, attr: &str, attr_type: &str, value: &str) -> Form {
    Form::new("admin-modify")
        .with_field("userid", userid)
        .with_field("attr", attr)
        .with_field("attr_type", attr_type)
        .with_field("value", value)
        .with_button(SubmitButton::new("Modify"))
}

/// The delete control (no fields)
pub fn delete_form() -> Form {
    Form::new("admin-delete").with_button(SubmitButton::new("Delete"))
}

/// Fetch and render the user list; on failure show a notice
pub async fn refresh(client: &PortalClient, ui: &dyn Ui) -> ClientResult<Vec<UserSummary>> {
    match client.users().await {
        Ok(users) => {
            ui.render_users(&users);
            Ok(users)
        }
        Err(e) => {
            warn!(error = %e, "user list fetch failed");
            ui.notice(LIST_FAILED);
            Err(e)
        }
    }
}

/// Success handler for admin mutations
///
/// Optionally stashes the edit draft, then re-renders the list. A failed
/// list fetch is reported by its own notice and does not fail the
/// mutation; a failed stash does.
pub struct RefreshUsers<'a> {
    pub client: &'a PortalClient,
    pub draft: Option<(&'a dyn KeyValueStore, &'a Form)>,
}

#[async_trait]
impl SuccessHandler for RefreshUsers<'_> {
    async fn on_success(&self, _response: &HttpResponse, ui: &dyn Ui) -> Result<(), ClientError> {
        if let Some((store, form)) = self.draft {
            stash_draft(store, form)?;
        }
        // Already surfaced as a notice.
        let _ = refresh(self.client, ui).await;
        Ok(())
    }
}

fn validate_edit(payload: &FormPayload, ui: &dyn Ui) -> Result<(), ValidationFailure> {
    let refuse = |reason: Reason| ValidationFailure::surface(vec![reason], ui);

    validate_required_fields(&["attr_type"], |name| payload.get(name)).map_err(refuse)?;
    let attr_type = payload
        .value("attr_type")
        .parse::<AttrType>()
        .map_err(|_| {
            refuse(Reason::InvalidValue {
                field: "attr_type".to_string(),
                value: payload.value("attr_type").to_string(),
            })
        })?;

    validate_required_fields(&["userid", "attr", "value"], |name| payload.get(name))
        .map_err(refuse)?;

    attr_type.coerce(payload.value("value")).map_err(|_| {
        refuse(Reason::InvalidValue {
            field: format!("{} value", attr_type),
            value: payload.value("value").to_string(),
        })
    })?;
    Ok(())
}

/// `PUT /admin/user` with `{userid, attr, attr_type, value}`
pub async fn modify(ctx: &PageContext, form: &Form) -> SubmissionOutcome {
    Submission::new(Method::Put, Endpoint::AdminUser)
        .busy_label(ctx.busy_label.as_str())
        .validate_with(validate_edit)
        .on_success(RefreshUsers {
            client: &ctx.client,
            draft: Some((ctx.store.as_ref(), form)),
        })
        .on_error_with(|failure, ui| match failure {
            Failure::Rejected(_) => ui.notice(MODIFY_FAILED),
            Failure::Transport(_) => ui.notice(REQUEST_ERROR),
        })
        .submit(form, ctx.client.transport(), ctx.ui())
        .await
}

/// `DELETE /admin/user?userid=<id>` after confirmation.
///
/// Returns `None` when the user declines.
pub async fn delete(ctx: &PageContext, form: &Form, userid: &str) -> Option<SubmissionOutcome> {
    if !ctx.ui().confirm(CONFIRM_DELETE_USER) {
        return None;
    }

    let outcome = Submission::new(Method::Delete, Endpoint::AdminUser)
        .with_path(admin_user_path(userid))
        .busy_label(ctx.busy_label.as_str())
        .on_success(RefreshUsers {
            client: &ctx.client,
            draft: None,
        })
        .on_error_with(|_, ui| ui.notice(DELETE_FAILED))
        .submit(form, ctx.client.transport(), ctx.ui())
        .await;
    Some(outcome)
}

/// Save the edit form's draft fields (trimmed) to storage
pub fn stash_draft(store: &dyn KeyValueStore, form: &Form) -> Result<(), StorageError> {
    let payload = form.collect();
    for (field, key) in DRAFT_FIELDS {
        if let Some(value) = payload.get(field) {
            store.set(key, value)?;
        }
    }
    Ok(())
}

/// Load a stashed draft into the form and delete it from storage.
///
/// Returns true if anything was restored.
pub fn restore_draft(store: &dyn KeyValueStore, form: &mut Form) -> Result<bool, StorageError> {
    let mut restored = false;
    for (field, key) in DRAFT_FIELDS {
        if let Some(value) = store.remove(key)? {
            form.set(field, value);
            restored = true;
        }
    }
    Ok(restored)
}
