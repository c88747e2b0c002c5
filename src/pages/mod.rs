//! Page controllers
//!
//! Each page wires the submission workflow to its form, validator and
//! handlers. All pages share one [`PageContext`].

pub mod account;
pub mod admin;
pub mod changepw;
pub mod login;
pub mod register;
pub mod session;

use std::sync::Arc;

use portal_protocol::ValidationRuleSet;
use portal_validation::validate_required_fields;

use crate::form::FormPayload;
use crate::host::PortalClient;
use crate::rules::{RuleSource, RULES_UNAVAILABLE};
use crate::storage::KeyValueStore;
use crate::ui::Ui;
use crate::workflow::{ValidationFailure, DEFAULT_BUSY_LABEL};

/// Everything a page needs: backend, surface, rules and storage
pub struct PageContext {
    pub client: PortalClient,
    pub ui: Arc<dyn Ui>,
    pub rules: RuleSource,
    pub store: Arc<dyn KeyValueStore>,
    pub busy_label: String,
}

impl PageContext {
    /// A context whose rules are fetched on first use
    pub fn new(client: PortalClient, ui: Arc<dyn Ui>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            rules: RuleSource::new(client.clone()),
            client,
            ui,
            store,
            busy_label: DEFAULT_BUSY_LABEL.to_string(),
        }
    }

    pub fn with_busy_label(mut self, label: impl Into<String>) -> Self {
        self.busy_label = label.into();
        self
    }

    pub fn with_rules(mut self, rules: RuleSource) -> Self {
        self.rules = rules;
        self
    }

    pub fn ui(&self) -> &dyn Ui {
        self.ui.as_ref()
    }
}

/// Require the named fields, surfacing the first missing one
pub(crate) fn require_fields(
    payload: &FormPayload,
    fields: &[&str],
    ui: &dyn Ui,
) -> Result<(), ValidationFailure> {
    validate_required_fields(fields, |name| payload.get(name))
        .map_err(|reason| ValidationFailure::surface(vec![reason], ui))
}

/// The rule set, or a surfaced "rules unavailable" refusal
pub(crate) async fn rules_or_refuse(
    rules: &RuleSource,
    ui: &dyn Ui,
) -> Result<Arc<ValidationRuleSet>, ValidationFailure> {
    rules.rules().await.map_err(|e| {
        ui.notice(RULES_UNAVAILABLE);
        ValidationFailure::RulesUnavailable(e.to_string())
    })
}
