//! Preparation of the GraphQL input payloads for creating and updating
//! automations.
//!
//! Reads and writes use structurally equivalent but differently-tagged
//! filter representations; the preparers normalize both paths to the same
//! canonical write shape.

use serde::{Deserialize, Serialize};

use crate::actions::{
    ActionInput, ActionType, NoOpActionInput, NotificationActionInput, WebhookActionInput,
};
use crate::automations::{Automation, AutomationUpdates, NewAutomation};
use crate::error::{AutomationError, Result};
use crate::events::{EventFilter, EventType};
use crate::scopes::ScopeType;
use crate::serde_util::json_string;

/// The action-config wrapper: exactly one field is populated, selected by
/// the action's discriminant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredActionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_action_input: Option<NotificationActionInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_webhook_action_input: Option<WebhookActionInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_op_action_input: Option<NoOpActionInput>,
}

/// Route an input action into the config wrapper field for its
/// discriminant. The match is exhaustive over the input variants, so a
/// new action kind cannot be added without handling it here.
pub fn prepare_action_config(action: &ActionInput) -> TriggeredActionConfig {
    let mut config = TriggeredActionConfig::default();
    match action {
        ActionInput::Notification(input) => {
            config.notification_action_input = Some(input.clone());
        }
        ActionInput::Webhook(input) => {
            config.generic_webhook_action_input = Some(input.clone());
        }
        ActionInput::NoOp(input) => {
            config.no_op_action_input = Some(input.clone());
        }
    }
    config
}

/// Variables payload for the create-automation mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTriggerInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub scope_type: ScopeType,
    #[serde(rename = "scopeID")]
    pub scope_id: String,
    pub triggering_event_type: EventType,
    #[serde(with = "json_string")]
    pub event_filter: EventFilter,
    pub triggered_action_type: ActionType,
    pub triggered_action_config: TriggeredActionConfig,
}

/// Variables payload for the update-automation mutation. Same shape as
/// [`CreateTriggerInput`] plus the automation's opaque identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTriggerInput {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub scope_type: ScopeType,
    #[serde(rename = "scopeID")]
    pub scope_id: String,
    pub triggering_event_type: EventType,
    #[serde(with = "json_string")]
    pub event_filter: EventFilter,
    pub triggered_action_type: ActionType,
    pub triggered_action_config: TriggeredActionConfig,
}

/// Prepare the payload for creating an automation, applying any field
/// overrides first. Fails with a local error if a required field is
/// still missing after the merge.
pub fn prepare_create_input(
    automation: &NewAutomation,
    updates: &AutomationUpdates,
) -> Result<CreateTriggerInput> {
    let name = updates
        .name
        .clone()
        .or_else(|| automation.name.clone())
        .ok_or(AutomationError::MissingField("name"))?;
    let description = updates
        .description
        .clone()
        .or_else(|| automation.description.clone());
    let enabled = updates.enabled.unwrap_or(automation.enabled);
    let event = updates
        .event
        .clone()
        .or_else(|| automation.event.clone())
        .ok_or(AutomationError::MissingField("event"))?;
    let action = updates
        .action
        .clone()
        .or_else(|| automation.action.clone())
        .ok_or(AutomationError::MissingField("action"))?;
    let scope = updates
        .scope
        .clone()
        .or_else(|| automation.scope.clone())
        .ok_or(AutomationError::MissingField("scope"))?;

    Ok(CreateTriggerInput {
        name,
        description,
        enabled,
        scope_type: scope.scope_type(),
        scope_id: scope.id().to_string(),
        triggering_event_type: event.event_type(),
        event_filter: event.filter().clone(),
        triggered_action_type: action.action_type(),
        triggered_action_config: prepare_action_config(&action),
    })
}

/// Prepare the payload for updating a previously-fetched automation.
///
/// Overrides replace whole fields; everything else is taken from the
/// saved record. The saved event filter is normalized from its wrapped
/// read shape to the canonical write shape.
pub fn prepare_update_input(
    automation: &Automation,
    updates: &AutomationUpdates,
) -> Result<UpdateTriggerInput> {
    let name = updates.name.clone().unwrap_or_else(|| automation.name.clone());
    let description = updates
        .description
        .clone()
        .or_else(|| automation.description.clone());
    let enabled = updates.enabled.unwrap_or(automation.enabled);
    let scope = updates.scope.clone().unwrap_or_else(|| automation.scope.clone());

    let (triggering_event_type, event_filter) = match &updates.event {
        Some(event) => (event.event_type(), event.filter().clone()),
        None => (
            automation.event.event_type,
            automation.event.filter.clone().into_event_filter(),
        ),
    };

    let action = match &updates.action {
        Some(action) => action.clone(),
        None => ActionInput::from_saved(&automation.action)?,
    };

    Ok(UpdateTriggerInput {
        id: automation.id.clone(),
        name,
        description,
        enabled,
        scope_type: scope.scope_type(),
        scope_id: scope.id().to_string(),
        triggering_event_type,
        event_filter,
        triggered_action_type: action.action_type(),
        triggered_action_config: prepare_action_config(&action),
    })
}
