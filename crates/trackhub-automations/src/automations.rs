//! The automation aggregate: saved records, unsaved drafts, and the
//! field-override set shared by the create and update paths.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::actions::{Action, ActionInput};
use crate::error::Result;
use crate::events::{Event, SavedEvent};
use crate::scopes::Scope;

/// The user who created an automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A saved automation fetched from the backend.
///
/// `name`, `description`, `enabled`, `scope` and `action` may be freely
/// reassigned before resubmitting the record as an update; provenance
/// fields are read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    pub id: String,

    created_by: UserRef,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    updated_at: Option<OffsetDateTime>,

    pub name: String,
    #[serde(default)]
    pub description: Option<String>,

    pub scope: Scope,
    pub event: SavedEvent,
    pub action: Action,

    pub enabled: bool,
}

impl Automation {
    pub fn created_by(&self) -> &UserRef {
        &self.created_by
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<OffsetDateTime> {
        self.updated_at
    }

    /// Re-express this saved automation as an unsaved draft, e.g. to
    /// clone it under a new name. Fails if the saved action can no
    /// longer be submitted (legacy launch-job).
    pub fn to_new(&self) -> Result<NewAutomation> {
        let event = Event::from_parts(
            self.event.event_type,
            self.scope.clone(),
            self.event.filter.clone().into_event_filter(),
        );
        Ok(NewAutomation {
            name: Some(self.name.clone()),
            description: self.description.clone(),
            enabled: self.enabled,
            scope: Some(self.scope.clone()),
            event: Some(event),
            action: Some(ActionInput::from_saved(&self.action)?),
        })
    }
}

/// An automation being assembled locally; fields may still be missing.
/// Usually produced by `event >> action` (or [`Event::triggers`]).
#[derive(Debug, Clone, PartialEq)]
pub struct NewAutomation {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub scope: Option<Scope>,
    pub event: Option<Event>,
    pub action: Option<ActionInput>,
}

impl Default for NewAutomation {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            enabled: true,
            scope: None,
            event: None,
            action: None,
        }
    }
}

impl NewAutomation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Field-level overrides applied when creating or updating an automation.
///
/// Unset fields keep their current values. Set sub-objects (scope, event,
/// action) are replaced wholesale; there is no deep partial merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutomationUpdates {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub scope: Option<Scope>,
    pub event: Option<Event>,
    pub action: Option<ActionInput>,
}

impl AutomationUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn event(mut self, event: Event) -> Self {
        self.event = Some(event);
        self
    }

    pub fn action(mut self, action: impl Into<ActionInput>) -> Self {
        self.action = Some(action.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::actions::{ActionType, NoOpActionInput};
    use crate::events::{ArtifactEvent, EventType};

    use super::*;

    fn saved_automation_json() -> serde_json::Value {
        let inner = json!({"$or": [{"$and": [{"alias": {"$regex": "prod-.*"}}]}]});
        let wrapper = json!({"filter": serde_json::to_string(&inner).unwrap()});
        json!({
            "id": "VHJpZ2dlcjox",
            "createdBy": {"id": "VXNlcjox", "username": "test-user"},
            "createdAt": "2026-05-01T12:00:00Z",
            "updatedAt": null,
            "name": "test-automation",
            "description": "test-description",
            "enabled": true,
            "scope": {"__typename": "ArtifactSequence", "id": "QXJ0U2VxOjE=", "name": "test-collection"},
            "event": {
                "eventType": "ADD_ARTIFACT_ALIAS",
                "filter": serde_json::to_string(&wrapper).unwrap(),
            },
            "action": {
                "__typename": "NoOpTriggeredAction",
            },
        })
    }

    #[test]
    fn test_saved_automation_decodes() {
        let automation: Automation = serde_json::from_value(saved_automation_json()).unwrap();
        assert_eq!(automation.name, "test-automation");
        assert_eq!(automation.created_by().username.as_deref(), Some("test-user"));
        assert_eq!(automation.updated_at(), None);
        assert_eq!(automation.event.event_type, EventType::AddArtifactAlias);
        assert_eq!(automation.action.action_type(), ActionType::NoOp);
        assert_eq!(automation.scope.id(), "QXJ0U2VxOjE=");
    }

    #[test]
    fn test_event_action_combinator_builds_draft() {
        let scope = Scope::project("UHJvamVjdDox");
        let event = Event::on_create_artifact(scope.clone())
            .with_filter(ArtifactEvent::alias().contains("v"));
        let draft = event.clone() >> NoOpActionInput::default();

        assert_eq!(draft.scope, Some(scope));
        assert_eq!(draft.event, Some(event));
        assert!(draft.enabled);
        assert_eq!(draft.name, None);
    }

    #[test]
    fn test_to_new_round_trips_mutable_fields() {
        let automation: Automation = serde_json::from_value(saved_automation_json()).unwrap();
        let draft = automation.to_new().unwrap();

        assert_eq!(draft.name.as_deref(), Some("test-automation"));
        assert_eq!(draft.description.as_deref(), Some("test-description"));
        assert!(draft.enabled);
        assert_eq!(draft.scope, Some(automation.scope.clone()));
        let event = draft.event.unwrap();
        assert_eq!(event.event_type(), EventType::AddArtifactAlias);
    }
}
