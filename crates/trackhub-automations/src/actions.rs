//! Actions performed when an automation fires.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AutomationError, Result};
use crate::serde_util::json_string_opt;

/// The type of action triggered by an automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    /// Legacy launch-job action; readable on old automations but no
    /// longer accepted in new ones.
    #[serde(rename = "QUEUE_JOB")]
    QueueJob,
    #[serde(rename = "NOTIFICATION")]
    Notification,
    #[serde(rename = "GENERIC_WEBHOOK")]
    GenericWebhook,
    #[serde(rename = "NO_OP")]
    NoOp,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueueJob => "QUEUE_JOB",
            Self::Notification => "NOTIFICATION",
            Self::GenericWebhook => "GENERIC_WEBHOOK",
            Self::NoOp => "NO_OP",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity level of a triggered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Info,
    Warn,
    Error,
}

/// A reference to the integration an action delivers through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An action on a saved automation, discriminated by GraphQL `__typename`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum Action {
    #[serde(rename = "QueueJobTriggeredAction")]
    QueueJob(QueueJobAction),
    #[serde(rename = "NotificationTriggeredAction")]
    Notification(NotificationAction),
    #[serde(rename = "GenericWebhookTriggeredAction")]
    Webhook(WebhookAction),
    #[serde(rename = "NoOpTriggeredAction")]
    NoOp(NoOpAction),
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::QueueJob(_) => ActionType::QueueJob,
            Self::Notification(_) => ActionType::Notification,
            Self::Webhook(_) => ActionType::GenericWebhook,
            Self::NoOp(_) => ActionType::NoOp,
        }
    }
}

/// Legacy launch-job details. Parse-only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueJobAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<serde_json::Value>,
}

/// Notification details on a saved automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub integration: IntegrationRef,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_severity")]
    pub severity: AlertSeverity,
}

fn default_severity() -> AlertSeverity {
    AlertSeverity::Info
}

/// Webhook details on a saved automation. The payload is embedded as a
/// JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookAction {
    pub integration: IntegrationRef,
    #[serde(
        rename = "requestPayload",
        default,
        with = "json_string_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_payload: Option<serde_json::Value>,
}

/// No-op marker on a saved automation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NoOpAction {}

/// An action to attach to a new or updated automation.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionInput {
    Notification(NotificationActionInput),
    Webhook(WebhookActionInput),
    NoOp(NoOpActionInput),
}

impl ActionInput {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Notification(_) => ActionType::Notification,
            Self::Webhook(_) => ActionType::GenericWebhook,
            Self::NoOp(_) => ActionType::NoOp,
        }
    }

    /// Convert an action on a saved automation into the input shape for
    /// resubmission. The legacy launch-job action cannot be resubmitted.
    pub fn from_saved(action: &Action) -> Result<Self> {
        match action {
            Action::Notification(saved) => Ok(Self::Notification(NotificationActionInput {
                integration_id: saved.integration.id.clone(),
                title: saved.title.clone(),
                message: saved.message.clone(),
                severity: saved.severity,
            })),
            Action::Webhook(saved) => Ok(Self::Webhook(WebhookActionInput {
                integration_id: saved.integration.id.clone(),
                request_payload: saved.request_payload.clone(),
            })),
            Action::NoOp(_) => Ok(Self::NoOp(NoOpActionInput::default())),
            Action::QueueJob(_) => Err(AutomationError::UnsupportedActionType(
                ActionType::QueueJob,
            )),
        }
    }
}

impl From<NotificationActionInput> for ActionInput {
    fn from(input: NotificationActionInput) -> Self {
        Self::Notification(input)
    }
}

impl From<WebhookActionInput> for ActionInput {
    fn from(input: WebhookActionInput) -> Self {
        Self::Webhook(input)
    }
}

impl From<NoOpActionInput> for ActionInput {
    fn from(input: NoOpActionInput) -> Self {
        Self::NoOp(input)
    }
}

/// Input payload for a notification action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationActionInput {
    #[serde(rename = "integrationID")]
    pub integration_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_severity")]
    pub severity: AlertSeverity,
}

impl NotificationActionInput {
    pub fn new(integration_id: impl Into<String>) -> Self {
        Self {
            integration_id: integration_id.into(),
            title: String::new(),
            message: String::new(),
            severity: AlertSeverity::Info,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Input payload for a webhook action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookActionInput {
    #[serde(rename = "integrationID")]
    pub integration_id: String,
    #[serde(
        rename = "requestPayload",
        default,
        with = "json_string_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_payload: Option<serde_json::Value>,
}

impl WebhookActionInput {
    pub fn new(integration_id: impl Into<String>) -> Self {
        Self {
            integration_id: integration_id.into(),
            request_payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.request_payload = Some(payload);
        self
    }
}

/// Input payload for a no-op action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoOpActionInput {
    /// Keeps the payload non-empty so the config key survives
    /// none-stripping serialization on the backend.
    #[serde(rename = "noOp", default = "default_true")]
    pub no_op: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NoOpActionInput {
    fn default() -> Self {
        Self { no_op: true }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_saved_action_decodes_by_typename() {
        let action: Action = serde_json::from_value(json!({
            "__typename": "NotificationTriggeredAction",
            "integration": {"id": "SW50ZWdyYXRpb246MQ=="},
            "title": "alert",
            "message": "loss is diverging",
            "severity": "ERROR",
        }))
        .unwrap();

        assert_eq!(action.action_type(), ActionType::Notification);
        let Action::Notification(notification) = action else {
            panic!("expected a notification action");
        };
        assert_eq!(notification.severity, AlertSeverity::Error);
        assert_eq!(notification.message, "loss is diverging");
    }

    #[test]
    fn test_saved_webhook_payload_is_embedded_json() {
        let action: Action = serde_json::from_value(json!({
            "__typename": "GenericWebhookTriggeredAction",
            "integration": {"id": "SW50ZWdyYXRpb246Mg==", "name": "ci-hook"},
            "requestPayload": "{\"event\":\"fired\"}",
        }))
        .unwrap();

        let Action::Webhook(webhook) = action else {
            panic!("expected a webhook action");
        };
        assert_eq!(webhook.request_payload, Some(json!({"event": "fired"})));
    }

    #[test]
    fn test_from_saved_converts_each_supported_action() {
        let notification = Action::Notification(NotificationAction {
            integration: IntegrationRef {
                id: "SW50OjE=".into(),
                name: None,
            },
            title: "t".into(),
            message: "m".into(),
            severity: AlertSeverity::Warn,
        });
        let input = ActionInput::from_saved(&notification).unwrap();
        assert_eq!(input.action_type(), ActionType::Notification);
        let ActionInput::Notification(input) = input else {
            panic!("expected a notification input");
        };
        assert_eq!(input.integration_id, "SW50OjE=");
        assert_eq!(input.severity, AlertSeverity::Warn);

        let noop = Action::NoOp(NoOpAction::default());
        assert_eq!(
            ActionInput::from_saved(&noop).unwrap(),
            ActionInput::NoOp(NoOpActionInput::default())
        );
    }

    #[test]
    fn test_from_saved_rejects_legacy_queue_job() {
        let legacy = Action::QueueJob(QueueJobAction::default());
        let err = ActionInput::from_saved(&legacy).unwrap_err();
        assert!(matches!(
            err,
            AutomationError::UnsupportedActionType(ActionType::QueueJob)
        ));
        assert!(err.to_string().contains("Unsupported action type"));
    }

    #[test]
    fn test_notification_input_wire_shape() {
        let input = NotificationActionInput::new("SW50OjE=")
            .with_title("alert")
            .with_message("hello")
            .with_severity(AlertSeverity::Warn);
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({
                "integrationID": "SW50OjE=",
                "title": "alert",
                "message": "hello",
                "severity": "WARN",
            })
        );
    }

    #[test]
    fn test_webhook_input_serializes_payload_as_json_string() {
        let input = WebhookActionInput::new("SW50OjI=").with_payload(json!({}));
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["requestPayload"], json!("{}"));

        let without_payload = WebhookActionInput::new("SW50OjI=");
        let value = serde_json::to_value(&without_payload).unwrap();
        assert!(value.get("requestPayload").is_none());
    }

    #[test]
    fn test_no_op_input_keeps_marker_field() {
        assert_eq!(
            serde_json::to_value(NoOpActionInput::default()).unwrap(),
            json!({"noOp": true})
        );
    }
}
