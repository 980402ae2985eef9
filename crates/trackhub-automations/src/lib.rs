//! Declarative automation rules for the TrackHub backend.
//!
//! An automation is a persisted rule of the form "when an event matching a
//! filter occurs within a scope, perform an action". This crate models the
//! rule pieces (scopes, events, filter trees, actions), the saved and
//! unsaved aggregate, and the preparation of the GraphQL input payloads
//! used to create and update rules. Talking to the backend lives in
//! `trackhub-api`.
//!
//! ```
//! use serde_json::json;
//! use trackhub_automations::{
//!     ArtifactEvent, AutomationUpdates, Event, Scope, WebhookActionInput,
//!     prepare_create_input,
//! };
//!
//! let event = Event::on_add_artifact_alias(Scope::artifact_collection("QXJ0OjE="))
//!     .with_filter(ArtifactEvent::alias().matches_regex("prod-.*"));
//! let action = WebhookActionInput::new("SW50OjE=").with_payload(json!({}));
//!
//! let draft = event >> action;
//! let input = prepare_create_input(&draft, &AutomationUpdates::new().name("promote"))?;
//! # Ok::<(), trackhub_automations::AutomationError>(())
//! ```

pub mod actions;
pub mod automations;
pub mod error;
pub mod events;
pub mod filters;
pub mod input;
pub mod scopes;

mod serde_util;

pub use actions::{
    Action, ActionInput, ActionType, AlertSeverity, IntegrationRef, NoOpAction, NoOpActionInput,
    NotificationAction, NotificationActionInput, QueueJobAction, WebhookAction,
    WebhookActionInput,
};
pub use automations::{Automation, AutomationUpdates, NewAutomation, UserRef};
pub use error::{AutomationError, Result};
pub use events::{
    Agg, ArtifactEvent, Event, EventFilter, EventType, MetricCmp, MetricFilter, MetricOperand,
    RunEvent, RunMetricFilter, SavedEvent, SavedEventFilter, WrappedEventFilter,
};
pub use filters::{Filter, FilterExpr, FilterField, Op, Scalar};
pub use input::{
    CreateTriggerInput, TriggeredActionConfig, UpdateTriggerInput, prepare_action_config,
    prepare_create_input, prepare_update_input,
};
pub use scopes::{Scope, ScopeType};
