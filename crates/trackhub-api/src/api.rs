//! The high-level API surface for automations and integrations.

use serde_json::Value;
use tracing::{debug, info};

use trackhub_automations::{
    Automation, AutomationUpdates, NewAutomation, prepare_create_input, prepare_update_input,
};

use crate::automations::{AutomationsFilter, AutomationsPager};
use crate::client::GraphqlClient;
use crate::error::{ApiError, Result};
use crate::integrations::{Integration, IntegrationsPager, SlackIntegration, WebhookIntegration};
use crate::queries;
use crate::settings::Settings;

/// Options for [`Api::create_automation`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Field overrides applied on top of the draft before submission.
    pub updates: AutomationUpdates,
    /// On a name conflict, fetch and return the existing automation
    /// unchanged instead of failing.
    pub fetch_existing: bool,
}

/// Entry point for talking to the TrackHub backend.
pub struct Api {
    client: GraphqlClient,
    settings: Settings,
}

impl Api {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = GraphqlClient::new(&settings)?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// List automations. With `filter.entity` unset, covers the projects
    /// visible to the caller.
    pub fn automations(&self, filter: &AutomationsFilter) -> AutomationsPager<'_> {
        AutomationsPager::new(&self.client, filter)
    }

    /// Fetch exactly one automation by name, optionally restricted to an
    /// owning entity. Zero or multiple matches are errors.
    pub async fn automation(&self, name: &str, entity: Option<&str>) -> Result<Automation> {
        let filter = AutomationsFilter {
            entity: entity.map(str::to_string),
            name: Some(name.to_string()),
            ..AutomationsFilter::default()
        };
        let mut matches = self.automations(&filter).collect_all().await?;
        match matches.len() {
            0 => Err(ApiError::NotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(ApiError::Ambiguous(name.to_string())),
        }
    }

    /// Create an automation from a draft, applying `options.updates`
    /// first. Scope/event compatibility is validated by the backend and
    /// surfaced as a remote error.
    pub async fn create_automation(
        &self,
        automation: &NewAutomation,
        options: &CreateOptions,
    ) -> Result<Automation> {
        let input = prepare_create_input(automation, &options.updates)?;
        let name = input.name.clone();
        let variables = serde_json::json!({ "input": input });

        match self
            .client
            .execute(&queries::CREATE_FILTER_TRIGGER_GQL, variables)
            .await
        {
            Ok(data) => {
                info!(%name, "created automation");
                decode_trigger(&data, "createFilterTrigger")
            }
            Err(err) if options.fetch_existing && err.is_conflict() => {
                debug!(%name, "automation exists; fetching it instead");
                self.automation(&name, None).await
            }
            Err(err) => Err(err),
        }
    }

    /// Resubmit a previously-fetched automation, applying field
    /// overrides. Requires the automation's saved identity.
    pub async fn update_automation(
        &self,
        automation: &Automation,
        updates: &AutomationUpdates,
    ) -> Result<Automation> {
        let input = prepare_update_input(automation, updates)?;
        let variables = serde_json::json!({ "input": input });
        let data = self
            .client
            .execute(&queries::UPDATE_FILTER_TRIGGER_GQL, variables)
            .await?;
        info!(id = %automation.id, "updated automation");
        decode_trigger(&data, "updateFilterTrigger")
    }

    /// Delete an automation by its saved identity.
    pub async fn delete_automation(&self, id: &str) -> Result<()> {
        let variables = serde_json::json!({ "id": id });
        let data = self.client.execute(queries::DELETE_TRIGGER_GQL, variables).await?;
        let success = data
            .get("deleteTrigger")
            .and_then(|v| v.get("success"))
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                ApiError::MalformedResponse("response has no deleteTrigger.success".to_string())
            })?;
        if !success {
            return Err(ApiError::Api {
                status: 200,
                message: format!("backend refused to delete trigger {id}"),
            });
        }
        info!(%id, "deleted automation");
        Ok(())
    }

    /// List all of an entity's integrations.
    pub fn integrations(&self, entity: &str) -> IntegrationsPager<'_> {
        IntegrationsPager::new(&self.client, entity)
    }

    /// List an entity's Slack integrations.
    pub async fn slack_integrations(&self, entity: &str) -> Result<Vec<SlackIntegration>> {
        let all = self.integrations(entity).collect_all().await?;
        Ok(all
            .into_iter()
            .filter_map(|integration| match integration {
                Integration::Slack(slack) => Some(slack),
                Integration::Webhook(_) => None,
            })
            .collect())
    }

    /// List an entity's webhook integrations.
    pub async fn webhook_integrations(&self, entity: &str) -> Result<Vec<WebhookIntegration>> {
        let all = self.integrations(entity).collect_all().await?;
        Ok(all
            .into_iter()
            .filter_map(|integration| match integration {
                Integration::Webhook(webhook) => Some(webhook),
                Integration::Slack(_) => None,
            })
            .collect())
    }
}

/// Decode the trigger record embedded in a mutation response.
fn decode_trigger(data: &Value, mutation: &str) -> Result<Automation> {
    let trigger = data
        .get(mutation)
        .and_then(|v| v.get("trigger"))
        .ok_or_else(|| {
            ApiError::MalformedResponse(format!("response has no {mutation}.trigger"))
        })?;
    serde_json::from_value(trigger.clone())
        .map_err(|err| ApiError::MalformedResponse(err.to_string()))
}
