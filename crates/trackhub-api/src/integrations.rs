//! Integrations automations deliver through (Slack channels, webhooks).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::GraphqlClient;
use crate::error::{ApiError, Result};
use crate::pagination::PageInfo;
use crate::queries;

use trackhub_automations::{NotificationActionInput, WebhookActionInput};

/// A Slack channel integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackIntegration {
    pub id: String,
    pub team_name: String,
    pub channel_name: String,
}

impl SlackIntegration {
    /// Start a notification action that sends to this integration.
    pub fn notify(&self) -> NotificationActionInput {
        NotificationActionInput::new(&self.id)
    }
}

/// A generic webhook integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookIntegration {
    pub id: String,
    pub name: String,
    pub url_endpoint: String,
}

impl WebhookIntegration {
    /// Start a webhook action that sends to this integration.
    pub fn webhook(&self) -> WebhookActionInput {
        WebhookActionInput::new(&self.id)
    }
}

/// Any integration an entity has configured, discriminated by GraphQL
/// `__typename`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum Integration {
    #[serde(rename = "SlackIntegration")]
    Slack(SlackIntegration),
    #[serde(rename = "GenericWebhookIntegration")]
    Webhook(WebhookIntegration),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntegrationConnection {
    edges: Vec<IntegrationEdge>,
    page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
struct IntegrationEdge {
    node: Integration,
}

const DEFAULT_PER_PAGE: u32 = 50;

/// A sequential pager over an entity's integrations. Same page semantics
/// as the automation listings.
pub struct IntegrationsPager<'a> {
    client: &'a GraphqlClient,
    entity: String,
    last_page_info: Option<PageInfo>,
}

impl<'a> IntegrationsPager<'a> {
    pub(crate) fn new(client: &'a GraphqlClient, entity: &str) -> Self {
        Self {
            client,
            entity: entity.to_string(),
            last_page_info: None,
        }
    }

    pub fn more(&self) -> bool {
        match &self.last_page_info {
            Some(info) => info.has_next_page,
            None => true,
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        self.last_page_info
            .as_ref()
            .and_then(|info| info.end_cursor.as_deref())
    }

    pub async fn next_page(&mut self) -> Result<Vec<Integration>> {
        if !self.more() {
            return Ok(Vec::new());
        }

        let mut variables = serde_json::Map::new();
        variables.insert("entityName".to_string(), Value::from(self.entity.clone()));
        variables.insert("perPage".to_string(), Value::from(DEFAULT_PER_PAGE));
        if let Some(cursor) = self.cursor() {
            variables.insert("cursor".to_string(), Value::from(cursor.to_string()));
        }

        let data = self
            .client
            .execute(queries::INTEGRATIONS_BY_ENTITY_GQL, Value::Object(variables))
            .await?;
        let page = decode_page(&data)?;

        debug!(
            integrations = page.edges.len(),
            has_next_page = page.page_info.has_next_page,
            "fetched integrations page"
        );
        self.last_page_info = Some(page.page_info);

        Ok(page.edges.into_iter().map(|edge| edge.node).collect())
    }

    pub async fn collect_all(mut self) -> Result<Vec<Integration>> {
        let mut all = Vec::new();
        while self.more() {
            all.extend(self.next_page().await?);
        }
        Ok(all)
    }
}

fn decode_page(data: &Value) -> Result<IntegrationConnection> {
    let page_data = data
        .get("entity")
        .and_then(|entity| entity.get("integrations"))
        .ok_or_else(|| {
            ApiError::MalformedResponse("response has no entity.integrations".to_string())
        })?;
    serde_json::from_value(page_data.clone())
        .map_err(|err| ApiError::MalformedResponse(err.to_string()))
}
