//! Paginated automation listings.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use trackhub_automations::Automation;

use crate::client::GraphqlClient;
use crate::error::{ApiError, Result};
use crate::pagination::PageInfo;
use crate::queries;

/// Filters for the automation listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutomationsFilter {
    /// Restrict results to this owning entity; when unset, the listing
    /// covers the projects visible to the caller.
    pub entity: Option<String>,
    /// Match automations by name.
    pub name: Option<String>,
    /// Match the containing project by name.
    pub project: Option<String>,
    /// Records requested per page.
    pub per_page: Option<u32>,
}

impl AutomationsFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectConnection {
    edges: Vec<ProjectEdge>,
    page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectEdge {
    node: ProjectNode,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectNode {
    #[serde(default)]
    triggers: Vec<Automation>,
}

const DEFAULT_PER_PAGE: u32 = 50;

/// A sequential pager over per-project automation lists.
///
/// Pages are fetched one at a time: [`more`](Self::more) is `true` before
/// the first fetch, and afterwards reflects the `hasNextPage` flag of the
/// last fetched page. The position for each fetch is the opaque cursor
/// taken from the previous page.
pub struct AutomationsPager<'a> {
    client: &'a GraphqlClient,
    query: &'static str,
    variables: serde_json::Map<String, Value>,
    per_page: u32,
    last_page_info: Option<PageInfo>,
}

impl<'a> AutomationsPager<'a> {
    pub(crate) fn new(client: &'a GraphqlClient, filter: &AutomationsFilter) -> Self {
        let mut variables = serde_json::Map::new();
        let query: &'static str = match &filter.entity {
            Some(entity) => {
                variables.insert("entityName".to_string(), Value::from(entity.clone()));
                queries::TRIGGERS_BY_ENTITY_GQL.as_str()
            }
            None => queries::TRIGGERS_FOR_VIEWER_GQL.as_str(),
        };
        if let Some(name) = &filter.name {
            variables.insert("triggerName".to_string(), Value::from(name.clone()));
        }
        if let Some(project) = &filter.project {
            variables.insert("projectName".to_string(), Value::from(project.clone()));
        }
        Self {
            client,
            query,
            variables,
            per_page: filter.per_page.unwrap_or(DEFAULT_PER_PAGE),
            last_page_info: None,
        }
    }

    /// Whether more records remain. `true` before any page is fetched.
    pub fn more(&self) -> bool {
        match &self.last_page_info {
            Some(info) => info.has_next_page,
            None => true,
        }
    }

    /// The cursor the next fetch will resume from.
    pub fn cursor(&self) -> Option<&str> {
        self.last_page_info
            .as_ref()
            .and_then(|info| info.end_cursor.as_deref())
    }

    /// Fetch the next page and decode its trigger records, in order.
    /// Returns an empty page once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Vec<Automation>> {
        if !self.more() {
            return Ok(Vec::new());
        }

        let mut variables = self.variables.clone();
        variables.insert("perPage".to_string(), Value::from(self.per_page));
        if let Some(cursor) = self.cursor() {
            variables.insert("cursor".to_string(), Value::from(cursor.to_string()));
        }

        let data = self.client.execute(self.query, Value::Object(variables)).await?;
        let page = decode_page(&data)?;

        debug!(
            projects = page.edges.len(),
            has_next_page = page.page_info.has_next_page,
            "fetched automations page"
        );
        self.last_page_info = Some(page.page_info);

        Ok(page
            .edges
            .into_iter()
            .flat_map(|edge| edge.node.triggers)
            .collect())
    }

    /// Drain the remaining pages into one list.
    pub async fn collect_all(mut self) -> Result<Vec<Automation>> {
        let mut all = Vec::new();
        while self.more() {
            all.extend(self.next_page().await?);
        }
        Ok(all)
    }
}

/// Validate a listing response against the expected page shape. Shape
/// mismatches become a single descriptive error instead of a raw parse
/// failure.
fn decode_page(data: &Value) -> Result<ProjectConnection> {
    let page_data = data
        .get("searchScope")
        .and_then(|scope| scope.get("projects"))
        .ok_or_else(|| {
            ApiError::MalformedResponse("response has no searchScope.projects".to_string())
        })?;
    serde_json::from_value(page_data.clone())
        .map_err(|err| ApiError::MalformedResponse(err.to_string()))
}
