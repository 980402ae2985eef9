use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ApiError, Result};
use crate::settings::Settings;

/// A minimal GraphQL-over-HTTP client: POSTs `{query, variables}` to the
/// backend's `/graphql` endpoint and splits GraphQL-level errors from
/// transport failures.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GraphqlClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let base = Url::parse(settings.base_url.trim_end_matches('/'))?;
        let endpoint = base.join("graphql")?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            api_key: settings.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Execute a query document with the given variables, returning the
    /// response's `data` field.
    pub async fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        debug!(endpoint = %self.endpoint, "executing GraphQL request");

        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });
        let mut request = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.basic_auth("api", Some(api_key));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "backend returned an error status");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: Value = serde_json::from_str(&text)?;
        if let Some(errors) = body.get("errors").and_then(Value::as_array)
            && !errors.is_empty()
        {
            let message = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%message, "backend returned GraphQL errors");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        body.get("data")
            .cloned()
            .ok_or_else(|| ApiError::MalformedResponse("response has no data field".to_string()))
    }
}

/// Pull a human-readable message out of an error response body, falling
/// back to the raw text.
fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(errors) = json.get("errors").and_then(Value::as_array) {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return messages.join("; ");
            }
        }
        if let Some(message) = json.get("error").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_graphql_errors() {
        let body = r#"{"errors": [{"message": "name already exists"}]}"#;
        assert_eq!(error_message(body), "name already exists");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_text() {
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_endpoint_is_derived_from_base_url() {
        let settings = Settings::new("http://localhost:8080/");
        let client = GraphqlClient::new(&settings).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:8080/graphql");
    }
}
