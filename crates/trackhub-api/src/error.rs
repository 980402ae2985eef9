use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the backend client and service handle.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable HTTP response.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the request, e.g. an incompatible
    /// scope/event combination or a duplicate name.
    #[error("Backend rejected the request (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response arrived but did not have the expected shape.
    #[error("Unexpected response data: {0}")]
    MalformedResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Automation(#[from] trackhub_automations::AutomationError),

    #[error("No automation found with name {0:?}")]
    NotFound(String),

    #[error("Multiple automations found with name {0:?}")]
    Ambiguous(String),

    #[error("Service connection error: {0}")]
    Service(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Whether the backend rejected the request as conflicting with
    /// existing state (e.g. an automation name that is already taken).
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Api { status: 409, .. } => true,
            Self::Api { message, .. } => {
                let message = message.to_ascii_lowercase();
                message.contains("already exists") || message.contains("duplicate")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
