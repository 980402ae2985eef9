use thiserror::Error;

use crate::actions::ActionType;

/// Errors raised while assembling or preparing automations locally.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Automation is missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unsupported action type: {0}")]
    UnsupportedActionType(ActionType),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AutomationError>;
