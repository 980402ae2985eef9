//! Client for the TrackHub backend: the GraphQL API surface for
//! automations and integrations, and the lazy handle to the local
//! service process.
//!
//! The automation rule model itself lives in [`trackhub_automations`].

pub mod api;
pub mod automations;
pub mod client;
pub mod error;
pub mod integrations;
pub mod pagination;
pub mod queries;
pub mod service;
pub mod settings;

pub use api::{Api, CreateOptions};
pub use automations::{AutomationsFilter, AutomationsPager};
pub use client::GraphqlClient;
pub use error::{ApiError, Result};
pub use integrations::{Integration, IntegrationsPager, SlackIntegration, WebhookIntegration};
pub use pagination::PageInfo;
pub use service::{
    ApiRequest, ApiResponse, ResponseHandle, ServiceApi, ServiceConnection, ServiceConnector,
};
pub use settings::Settings;
