//! A lazy handle to the out-of-process service backend.
//!
//! The connection protocol itself lives behind [`ServiceConnection`];
//! this module owns only the lifecycle: connect on first use, stamp the
//! handle's id on every request, and release backend-side resources on
//! [`ServiceApi::close`] (or best-effort on drop).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::settings::Settings;

/// A request routed to the service process. The `id` names the owning
/// handle's backend-side resources and is stamped by [`ServiceApi`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    #[serde(default)]
    pub id: String,
    pub body: Value,
}

impl ApiRequest {
    pub fn new(body: Value) -> Self {
        Self {
            id: String::new(),
            body,
        }
    }
}

/// The service's reply to an [`ApiRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub id: String,
    pub body: Value,
}

/// A pending reply from the service. Produced once the service has
/// acknowledged receipt of the request.
pub struct ResponseHandle {
    rx: oneshot::Receiver<ApiResponse>,
}

impl ResponseHandle {
    pub fn new(rx: oneshot::Receiver<ApiResponse>) -> Self {
        Self { rx }
    }

    /// Wait for the reply.
    pub async fn wait(self) -> Result<ApiResponse> {
        self.rx
            .await
            .map_err(|_| ApiError::Service("connection dropped before replying".to_string()))
    }

    /// Wait for the reply, giving up after `timeout`.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<ApiResponse> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(ApiError::Service(
                "connection dropped before replying".to_string(),
            )),
            Err(_) => Err(ApiError::Timeout(timeout)),
        }
    }
}

/// Transport to the service process. Implementations own framing and
/// delivery; `send` returns once the service acknowledges receipt.
#[async_trait]
pub trait ServiceConnection: Send + Sync {
    /// Initialize backend-side resources for a new handle, returning the
    /// id the service assigned to it.
    async fn init(&self, settings: &Settings) -> Result<String>;

    /// Submit a request, returning a handle for the eventual reply.
    async fn send(&self, request: ApiRequest) -> Result<ResponseHandle>;

    /// Release the backend-side resources tied to a handle id.
    async fn cleanup(&self, api_id: &str) -> Result<()>;
}

/// Establishes connections to the service process.
#[async_trait]
pub trait ServiceConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn ServiceConnection>>;
}

/// A lazily initialized handle to the service backend.
///
/// The connection is established on the first request; until then the
/// handle is inert. Lazy initialization takes `&mut self`, so a handle
/// shared across threads needs external serialization of its first use.
pub struct ServiceApi {
    settings: Settings,
    connector: Box<dyn ServiceConnector>,
    connection: Option<Box<dyn ServiceConnection>>,
    api_id: String,
}

impl ServiceApi {
    pub fn new(settings: Settings, connector: Box<dyn ServiceConnector>) -> Self {
        Self {
            settings,
            connector,
            connection: None,
            // Placeholder until the init exchange assigns the real id.
            api_id: Uuid::new_v4().to_string(),
        }
    }

    /// The id naming this handle's backend-side resources.
    pub fn api_id(&self) -> &str {
        &self.api_id
    }

    async fn ensure_connection(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        let connection = self.connector.connect().await?;
        self.api_id = connection.init(&self.settings).await?;
        debug!(api_id = %self.api_id, "service connection established");
        self.connection = Some(connection);
        Ok(())
    }

    fn connected(&self) -> Result<&dyn ServiceConnection> {
        self.connection
            .as_deref()
            .ok_or_else(|| ApiError::Service("connection was not established".to_string()))
    }

    /// Send an API request and wait for the reply, connecting first if
    /// needed.
    pub async fn send_request(
        &mut self,
        mut request: ApiRequest,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse> {
        self.ensure_connection().await?;
        request.id = self.api_id.clone();
        let handle = self.connected()?.send(request).await?;
        match timeout {
            Some(timeout) => handle.wait_timeout(timeout).await,
            None => handle.wait().await,
        }
    }

    /// Send an API request, returning once the service acknowledges
    /// receipt. The returned handle resolves to the eventual reply;
    /// replies to concurrent requests are not ordered.
    pub async fn send_request_async(&mut self, mut request: ApiRequest) -> Result<ResponseHandle> {
        self.ensure_connection().await?;
        request.id = self.api_id.clone();
        self.connected()?.send(request).await
    }

    /// Release the backend-side resources tied to this handle. Idempotent;
    /// a never-connected handle has nothing to release.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            connection.cleanup(&self.api_id).await?;
            debug!(api_id = %self.api_id, "service connection closed");
        }
        Ok(())
    }
}

impl Drop for ServiceApi {
    fn drop(&mut self) {
        // Fallback for handles dropped without close(); errors are
        // suppressed and the cleanup races process exit.
        if let Some(connection) = self.connection.take() {
            let api_id = std::mem::take(&mut self.api_id);
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    let _ = connection.cleanup(&api_id).await;
                });
            }
        }
    }
}
