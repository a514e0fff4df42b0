use std::time::Duration;

use async_trait::async_trait;
use lapse_shared::{
    error_chain_fmt,
    resources::{PowerState, ResourceSnapshot},
    servers::{ServerStatus, SuspendAction},
    settings::DaemonSettings,
};
use reqwest::Client;
use uuid::Uuid;

///
/// Possible errors when talking to the node daemon.
///
#[derive(thiserror::Error)]
pub enum DaemonError {
    /// The request could not be sent or its response not be read.
    #[error("Request to the daemon failed")]
    Http(#[from] reqwest::Error),
    /// The daemon answered with a non-success status.
    #[error("Daemon returned {status}: {message}")]
    Api { status: u16, message: String },
}

impl std::fmt::Debug for DaemonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

///
/// Live utilization as reported by the daemon.
///
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Utilization {
    pub memory_bytes: u64,
    pub disk_bytes: u64,
    pub cpu_absolute: f64,
    #[serde(default)]
    pub uptime: u64,
}

///
/// Server details returned by `GET /api/servers/{id}` on the daemon.
///
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DaemonServer {
    pub state: PowerState,
    pub is_suspended: bool,
    pub utilization: Utilization,
}

impl DaemonServer {
    ///
    /// Combine the live utilization with the status persisted by the panel.
    ///
    /// A server counts as suspended as soon as either side says so.
    ///
    pub fn to_snapshot(&self, persisted: ServerStatus) -> ResourceSnapshot {
        ResourceSnapshot {
            display_state: self.state,
            cpu_usage_percent: self.utilization.cpu_absolute,
            memory_usage_bytes: self.utilization.memory_bytes,
            disk_usage_bytes: self.utilization.disk_bytes,
            is_suspended: self.is_suspended || persisted.is_suspended(),
        }
    }
}

///
/// The node daemon that actually enforces suspensions and knows the live
/// resource usage of a server.
///
#[async_trait]
pub trait Daemon: Send + Sync {
    /// Apply a suspension action. Applying an action twice is a no-op on the daemon.
    async fn apply(&self, server_id: Uuid, action: SuspendAction) -> Result<(), DaemonError>;

    async fn server(&self, server_id: Uuid) -> Result<DaemonServer, DaemonError>;
}

///
/// HTTP client for the daemon API.
///
#[derive(Debug, Clone)]
pub struct DaemonClient {
    http: Client,
    base_url: String,
    token: String,
}

impl DaemonClient {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Result<Self, DaemonError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_settings(settings: &DaemonSettings) -> Result<Self, DaemonError> {
        Self::new(
            settings.base_url.clone(),
            settings.token.clone(),
            settings.timeout(),
        )
    }

    fn url(&self, server_id: Uuid, path: &str) -> String {
        format!("{}/api/servers/{}{}", self.base_url, server_id, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DaemonError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();

        Err(DaemonError::Api { status, message })
    }
}

#[async_trait]
impl Daemon for DaemonClient {
    #[tracing::instrument(name = "Apply suspension on daemon", skip(self))]
    async fn apply(&self, server_id: Uuid, action: SuspendAction) -> Result<(), DaemonError> {
        let response = self
            .http
            .post(self.url(server_id, "/suspension"))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(&serde_json::json!({ "action": action }))
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetch server from daemon", skip(self))]
    async fn server(&self, server_id: Uuid) -> Result<DaemonServer, DaemonError> {
        let response = self
            .http
            .get(self.url(server_id, ""))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}
