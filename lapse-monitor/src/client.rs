use std::time::Duration;

use async_trait::async_trait;
use lapse_shared::{
    error_chain_fmt,
    resources::ResourceSnapshot,
    servers::{Paginated, ServerResponse, ServerStatus},
    settings::MonitorSettings,
};
use reqwest::Client;
use uuid::Uuid;

///
/// Possible errors when fetching from the panel.
///
/// Never fatal for a monitor loop, a failed fetch only shows up as a
/// connection error until the next tick.
///
#[derive(thiserror::Error)]
pub enum FetchError {
    #[error("Request to the panel failed")]
    Http(#[from] reqwest::Error),
    #[error("Panel returned {status}: {message}")]
    Api { status: u16, message: String },
}

impl std::fmt::Debug for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

///
/// Source of point-in-time resource snapshots.
///
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self, server_id: Uuid) -> Result<ResourceSnapshot, FetchError>;
}

///
/// Accessor for the persisted status of a server.
///
/// Every call has to reach the panel; a monitor must never look at a cached status.
///
#[async_trait]
pub trait StatusLookup: Send + Sync {
    async fn status(&self, server_id: Uuid) -> Result<ServerStatus, FetchError>;
}

///
/// HTTP client for the panel API.
///
#[derive(Debug, Clone)]
pub struct PanelClient {
    http: Client,
    base_url: String,
}

impl PanelClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &MonitorSettings) -> Result<Self, FetchError> {
        Self::new(settings.panel_url.clone(), settings.timeout())
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await?;

        if response.status().is_success() == false {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();

            return Err(FetchError::Api { status, message });
        }

        Ok(response.json().await?)
    }

    pub async fn server(&self, server_id: Uuid) -> Result<ServerResponse, FetchError> {
        self.get(&format!("/servers/{}", server_id), &[]).await
    }

    pub async fn servers_page(&self, page: u32) -> Result<Paginated<ServerResponse>, FetchError> {
        self.get("/servers", &[("page", page.to_string())]).await
    }

    ///
    /// Fetch every server, page by page.
    ///
    #[tracing::instrument(name = "List all servers", skip(self))]
    pub async fn all_servers(&self) -> Result<Vec<ServerResponse>, FetchError> {
        let mut servers = Vec::new();
        let mut page = 1;

        loop {
            let mut current = self.servers_page(page).await?;
            let received = current.data.len();
            servers.append(&mut current.data);

            if received == 0 || servers.len() as i64 >= current.total {
                break;
            }

            page += 1;
        }

        Ok(servers)
    }
}

#[async_trait]
impl SnapshotSource for PanelClient {
    #[tracing::instrument(name = "Fetch resource snapshot", skip(self))]
    async fn snapshot(&self, server_id: Uuid) -> Result<ResourceSnapshot, FetchError> {
        self.get(&format!("/servers/{}/resources", server_id), &[])
            .await
    }
}

#[async_trait]
impl StatusLookup for PanelClient {
    async fn status(&self, server_id: Uuid) -> Result<ServerStatus, FetchError> {
        Ok(self.server(server_id).await?.status)
    }
}
