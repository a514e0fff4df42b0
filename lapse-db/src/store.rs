//! The data store seam used by the panel: one trait, a Postgres
//! implementation and an in-memory one for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lapse_shared::servers::ServerStatus;
use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use crate::servers::{
    models::{AllocationModel, ExtensionDays, Page, ServerModel},
    queries,
};

///
/// Possible errors of a [`ServerStore`].
///
#[derive(thiserror::Error)]
pub enum StoreError {
    /// A query against the database failed.
    #[error("Failed to query the database")]
    Database(#[from] sqlx::Error),
    /// The store cannot be reached at all.
    #[error("The server store is unavailable")]
    Unavailable,
    /// No server has the given id.
    #[error("Server {0} does not exist")]
    NotFound(Uuid),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        lapse_shared::error_chain_fmt(self, f)
    }
}

///
/// Persistent collection of servers.
///
/// Every read goes to the backing store; implementations must not cache, since
/// the status field is written by the expiration enforcer and read by monitors.
///
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Servers with an expiration before `now` that are not suspended.
    async fn expired_servers(&self, now: DateTime<Utc>) -> Result<Vec<ServerModel>, StoreError>;

    async fn server(&self, server_id: Uuid) -> Result<Option<ServerModel>, StoreError>;

    async fn status(&self, server_id: Uuid) -> Result<Option<ServerStatus>, StoreError>;

    /// Fails with [`StoreError::NotFound`] for unknown servers.
    async fn set_status(&self, server_id: Uuid, status: ServerStatus) -> Result<(), StoreError>;

    /// Move the expiration by `days`, starting from `now` when there is none.
    ///
    /// Read and write happen atomically, so concurrent extensions all add up.
    /// Returns the updated server, or `None` if it does not exist.
    async fn extend_expiration(
        &self,
        server_id: Uuid,
        days: ExtensionDays,
        now: DateTime<Utc>,
    ) -> Result<Option<ServerModel>, StoreError>;

    async fn allocations(&self, server_id: Uuid) -> Result<Vec<AllocationModel>, StoreError>;

    /// One page of servers plus the total amount of servers.
    async fn servers_page(&self, page: Page) -> Result<(Vec<ServerModel>, i64), StoreError>;
}

///
/// [`ServerStore`] backed by Postgres.
///
#[derive(Debug, Clone)]
pub struct PgServerStore {
    pool: PgPool,
}

impl PgServerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServerStore for PgServerStore {
    async fn expired_servers(&self, now: DateTime<Utc>) -> Result<Vec<ServerModel>, StoreError> {
        Ok(queries::get_expired_servers(now, &self.pool).await?)
    }

    async fn server(&self, server_id: Uuid) -> Result<Option<ServerModel>, StoreError> {
        Ok(queries::get_server_with_id(server_id, &self.pool).await?)
    }

    async fn status(&self, server_id: Uuid) -> Result<Option<ServerStatus>, StoreError> {
        Ok(queries::get_server_status(server_id, &self.pool).await?)
    }

    async fn set_status(&self, server_id: Uuid, status: ServerStatus) -> Result<(), StoreError> {
        if queries::update_server_status(&self.pool, server_id, status).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(server_id))
        }
    }

    async fn extend_expiration(
        &self,
        server_id: Uuid,
        days: ExtensionDays,
        now: DateTime<Utc>,
    ) -> Result<Option<ServerModel>, StoreError> {
        Ok(queries::extend_server_expiration(&self.pool, server_id, days, now).await?)
    }

    async fn allocations(&self, server_id: Uuid) -> Result<Vec<AllocationModel>, StoreError> {
        Ok(queries::get_allocations_for_server(server_id, &self.pool).await?)
    }

    async fn servers_page(&self, page: Page) -> Result<(Vec<ServerModel>, i64), StoreError> {
        let servers = queries::get_servers_page(page, &self.pool).await?;
        let total = queries::count_servers(&self.pool).await?;

        Ok((servers, total))
    }
}

///
/// In-memory [`ServerStore`] for testing and development.
///
#[derive(Debug, Default)]
pub struct MemoryServerStore {
    servers: RwLock<HashMap<Uuid, ServerModel>>,
    allocations: RwLock<HashMap<Uuid, Vec<AllocationModel>>>,
    unavailable: AtomicBool,
}

impl MemoryServerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, server: ServerModel, allocations: Vec<AllocationModel>) {
        self.allocations.write().insert(server.id, allocations);
        self.servers.write().insert(server.id, server);
    }

    ///
    /// Simulate an outage: every operation fails with [`StoreError::Unavailable`]
    /// until it is switched off again.
    ///
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ServerStore for MemoryServerStore {
    async fn expired_servers(&self, now: DateTime<Utc>) -> Result<Vec<ServerModel>, StoreError> {
        self.check_available()?;

        Ok(self
            .servers
            .read()
            .values()
            .filter(|server| server.is_expiration_candidate(now))
            .cloned()
            .collect())
    }

    async fn server(&self, server_id: Uuid) -> Result<Option<ServerModel>, StoreError> {
        self.check_available()?;

        Ok(self.servers.read().get(&server_id).cloned())
    }

    async fn status(&self, server_id: Uuid) -> Result<Option<ServerStatus>, StoreError> {
        self.check_available()?;

        Ok(self.servers.read().get(&server_id).map(|server| server.status))
    }

    async fn set_status(&self, server_id: Uuid, status: ServerStatus) -> Result<(), StoreError> {
        self.check_available()?;

        let mut servers = self.servers.write();
        let server = servers
            .get_mut(&server_id)
            .ok_or(StoreError::NotFound(server_id))?;

        server.status = status;
        server.updated_at = Utc::now();

        Ok(())
    }

    async fn extend_expiration(
        &self,
        server_id: Uuid,
        days: ExtensionDays,
        now: DateTime<Utc>,
    ) -> Result<Option<ServerModel>, StoreError> {
        self.check_available()?;

        let mut servers = self.servers.write();

        Ok(servers.get_mut(&server_id).map(|server| {
            server.expires_at = Some(days.extend(server.expires_at, now));
            server.updated_at = Utc::now();
            server.clone()
        }))
    }

    async fn allocations(&self, server_id: Uuid) -> Result<Vec<AllocationModel>, StoreError> {
        self.check_available()?;

        Ok(self
            .allocations
            .read()
            .get(&server_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn servers_page(&self, page: Page) -> Result<(Vec<ServerModel>, i64), StoreError> {
        self.check_available()?;

        let mut servers: Vec<ServerModel> = self.servers.read().values().cloned().collect();
        servers.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        let total = servers.len() as i64;
        let page = servers
            .into_iter()
            .skip(page.offset() as usize)
            .take(Page::PER_PAGE as usize)
            .collect();

        Ok((page, total))
    }
}
