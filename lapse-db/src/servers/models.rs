use chrono::{DateTime, Duration, Utc};
use lapse_shared::servers::{
    AllocationResponse, Limits, ServerResponse, ServerStatus, UnknownServerStatus,
};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

///
/// Model to fetch a server from the database with.
///
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServerModel {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub status: ServerStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub cpu_limit: i64,
    pub memory_limit: i64,
    pub disk_limit: i64,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ServerModel {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse()
            .map_err(|e: UnknownServerStatus| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            owner_id: row.try_get("owner_id")?,
            status,
            expires_at: row.try_get("expires_at")?,
            cpu_limit: row.try_get("cpu_limit")?,
            memory_limit: row.try_get("memory_limit")?,
            disk_limit: row.try_get("disk_limit")?,
            updated_at: row.try_get("updated_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl ServerModel {
    ///
    /// Whether the expiration enforcer has to suspend this server at `now`.
    ///
    /// Servers without an expiration date live forever, and servers that are
    /// suspended already are never selected again.
    ///
    pub fn is_expiration_candidate(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at < now && self.status.is_suspended() == false,
            None => false,
        }
    }

    pub fn limits(&self) -> Limits {
        Limits {
            cpu: self.cpu_limit.max(0) as u64,
            memory: self.memory_limit.max(0) as u64,
            disk: self.disk_limit.max(0) as u64,
        }
    }

    pub fn to_response(self, allocations: Vec<AllocationModel>) -> ServerResponse {
        let limits = self.limits();

        ServerResponse {
            id: self.id,
            name: self.name,
            owner_id: self.owner_id,
            status: self.status,
            expires_at: self.expires_at,
            limits,
            allocations: allocations.into_iter().map(Into::into).collect(),
            updated_at: self.updated_at,
            created_at: self.created_at,
        }
    }
}

///
/// Network allocation (ip and port) assigned to a server.
///
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
pub struct AllocationModel {
    pub id: Uuid,
    pub server_id: Uuid,
    pub ip: String,
    pub port: i32,
    pub alias: Option<String>,
    pub is_default: bool,
}

impl From<AllocationModel> for AllocationResponse {
    fn from(val: AllocationModel) -> Self {
        Self {
            ip: val.ip,
            port: u16::try_from(val.port).unwrap_or_default(),
            alias: val.alias,
            is_default: val.is_default,
        }
    }
}

///
/// Provides a validated amount of days to extend an expiration by.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionDays(i64);

impl ExtensionDays {
    pub const DEFAULT: ExtensionDays = ExtensionDays(30);
    const MAX: i64 = 3650;

    ///
    /// Parse [`ExtensionDays`] from a raw day count.
    ///
    /// This ensures the value lies within `1..=3650`.
    ///
    pub fn parse(value: i64) -> Result<ExtensionDays, String> {
        if (1..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("{} is not a valid amount of days!", value))
        }
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    ///
    /// Compute the new expiration date.
    ///
    /// Extends from the current expiration when there is one, otherwise from `now`.
    ///
    pub fn extend(&self, current: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
        current.unwrap_or(now) + Duration::days(self.0)
    }
}

impl std::fmt::Display for ExtensionDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

///
/// Provides a validated, 1-based page number for listings.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(u32);

impl Page {
    pub const PER_PAGE: u32 = 50;

    pub fn parse(value: u32) -> Result<Page, String> {
        if value >= 1 {
            Ok(Self(value))
        } else {
            Err(format!("{} is not a valid page!", value))
        }
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.0 - 1) * i64::from(Self::PER_PAGE)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self(1)
    }
}
