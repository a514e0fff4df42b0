use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

///
/// Lifecycle status of a server as persisted by the panel.
///
/// Serialized in `snake_case`, which is also the representation stored in the
/// `servers.status` column.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Active,
    Installing,
    InstallFailed,
    ReinstallFailed,
    RestoringBackup,
    Transferring,
    Suspended,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Active => "active",
            ServerStatus::Installing => "installing",
            ServerStatus::InstallFailed => "install_failed",
            ServerStatus::ReinstallFailed => "reinstall_failed",
            ServerStatus::RestoringBackup => "restoring_backup",
            ServerStatus::Transferring => "transferring",
            ServerStatus::Suspended => "suspended",
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, ServerStatus::Suspended)
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0:?} is not a known server status")]
pub struct UnknownServerStatus(pub String);

impl FromStr for ServerStatus {
    type Err = UnknownServerStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(ServerStatus::Active),
            "installing" => Ok(ServerStatus::Installing),
            "install_failed" => Ok(ServerStatus::InstallFailed),
            "reinstall_failed" => Ok(ServerStatus::ReinstallFailed),
            "restoring_backup" => Ok(ServerStatus::RestoringBackup),
            "transferring" => Ok(ServerStatus::Transferring),
            "suspended" => Ok(ServerStatus::Suspended),
            other => Err(UnknownServerStatus(other.to_string())),
        }
    }
}

///
/// Administrative action applied through the suspension toggle.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspendAction {
    Suspend,
    Unsuspend,
}

impl SuspendAction {
    ///
    /// The status a server is persisted with once the action went through.
    ///
    pub fn target_status(&self) -> ServerStatus {
        match self {
            SuspendAction::Suspend => ServerStatus::Suspended,
            SuspendAction::Unsuspend => ServerStatus::Active,
        }
    }

    ///
    /// Whether a server with the given status already is where this action would put it.
    ///
    pub fn is_satisfied_by(&self, status: ServerStatus) -> bool {
        match self {
            SuspendAction::Suspend => status.is_suspended(),
            SuspendAction::Unsuspend => !status.is_suspended(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuspendAction::Suspend => "suspend",
            SuspendAction::Unsuspend => "unsuspend",
        }
    }
}

impl std::fmt::Display for SuspendAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Resource limits of a server. `0` means unlimited.
///
/// Memory and disk are expressed in MiB, cpu in percent of one core.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Limits {
    pub cpu: u64,
    pub memory: u64,
    pub disk: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub ip: String,
    pub port: u16,
    pub alias: Option<String>,
    pub is_default: bool,
}

///
/// Model for servers that can be used for responses.
///
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResponse {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub status: ServerStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub limits: Limits,
    pub allocations: Vec<AllocationResponse>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ServerResponse {
    pub fn default_allocation(&self) -> Option<&AllocationResponse> {
        self.allocations.iter().find(|allocation| allocation.is_default)
    }
}

///
/// One page of a listing.
///
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}
