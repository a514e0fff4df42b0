use std::sync::Arc;

use lapse_db::{ServerStore, StoreError};
use lapse_shared::{error_chain_fmt, servers::SuspendAction};
use uuid::Uuid;

use crate::daemon::{Daemon, DaemonError};

///
/// Possible errors of the [`SuspensionToggle`].
///
#[derive(thiserror::Error)]
pub enum SuspensionError {
    /// The daemon refused or failed to apply the action. Nothing was persisted.
    #[error("Failed to {action} server {server_id} on the daemon")]
    ExternalAction {
        server_id: Uuid,
        action: SuspendAction,
        #[source]
        source: DaemonError,
    },
    /// No server has the given id.
    #[error("Server {0} does not exist")]
    NotFound(Uuid),
    /// Reading or persisting the status failed.
    #[error("Failed to access the server store")]
    Store(#[from] StoreError),
}

impl std::fmt::Debug for SuspensionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

///
/// What a successful toggle did.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The daemon applied the action and the new status was persisted.
    Applied,
    /// The server already was in the target state; nothing happened.
    Unchanged,
}

///
/// Suspends and unsuspends servers.
///
/// The daemon is always told first. The status is only persisted once the daemon
/// succeeded, so the stored status never claims a state the node has not reached.
///
pub struct SuspensionToggle {
    store: Arc<dyn ServerStore>,
    daemon: Arc<dyn Daemon>,
}

impl SuspensionToggle {
    pub fn new(store: Arc<dyn ServerStore>, daemon: Arc<dyn Daemon>) -> Self {
        Self { store, daemon }
    }

    #[tracing::instrument(name = "Toggle server suspension", skip(self))]
    pub async fn toggle(
        &self,
        server_id: Uuid,
        action: SuspendAction,
    ) -> Result<ToggleOutcome, SuspensionError> {
        let status = self
            .store
            .status(server_id)
            .await?
            .ok_or(SuspensionError::NotFound(server_id))?;

        if action.is_satisfied_by(status) {
            tracing::debug!(%status, "Server already in target state");
            return Ok(ToggleOutcome::Unchanged);
        }

        self.daemon
            .apply(server_id, action)
            .await
            .map_err(|source| SuspensionError::ExternalAction {
                server_id,
                action,
                source,
            })?;

        let target = action.target_status();

        if let Err(e) = self.store.set_status(server_id, target).await {
            tracing::error!(
                error = ?e,
                "Daemon applied the action but the new status could not be persisted"
            );
            return Err(e.into());
        }

        tracing::info!(status = %target, "Persisted new server status");

        Ok(ToggleOutcome::Applied)
    }
}
