use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use lapse_db::{ServerStore, StoreError};
use lapse_shared::{error_chain_fmt, servers::SuspendAction};
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};
use uuid::Uuid;

use crate::suspension::{SuspensionToggle, ToggleOutcome};

///
/// Possible errors of an enforcement run.
///
/// Failures of single servers are not errors; they end up in the
/// [`EnforcementSummary`] instead.
///
#[derive(thiserror::Error)]
pub enum EnforcementError {
    /// The candidates could not be determined, so nothing was done.
    #[error("Failed to query expired servers")]
    DataStore(#[source] StoreError),
    /// Another run is still in progress.
    #[error("An expiration check is already running")]
    AlreadyRunning,
}

impl std::fmt::Debug for EnforcementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementFailure {
    pub server_id: Uuid,
    pub name: String,
    pub reason: String,
}

///
/// Outcome of one enforcement run.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementSummary {
    /// Candidates handed to the suspension toggle.
    pub attempted: usize,
    /// Candidates that are suspended now.
    pub suspended: usize,
    /// Candidates that turned out to be suspended already.
    pub unchanged: usize,
    pub failures: Vec<EnforcementFailure>,
}

impl EnforcementSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

///
/// Suspends every server whose expiration date has passed.
///
pub struct ExpirationEnforcer {
    store: Arc<dyn ServerStore>,
    toggle: Arc<SuspensionToggle>,
    running: Mutex<()>,
}

impl ExpirationEnforcer {
    pub fn new(store: Arc<dyn ServerStore>, toggle: Arc<SuspensionToggle>) -> Self {
        Self {
            store,
            toggle,
            running: Mutex::new(()),
        }
    }

    pub async fn run(&self) -> Result<EnforcementSummary, EnforcementError> {
        self.run_at(Utc::now()).await
    }

    ///
    /// Run the enforcer as if the current time was `now`.
    ///
    /// Every candidate gets exactly one suspend attempt; a failing server is
    /// recorded and the run continues with the next one.
    ///
    #[tracing::instrument(name = "Enforce server expirations", skip(self))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<EnforcementSummary, EnforcementError> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| EnforcementError::AlreadyRunning)?;

        let candidates = self
            .store
            .expired_servers(now)
            .await
            .map_err(EnforcementError::DataStore)?;

        let mut summary = EnforcementSummary::default();

        for server in candidates {
            summary.attempted += 1;

            tracing::info!(
                server_id = %server.id,
                name = %server.name,
                "Suspending expired server"
            );

            match self.toggle.toggle(server.id, SuspendAction::Suspend).await {
                Ok(ToggleOutcome::Applied) => summary.suspended += 1,
                Ok(ToggleOutcome::Unchanged) => summary.unchanged += 1,
                Err(e) => {
                    tracing::error!(
                        server_id = %server.id,
                        error = ?e,
                        "Failed to suspend expired server"
                    );

                    summary.failures.push(EnforcementFailure {
                        server_id: server.id,
                        name: server.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if summary.attempted > 0 {
            tracing::info!(
                attempted = summary.attempted,
                suspended = summary.suspended,
                failed = summary.failed(),
                "Expiration check finished"
            );
        }

        Ok(summary)
    }

    ///
    /// Run the enforcer on a fixed interval until the returned task is aborted.
    ///
    /// The first run happens right away. Ticks missed while a run takes longer
    /// than the interval are skipped.
    ///
    pub fn spawn_schedule(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                match self.run().await {
                    Ok(_) => (),
                    Err(EnforcementError::AlreadyRunning) => {
                        tracing::warn!(
                            "Skipping scheduled expiration check, previous run still active"
                        )
                    }
                    Err(e) => tracing::error!(error = ?e, "Scheduled expiration check failed"),
                }
            }
        })
    }
}
