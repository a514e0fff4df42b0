use std::{sync::Arc, time::Duration};

use lapse_shared::settings::MonitorSettings;
use tokio::time::MissedTickBehavior;

use crate::{
    client::{FetchError, PanelClient},
    dashboard::Dashboard,
    monitor::MonitorConfig,
};

/// How often changed rows are written out.
const RENDER_INTERVAL: Duration = Duration::from_secs(1);

pub struct Application {
    client: Arc<PanelClient>,
    dashboard: Dashboard,
    refresh_interval: Duration,
}

impl Application {
    pub fn build(settings: &MonitorSettings) -> Result<Self, FetchError> {
        let client = Arc::new(PanelClient::from_settings(settings)?);
        let dashboard = Dashboard::new(
            client.clone(),
            client.clone(),
            MonitorConfig::from(settings),
        );

        Ok(Self {
            client,
            dashboard,
            refresh_interval: settings.refresh_interval(),
        })
    }

    ///
    /// Keep the dashboard in sync with the panel until ctrl-c is received.
    ///
    /// Every monitor loop is cancelled before this returns.
    ///
    pub async fn run_until_stopped(mut self) {
        let mut refresh = tokio::time::interval(self.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut render = tokio::time::interval(RENDER_INTERVAL);
        render.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down monitor");
                    break;
                }
                _ = refresh.tick() => self.refresh().await,
                _ = render.tick() => {
                    for row in self.dashboard.changed_rows() {
                        tracing::info!(server_id = %row.server_id, "{}", row);
                    }
                }
            }
        }

        self.dashboard.clear();
    }

    async fn refresh(&mut self) {
        match self.client.all_servers().await {
            Ok(servers) => {
                self.dashboard.sync(servers);
                tracing::debug!(displayed = self.dashboard.len(), "Synced displayed servers");
            }
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to list servers, keeping the current set");
            }
        }
    }
}
