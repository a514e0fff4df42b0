//! One live monitor loop per displayed server.
//!
//! A loop is either *polling*, fetching a resource snapshot on a fixed cadence,
//! or *suspended*, fetching nothing at all. Independently of that it re-reads the
//! persisted status of its server, so suspensions applied elsewhere are picked up
//! without a fetch.

use std::{sync::Arc, time::Duration};

use lapse_shared::{
    resources::ResourceSnapshot,
    servers::{Limits, ServerStatus},
    settings::MonitorSettings,
};
use tokio::{
    sync::{watch, Notify},
    task::JoinHandle,
    time::{Instant, Interval, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    alarm::AlarmState,
    client::{SnapshotSource, StatusLookup},
    display::DisplayState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Cadence of snapshot fetches while polling.
    pub poll_interval: Duration,
    /// Cadence of persisted status reads.
    pub status_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            status_interval: Duration::from_secs(10),
        }
    }
}

impl From<&MonitorSettings> for MonitorConfig {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            status_interval: settings.status_interval(),
        }
    }
}

///
/// Everything a monitor loop currently knows about its server.
///
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorView {
    pub server_id: Uuid,
    /// Last observed persisted status.
    pub status: ServerStatus,
    /// Local suspended display flag.
    pub suspended: bool,
    pub last_snapshot: Option<ResourceSnapshot>,
    pub alarms: AlarmState,
    /// Whether the latest fetch failed.
    pub fetch_failed: bool,
}

impl MonitorView {
    fn new(server_id: Uuid, status: ServerStatus) -> Self {
        Self {
            server_id,
            status,
            suspended: status.is_suspended(),
            last_snapshot: None,
            alarms: AlarmState::default(),
            fetch_failed: false,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.suspended == false
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState::resolve(
            self.status,
            self.suspended,
            self.fetch_failed,
            self.last_snapshot.map(|snapshot| (snapshot, self.alarms)),
        )
    }
}

///
/// Monitor loop of a single server, not started yet.
///
pub struct MonitorLoop {
    server_id: Uuid,
    limits: Limits,
    initial_status: ServerStatus,
    snapshots: Arc<dyn SnapshotSource>,
    statuses: Arc<dyn StatusLookup>,
    config: MonitorConfig,
}

impl MonitorLoop {
    pub fn new(
        server_id: Uuid,
        limits: Limits,
        initial_status: ServerStatus,
        snapshots: Arc<dyn SnapshotSource>,
        statuses: Arc<dyn StatusLookup>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            server_id,
            limits,
            initial_status,
            snapshots,
            statuses,
            config,
        }
    }

    ///
    /// Spawn the loop onto the runtime.
    ///
    /// Starts suspended when the initial status is `suspended`, otherwise the
    /// first snapshot is fetched right away.
    ///
    pub fn start(self) -> MonitorHandle {
        let initial_view = MonitorView::new(self.server_id, self.initial_status);
        let (sender, receiver) = watch::channel(initial_view);
        let (limits, limits_receiver) = watch::channel(self.limits);
        let status_changed = Arc::new(Notify::new());

        let task = tokio::spawn(self.run(sender, limits_receiver, status_changed.clone()));

        MonitorHandle {
            task,
            view: receiver,
            limits,
            status_changed,
        }
    }

    async fn run(
        mut self,
        sender: watch::Sender<MonitorView>,
        mut limits: watch::Receiver<Limits>,
        status_changed: Arc<Notify>,
    ) {
        let mut view = MonitorView::new(self.server_id, self.initial_status);
        let mut poll = if view.suspended {
            None
        } else {
            Some(self.poll_ticker())
        };

        let mut status_ticker = tokio::time::interval_at(
            Instant::now() + self.config.status_interval,
            self.config.status_interval,
        );
        status_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick(&mut poll) => self.fetch(&mut view, &mut poll).await,
                _ = status_ticker.tick() => self.observe_status(&mut view, &mut poll).await,
                _ = status_changed.notified() => self.observe_status(&mut view, &mut poll).await,
                Ok(()) = limits.changed() => {
                    self.limits = *limits.borrow();

                    if let Some(snapshot) = view.last_snapshot {
                        view.alarms = AlarmState::derive(&snapshot, &self.limits);
                    }
                }
            }

            sender.send_if_modified(|current| {
                if *current == view {
                    return false;
                }

                *current = view.clone();
                true
            });
        }
    }

    fn poll_ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    async fn fetch(&self, view: &mut MonitorView, poll: &mut Option<Interval>) {
        match self.snapshots.snapshot(self.server_id).await {
            Ok(snapshot) => {
                view.alarms = AlarmState::derive(&snapshot, &self.limits);
                view.last_snapshot = Some(snapshot);
                view.fetch_failed = false;

                if snapshot.is_suspended {
                    tracing::info!(
                        server_id = %self.server_id,
                        "Snapshot reports suspension, polling stopped"
                    );

                    view.suspended = true;
                    *poll = None;
                }
            }
            Err(e) => {
                tracing::warn!(
                    server_id = %self.server_id,
                    error = ?e,
                    "Failed to fetch resource snapshot"
                );

                view.fetch_failed = true;
            }
        }
    }

    ///
    /// Re-read the persisted status and react to changes of it.
    ///
    /// Only a transition into or out of `suspended` toggles polling. A suspension
    /// reported by a snapshot therefore sticks until the persisted status moves.
    ///
    async fn observe_status(&self, view: &mut MonitorView, poll: &mut Option<Interval>) {
        let status = match self.statuses.status(self.server_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!(
                    server_id = %self.server_id,
                    error = ?e,
                    "Failed to read server status"
                );
                return;
            }
        };

        let previous = std::mem::replace(&mut view.status, status);

        if previous.is_suspended() == status.is_suspended() {
            return;
        }

        if status.is_suspended() {
            tracing::info!(server_id = %self.server_id, "Server was suspended, polling stopped");

            view.suspended = true;
            *poll = None;
        } else {
            tracing::info!(server_id = %self.server_id, "Server was unsuspended, polling resumed");

            view.suspended = false;
            view.last_snapshot = None;
            view.alarms = AlarmState::default();
            view.fetch_failed = false;
            *poll = Some(self.poll_ticker());
        }
    }
}

async fn tick(poll: &mut Option<Interval>) {
    match poll {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

///
/// Handle of a running monitor loop.
///
/// Dropping the handle cancels the loop, including a fetch that is in flight.
///
#[derive(Debug)]
pub struct MonitorHandle {
    task: JoinHandle<()>,
    view: watch::Receiver<MonitorView>,
    limits: watch::Sender<Limits>,
    status_changed: Arc<Notify>,
}

impl MonitorHandle {
    pub fn view(&self) -> MonitorView {
        self.view.borrow().clone()
    }

    ///
    /// Make the loop re-read the persisted status right away instead of waiting
    /// for the next status tick.
    ///
    pub fn status_changed(&self) {
        self.status_changed.notify_one();
    }

    ///
    /// Replace the limits alarms are derived from. The current snapshot is
    /// re-evaluated without a new fetch.
    ///
    pub fn set_limits(&self, limits: Limits) {
        self.limits.send_if_modified(|current| {
            if *current == limits {
                return false;
            }

            *current = limits;
            true
        });
    }

    pub fn cancel(self) {
        drop(self)
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
