use lapse_shared::{
    resources::{PowerState, ResourceSnapshot},
    servers::ServerStatus,
};

use crate::alarm::AlarmState;

///
/// What a monitored server row shows.
///
/// Variants are ordered by precedence, the first one that applies wins.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayState {
    Suspended,
    Transferring,
    Installing,
    InstallFailed,
    RestoringBackup,
    ConnectionError,
    Live {
        snapshot: ResourceSnapshot,
        alarms: AlarmState,
    },
    Loading,
}

impl DisplayState {
    ///
    /// Resolve the display state of a server.
    ///
    /// * `status` is the last observed persisted status.
    /// * `suspended` is the local suspended display flag of the monitor loop.
    /// * `fetch_failed` is set when the latest snapshot fetch failed.
    ///
    pub fn resolve(
        status: ServerStatus,
        suspended: bool,
        fetch_failed: bool,
        live: Option<(ResourceSnapshot, AlarmState)>,
    ) -> Self {
        if suspended || status.is_suspended() {
            return DisplayState::Suspended;
        }

        match status {
            ServerStatus::Transferring => DisplayState::Transferring,
            ServerStatus::Installing => DisplayState::Installing,
            ServerStatus::InstallFailed | ServerStatus::ReinstallFailed => {
                DisplayState::InstallFailed
            }
            ServerStatus::RestoringBackup => DisplayState::RestoringBackup,
            ServerStatus::Active | ServerStatus::Suspended => match (fetch_failed, live) {
                (true, _) => DisplayState::ConnectionError,
                (false, Some((snapshot, alarms))) => DisplayState::Live { snapshot, alarms },
                (false, None) => DisplayState::Loading,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayState::Suspended => "Suspended",
            DisplayState::Transferring => "Transferring",
            DisplayState::Installing => "Installing",
            DisplayState::InstallFailed => "Install failed",
            DisplayState::RestoringBackup => "Restoring backup",
            DisplayState::ConnectionError => "Connection error",
            DisplayState::Live { snapshot, .. } => match snapshot.display_state {
                PowerState::Running => "Running",
                PowerState::Starting => "Starting",
                PowerState::Stopping => "Stopping",
                PowerState::Offline => "Offline",
            },
            DisplayState::Loading => "Loading",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, DisplayState::Live { .. })
    }
}
