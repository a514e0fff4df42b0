///
/// Power state reported by the daemon for a server process.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    Running,
    Starting,
    Stopping,
    Offline,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::Running => "running",
            PowerState::Starting => "starting",
            PowerState::Stopping => "stopping",
            PowerState::Offline => "offline",
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// A point-in-time sample of the resource usage of one server.
///
/// This is the body of `GET /servers/{id}/resources`.
///
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub display_state: PowerState,
    pub cpu_usage_percent: f64,
    pub memory_usage_bytes: u64,
    pub disk_usage_bytes: u64,
    pub is_suspended: bool,
}
