use lapse_shared::{resources::ResourceSnapshot, servers::Limits};

/// Share of a limit from which on usage is alarming.
pub const ALARM_THRESHOLD: f64 = 0.9;

const BYTES_PER_MIB: u64 = 1024 * 1024;

///
/// Threshold alarms of one server, recomputed from every fetched snapshot.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct AlarmState {
    pub cpu: bool,
    pub memory: bool,
    pub disk: bool,
}

impl AlarmState {
    pub fn derive(snapshot: &ResourceSnapshot, limits: &Limits) -> Self {
        Self {
            cpu: cpu_alarm(snapshot.cpu_usage_percent, limits.cpu),
            memory: bytes_alarm(snapshot.memory_usage_bytes, limits.memory),
            disk: bytes_alarm(snapshot.disk_usage_bytes, limits.disk),
        }
    }

    pub fn any(&self) -> bool {
        self.cpu || self.memory || self.disk
    }
}

/// `limit` is in percent, `0` never alarms.
pub fn cpu_alarm(usage_percent: f64, limit: u64) -> bool {
    if limit == 0 {
        return false;
    }

    usage_percent >= limit as f64 * ALARM_THRESHOLD
}

/// `limit_mib` is in MiB, `0` never alarms.
pub fn bytes_alarm(usage_bytes: u64, limit_mib: u64) -> bool {
    if limit_mib == 0 {
        return false;
    }

    usage_bytes as f64 / limit_mib.saturating_mul(BYTES_PER_MIB) as f64 >= ALARM_THRESHOLD
}
