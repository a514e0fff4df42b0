use lapse_shared::servers::ServerResponse;
use uuid::Uuid;

use crate::{alarm::AlarmState, display::DisplayState, monitor::MonitorView};

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

///
/// Rendered line of the dashboard for one server.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRow {
    pub server_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub label: &'static str,
    pub usage: Option<UsageColumns>,
}

///
/// Formatted live usage, only present while stats are shown.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageColumns {
    pub cpu: String,
    pub memory: String,
    pub disk: String,
    pub alarms: AlarmState,
}

impl ServerRow {
    pub fn render(server: &ServerResponse, view: &MonitorView) -> Self {
        let display = view.display_state();

        let usage = match display {
            DisplayState::Live { snapshot, alarms } => Some(UsageColumns {
                cpu: format!(
                    "{:.2}% / {}",
                    snapshot.cpu_usage_percent,
                    format_limit(server.limits.cpu, |cpu| format!("{}%", cpu))
                ),
                memory: format!(
                    "{} / {}",
                    format_bytes(snapshot.memory_usage_bytes),
                    format_limit(server.limits.memory, mib_to_string)
                ),
                disk: format!(
                    "{} / {}",
                    format_bytes(snapshot.disk_usage_bytes),
                    format_limit(server.limits.disk, mib_to_string)
                ),
                alarms,
            }),
            _ => None,
        };

        Self {
            server_id: server.id,
            name: server.name.clone(),
            address: server.default_allocation().map(|allocation| {
                format!(
                    "{}:{}",
                    allocation.alias.as_deref().unwrap_or(&allocation.ip),
                    allocation.port
                )
            }),
            label: display.label(),
            usage,
        }
    }
}

impl std::fmt::Display for ServerRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) [{}]",
            self.name,
            self.address.as_deref().unwrap_or("no allocation"),
            self.label
        )?;

        if let Some(usage) = &self.usage {
            write!(
                f,
                " cpu {}{} | memory {}{} | disk {}{}",
                usage.cpu,
                alarm_marker(usage.alarms.cpu),
                usage.memory,
                alarm_marker(usage.alarms.memory),
                usage.disk,
                alarm_marker(usage.alarms.disk)
            )?;
        }

        Ok(())
    }
}

fn alarm_marker(alarm: bool) -> &'static str {
    if alarm {
        " (!)"
    } else {
        ""
    }
}

fn format_limit(limit: u64, format: impl Fn(u64) -> String) -> String {
    if limit == 0 {
        "Unlimited".to_string()
    } else {
        format(limit)
    }
}

fn mib_to_string(mib: u64) -> String {
    format_bytes(mib.saturating_mul(1024 * 1024))
}

///
/// Format a byte count with binary units and two decimals.
///
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
