use std::{collections::HashMap, sync::Arc};

use lapse_shared::servers::ServerResponse;
use uuid::Uuid;

use crate::{
    client::{SnapshotSource, StatusLookup},
    monitor::{MonitorConfig, MonitorHandle, MonitorLoop},
    row::ServerRow,
};

struct Entry {
    server: ServerResponse,
    handle: MonitorHandle,
    last_row: Option<ServerRow>,
}

///
/// The set of displayed servers, each with its own monitor loop.
///
pub struct Dashboard {
    snapshots: Arc<dyn SnapshotSource>,
    statuses: Arc<dyn StatusLookup>,
    config: MonitorConfig,
    entries: HashMap<Uuid, Entry>,
}

impl Dashboard {
    pub fn new(
        snapshots: Arc<dyn SnapshotSource>,
        statuses: Arc<dyn StatusLookup>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            snapshots,
            statuses,
            config,
            entries: HashMap::new(),
        }
    }

    ///
    /// Start monitoring a server.
    ///
    /// Showing a displayed server again only updates its data and forwards status
    /// and limit changes to the running loop.
    ///
    pub fn show(&mut self, server: ServerResponse) {
        if let Some(entry) = self.entries.get_mut(&server.id) {
            if entry.server.status != server.status {
                entry.handle.status_changed();
            }

            entry.handle.set_limits(server.limits);

            entry.server = server;
            return;
        }

        tracing::debug!(server_id = %server.id, name = %server.name, "Showing server");

        let handle = MonitorLoop::new(
            server.id,
            server.limits,
            server.status,
            self.snapshots.clone(),
            self.statuses.clone(),
            self.config,
        )
        .start();

        self.entries.insert(
            server.id,
            Entry {
                server,
                handle,
                last_row: None,
            },
        );
    }

    ///
    /// Stop monitoring a server. Its loop is cancelled.
    ///
    pub fn hide(&mut self, server_id: Uuid) -> bool {
        match self.entries.remove(&server_id) {
            Some(entry) => {
                tracing::debug!(%server_id, "Hiding server");
                entry.handle.cancel();
                true
            }
            None => false,
        }
    }

    ///
    /// Make the displayed set match `servers`.
    ///
    pub fn sync(&mut self, servers: Vec<ServerResponse>) {
        let visible: Vec<Uuid> = servers.iter().map(|server| server.id).collect();

        let removed: Vec<Uuid> = self
            .entries
            .keys()
            .filter(|id| visible.contains(id) == false)
            .copied()
            .collect();

        for server_id in removed {
            self.hide(server_id);
        }

        for server in servers {
            self.show(server);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, server_id: Uuid) -> bool {
        self.entries.contains_key(&server_id)
    }

    ///
    /// Current rows, sorted by server name.
    ///
    pub fn rows(&self) -> Vec<ServerRow> {
        let mut rows: Vec<ServerRow> = self
            .entries
            .values()
            .map(|entry| ServerRow::render(&entry.server, &entry.handle.view()))
            .collect();

        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.server_id.cmp(&b.server_id)));
        rows
    }

    ///
    /// Rows that changed since the last call.
    ///
    pub fn changed_rows(&mut self) -> Vec<ServerRow> {
        let mut changed = Vec::new();

        for entry in self.entries.values_mut() {
            let row = ServerRow::render(&entry.server, &entry.handle.view());

            if entry.last_row.as_ref() != Some(&row) {
                entry.last_row = Some(row.clone());
                changed.push(row);
            }
        }

        changed.sort_by(|a, b| a.name.cmp(&b.name));
        changed
    }

    ///
    /// Hide every server.
    ///
    pub fn clear(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.handle.cancel();
        }
    }
}
