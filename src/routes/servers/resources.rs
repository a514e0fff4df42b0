use actix_http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use lapse_db::ServerStore;
use lapse_shared::{
    error_chain_fmt,
    resources::{PowerState, ResourceSnapshot},
};
use uuid::Uuid;

use crate::daemon::{Daemon, DaemonError};

#[derive(thiserror::Error)]
pub enum ResourcesError {
    #[error("Not found")]
    NotFoundError,
    /// The daemon could not report the utilization.
    #[error("Failed to fetch resources from the daemon")]
    DaemonError(#[source] DaemonError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ResourcesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ResourcesError {
    fn status_code(&self) -> StatusCode {
        match *self {
            ResourcesError::NotFoundError => StatusCode::NOT_FOUND,
            ResourcesError::DaemonError(_) => StatusCode::BAD_GATEWAY,
            ResourcesError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[tracing::instrument(name = "Get server resources", skip(store, daemon))]
pub async fn resources(
    server_id: web::Path<Uuid>,
    store: web::Data<dyn ServerStore>,
    daemon: web::Data<dyn Daemon>,
) -> Result<HttpResponse, ResourcesError> {
    let status = store
        .status(*server_id)
        .await
        .context("Failed to fetch server status")?
        .ok_or(ResourcesError::NotFoundError)?;

    // Suspended servers are stopped on the node, there is nothing live to report.
    if status.is_suspended() {
        return Ok(HttpResponse::Ok().json(ResourceSnapshot {
            display_state: PowerState::Offline,
            cpu_usage_percent: 0.0,
            memory_usage_bytes: 0,
            disk_usage_bytes: 0,
            is_suspended: true,
        }));
    }

    let server = daemon
        .server(*server_id)
        .await
        .map_err(ResourcesError::DaemonError)?;

    Ok(HttpResponse::Ok().json(server.to_snapshot(status)))
}
