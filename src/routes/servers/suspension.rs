use actix_http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use lapse_shared::{error_chain_fmt, servers::SuspendAction};
use uuid::Uuid;

use crate::suspension::{SuspensionError, SuspensionToggle};

#[derive(serde::Deserialize)]
pub struct BodyData {
    action: SuspendAction,
}

///
/// Possible errors that can occur on this route.
///
#[derive(thiserror::Error)]
pub enum SuspensionRouteError {
    #[error("Not found")]
    NotFoundError,
    /// The daemon could not apply the action; nothing changed.
    #[error(transparent)]
    DaemonError(SuspensionError),
    #[error(transparent)]
    UnexpectedError(SuspensionError),
}

impl std::fmt::Debug for SuspensionRouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SuspensionRouteError {
    fn status_code(&self) -> StatusCode {
        match *self {
            SuspensionRouteError::NotFoundError => StatusCode::NOT_FOUND,
            SuspensionRouteError::DaemonError(_) => StatusCode::BAD_GATEWAY,
            SuspensionRouteError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SuspensionError> for SuspensionRouteError {
    fn from(e: SuspensionError) -> Self {
        match e {
            SuspensionError::NotFound(_) => SuspensionRouteError::NotFoundError,
            e @ SuspensionError::ExternalAction { .. } => SuspensionRouteError::DaemonError(e),
            e @ SuspensionError::Store(_) => SuspensionRouteError::UnexpectedError(e),
        }
    }
}

#[tracing::instrument(
    name = "Toggle suspension",
    skip(body, toggle),
    fields(action = %body.action)
)]
pub async fn suspension(
    server_id: web::Path<Uuid>,
    body: web::Json<BodyData>,
    toggle: web::Data<SuspensionToggle>,
) -> Result<HttpResponse, SuspensionRouteError> {
    toggle.toggle(*server_id, body.action).await?;

    Ok(HttpResponse::NoContent().finish())
}
