use actix_http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use chrono::Utc;
use lapse_db::{servers::models::ExtensionDays, ServerStore};
use lapse_shared::error_chain_fmt;
use uuid::Uuid;

use super::get::load_server;

///
/// Contains the request body for extending the expiration of a server.
///
#[derive(serde::Deserialize)]
pub struct BodyData {
    days: Option<i64>,
}

impl TryFrom<BodyData> for ExtensionDays {
    type Error = String;

    fn try_from(value: BodyData) -> Result<Self, Self::Error> {
        match value.days {
            Some(days) => ExtensionDays::parse(days),
            None => Ok(ExtensionDays::DEFAULT),
        }
    }
}

///
/// Possible errors that can occur on this route.
///
#[derive(thiserror::Error)]
pub enum UpdateExpirationError {
    /// Invalid data was supplied in the request.
    #[error("{0}")]
    ValidationError(String),
    #[error("Not found")]
    NotFoundError,
    /// An unexpected error has occured while processing the request.
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for UpdateExpirationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for UpdateExpirationError {
    fn status_code(&self) -> StatusCode {
        match *self {
            UpdateExpirationError::ValidationError(_) => StatusCode::BAD_REQUEST,
            UpdateExpirationError::NotFoundError => StatusCode::NOT_FOUND,
            UpdateExpirationError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[tracing::instrument(name = "Extend server expiration", skip(body, store))]
pub async fn update_expiration(
    server_id: web::Path<Uuid>,
    body: web::Json<BodyData>,
    store: web::Data<dyn ServerStore>,
) -> Result<HttpResponse, UpdateExpirationError> {
    // Validate the request body
    let days: ExtensionDays = body
        .into_inner()
        .try_into()
        .map_err(UpdateExpirationError::ValidationError)?;

    let updated = store
        .extend_expiration(*server_id, days, Utc::now())
        .await
        .context("Failed to extend expiration")?
        .ok_or(UpdateExpirationError::NotFoundError)?;

    if let Some(expires_at) = updated.expires_at {
        tracing::info!(%days, %expires_at, "Extended server expiration");
    }

    let server = load_server(store.get_ref(), *server_id)
        .await?
        .ok_or(UpdateExpirationError::NotFoundError)?;

    Ok(HttpResponse::Ok().json(server))
}
