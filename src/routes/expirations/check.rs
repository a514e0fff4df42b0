use actix_http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use lapse_shared::error_chain_fmt;

use crate::enforcer::{EnforcementError, ExpirationEnforcer};

#[derive(thiserror::Error)]
pub enum CheckExpirationsError {
    /// Another run is still in progress.
    #[error("An expiration check is already running")]
    ConflictError,
    #[error(transparent)]
    UnexpectedError(EnforcementError),
}

impl std::fmt::Debug for CheckExpirationsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for CheckExpirationsError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CheckExpirationsError::ConflictError => StatusCode::CONFLICT,
            CheckExpirationsError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EnforcementError> for CheckExpirationsError {
    fn from(e: EnforcementError) -> Self {
        match e {
            EnforcementError::AlreadyRunning => CheckExpirationsError::ConflictError,
            e => CheckExpirationsError::UnexpectedError(e),
        }
    }
}

///
/// Run the expiration enforcer right away and respond with its summary.
///
#[tracing::instrument(name = "Check expirations", skip(enforcer))]
pub async fn check(
    enforcer: web::Data<ExpirationEnforcer>,
) -> Result<HttpResponse, CheckExpirationsError> {
    let summary = enforcer.run().await?;

    Ok(HttpResponse::Ok().json(summary))
}
