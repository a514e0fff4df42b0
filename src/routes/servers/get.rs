use actix_http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use lapse_db::ServerStore;
use lapse_shared::{error_chain_fmt, servers::ServerResponse};
use uuid::Uuid;

///
/// Possibles errors that can occur on this route.
///
#[derive(thiserror::Error)]
pub enum GetServerError {
    /// No server with the requested id exists.
    #[error("Not found")]
    NotFoundError,
    /// An unexpected error has occoured while processing the request.
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for GetServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for GetServerError {
    fn status_code(&self) -> StatusCode {
        match *self {
            GetServerError::NotFoundError => StatusCode::NOT_FOUND,
            GetServerError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

///
/// Load a server with its allocations, the way every server route responds.
///
pub(crate) async fn load_server(
    store: &dyn ServerStore,
    server_id: Uuid,
) -> Result<Option<ServerResponse>, anyhow::Error> {
    let server = match store
        .server(server_id)
        .await
        .context("Error while fetching server")?
    {
        Some(server) => server,
        None => return Ok(None),
    };

    let allocations = store
        .allocations(server_id)
        .await
        .context("Error while fetching allocations")?;

    Ok(Some(server.to_response(allocations)))
}

#[tracing::instrument("Get server", skip(store))]
pub async fn get(
    server_id: web::Path<Uuid>,
    store: web::Data<dyn ServerStore>,
) -> Result<HttpResponse, GetServerError> {
    let server = load_server(store.get_ref(), *server_id)
        .await?
        .ok_or(GetServerError::NotFoundError)?;

    Ok(HttpResponse::Ok().json(server))
}
