use actix_http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use lapse_db::{servers::models::Page, ServerStore};
use lapse_shared::{
    error_chain_fmt,
    servers::{Paginated, ServerResponse},
};

#[derive(serde::Deserialize)]
pub struct QueryData {
    page: Option<u32>,
}

#[derive(thiserror::Error)]
pub enum ListServersError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ListServersError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ListServersError {
    fn status_code(&self) -> StatusCode {
        match *self {
            ListServersError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ListServersError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[tracing::instrument(name = "List servers", skip(query, store), fields(page = ?query.page))]
pub async fn list(
    query: web::Query<QueryData>,
    store: web::Data<dyn ServerStore>,
) -> Result<HttpResponse, ListServersError> {
    let page = match query.page {
        Some(page) => Page::parse(page).map_err(ListServersError::ValidationError)?,
        None => Page::default(),
    };

    let (servers, total) = store
        .servers_page(page)
        .await
        .context("Failed to fetch servers")?;

    let mut data = Vec::with_capacity(servers.len());

    for server in servers {
        let allocations = store
            .allocations(server.id)
            .await
            .context("Failed to fetch allocations")?;

        data.push(server.to_response(allocations));
    }

    Ok(HttpResponse::Ok().json(Paginated::<ServerResponse> {
        data,
        page: page.number(),
        per_page: Page::PER_PAGE,
        total,
    }))
}
