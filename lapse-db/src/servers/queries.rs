use chrono::{DateTime, Utc};
use lapse_shared::servers::ServerStatus;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;

#[tracing::instrument(name = "Get server with id", skip(server_id, pool))]
pub async fn get_server_with_id(
    server_id: Uuid,
    pool: &PgPool,
) -> Result<Option<ServerModel>, sqlx::Error> {
    sqlx::query_as::<_, ServerModel>(
        r#"
        SELECT *
        FROM servers
        WHERE servers.id = $1
        "#,
    )
    .bind(server_id)
    .fetch_optional(pool)
    .await
}

///
/// Servers whose expiration date lies before `now` and that are not suspended yet.
///
/// Must stay in sync with [`ServerModel::is_expiration_candidate`].
///
#[tracing::instrument(name = "Get expired servers", skip(pool))]
pub async fn get_expired_servers(
    now: DateTime<Utc>,
    pool: &PgPool,
) -> Result<Vec<ServerModel>, sqlx::Error> {
    sqlx::query_as::<_, ServerModel>(
        r#"
        SELECT *
        FROM servers
        WHERE servers.expires_at IS NOT NULL
          AND servers.expires_at < $1
          AND servers.status <> $2
        "#,
    )
    .bind(now)
    .bind(ServerStatus::Suspended.as_str())
    .fetch_all(pool)
    .await
}

#[tracing::instrument(name = "Get status of server", skip(pool))]
pub async fn get_server_status(
    server_id: Uuid,
    pool: &PgPool,
) -> Result<Option<ServerStatus>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT status FROM servers WHERE id = $1")
        .bind(server_id)
        .fetch_optional(pool)
        .await?;

    row.map(|(status,)| {
        status.parse::<ServerStatus>().map_err(|e| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

///
/// Persist a new status. Returns `false` when no server has the given id.
///
#[tracing::instrument(name = "Update status of server", skip(pool))]
pub async fn update_server_status(
    pool: &PgPool,
    server_id: Uuid,
    status: ServerStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE servers SET status = $1, updated_at = now() WHERE id = $2")
        .bind(status.as_str())
        .bind(server_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

///
/// Move the expiration of a server by `days` in a single statement, starting from
/// `now` when the server has none.
///
#[tracing::instrument(name = "Extend expiration of server", skip(pool))]
pub async fn extend_server_expiration(
    pool: &PgPool,
    server_id: Uuid,
    days: ExtensionDays,
    now: DateTime<Utc>,
) -> Result<Option<ServerModel>, sqlx::Error> {
    sqlx::query_as::<_, ServerModel>(
        r#"
        UPDATE servers
        SET expires_at = COALESCE(expires_at, $1) + make_interval(days => $2::int),
            updated_at = now()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(now)
    .bind(days.get())
    .bind(server_id)
    .fetch_optional(pool)
    .await
}

#[tracing::instrument(name = "Get page of servers", skip(pool))]
pub async fn get_servers_page(page: Page, pool: &PgPool) -> Result<Vec<ServerModel>, sqlx::Error> {
    sqlx::query_as::<_, ServerModel>(
        r#"
        SELECT *
        FROM servers
        ORDER BY created_at, id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(i64::from(Page::PER_PAGE))
    .bind(page.offset())
    .fetch_all(pool)
    .await
}

#[tracing::instrument(name = "Count servers", skip(pool))]
pub async fn count_servers(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM servers")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[tracing::instrument(name = "Get allocations for server", skip(server_id, pool))]
pub async fn get_allocations_for_server(
    server_id: Uuid,
    pool: &PgPool,
) -> Result<Vec<AllocationModel>, sqlx::Error> {
    sqlx::query_as::<_, AllocationModel>(
        r#"
        SELECT *
        FROM allocations
        WHERE allocations.server_id = $1
        ORDER BY is_default DESC, port
        "#,
    )
    .bind(server_id)
    .fetch_all(pool)
    .await
}
