use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::listing::PageRequest;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: String,
    pub image_url: Option<String>,
    pub is_active: bool,
}

#[derive(Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

const COLUMNS: &str =
    "id, title, description, location, event_date, image_url, is_active, created_at, updated_at";

const FILTER_CLAUSE: &str = "($1::text IS NULL OR title ILIKE $1 OR location ILIKE $1)
         AND ($2::boolean IS NULL OR is_active = $2)";

pub async fn list(
    pool: &PgPool,
    search: Option<&str>,
    active: Option<bool>,
    page: PageRequest,
) -> sqlx::Result<(Vec<Event>, i64)> {
    let total: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM events WHERE {FILTER_CLAUSE}"))
            .bind(search)
            .bind(active)
            .fetch_one(pool)
            .await?;

    let rows = sqlx::query_as::<_, Event>(&format!(
        "SELECT {COLUMNS} FROM events
         WHERE {FILTER_CLAUSE}
         ORDER BY created_at DESC, id DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(search)
    .bind(active)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn find(pool: &PgPool, id: i64) -> sqlx::Result<Option<Event>> {
    sqlx::query_as::<_, Event>(&format!("SELECT {COLUMNS} FROM events WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &PgPool, event: &NewEvent) -> sqlx::Result<Event> {
    sqlx::query_as::<_, Event>(&format!(
        "INSERT INTO events (title, description, location, event_date, image_url, is_active)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(&event.title)
    .bind(event.description.as_deref())
    .bind(event.location.as_deref())
    .bind(&event.event_date)
    .bind(event.image_url.as_deref())
    .bind(event.is_active)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    changes: &EventChanges,
) -> sqlx::Result<Option<Event>> {
    sqlx::query_as::<_, Event>(&format!(
        "UPDATE events
         SET title = COALESCE($2, title),
             description = CASE WHEN $3::text IS NULL THEN description ELSE NULLIF($3, '') END,
             location = CASE WHEN $4::text IS NULL THEN location ELSE NULLIF($4, '') END,
             event_date = COALESCE($5, event_date),
             image_url = CASE WHEN $6::text IS NULL THEN image_url ELSE NULLIF($6, '') END,
             is_active = COALESCE($7, is_active),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.location.as_deref())
    .bind(changes.event_date.as_deref())
    .bind(changes.image_url.as_deref())
    .bind(changes.is_active)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
