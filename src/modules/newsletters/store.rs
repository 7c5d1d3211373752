use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Newsletter {
    pub id: i64,
    pub date: String,
    pub pdf_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewNewsletter {
    pub date: String,
    pub pdf_url: String,
    pub is_active: bool,
}

#[derive(Default)]
pub struct NewsletterChanges {
    pub date: Option<String>,
    pub pdf_url: Option<String>,
    pub is_active: Option<bool>,
}

const COLUMNS: &str = "id, date, pdf_url, is_active, created_at, updated_at";

/// All newsletters matching the active filter; ordering happens in memory.
pub async fn list(pool: &PgPool, active: Option<bool>) -> sqlx::Result<Vec<Newsletter>> {
    sqlx::query_as::<_, Newsletter>(&format!(
        "SELECT {COLUMNS} FROM newsletters
         WHERE ($1::boolean IS NULL OR is_active = $1)
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(active)
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: i64) -> sqlx::Result<Option<Newsletter>> {
    sqlx::query_as::<_, Newsletter>(&format!("SELECT {COLUMNS} FROM newsletters WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &PgPool, newsletter: &NewNewsletter) -> sqlx::Result<Newsletter> {
    sqlx::query_as::<_, Newsletter>(&format!(
        "INSERT INTO newsletters (date, pdf_url, is_active) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
    ))
    .bind(&newsletter.date)
    .bind(&newsletter.pdf_url)
    .bind(newsletter.is_active)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    changes: &NewsletterChanges,
) -> sqlx::Result<Option<Newsletter>> {
    sqlx::query_as::<_, Newsletter>(&format!(
        "UPDATE newsletters
         SET date = COALESCE($2, date),
             pdf_url = COALESCE($3, pdf_url),
             is_active = COALESCE($4, is_active),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(changes.date.as_deref())
    .bind(changes.pdf_url.as_deref())
    .bind(changes.is_active)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM newsletters WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
