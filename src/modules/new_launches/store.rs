use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::listing::PageRequest;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NewLaunch {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub district: Option<String>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub property_type: Option<String>,
    pub bedrooms: Option<String>,
    pub price: Option<String>,
    pub launch_date: Option<String>,
    pub developer: Option<String>,
    pub units: Option<i32>,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Text columns shared by create and update payloads.
#[derive(Debug, Default, Clone)]
pub struct NewLaunchFields {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub district: Option<String>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub property_type: Option<String>,
    pub bedrooms: Option<String>,
    pub price: Option<String>,
    pub launch_date: Option<String>,
    pub developer: Option<String>,
    pub units: Option<i32>,
}

#[derive(Debug, Default, Clone)]
pub struct NewLaunchFilter {
    /// Already an `ILIKE` pattern.
    pub search: Option<String>,
    pub status: Option<String>,
    pub district: Option<String>,
    pub property_type: Option<String>,
    pub visibility: Option<String>,
    /// Already an `ILIKE` pattern.
    pub developer: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, FromRow)]
pub struct ViewCount {
    pub id: i64,
    pub views: i32,
}

const COLUMNS: &str = "id, title, summary, image_url, location, district, status, visibility, property_type, bedrooms, price, launch_date, developer, units, views, created_at, updated_at";

const FILTER_CLAUSE: &str = "($1::text IS NULL OR title ILIKE $1 OR summary ILIKE $1 OR location ILIKE $1)
         AND ($2::text IS NULL OR status = $2)
         AND ($3::text IS NULL OR district = $3)
         AND ($4::text IS NULL OR property_type = $4)
         AND ($5::text IS NULL OR visibility = $5)
         AND ($6::text IS NULL OR developer ILIKE $6)";

pub async fn list_page(
    pool: &PgPool,
    filter: &NewLaunchFilter,
    page: PageRequest,
) -> sqlx::Result<(Vec<NewLaunch>, i64)> {
    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM new_launches WHERE {FILTER_CLAUSE}"
    ))
    .bind(filter.search.as_deref())
    .bind(filter.status.as_deref())
    .bind(filter.district.as_deref())
    .bind(filter.property_type.as_deref())
    .bind(filter.visibility.as_deref())
    .bind(filter.developer.as_deref())
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, NewLaunch>(&format!(
        "SELECT {COLUMNS} FROM new_launches
         WHERE {FILTER_CLAUSE}
         ORDER BY created_at DESC, id DESC
         LIMIT $7 OFFSET $8"
    ))
    .bind(filter.search.as_deref())
    .bind(filter.status.as_deref())
    .bind(filter.district.as_deref())
    .bind(filter.property_type.as_deref())
    .bind(filter.visibility.as_deref())
    .bind(filter.developer.as_deref())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

/// Every listing matching the SQL-expressible filters, newest first.
pub async fn list_all(pool: &PgPool, filter: &NewLaunchFilter) -> sqlx::Result<Vec<NewLaunch>> {
    sqlx::query_as::<_, NewLaunch>(&format!(
        "SELECT {COLUMNS} FROM new_launches
         WHERE {FILTER_CLAUSE}
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(filter.search.as_deref())
    .bind(filter.status.as_deref())
    .bind(filter.district.as_deref())
    .bind(filter.property_type.as_deref())
    .bind(filter.visibility.as_deref())
    .bind(filter.developer.as_deref())
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: i64) -> sqlx::Result<Option<NewLaunch>> {
    sqlx::query_as::<_, NewLaunch>(&format!("SELECT {COLUMNS} FROM new_launches WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &PgPool, title: &str, fields: &NewLaunchFields) -> sqlx::Result<NewLaunch> {
    sqlx::query_as::<_, NewLaunch>(&format!(
        "INSERT INTO new_launches
            (title, summary, image_url, location, district, status, visibility,
             property_type, bedrooms, price, launch_date, developer, units)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING {COLUMNS}"
    ))
    .bind(title)
    .bind(fields.summary.as_deref())
    .bind(fields.image_url.as_deref())
    .bind(fields.location.as_deref())
    .bind(fields.district.as_deref())
    .bind(fields.status.as_deref())
    .bind(fields.visibility.as_deref())
    .bind(fields.property_type.as_deref())
    .bind(fields.bedrooms.as_deref())
    .bind(fields.price.as_deref())
    .bind(fields.launch_date.as_deref())
    .bind(fields.developer.as_deref())
    .bind(fields.units)
    .fetch_one(pool)
    .await
}

/// Partial update. `None` keeps the column; an empty string clears an optional column.
pub async fn update(
    pool: &PgPool,
    id: i64,
    fields: &NewLaunchFields,
) -> sqlx::Result<Option<NewLaunch>> {
    sqlx::query_as::<_, NewLaunch>(&format!(
        "UPDATE new_launches
         SET title = COALESCE($2, title),
             summary = CASE WHEN $3::text IS NULL THEN summary ELSE NULLIF($3, '') END,
             image_url = CASE WHEN $4::text IS NULL THEN image_url ELSE NULLIF($4, '') END,
             location = CASE WHEN $5::text IS NULL THEN location ELSE NULLIF($5, '') END,
             district = CASE WHEN $6::text IS NULL THEN district ELSE NULLIF($6, '') END,
             status = CASE WHEN $7::text IS NULL THEN status ELSE NULLIF($7, '') END,
             visibility = CASE WHEN $8::text IS NULL THEN visibility ELSE NULLIF($8, '') END,
             property_type = CASE WHEN $9::text IS NULL THEN property_type ELSE NULLIF($9, '') END,
             bedrooms = CASE WHEN $10::text IS NULL THEN bedrooms ELSE NULLIF($10, '') END,
             price = CASE WHEN $11::text IS NULL THEN price ELSE NULLIF($11, '') END,
             launch_date = CASE WHEN $12::text IS NULL THEN launch_date ELSE NULLIF($12, '') END,
             developer = CASE WHEN $13::text IS NULL THEN developer ELSE NULLIF($13, '') END,
             units = COALESCE($14, units),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(fields.title.as_deref())
    .bind(fields.summary.as_deref())
    .bind(fields.image_url.as_deref())
    .bind(fields.location.as_deref())
    .bind(fields.district.as_deref())
    .bind(fields.status.as_deref())
    .bind(fields.visibility.as_deref())
    .bind(fields.property_type.as_deref())
    .bind(fields.bedrooms.as_deref())
    .bind(fields.price.as_deref())
    .bind(fields.launch_date.as_deref())
    .bind(fields.developer.as_deref())
    .bind(fields.units)
    .fetch_optional(pool)
    .await
}

pub async fn record_view(pool: &PgPool, id: i64) -> sqlx::Result<Option<ViewCount>> {
    sqlx::query_as::<_, ViewCount>(
        "UPDATE new_launches SET views = views + 1 WHERE id = $1 RETURNING id, views",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM new_launches WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::search_pattern;

    fn fields(district: &str, developer: &str, price: &str) -> NewLaunchFields {
        NewLaunchFields {
            district: Some(district.to_string()),
            developer: Some(developer.to_string()),
            price: Some(price.to_string()),
            status: Some("Launching".into()),
            units: Some(300),
            ..Default::default()
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn list_page_filters_in_sql(pool: PgPool) -> sqlx::Result<()> {
        insert(&pool, "Marina Vista", &fields("D01", "Far East Organization", "$1.8M")).await?;
        insert(&pool, "Bedok Grove", &fields("D16", "Far East Organization", "$1.2M")).await?;
        insert(&pool, "Holland Rise", &fields("D10", "CDL", "$2.6M")).await?;

        let filter = NewLaunchFilter {
            developer: search_pattern(Some("far east")),
            ..Default::default()
        };
        let (rows, total) = list_page(&pool, &filter, PageRequest::new(1, 1)).await?;
        assert_eq!(total, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Bedok Grove");

        let filter = NewLaunchFilter {
            district: Some("D10".into()),
            ..Default::default()
        };
        let all = list_all(&pool, &filter).await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].developer.as_deref(), Some("CDL"));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn update_clears_blank_and_keeps_absent(pool: PgPool) -> sqlx::Result<()> {
        let created = insert(&pool, "Marina Vista", &fields("D01", "Far East Organization", "$1.8M")).await?;

        let changes = NewLaunchFields {
            price: Some(String::new()),
            units: Some(420),
            ..Default::default()
        };
        let updated = update(&pool, created.id, &changes).await?.expect("row exists");
        assert_eq!(updated.title, "Marina Vista");
        assert_eq!(updated.price, None);
        assert_eq!(updated.district.as_deref(), Some("D01"));
        assert_eq!(updated.units, Some(420));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn record_view_increments_existing_rows(pool: PgPool) -> sqlx::Result<()> {
        let created = insert(&pool, "Holland Rise", &fields("D10", "CDL", "$2.6M")).await?;
        assert_eq!(created.views, 0);

        record_view(&pool, created.id).await?;
        let count = record_view(&pool, created.id).await?.expect("row exists");
        assert_eq!(count.views, 2);

        assert!(delete(&pool, created.id).await?);
        assert!(record_view(&pool, created.id).await?.is_none());
        Ok(())
    }
}
