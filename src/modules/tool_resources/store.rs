use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::listing::PageRequest;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ToolResource {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub category: String,
    pub sub_category: Option<String>,
    pub url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewToolResource {
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub category: String,
    pub sub_category: Option<String>,
    pub url: String,
    pub is_active: bool,
}

/// Partial update. `None` keeps the column; an empty string clears an optional column.
#[derive(Default)]
pub struct ToolResourceChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Clone)]
pub struct ToolResourceFilter {
    /// Already an `ILIKE` pattern.
    pub search: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryPair {
    pub category: String,
    pub sub_category: Option<String>,
}

const COLUMNS: &str =
    "id, name, description, icon_url, category, sub_category, url, is_active, created_at, updated_at";

const FILTER_CLAUSE: &str = "($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)
         AND ($2::text IS NULL OR category = $2)
         AND ($3::text IS NULL OR sub_category = $3)
         AND ($4::boolean IS NULL OR is_active = $4)";

pub async fn list(
    pool: &PgPool,
    filter: &ToolResourceFilter,
    page: PageRequest,
) -> sqlx::Result<(Vec<ToolResource>, i64)> {
    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM tool_resources WHERE {FILTER_CLAUSE}"
    ))
    .bind(filter.search.as_deref())
    .bind(filter.category.as_deref())
    .bind(filter.sub_category.as_deref())
    .bind(filter.active)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, ToolResource>(&format!(
        "SELECT {COLUMNS} FROM tool_resources
         WHERE {FILTER_CLAUSE}
         ORDER BY created_at DESC, id DESC
         LIMIT $5 OFFSET $6"
    ))
    .bind(filter.search.as_deref())
    .bind(filter.category.as_deref())
    .bind(filter.sub_category.as_deref())
    .bind(filter.active)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn category_pairs(pool: &PgPool) -> sqlx::Result<Vec<CategoryPair>> {
    sqlx::query_as::<_, CategoryPair>(
        "SELECT DISTINCT category, sub_category FROM tool_resources ORDER BY category, sub_category",
    )
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: i64) -> sqlx::Result<Option<ToolResource>> {
    sqlx::query_as::<_, ToolResource>(&format!(
        "SELECT {COLUMNS} FROM tool_resources WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, resource: &NewToolResource) -> sqlx::Result<ToolResource> {
    sqlx::query_as::<_, ToolResource>(&format!(
        "INSERT INTO tool_resources (name, description, icon_url, category, sub_category, url, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {COLUMNS}"
    ))
    .bind(&resource.name)
    .bind(resource.description.as_deref())
    .bind(resource.icon_url.as_deref())
    .bind(&resource.category)
    .bind(resource.sub_category.as_deref())
    .bind(&resource.url)
    .bind(resource.is_active)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    changes: &ToolResourceChanges,
) -> sqlx::Result<Option<ToolResource>> {
    sqlx::query_as::<_, ToolResource>(&format!(
        "UPDATE tool_resources
         SET name = COALESCE($2, name),
             description = CASE WHEN $3::text IS NULL THEN description ELSE NULLIF($3, '') END,
             icon_url = CASE WHEN $4::text IS NULL THEN icon_url ELSE NULLIF($4, '') END,
             category = COALESCE($5, category),
             sub_category = CASE WHEN $6::text IS NULL THEN sub_category ELSE NULLIF($6, '') END,
             url = COALESCE($7, url),
             is_active = COALESCE($8, is_active),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.icon_url.as_deref())
    .bind(changes.category.as_deref())
    .bind(changes.sub_category.as_deref())
    .bind(changes.url.as_deref())
    .bind(changes.is_active)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM tool_resources WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::search_pattern;

    fn resource(name: &str, category: &str, sub_category: Option<&str>) -> NewToolResource {
        NewToolResource {
            name: name.to_string(),
            description: Some(format!("{name} for agents")),
            icon_url: None,
            category: category.to_string(),
            sub_category: sub_category.map(str::to_string),
            url: format!("https://tools.test/{}", name.len()),
            is_active: true,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn list_counts_and_pages_the_filtered_set(pool: PgPool) -> sqlx::Result<()> {
        for i in 0..5 {
            insert(
                &pool,
                &resource(&format!("Calculator {i}"), "Compass Tools", Some("Calculators")),
            )
            .await?;
        }
        insert(&pool, &resource("Mortgage Planner", "Partner Tools", None)).await?;

        let filter = ToolResourceFilter {
            category: Some("Compass Tools".into()),
            ..Default::default()
        };
        let (rows, total) = list(&pool, &filter, PageRequest::new(2, 2)).await?;
        assert_eq!(total, 5);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Calculator 2", "Calculator 1"]);

        let (_, everything) = list(&pool, &ToolResourceFilter::default(), PageRequest::new(1, 10)).await?;
        assert_eq!(everything, 6);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn search_treats_wildcards_literally(pool: PgPool) -> sqlx::Result<()> {
        insert(&pool, &resource("50% Rebate Guide", "Compass Tools", None)).await?;
        insert(&pool, &resource("500 Unit Tracker", "Compass Tools", None)).await?;

        let filter = ToolResourceFilter {
            search: search_pattern(Some("50%")),
            ..Default::default()
        };
        let (rows, total) = list(&pool, &filter, PageRequest::new(1, 10)).await?;
        assert_eq!(total, 1);
        assert_eq!(rows[0].name, "50% Rebate Guide");
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn update_keeps_absent_and_clears_blank_columns(pool: PgPool) -> sqlx::Result<()> {
        let created = insert(&pool, &resource("Stamp Duty", "Compass Tools", Some("Calculators"))).await?;

        let changes = ToolResourceChanges {
            description: Some(String::new()),
            url: Some("https://tools.test/stamp-duty".into()),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = update(&pool, created.id, &changes).await?.expect("row exists");
        assert_eq!(updated.name, "Stamp Duty");
        assert_eq!(updated.description, None);
        assert_eq!(updated.sub_category.as_deref(), Some("Calculators"));
        assert_eq!(updated.url, "https://tools.test/stamp-duty");
        assert!(!updated.is_active);

        assert!(update(&pool, created.id + 1000, &changes).await?.is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn category_pairs_are_distinct_and_sorted(pool: PgPool) -> sqlx::Result<()> {
        insert(&pool, &resource("B", "Partner Tools", Some("Mortgage"))).await?;
        insert(&pool, &resource("A", "Compass Tools", Some("Reports"))).await?;
        insert(&pool, &resource("C", "Compass Tools", Some("Reports"))).await?;

        let pairs: Vec<(String, Option<String>)> = category_pairs(&pool)
            .await?
            .into_iter()
            .map(|pair| (pair.category, pair.sub_category))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Compass Tools".to_string(), Some("Reports".to_string())),
                ("Partner Tools".to_string(), Some("Mortgage".to_string())),
            ]
        );
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_reports_whether_a_row_went(pool: PgPool) -> sqlx::Result<()> {
        let created = insert(&pool, &resource("Old Tool", "Compass Tools", None)).await?;
        assert!(delete(&pool, created.id).await?);
        assert!(!delete(&pool, created.id).await?);
        assert!(find(&pool, created.id).await?.is_none());
        Ok(())
    }
}
