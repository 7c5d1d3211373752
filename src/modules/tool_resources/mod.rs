use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod store;

use crate::{
    listing::{DEFAULT_PAGE_SIZE, PageParams, PageRequest, Paginated, filter_value, search_pattern},
    modules::shared::{
        active_filter, clean_optional, db_error, deleted, not_found, require_text,
        required_update, trim_update,
    },
    web::{ApiError, ApiJson, ApiMessage, ApiQuery, AppState, AuthUser, parse_id},
};

use store::{CategoryPair, NewToolResource, ToolResource, ToolResourceChanges, ToolResourceFilter};

const RESOURCE: &str = "Tool resource";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tool-resources",
            get(list_tool_resources).post(create_tool_resource),
        )
        .route("/api/tool-resources/categories", get(list_categories))
        .route(
            "/api/tool-resources/:id",
            get(get_tool_resource)
                .put(update_tool_resource)
                .delete(delete_tool_resource),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResourceQuery {
    #[serde(flatten)]
    paging: PageParams,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    sub_category: Option<String>,
    #[serde(default)]
    active: Option<String>,
}

impl ToolResourceQuery {
    fn page(&self) -> PageRequest {
        PageRequest::from_params(&self.paging, DEFAULT_PAGE_SIZE)
    }

    fn filter(&self) -> Result<ToolResourceFilter, ApiError> {
        Ok(ToolResourceFilter {
            search: search_pattern(self.search.as_deref()),
            category: filter_value(self.category.as_deref()),
            sub_category: filter_value(self.sub_category.as_deref()),
            active: active_filter(self.active.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResourceInput {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    icon_url: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    sub_category: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl ToolResourceInput {
    fn into_new(self) -> Result<NewToolResource, ApiError> {
        Ok(NewToolResource {
            name: require_text(self.name, "Name")?,
            description: clean_optional(self.description),
            icon_url: clean_optional(self.icon_url),
            category: require_text(self.category, "Category")?,
            sub_category: clean_optional(self.sub_category),
            url: require_text(self.url, "URL")?,
            is_active: self.is_active.unwrap_or(true),
        })
    }

    fn into_changes(self) -> Result<ToolResourceChanges, ApiError> {
        Ok(ToolResourceChanges {
            name: required_update(self.name, "Name")?,
            description: trim_update(self.description),
            icon_url: trim_update(self.icon_url),
            category: required_update(self.category, "Category")?,
            sub_category: trim_update(self.sub_category),
            url: required_update(self.url, "URL")?,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: String,
    pub sub_categories: Vec<String>,
}

/// Groups sorted `(category, sub_category)` pairs for the filter dropdowns.
pub fn group_categories(pairs: Vec<CategoryPair>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for pair in pairs {
        let starts_group = groups
            .last()
            .is_none_or(|group| group.category != pair.category);
        if starts_group {
            groups.push(CategoryGroup {
                category: pair.category,
                sub_categories: Vec::new(),
            });
        }

        let Some(group) = groups.last_mut() else {
            continue;
        };
        if let Some(sub) = pair.sub_category.filter(|s| !s.trim().is_empty()) {
            if !group.sub_categories.contains(&sub) {
                group.sub_categories.push(sub);
            }
        }
    }
    groups
}

pub async fn list_tool_resources(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<ToolResourceQuery>,
) -> Result<Json<Paginated<ToolResource>>, ApiError> {
    let page = query.page();
    let filter = query.filter()?;

    let (rows, total) = store::list(state.pool_ref(), &filter, page)
        .await
        .map_err(|err| db_error(err, "fetch tool resources"))?;

    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<CategoryGroup>>, ApiError> {

    let pairs = store::category_pairs(state.pool_ref())
        .await
        .map_err(|err| db_error(err, "fetch tool resource categories"))?;

    Ok(Json(group_categories(pairs)))
}

pub async fn get_tool_resource(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ToolResource>, ApiError> {
    let id = parse_id(&raw_id)?;

    store::find(state.pool_ref(), id)
        .await
        .map_err(|err| db_error(err, "fetch tool resource"))?
        .map(Json)
        .ok_or_else(|| not_found(RESOURCE))
}

pub async fn create_tool_resource(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<ToolResourceInput>,
) -> Result<(StatusCode, Json<ToolResource>), ApiError> {
    let new = input.into_new()?;

    let resource = store::insert(state.pool_ref(), &new)
        .await
        .map_err(|err| db_error(err, "create tool resource"))?;
    info!(id = resource.id, user = %user.username, "tool resource created");

    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn update_tool_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    ApiJson(input): ApiJson<ToolResourceInput>,
) -> Result<Json<ToolResource>, ApiError> {
    let id = parse_id(&raw_id)?;
    let changes = input.into_changes()?;

    let resource = store::update(state.pool_ref(), id, &changes)
        .await
        .map_err(|err| db_error(err, "update tool resource"))?
        .ok_or_else(|| not_found(RESOURCE))?;
    info!(id, user = %user.username, "tool resource updated");

    Ok(Json(resource))
}

pub async fn delete_tool_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiMessage>, ApiError> {
    let id = parse_id(&raw_id)?;

    let removed = store::delete(state.pool_ref(), id)
        .await
        .map_err(|err| db_error(err, "delete tool resource"))?;
    if !removed {
        return Err(not_found(RESOURCE));
    }
    info!(id, user = %user.username, "tool resource deleted");

    Ok(deleted(RESOURCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_builds_exact_category_filter() {
        let query: ToolResourceQuery = serde_json::from_value(serde_json::json!({
            "category": "Compass Tools",
            "subCategory": "all",
            "search": "mortgage",
            "active": ""
        }))
        .expect("query");

        let filter = query.filter().expect("filter");
        assert_eq!(filter.category.as_deref(), Some("Compass Tools"));
        assert_eq!(filter.active, None);
        assert_eq!(filter.sub_category, None);
        assert_eq!(filter.search.as_deref(), Some("%mortgage%"));
        assert_eq!(query.page(), PageRequest::new(1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn create_requires_name_category_and_url() {
        let result = ToolResourceInput {
            name: Some("Stamp Duty Calculator".into()),
            category: Some("Compass Tools".into()),
            ..Default::default()
        }
        .into_new();
        let (_, Json(body)) = result.err().expect("url missing");
        assert_eq!(body.message, "URL is required");
    }

    #[test]
    fn update_keeps_blank_optional_values_for_clearing() {
        let changes = ToolResourceInput {
            description: Some("   ".into()),
            ..Default::default()
        }
        .into_changes()
        .expect("changes");
        assert_eq!(changes.description.as_deref(), Some(""));
        assert!(changes.name.is_none());
    }

    #[test]
    fn categories_group_sub_categories() {
        let pair = |category: &str, sub: Option<&str>| CategoryPair {
            category: category.to_string(),
            sub_category: sub.map(str::to_string),
        };
        let groups = group_categories(vec![
            pair("Compass Tools", None),
            pair("Compass Tools", Some("Calculators")),
            pair("Compass Tools", Some("Reports")),
            pair("Partner Tools", Some("Mortgage")),
        ]);

        assert_eq!(
            groups,
            vec![
                CategoryGroup {
                    category: "Compass Tools".into(),
                    sub_categories: vec!["Calculators".into(), "Reports".into()],
                },
                CategoryGroup {
                    category: "Partner Tools".into(),
                    sub_categories: vec!["Mortgage".into()],
                },
            ]
        );
    }
}
