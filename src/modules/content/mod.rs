//! Local proxy routes for the CMS-owned collections (projects, press articles).

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::{
    cms::{CmsCollection, CmsError, CmsListQuery},
    listing::{DEFAULT_PAGE_SIZE, PageParams, PageRequest, Paginated, filter_value},
    web::{ApiError, ApiJson, ApiMessage, ApiQuery, AppState, AuthUser, json_error},
};

/// Attributes the CMS manages itself and rejects on write.
const READ_ONLY_FIELDS: [&str; 5] = ["id", "documentId", "createdAt", "updatedAt", "publishedAt"];

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(collection_router(CmsCollection::Projects))
        .merge(collection_router(CmsCollection::PressArticles))
}

fn collection_router(collection: CmsCollection) -> Router<AppState> {
    let base = format!("/api/{}", collection.path());
    let entry = format!("{base}/:id");

    Router::new()
        .route(
            &base,
            get(
                move |State(state): State<AppState>,
                      _user: AuthUser,
                      ApiQuery(query): ApiQuery<ContentQuery>| {
                    list_entries(collection, state, query)
                },
            )
            .post(
                move |State(state): State<AppState>, user: AuthUser, ApiJson(body): ApiJson<Value>| {
                    create_entry(collection, state, user, body)
                },
            ),
        )
        .route(
            &entry,
            get(
                move |State(state): State<AppState>, _user: AuthUser, Path(raw_id): Path<String>| {
                    get_entry(collection, state, raw_id)
                },
            )
            .put(
                move |State(state): State<AppState>,
                      user: AuthUser,
                      Path(raw_id): Path<String>,
                      ApiJson(body): ApiJson<Value>| {
                    update_entry(collection, state, user, raw_id, body)
                },
            )
            .delete(
                move |State(state): State<AppState>, user: AuthUser, Path(raw_id): Path<String>| {
                    delete_entry(collection, state, user, raw_id)
                },
            ),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentQuery {
    #[serde(flatten)]
    paging: PageParams,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    district: Option<String>,
}

impl ContentQuery {
    fn page(&self) -> PageRequest {
        PageRequest::from_params(&self.paging, DEFAULT_PAGE_SIZE)
    }

    /// Press articles only filter by title.
    fn cms_query(&self, collection: CmsCollection) -> CmsListQuery {
        let search = filter_value(self.search.as_deref());
        match collection {
            CmsCollection::Projects => CmsListQuery {
                search,
                status: filter_value(self.status.as_deref()),
                district: filter_value(self.district.as_deref()),
            },
            CmsCollection::PressArticles => CmsListQuery {
                search,
                ..Default::default()
            },
        }
    }
}

/// CMS document ids are numeric or opaque slugs; anything else never reaches the CMS.
pub fn parse_entry_id(raw: &str) -> Result<String, ApiError> {
    let id = raw.trim();
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id.to_string())
    } else {
        Err(json_error(StatusCode::BAD_REQUEST, "Invalid ID"))
    }
}

/// Accepts either the bare attributes or a `{ data: {..} }` envelope and drops
/// fields the CMS owns.
pub fn entry_fields(body: Value) -> Result<Value, ApiError> {
    let mut fields = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(inner)) if map.is_empty() => inner,
            Some(other) => {
                map.insert("data".to_string(), other);
                map
            }
            None => map,
        },
        _ => {
            return Err(json_error(
                StatusCode::BAD_REQUEST,
                "Request body must be a JSON object",
            ));
        }
    };

    strip_read_only(&mut fields);
    if fields.is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "No fields provided"));
    }
    Ok(Value::Object(fields))
}

fn strip_read_only(fields: &mut Map<String, Value>) {
    for key in READ_ONLY_FIELDS {
        fields.remove(key);
    }
}

fn label(collection: CmsCollection) -> &'static str {
    match collection {
        CmsCollection::Projects => "Project",
        CmsCollection::PressArticles => "Press article",
    }
}

/// Maps a CMS failure onto the local error shape. Client errors pass through;
/// everything else is a 500 carrying the provider's error name.
pub fn cms_error(err: CmsError, collection: CmsCollection, action: &str) -> ApiError {
    error!(%err, %collection, action, "CMS request failed");

    let rejected_input = err.status.is_some_and(|status| status.as_u16() == 400);
    let (status, message) = if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            format!("{} not found", label(collection)),
        )
    } else if rejected_input {
        (StatusCode::BAD_REQUEST, err.message)
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to {action}"),
        )
    };

    (status, Json(ApiMessage::new(message).with_code(err.code)))
}

async fn list_entries(
    collection: CmsCollection,
    state: AppState,
    query: ContentQuery,
) -> Result<Json<Paginated<Value>>, ApiError> {
    state
        .cms()
        .list(collection, query.page(), &query.cms_query(collection))
        .await
        .map(Json)
        .map_err(|err| cms_error(err, collection, &format!("fetch {collection}")))
}

async fn get_entry(
    collection: CmsCollection,
    state: AppState,
    raw_id: String,
) -> Result<Json<Value>, ApiError> {
    let id = parse_entry_id(&raw_id)?;

    state
        .cms()
        .get(collection, &id)
        .await
        .map(Json)
        .map_err(|err| cms_error(err, collection, &format!("fetch {collection}")))
}

async fn create_entry(
    collection: CmsCollection,
    state: AppState,
    user: AuthUser,
    body: Value,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let fields = entry_fields(body)?;

    let entry = state
        .cms()
        .create(collection, fields)
        .await
        .map_err(|err| cms_error(err, collection, &format!("create {collection}")))?;
    info!(%collection, user = %user.username, "CMS entry created");

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    collection: CmsCollection,
    state: AppState,
    user: AuthUser,
    raw_id: String,
    body: Value,
) -> Result<Json<Value>, ApiError> {
    let id = parse_entry_id(&raw_id)?;
    let fields = entry_fields(body)?;

    let entry = state
        .cms()
        .update(collection, &id, fields)
        .await
        .map_err(|err| cms_error(err, collection, &format!("update {collection}")))?;
    info!(%collection, id = %id, user = %user.username, "CMS entry updated");

    Ok(Json(entry))
}

async fn delete_entry(
    collection: CmsCollection,
    state: AppState,
    user: AuthUser,
    raw_id: String,
) -> Result<Json<ApiMessage>, ApiError> {
    let id = parse_entry_id(&raw_id)?;

    state
        .cms()
        .delete(collection, &id)
        .await
        .map_err(|err| cms_error(err, collection, &format!("delete {collection}")))?;
    info!(%collection, id = %id, user = %user.username, "CMS entry deleted");

    Ok(Json(ApiMessage::new(format!(
        "{} deleted successfully",
        label(collection)
    ))))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn upstream(status: u16, code: Option<&str>) -> CmsError {
        CmsError {
            status: reqwest::StatusCode::from_u16(status).ok(),
            message: "upstream says no".to_string(),
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn entry_ids_reject_path_tricks() {
        assert_eq!(parse_entry_id("42").expect("numeric"), "42");
        assert_eq!(parse_entry_id("k3x9_ab-c").expect("slug"), "k3x9_ab-c");
        for raw in ["", "../admin", "1?populate=*", "a b"] {
            let (status, Json(body)) = parse_entry_id(raw).expect_err("invalid id");
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body.message, "Invalid ID");
        }
    }

    #[test]
    fn entry_fields_unwrap_envelope_and_drop_read_only() {
        let fields = entry_fields(json!({
            "data": { "id": 7, "title": "Marina One", "updatedAt": "2025-01-01" }
        }))
        .expect("fields");
        assert_eq!(fields, json!({ "title": "Marina One" }));

        let bare = entry_fields(json!({ "title": "Press", "createdAt": "x" })).expect("fields");
        assert_eq!(bare, json!({ "title": "Press" }));
    }

    #[test]
    fn entry_fields_require_an_object() {
        assert!(entry_fields(json!(["title"])).is_err());
        assert!(entry_fields(json!({ "id": 3 })).is_err());
    }

    #[test]
    fn press_queries_ignore_project_filters() {
        let query = ContentQuery {
            search: Some("award".into()),
            status: Some("Launching".into()),
            district: Some("all".into()),
            ..Default::default()
        };

        let projects = query.cms_query(CmsCollection::Projects);
        assert_eq!(projects.status.as_deref(), Some("Launching"));
        assert_eq!(projects.district, None);

        let press = query.cms_query(CmsCollection::PressArticles);
        assert_eq!(press.search.as_deref(), Some("award"));
        assert_eq!(press.status, None);
    }

    #[test]
    fn cms_errors_map_to_local_statuses() {
        let (status, Json(body)) = cms_error(
            upstream(404, Some("NotFoundError")),
            CmsCollection::Projects,
            "fetch projects",
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Project not found");

        let (status, Json(body)) = cms_error(
            upstream(400, Some("ValidationError")),
            CmsCollection::PressArticles,
            "create press-articles",
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "upstream says no");
        assert_eq!(body.code.as_deref(), Some("ValidationError"));

        let (status, Json(body)) = cms_error(
            upstream(503, Some("ServiceUnavailable")),
            CmsCollection::Projects,
            "fetch projects",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Failed to fetch projects");
        assert_eq!(body.code.as_deref(), Some("ServiceUnavailable"));
    }
}
