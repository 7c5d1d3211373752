use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::info;

pub mod store;

use crate::{
    listing::{DEFAULT_PAGE_SIZE, PageParams, PageRequest, Paginated, search_pattern},
    modules::shared::{
        active_filter, clean_optional, db_error, deleted, not_found, require_text,
        required_update, trim_update,
    },
    web::{ApiError, ApiJson, ApiMessage, ApiQuery, AppState, AuthUser, parse_id},
};

use store::{Event, EventChanges, NewEvent};

const RESOURCE: &str = "Event";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route(
            "/api/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    #[serde(flatten)]
    paging: PageParams,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    active: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    event_date: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl EventInput {
    fn into_new(self) -> Result<NewEvent, ApiError> {
        Ok(NewEvent {
            title: require_text(self.title, "Title")?,
            description: clean_optional(self.description),
            location: clean_optional(self.location),
            event_date: require_text(self.event_date, "Event date")?,
            image_url: clean_optional(self.image_url),
            is_active: self.is_active.unwrap_or(true),
        })
    }

    fn into_changes(self) -> Result<EventChanges, ApiError> {
        Ok(EventChanges {
            title: required_update(self.title, "Title")?,
            description: trim_update(self.description),
            location: trim_update(self.location),
            event_date: required_update(self.event_date, "Event date")?,
            image_url: trim_update(self.image_url),
            is_active: self.is_active,
        })
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<EventQuery>,
) -> Result<Json<Paginated<Event>>, ApiError> {
    let page = PageRequest::from_params(&query.paging, DEFAULT_PAGE_SIZE);
    let search = search_pattern(query.search.as_deref());
    let active = active_filter(query.active.as_deref())?;

    let (rows, total) = store::list(state.pool_ref(), search.as_deref(), active, page)
        .await
        .map_err(|err| db_error(err, "fetch events"))?;

    Ok(Json(Paginated::new(rows, page, total)))
}

pub async fn get_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let id = parse_id(&raw_id)?;

    store::find(state.pool_ref(), id)
        .await
        .map_err(|err| db_error(err, "fetch event"))?
        .map(Json)
        .ok_or_else(|| not_found(RESOURCE))
}

pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let new = input.into_new()?;

    let event = store::insert(state.pool_ref(), &new)
        .await
        .map_err(|err| db_error(err, "create event"))?;
    info!(id = event.id, user = %user.username, "event created");

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<Json<Event>, ApiError> {
    let id = parse_id(&raw_id)?;
    let changes = input.into_changes()?;

    let event = store::update(state.pool_ref(), id, &changes)
        .await
        .map_err(|err| db_error(err, "update event"))?
        .ok_or_else(|| not_found(RESOURCE))?;
    info!(id, user = %user.username, "event updated");

    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiMessage>, ApiError> {
    let id = parse_id(&raw_id)?;

    let removed = store::delete(state.pool_ref(), id)
        .await
        .map_err(|err| db_error(err, "delete event"))?;
    if !removed {
        return Err(not_found(RESOURCE));
    }
    info!(id, user = %user.username, "event deleted");

    Ok(deleted(RESOURCE))
}
