use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

pub mod price;
pub mod store;

use crate::{
    cms::developer_name,
    listing::{PageParams, PageRequest, Paginated, filter_value, search_pattern},
    modules::shared::{
        clean_optional, db_error, deleted, not_found, require_text, required_update, trim_update,
    },
    web::{ApiError, ApiJson, ApiMessage, ApiQuery, AppState, AuthUser, json_error, parse_id},
};

use price::{PriceRange, parse_price};
use store::{NewLaunch, NewLaunchFields, NewLaunchFilter, ViewCount};

const RESOURCE: &str = "New launch";
pub const NEW_LAUNCH_PAGE_SIZE: i64 = 8;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/new-launch-collection",
            get(list_new_launches).post(create_new_launch),
        )
        .route(
            "/api/new-launch-collection/:id",
            get(get_new_launch)
                .put(update_new_launch)
                .delete(delete_new_launch),
        )
        .route("/api/new-launch-collection/:id/views", post(record_view))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLaunchQuery {
    #[serde(flatten)]
    paging: PageParams,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    property_type: Option<String>,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    developer: Option<String>,
    #[serde(default)]
    min_price: Option<String>,
    #[serde(default)]
    max_price: Option<String>,
}

impl NewLaunchQuery {
    fn page(&self) -> PageRequest {
        PageRequest::from_params(&self.paging, NEW_LAUNCH_PAGE_SIZE)
    }

    fn filter(&self) -> NewLaunchFilter {
        NewLaunchFilter {
            search: search_pattern(self.search.as_deref()),
            status: filter_value(self.status.as_deref()),
            district: filter_value(self.district.as_deref()),
            property_type: filter_value(self.property_type.as_deref()),
            visibility: filter_value(self.visibility.as_deref()),
            developer: search_pattern(self.developer.as_deref()),
        }
    }

    /// Bounds accept plain numbers as well as labels such as `1.5M`.
    fn price_range(&self) -> PriceRange {
        let bound = |raw: Option<&str>| filter_value(raw).as_deref().and_then(parse_price);
        PriceRange::new(
            bound(self.min_price.as_deref()),
            bound(self.max_price.as_deref()),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLaunchInput {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    property_type: Option<String>,
    #[serde(default)]
    bedrooms: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    launch_date: Option<String>,
    /// A plain name, a `{ name }` object, or a CMS relation.
    #[serde(default)]
    developer: Option<Value>,
    #[serde(default)]
    units: Option<i32>,
}

impl NewLaunchInput {
    fn validate_units(&self) -> Result<(), ApiError> {
        match self.units {
            Some(units) if units < 0 => Err(json_error(
                StatusCode::BAD_REQUEST,
                "Units cannot be negative",
            )),
            _ => Ok(()),
        }
    }

    fn into_new(self) -> Result<(String, NewLaunchFields), ApiError> {
        self.validate_units()?;
        let title = require_text(self.title, "Title")?;
        let fields = NewLaunchFields {
            title: None,
            summary: clean_optional(self.summary),
            image_url: clean_optional(self.image_url),
            location: clean_optional(self.location),
            district: clean_optional(self.district),
            status: clean_optional(self.status),
            visibility: clean_optional(self.visibility),
            property_type: clean_optional(self.property_type),
            bedrooms: clean_optional(self.bedrooms),
            price: clean_optional(self.price),
            launch_date: clean_optional(self.launch_date),
            developer: self.developer.as_ref().and_then(developer_name),
            units: self.units,
        };
        Ok((title, fields))
    }

    fn into_changes(self) -> Result<NewLaunchFields, ApiError> {
        self.validate_units()?;
        // A developer value that resolves to no name clears the column.
        let developer = self
            .developer
            .as_ref()
            .map(|value| developer_name(value).unwrap_or_default());

        Ok(NewLaunchFields {
            title: required_update(self.title, "Title")?,
            summary: trim_update(self.summary),
            image_url: trim_update(self.image_url),
            location: trim_update(self.location),
            district: trim_update(self.district),
            status: trim_update(self.status),
            visibility: trim_update(self.visibility),
            property_type: trim_update(self.property_type),
            bedrooms: trim_update(self.bedrooms),
            price: trim_update(self.price),
            launch_date: trim_update(self.launch_date),
            developer,
            units: self.units,
        })
    }
}

/// Applies the price range to an already filtered, ordered set and paginates it.
pub fn paginate_by_price(
    launches: Vec<NewLaunch>,
    range: PriceRange,
    page: PageRequest,
) -> Paginated<NewLaunch> {
    let matching = launches
        .into_iter()
        .filter(|launch| range.matches(launch.price.as_deref()))
        .collect();
    Paginated::from_full(matching, page)
}

pub async fn list_new_launches(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<NewLaunchQuery>,
) -> Result<Json<Paginated<NewLaunch>>, ApiError> {
    let page = query.page();
    let filter = query.filter();
    let range = query.price_range();

    if range.is_unbounded() {
        let (rows, total) = store::list_page(state.pool_ref(), &filter, page)
            .await
            .map_err(|err| db_error(err, "fetch new launches"))?;
        return Ok(Json(Paginated::new(rows, page, total)));
    }

    let launches = store::list_all(state.pool_ref(), &filter)
        .await
        .map_err(|err| db_error(err, "fetch new launches"))?;

    Ok(Json(paginate_by_price(launches, range, page)))
}

pub async fn get_new_launch(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<NewLaunch>, ApiError> {
    let id = parse_id(&raw_id)?;

    store::find(state.pool_ref(), id)
        .await
        .map_err(|err| db_error(err, "fetch new launch"))?
        .map(Json)
        .ok_or_else(|| not_found(RESOURCE))
}

pub async fn create_new_launch(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<NewLaunchInput>,
) -> Result<(StatusCode, Json<NewLaunch>), ApiError> {
    let (title, fields) = input.into_new()?;

    let launch = store::insert(state.pool_ref(), &title, &fields)
        .await
        .map_err(|err| db_error(err, "create new launch"))?;
    info!(id = launch.id, user = %user.username, "new launch created");

    Ok((StatusCode::CREATED, Json(launch)))
}

pub async fn update_new_launch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    ApiJson(input): ApiJson<NewLaunchInput>,
) -> Result<Json<NewLaunch>, ApiError> {
    let id = parse_id(&raw_id)?;
    let changes = input.into_changes()?;

    let launch = store::update(state.pool_ref(), id, &changes)
        .await
        .map_err(|err| db_error(err, "update new launch"))?
        .ok_or_else(|| not_found(RESOURCE))?;
    info!(id, user = %user.username, "new launch updated");

    Ok(Json(launch))
}

pub async fn delete_new_launch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiMessage>, ApiError> {
    let id = parse_id(&raw_id)?;

    let removed = store::delete(state.pool_ref(), id)
        .await
        .map_err(|err| db_error(err, "delete new launch"))?;
    if !removed {
        return Err(not_found(RESOURCE));
    }
    info!(id, user = %user.username, "new launch deleted");

    Ok(deleted(RESOURCE))
}

pub async fn record_view(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ViewCount>, ApiError> {
    let id = parse_id(&raw_id)?;

    store::record_view(state.pool_ref(), id)
        .await
        .map_err(|err| db_error(err, "record new launch view"))?
        .map(Json)
        .ok_or_else(|| not_found(RESOURCE))
}
