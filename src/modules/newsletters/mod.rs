use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

pub mod label;
pub mod store;

use crate::{
    listing::{DEFAULT_PAGE_SIZE, PageParams, PageRequest, Paginated},
    modules::shared::{active_filter, db_error, deleted, not_found, require_text, required_update},
    web::{ApiError, ApiJson, ApiMessage, ApiQuery, AppState, AuthUser, json_error, parse_id},
};

use store::{NewNewsletter, Newsletter, NewsletterChanges};

const RESOURCE: &str = "Newsletter";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/newsletters",
            get(list_newsletters).post(create_newsletter),
        )
        .route(
            "/api/newsletters/:id",
            get(get_newsletter)
                .put(update_newsletter)
                .delete(delete_newsletter),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsletterQuery {
    #[serde(flatten)]
    paging: PageParams,
    #[serde(default)]
    active: Option<String>,
}

/// Form payload. The label comes either verbatim in `date` or from the two pickers.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterInput {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    pdf_url: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl NewsletterInput {
    fn resolve_label(&self) -> Result<Option<String>, ApiError> {
        if let Some(date) = self.date.as_deref().map(str::trim) {
            if !date.is_empty() {
                return Ok(Some(date.to_string()));
            }
        }

        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end < start => Err(json_error(
                StatusCode::BAD_REQUEST,
                "End date must be on or after the start date",
            )),
            (Some(start), Some(end)) => Ok(Some(label::format_label(start, end))),
            (Some(_), None) | (None, Some(_)) => Err(json_error(
                StatusCode::BAD_REQUEST,
                "Both startDate and endDate are required",
            )),
            (None, None) => Ok(None),
        }
    }

    fn into_new(self) -> Result<NewNewsletter, ApiError> {
        let date = require_text(self.resolve_label()?, "Date")?;
        let pdf_url = require_text(self.pdf_url, "PDF URL")?;
        Ok(NewNewsletter {
            date,
            pdf_url,
            is_active: self.is_active.unwrap_or(true),
        })
    }

    fn into_changes(self) -> Result<NewsletterChanges, ApiError> {
        let blank_date = self.date.as_deref().is_some_and(|d| d.trim().is_empty());
        if blank_date && self.start_date.is_none() && self.end_date.is_none() {
            return Err(json_error(StatusCode::BAD_REQUEST, "Date cannot be empty"));
        }

        Ok(NewsletterChanges {
            date: self.resolve_label()?,
            pdf_url: required_update(self.pdf_url, "PDF URL")?,
            is_active: self.is_active,
        })
    }
}

pub async fn list_newsletters(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<NewsletterQuery>,
) -> Result<Json<Paginated<Newsletter>>, ApiError> {
    let page = PageRequest::from_params(&query.paging, DEFAULT_PAGE_SIZE);
    let active = active_filter(query.active.as_deref())?;

    let mut newsletters = store::list(state.pool_ref(), active)
        .await
        .map_err(|err| db_error(err, "fetch newsletters"))?;
    label::sort_newest_first(&mut newsletters);

    Ok(Json(Paginated::from_full(newsletters, page)))
}

pub async fn get_newsletter(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<Newsletter>, ApiError> {
    let id = parse_id(&raw_id)?;

    store::find(state.pool_ref(), id)
        .await
        .map_err(|err| db_error(err, "fetch newsletter"))?
        .map(Json)
        .ok_or_else(|| not_found(RESOURCE))
}

pub async fn create_newsletter(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<NewsletterInput>,
) -> Result<(StatusCode, Json<Newsletter>), ApiError> {
    let new = input.into_new()?;

    let newsletter = store::insert(state.pool_ref(), &new)
        .await
        .map_err(|err| db_error(err, "create newsletter"))?;
    info!(id = newsletter.id, user = %user.username, "newsletter created");

    Ok((StatusCode::CREATED, Json(newsletter)))
}

pub async fn update_newsletter(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    ApiJson(input): ApiJson<NewsletterInput>,
) -> Result<Json<Newsletter>, ApiError> {
    let id = parse_id(&raw_id)?;
    let changes = input.into_changes()?;

    let newsletter = store::update(state.pool_ref(), id, &changes)
        .await
        .map_err(|err| db_error(err, "update newsletter"))?
        .ok_or_else(|| not_found(RESOURCE))?;
    info!(id, user = %user.username, "newsletter updated");

    Ok(Json(newsletter))
}

pub async fn delete_newsletter(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiMessage>, ApiError> {
    let id = parse_id(&raw_id)?;

    let removed = store::delete(state.pool_ref(), id)
        .await
        .map_err(|err| db_error(err, "delete newsletter"))?;
    if !removed {
        return Err(not_found(RESOURCE));
    }
    info!(id, user = %user.username, "newsletter deleted");

    Ok(deleted(RESOURCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(json: serde_json::Value) -> NewsletterInput {
        serde_json::from_value(json).expect("valid input")
    }

    #[test]
    fn submitted_label_is_stored_verbatim() {
        let new = input(serde_json::json!({
            "date": "1/12/2025 – 7/12/2025",
            "pdfUrl": "https://cdn.test/newsletters/dec.pdf"
        }))
        .into_new()
        .expect("valid newsletter");

        assert_eq!(new.date, "1/12/2025 – 7/12/2025");
        assert!(new.is_active);
    }

    #[test]
    fn picker_dates_compose_label() {
        let new = input(serde_json::json!({
            "startDate": "2025-12-01",
            "endDate": "2025-12-07",
            "pdfUrl": "https://cdn.test/dec.pdf",
            "isActive": false
        }))
        .into_new()
        .expect("valid newsletter");

        assert_eq!(new.date, "1/12/2025 – 7/12/2025");
        assert!(!new.is_active);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let (status, Json(body)) = input(serde_json::json!({
            "startDate": "2025-12-07",
            "endDate": "2025-12-01",
            "pdfUrl": "https://cdn.test/dec.pdf"
        }))
        .into_new()
        .err()
        .expect("reversed range");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("End date"));
    }

    #[test]
    fn missing_fields_are_reported() {
        let (_, Json(body)) = input(serde_json::json!({ "pdfUrl": "https://x" }))
            .into_new()
            .err()
            .expect("date missing");
        assert_eq!(body.message, "Date is required");

        let (_, Json(body)) = input(serde_json::json!({ "date": "Dec" }))
            .into_new()
            .err()
            .expect("pdf missing");
        assert_eq!(body.message, "PDF URL is required");
    }

    #[test]
    fn update_leaves_absent_fields_untouched() {
        let changes = input(serde_json::json!({ "isActive": false }))
            .into_changes()
            .expect("valid changes");
        assert!(changes.date.is_none());
        assert!(changes.pdf_url.is_none());
        assert_eq!(changes.is_active, Some(false));
    }

    #[test]
    fn update_rejects_blank_date_without_pickers() {
        let (status, Json(body)) = input(serde_json::json!({ "date": "  " }))
            .into_changes()
            .err()
            .expect("blank date");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Date cannot be empty");

        let changes = input(serde_json::json!({
            "date": "",
            "startDate": "2025-12-08",
            "endDate": "2025-12-14"
        }))
        .into_changes()
        .expect("pickers supply the label");
        assert_eq!(changes.date.as_deref(), Some("8/12/2025 – 14/12/2025"));
    }

    #[test]
    fn query_keeps_blank_and_all_as_strings() {
        let query: NewsletterQuery =
            serde_json::from_value(serde_json::json!({ "active": "all", "page": "" }))
                .expect("query");
        assert_eq!(active_filter(query.active.as_deref()).expect("all"), None);
        assert_eq!(
            PageRequest::from_params(&query.paging, DEFAULT_PAGE_SIZE),
            PageRequest::new(1, DEFAULT_PAGE_SIZE)
        );
    }
}
