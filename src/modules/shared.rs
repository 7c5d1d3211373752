use axum::{Json, http::StatusCode};
use tracing::error;

use crate::{
    listing::filter_value,
    web::{ApiError, ApiMessage, json_error},
};

/// Trims an optional form value, dropping it entirely when blank.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trims an optional update value but keeps blanks, which clear the column.
pub fn trim_update(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Requires a non-blank value on create.
pub fn require_text(value: Option<String>, label: &str) -> Result<String, ApiError> {
    clean_optional(value)
        .ok_or_else(|| json_error(StatusCode::BAD_REQUEST, format!("{label} is required")))
}

/// Rejects an explicitly blanked required field on update; absent stays untouched.
pub fn required_update(value: Option<String>, label: &str) -> Result<Option<String>, ApiError> {
    match trim_update(value) {
        Some(v) if v.is_empty() => Err(json_error(
            StatusCode::BAD_REQUEST,
            format!("{label} cannot be empty"),
        )),
        other => Ok(other),
    }
}

/// Parses the `active` query filter. Blank and `all` mean both states.
pub fn active_filter(value: Option<&str>) -> Result<Option<bool>, ApiError> {
    let Some(value) = filter_value(value) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "Active filter must be true, false or all",
        )),
    }
}

pub fn db_error(err: sqlx::Error, action: &str) -> ApiError {
    error!(?err, action, "database operation failed");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {action}"),
    )
}

pub fn not_found(resource: &str) -> ApiError {
    json_error(StatusCode::NOT_FOUND, format!("{resource} not found"))
}

pub fn deleted(resource: &str) -> Json<ApiMessage> {
    Json(ApiMessage::new(format!("{resource} deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_optional_drops_blank_values() {
        assert_eq!(clean_optional(Some("  ".into())), None);
        assert_eq!(clean_optional(Some(" D10 ".into())), Some("D10".into()));
        assert_eq!(clean_optional(None), None);
    }

    #[test]
    fn require_text_names_the_field() {
        let (status, Json(body)) = require_text(Some("".into()), "Name").expect_err("blank");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Name is required");
    }

    #[test]
    fn required_update_distinguishes_absent_from_blank() {
        assert_eq!(required_update(None, "Title").expect("absent"), None);
        assert_eq!(
            required_update(Some(" New ".into()), "Title").expect("present"),
            Some("New".into())
        );
        assert!(required_update(Some(" ".into()), "Title").is_err());
    }

    #[test]
    fn active_filter_treats_blank_and_all_as_unfiltered() {
        assert_eq!(active_filter(None).expect("absent"), None);
        assert_eq!(active_filter(Some("")).expect("blank"), None);
        assert_eq!(active_filter(Some("ALL")).expect("all"), None);
        assert_eq!(active_filter(Some("true")).expect("true"), Some(true));
        assert_eq!(active_filter(Some("False")).expect("false"), Some(false));

        let (status, Json(body)) = active_filter(Some("maybe")).expect_err("garbled");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.starts_with("Active filter"));
    }
}
