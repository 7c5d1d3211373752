//! `Query` and `Json` wrappers that reject with the JSON error body used by every API route.

use axum::{
    Json, async_trait,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::web::{ApiError, json_error};

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(query_rejection)
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| ApiJson(value))
            .map_err(json_rejection)
    }
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    json_error(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// Malformed or mistyped bodies are a 400; content-type and size problems keep their status.
fn json_rejection(rejection: JsonRejection) -> ApiError {
    let status = match &rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            StatusCode::BAD_REQUEST
        }
        other => other.status(),
    };
    json_error(status, rejection.body_text())
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        start_date: chrono::NaiveDate,
    }

    fn json_request(body: &'static str) -> Request {
        http::Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request")
    }

    #[tokio::test]
    async fn malformed_json_is_a_json_400() {
        let (status, Json(body)) =
            ApiJson::<Payload>::from_request(json_request(r#"{"startDate":"#), &())
                .await
                .expect_err("syntax error");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.message.is_empty());
    }

    #[tokio::test]
    async fn mistyped_field_is_a_json_400() {
        let (status, Json(body)) =
            ApiJson::<Payload>::from_request(json_request(r#"{"startDate":"next week"}"#), &())
                .await
                .expect_err("bad date");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("startDate"));
    }

    #[tokio::test]
    async fn missing_content_type_keeps_its_status() {
        let request = http::Request::post("/")
            .body(Body::from(r#"{"startDate":"2025-12-01"}"#))
            .expect("request");
        let (status, _) = ApiJson::<Payload>::from_request(request, &())
            .await
            .expect_err("no content type");
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn well_formed_json_is_extracted() {
        let ApiJson(payload) =
            ApiJson::<Payload>::from_request(json_request(r#"{"startDate":"2025-12-01"}"#), &())
                .await
                .expect("payload");
        assert_eq!(payload.start_date.to_string(), "2025-12-01");
    }
}
