//! Shared fixtures for router and handler tests.

use aws_sdk_s3::config::{BehaviorVersion, Region};
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    cms::CmsClient,
    config::AppConfig,
    storage::S3Storage,
    web::{AppState, auth::SESSION_COOKIE, router::build_router},
};

fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost:1/unused".to_string()),
        "S3_BUCKET" => Some("dashboard-test".to_string()),
        "CMS_API_URL" => Some("http://127.0.0.1:9".to_string()),
        _ => None,
    })
    .expect("test config")
}

/// State backed by the given pool; S3 and the CMS point at nothing.
pub fn state_with_pool(pool: PgPool) -> AppState {
    let config = test_config();
    let s3 = aws_sdk_s3::Client::from_conf(
        aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build(),
    );
    let storage = S3Storage::new(s3, &config.storage);
    let cms = CmsClient::new(&config.cms).expect("cms client");

    AppState::from_parts(pool, storage, cms, config)
}

/// State whose pool never connects. Only for paths that stop before the database.
pub fn lazy_state() -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy(&test_config().database_url)
        .expect("lazy pool");
    state_with_pool(pool)
}

/// Inserts a staff user with a live session and returns the `Cookie` header value.
pub async fn staff_cookie(pool: &PgPool) -> String {
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, 'unused')")
        .bind(user_id)
        .bind(format!("staff-{}", user_id.simple()))
        .execute(pool)
        .await
        .expect("insert staff");

    let token = Uuid::new_v4();
    sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(user_id)
        .bind(Utc::now() + Duration::hours(1))
        .execute(pool)
        .await
        .expect("insert session");

    format!("{SESSION_COOKIE}={token}")
}

pub fn json_request(method: &str, uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str, cookie: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request")
}

/// Runs one request through the full router and decodes the JSON body.
pub async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = build_router(state)
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, content_type, body)
}
