use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect},
    routing::{get, post},
};

use crate::{
    modules,
    web::{AppState, auth, dashboard, uploads},
};

const ROBOTS_TXT_BODY: &str = include_str!("../../robots.txt");

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config().uploads.request_body_limit();

    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/login", get(auth::login_page).post(auth::process_login))
        .route("/logout", post(auth::logout))
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .route("/dashboard", get(dashboard::dashboard))
        .route(
            "/api/upload",
            post(uploads::upload_files).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .merge(modules::newsletters::router())
        .merge(modules::tool_resources::router())
        .merge(modules::new_launches::router())
        .merge(modules::events::router())
        .merge(modules::content::router())
        .with_state(state)
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
