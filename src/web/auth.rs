use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::{
    async_trait,
    extract::{Form, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration as ChronoDuration, Utc};
use cookie::time::Duration as CookieDuration;
use rand_core::OsRng;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::web::{ApiError, AppState, internal_error, json_error, render_login_page};

pub const SESSION_COOKIE: &str = "auth_token";
pub const SESSION_TTL_DAYS: i64 = 7;

const LOGIN_PATH: &str = "/login";
const HOME_PATH: &str = "/dashboard";

#[derive(Clone, sqlx::FromRow)]
pub struct StaffCredentials {
    pub id: Uuid,
    pub password_hash: String,
}

/// Staff member resolved from a live session.
#[derive(Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Listed ahead of `ApiQuery`/`ApiJson` in a handler so a missing session is a
/// 401 before any input is parsed.
#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        require_user_json(state, &jar).await
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Why a sign-in attempt was turned away; rendered back onto the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    BadCredentials,
    Unavailable,
}

impl LoginFailure {
    fn status(self) -> StatusCode {
        match self {
            LoginFailure::BadCredentials => StatusCode::UNAUTHORIZED,
            LoginFailure::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> &'static str {
        match self {
            LoginFailure::BadCredentials => "Incorrect username or password.",
            LoginFailure::Unavailable => "Something went wrong. Please try again later.",
        }
    }
}

impl IntoResponse for LoginFailure {
    fn into_response(self) -> Response {
        (self.status(), Html(render_login_page(Some(self.message())))).into_response()
    }
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    if current_user(&state, &jar).await.is_some() {
        return Err(Redirect::to(HOME_PATH));
    }
    Ok(Html(render_login_page(None)))
}

pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), LoginFailure> {
    let username = form.username.trim();

    let credentials = fetch_credentials(state.pool_ref(), username)
        .await
        .map_err(|err| {
            error!(?err, "failed to look up staff credentials");
            LoginFailure::Unavailable
        })?
        .ok_or(LoginFailure::BadCredentials)?;

    if !verify_password(&form.password, &credentials.password_hash) {
        warn!(username, "rejected sign-in");
        return Err(LoginFailure::BadCredentials);
    }

    let token = open_session(state.pool_ref(), credentials.id)
        .await
        .map_err(|err| {
            error!(?err, "failed to open session");
            LoginFailure::Unavailable
        })?;
    info!(user_id = %credentials.id, "staff signed in");

    let jar = jar.add(session_cookie(
        token.to_string(),
        CookieDuration::days(SESSION_TTL_DAYS),
    ));
    Ok((jar, Redirect::to(HOME_PATH)))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(token) = session_token(&jar) {
        if let Err(err) = close_session(state.pool_ref(), token).await {
            error!(?err, "failed to close session on sign-out");
        }
    }

    let jar = jar.remove(session_cookie(String::new(), CookieDuration::ZERO));
    (jar, Redirect::to(LOGIN_PATH))
}

/// Gate for HTML pages: unauthenticated visitors are sent to the login form.
pub async fn require_user_redirect(state: &AppState, jar: &CookieJar) -> Result<AuthUser, Redirect> {
    current_user(state, jar)
        .await
        .ok_or_else(|| Redirect::to(LOGIN_PATH))
}

/// Gate for JSON routes. A request without a session cookie never touches the database.
pub async fn require_user_json(state: &AppState, jar: &CookieJar) -> Result<AuthUser, ApiError> {
    let Some(token) = session_token(jar) else {
        return Err(json_error(StatusCode::UNAUTHORIZED, "Unauthorized"));
    };

    match fetch_user_by_session(state.pool_ref(), token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(json_error(
            StatusCode::UNAUTHORIZED,
            "Session expired, please sign in again",
        )),
        Err(err) => {
            error!(?err, "failed to validate session");
            Err(internal_error())
        }
    }
}

/// Session lookup for pages, where a lookup failure is treated as signed out.
async fn current_user(state: &AppState, jar: &CookieJar) -> Option<AuthUser> {
    let token = session_token(jar)?;
    fetch_user_by_session(state.pool_ref(), token)
        .await
        .unwrap_or_else(|err| {
            error!(?err, "failed to validate session");
            None
        })
}

fn session_token(jar: &CookieJar) -> Option<Uuid> {
    let cookie = jar.get(SESSION_COOKIE)?;
    Uuid::parse_str(cookie.value()).ok()
}

fn session_cookie(value: String, max_age: CookieDuration) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(max_age);
    cookie
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash).is_ok_and(|hash| {
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok()
    })
}

async fn fetch_credentials(pool: &PgPool, username: &str) -> sqlx::Result<Option<StaffCredentials>> {
    sqlx::query_as::<_, StaffCredentials>("SELECT id, password_hash FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

async fn open_session(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Uuid> {
    let token = Uuid::new_v4();
    let expires_at = Utc::now() + ChronoDuration::days(SESSION_TTL_DAYS);
    sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(token)
}

async fn close_session(pool: &PgPool, token: Uuid) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn fetch_user_by_session(pool: &PgPool, token: Uuid) -> sqlx::Result<Option<AuthUser>> {
    sqlx::query_as::<_, AuthUser>(
        "SELECT users.id, users.username
         FROM sessions JOIN users ON users.id = sessions.user_id
         WHERE sessions.id = $1 AND sessions.expires_at > NOW()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}
