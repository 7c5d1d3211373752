pub mod auth;
pub mod dashboard;
pub mod extract;
pub mod responses;
pub mod router;
pub mod state;
pub mod templates;
#[cfg(test)]
pub mod testing;
pub mod uploads;

pub use auth::AuthUser;
pub use extract::{ApiJson, ApiQuery};
pub use responses::{ApiError, ApiMessage, internal_error, json_error, parse_id};
pub use state::AppState;
pub use templates::{escape_html, render_login_page};
