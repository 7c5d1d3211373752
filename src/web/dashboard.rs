use axum::{
    extract::State,
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use sqlx::{FromRow, PgPool};
use tracing::error;

use crate::{
    modules::newsletters::{label, store as newsletters},
    web::{
        AppState, auth, escape_html,
        templates::{PageLayout, render_page},
    },
};

const RECENT_LIMIT: usize = 5;

#[derive(Debug, Default, Clone, Copy, FromRow)]
pub struct ContentCounts {
    pub newsletters: i64,
    pub tool_resources: i64,
    pub new_launches: i64,
    pub events: i64,
}

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    let user = auth::require_user_redirect(&state, &jar).await?;

    let overview = match load_overview(state.pool_ref()).await {
        Ok((counts, recent)) => render_overview(&counts, &recent),
        Err(err) => {
            error!(?err, "failed to load dashboard overview");
            render_inline_error("Content could not be loaded. Please refresh to try again.")
        }
    };

    Ok(Html(render_page(PageLayout {
        title: "Content Dashboard",
        username: &user.username,
        body_html: overview,
    })))
}

async fn load_overview(
    pool: &PgPool,
) -> sqlx::Result<(ContentCounts, Vec<newsletters::Newsletter>)> {
    let counts = sqlx::query_as::<_, ContentCounts>(
        "SELECT
            (SELECT COUNT(*) FROM newsletters) AS newsletters,
            (SELECT COUNT(*) FROM tool_resources) AS tool_resources,
            (SELECT COUNT(*) FROM new_launches) AS new_launches,
            (SELECT COUNT(*) FROM events) AS events",
    )
    .fetch_one(pool)
    .await?;

    let mut recent = newsletters::list(pool, None).await?;
    label::sort_newest_first(&mut recent);
    recent.truncate(RECENT_LIMIT);

    Ok((counts, recent))
}

fn render_overview(counts: &ContentCounts, recent: &[newsletters::Newsletter]) -> String {
    let cards = [
        ("Newsletters", counts.newsletters, "/api/newsletters"),
        ("Tool resources", counts.tool_resources, "/api/tool-resources"),
        ("New launches", counts.new_launches, "/api/new-launch-collection"),
        ("Events", counts.events, "/api/events"),
    ]
    .iter()
    .map(|(caption, count, href)| {
        format!(
            r#"<div class="card"><p class="caption">{caption}</p><p class="count">{count}</p><p class="caption"><code>{href}</code></p></div>"#,
        )
    })
    .collect::<String>();

    let rows = if recent.is_empty() {
        r#"<tr><td colspan="3" class="empty">No newsletters yet.</td></tr>"#.to_string()
    } else {
        recent
            .iter()
            .map(|newsletter| {
                let (class, text) = if newsletter.is_active {
                    ("active", "Active")
                } else {
                    ("inactive", "Hidden")
                };
                let file = match web_link(&newsletter.pdf_url) {
                    Some(url) => format!(
                        r#"<a href="{}" target="_blank" rel="noopener">PDF</a>"#,
                        escape_html(url)
                    ),
                    None => r#"<span class="caption">Unsupported link</span>"#.to_string(),
                };
                format!(
                    r#"<tr><td>{date}</td><td>{file}</td><td><span class="status-tag {class}">{text}</span></td></tr>"#,
                    date = escape_html(&newsletter.date),
                )
            })
            .collect::<String>()
    };

    format!(
        r#"        <section>
            <div class="cards">{cards}</div>
        </section>
        <section class="panel">
            <h2>Latest newsletters</h2>
            <table>
                <thead><tr><th>Week</th><th>File</th><th>Status</th></tr></thead>
                <tbody>{rows}</tbody>
            </table>
        </section>"#
    )
}

/// Only `http(s)` URLs become links; anything else (`javascript:`, `data:`) is shown inert.
fn web_link(url: &str) -> Option<&str> {
    let url = url.trim();
    let scheme = url.split_once(':')?.0;
    (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")).then_some(url)
}

fn render_inline_error(message: &str) -> String {
    format!(
        r#"        <section><div class="inline-error">{}</div></section>"#,
        escape_html(message)
    )
}
