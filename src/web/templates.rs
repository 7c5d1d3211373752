use chrono::{Datelike, Utc};

const PAGE_BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #ffffff; padding: 1.5rem; border-bottom: 1px solid #e2e8f0; }
        .header-bar { display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; }
        .header-bar h1 { margin: 0; font-size: 1.5rem; }
        .user-chip { color: #475569; font-size: 0.95rem; }
        .logout-button { padding: 0.45rem 0.9rem; border: 1px solid #fecaca; border-radius: 999px; background: #fee2e2; color: #0f172a; font-weight: 600; cursor: pointer; }
        .logout-button:hover { background: #fecaca; }
        main { padding: 2rem 1.5rem; max-width: 1080px; margin: 0 auto; box-sizing: border-box; }
        section { margin-bottom: 2.5rem; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); }
        .panel h2 { margin-top: 0; }
        .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 1rem; }
        .card { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.25rem; }
        .card .count { font-size: 2rem; font-weight: 700; margin: 0.25rem 0 0; }
        .card .caption { color: #475569; font-size: 0.9rem; margin: 0; }
        table { width: 100%; border-collapse: collapse; margin-top: 1rem; background: #ffffff; border: 1px solid #e2e8f0; }
        th, td { padding: 0.75rem 1rem; border-bottom: 1px solid #e2e8f0; text-align: left; }
        th { background: #f1f5f9; font-weight: 600; }
        td a { color: #2563eb; text-decoration: none; }
        .status-tag { display: inline-flex; padding: 0.2rem 0.7rem; border-radius: 999px; font-size: 0.85rem; font-weight: 600; }
        .status-tag.active { background: #dcfce7; color: #166534; }
        .status-tag.inactive { background: #f1f5f9; color: #475569; }
        .inline-error { padding: 1rem; border-radius: 12px; background: #fee2e2; color: #b91c1c; }
        .empty { color: #64748b; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
        @media (max-width: 768px) {
            main { padding: 1.5rem 1rem; }
            .header-bar { flex-direction: column; align-items: flex-start; }
            th, td { padding: 0.5rem; }
        }
"#;

pub struct PageLayout<'a> {
    pub title: &'a str,
    pub username: &'a str,
    pub body_html: String,
}

/// Wraps authenticated pages in the shared header, styles and footer.
pub fn render_page(layout: PageLayout<'_>) -> String {
    let PageLayout {
        title,
        username,
        body_html,
    } = layout;

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <div class="header-bar">
            <h1>{title}</h1>
            <div style="display:flex; gap:0.75rem; align-items:center;">
                <span class="user-chip">Signed in as {username}</span>
                <form method="post" action="/logout">
                    <button type="submit" class="logout-button">Sign out</button>
                </form>
            </div>
        </div>
    </header>
    <main>
{body_html}
        {footer}
    </main>
</body>
</html>"#,
        title = escape_html(title),
        username = escape_html(username),
        styles = PAGE_BASE_STYLES,
        body_html = body_html,
        footer = render_footer(),
    )
}

pub fn render_login_page(error: Option<&str>) -> String {
    let footer = render_footer();
    let error_html = error
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape_html(message)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Content Dashboard</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
        :root {{ color-scheme: light; }}
        body {{ font-family: "Helvetica Neue", Arial, sans-serif; display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; margin: 0; background: #f1f5f9; color: #0f172a; padding: 1.5rem; box-sizing: border-box; }}
        main {{ width: 100%; max-width: 420px; display: flex; flex-direction: column; align-items: center; gap: 1.5rem; }}
        .panel {{ background: #ffffff; padding: 2.5rem 2.25rem; border-radius: 18px; box-shadow: 0 20px 60px rgba(15, 23, 42, 0.08); width: 100%; border: 1px solid #e2e8f0; box-sizing: border-box; }}
        h1 {{ margin: 0 0 1rem; font-size: 1.6rem; text-align: center; }}
        p.description {{ margin: 0 0 1.5rem; color: #475569; text-align: center; font-size: 0.95rem; }}
        p.error {{ margin: 0 0 1rem; padding: 0.75rem; border-radius: 10px; background: #fee2e2; color: #b91c1c; text-align: center; }}
        label {{ display: block; margin-top: 1.2rem; font-weight: 600; }}
        input {{ width: 100%; padding: 0.85rem; margin-top: 0.65rem; border-radius: 10px; border: 1px solid #cbd5f5; background: #f8fafc; font-size: 1rem; box-sizing: border-box; }}
        input:focus {{ outline: none; border-color: #2563eb; box-shadow: 0 0 0 3px rgba(37, 99, 235, 0.15); }}
        button {{ margin-top: 2rem; width: 100%; padding: 0.95rem; border: none; border-radius: 10px; background: #2563eb; color: #ffffff; font-weight: 600; font-size: 1.05rem; cursor: pointer; }}
        button:hover {{ background: #1d4ed8; }}
        .app-footer {{ margin-top: 2rem; text-align: center; font-size: 0.85rem; color: #64748b; }}
    </style>
</head>
<body>
    <main>
        <section class="panel">
            <h1>Content Dashboard</h1>
            <p class="description">Sign in with your staff account.</p>
            {error_html}
            <form method="post" action="/login">
                <label for="username">Username</label>
                <input id="username" name="username" autocomplete="username" required>
                <label for="password">Password</label>
                <input id="password" type="password" name="password" autocomplete="current-password" required>
                <button type="submit">Sign in</button>
            </form>
        </section>
        {footer}
    </main>
</body>
</html>"#,
        error_html = error_html,
        footer = footer,
    )
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© {year} Content Dashboard. Staff use only.</footer>"#,
        year = current_year
    )
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_page_escapes_error_message() {
        let html = render_login_page(Some("Invalid <credentials>"));
        assert!(html.contains("Invalid &lt;credentials&gt;"));
        assert!(!render_login_page(None).contains(r#"class="error""#));
    }

    #[test]
    fn page_layout_escapes_username() {
        let html = render_page(PageLayout {
            title: "Dashboard",
            username: "<script>",
            body_html: String::new(),
        });
        assert!(html.contains("Signed in as &lt;script&gt;"));
    }
}
