//! HTML login and consent pages.
//!
//! All interpolated values are HTML-escaped to prevent XSS.

use crate::config::paths;

const STYLE: &str = r#"<style>
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: #f5f5f5; margin: 0; display: flex; justify-content: center; align-items: center; min-height: 100vh; }
.card { background: #fff; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); padding: 32px; max-width: 400px; width: 100%; }
h1 { font-size: 20px; margin: 0 0 8px; color: #333; }
.subtitle { color: #666; font-size: 14px; margin: 0 0 24px; }
label { display: block; font-size: 14px; font-weight: 500; margin: 12px 0 6px; color: #333; }
input[type="email"], input[type="password"] { width: 100%; padding: 10px; border: 1px solid #ddd; border-radius: 4px; font-size: 14px; box-sizing: border-box; }
button { width: 100%; padding: 10px; background: #4a90d9; color: #fff; border: none; border-radius: 4px; font-size: 14px; font-weight: 500; cursor: pointer; margin-top: 16px; }
button:hover { background: #357abd; }
</style>"#;

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title}</title>
{style}
</head>
<body>
<div class="card">
{body}
</div>
</body>
</html>"#,
        title = html_escape(title),
        style = STYLE,
    )
}

/// Render the login form for an authorization session.
pub fn render_login_page(state: &str, error_message: Option<&str>) -> String {
    let error_html = error_message
        .map(|msg| {
            format!(
                r#"<div style="background:#fee;border:1px solid #c00;color:#c00;padding:10px;border-radius:4px;margin-bottom:16px">{}</div>"#,
                html_escape(msg)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Sign in</h1>
<p class="subtitle">Log in to continue the authorization</p>
{error_html}
<form method="POST" action="{action}">
<input type="hidden" name="state" value="{state}">
<label for="email">Email</label>
<input type="email" id="email" name="email" required autofocus>
<label for="password">Password</label>
<input type="password" id="password" name="password" required>
<button type="submit">Log in</button>
</form>"#,
        action = paths::SUBMIT,
        state = html_escape(state),
    );

    page("Sign in", &body)
}

/// Render the consent form naming the requesting application.
pub fn render_consent_page(state: &str, application: &str) -> String {
    let body = format!(
        r#"<h1>Authorize access</h1>
<p class="subtitle"><strong>{application}</strong> is requesting access to your name, email and roles</p>
<form method="POST" action="{action}">
<input type="hidden" name="state" value="{state}">
<button type="submit">Allow</button>
</form>"#,
        application = html_escape(application),
        action = paths::CONSENT,
        state = html_escape(state),
    );

    page("Authorize access", &body)
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
