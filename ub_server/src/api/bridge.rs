//! HTML bridge pages for emailed links.
//!
//! Verification and reset emails link to these pages, which hand the
//! token to the JSON API from the browser. The pages are deliberately
//! tiny: a heading, a status line, and a script that posts the token.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Html;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BridgeParams {
    pub token: String,
}

/// Tokens travel as URL-safe JWT text; anything else is rejected before
/// it can be embedded in markup.
fn is_token_safe(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Landing page for emailed verification links
pub async fn verification_page(
    Query(params): Query<BridgeParams>,
) -> Result<Html<String>, StatusCode> {
    if !is_token_safe(&params.token) {
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(Html(verification_bridge_page(&params.token)))
}

/// Landing page for emailed password reset links
pub async fn reset_page(Query(params): Query<BridgeParams>) -> Result<Html<String>, StatusCode> {
    if !is_token_safe(&params.token) {
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(Html(reset_bridge_page(&params.token)))
}

fn verification_bridge_page(token: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Confirm your email</title></head>
<body>
  <h1>Confirm your email</h1>
  <p id="status">Confirming...</p>
  <script>
    fetch("/api/auth/verify-email", {{
      method: "POST",
      headers: {{ "Content-Type": "application/json" }},
      body: JSON.stringify({{ token: "{token}" }})
    }})
      .then((response) => response.json().then((body) => {{
        document.getElementById("status").textContent =
          response.ok ? body.message : body.error;
      }}))
      .catch(() => {{
        document.getElementById("status").textContent = "Something went wrong";
      }});
  </script>
</body>
</html>
"#
    )
}

fn reset_bridge_page(token: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Reset your password</title></head>
<body>
  <h1>Reset your password</h1>
  <form id="reset-form">
    <input type="password" id="password" placeholder="New password" required>
    <button type="submit">Reset password</button>
  </form>
  <p id="status"></p>
  <script>
    document.getElementById("reset-form").addEventListener("submit", (event) => {{
      event.preventDefault();
      fetch("/api/auth/reset-password", {{
        method: "POST",
        headers: {{ "Content-Type": "application/json" }},
        body: JSON.stringify({{
          token: "{token}",
          password: document.getElementById("password").value
        }})
      }})
        .then((response) => response.json().then((body) => {{
          document.getElementById("status").textContent =
            response.ok ? body.message : body.error;
        }}))
        .catch(() => {{
          document.getElementById("status").textContent = "Something went wrong";
        }});
    }});
  </script>
</body>
</html>
"#
    )
}
