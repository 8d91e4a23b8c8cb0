//! Access gate.
//!
//! Sign-in itself happens upstream; requests reach this service with
//! the signed-in user's address in the `x-user-email` header.  Only
//! addresses on the configured allow-list get through.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Allow-list of e-mail addresses, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed: HashSet<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: emails
                .into_iter()
                .map(|email| email.as_ref().trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    pub fn is_email_allowed(&self, email: &str) -> bool {
        self.allowed.contains(&email.trim().to_lowercase())
    }
}

/// The signed-in user, inserted into request extensions by
/// [`require_allowed_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub email: String,
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Middleware: 401 without an identity, 403 for an identity that is
/// not allow-listed.
pub async fn require_allowed_user(
    State(policy): State<Arc<AccessPolicy>>,
    mut req: Request,
    next: Next,
) -> Response {
    let email = req
        .headers()
        .get(USER_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let Some(email) = email else {
        return reject(StatusCode::UNAUTHORIZED, "Sign-in required.");
    };
    if !policy.is_email_allowed(&email) {
        warn!(%email, "access denied");
        return reject(
            StatusCode::FORBIDDEN,
            "Access denied. Only authorized email addresses can sign in.",
        );
    }

    req.extensions_mut().insert(CurrentUser { email });
    next.run(req).await
}
