//! HTTP Basic authentication for admin routes.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Extractor that admits only requests carrying the configured admin credentials.
pub struct AdminGuard;

#[async_trait]
impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let (username, password) = decode_basic(header).ok_or(AppError::Unauthorized)?;

        if constant_time_eq(username.as_bytes(), state.config.admin_username.as_bytes())
            & constant_time_eq(password.as_bytes(), state.config.admin_password.as_bytes())
        {
            Ok(AdminGuard)
        } else {
            warn!("Rejected admin credentials for user '{username}'");
            Err(AppError::Unauthorized)
        }
    }
}

/// Splits a `Basic <base64(user:pass)>` header value into its credentials.
pub fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
