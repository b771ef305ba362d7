//! Account settings.

use axum::extract::State;
use axum::response::Json;
use axum_extra::extract::cookie::CookieJar;

use super::ApiError;
use super::auth::{CurrentSession, refreshed_cookies};
use crate::services::account::{self, PasswordChange};
use crate::state::AppState;

/// `POST /api/settings/password`
pub async fn change_password(
    State(state): State<AppState>,
    CurrentSession(active): CurrentSession,
    Json(change): Json<PasswordChange>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    account::change_password(state.auth.as_ref(), active.access_token(), &change).await?;
    let jar = refreshed_cookies(Some(&active), state.config.cookie_secure);
    Ok((jar, Json(serde_json::json!({ "message": "Password updated successfully." }))))
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
