//! Router assembly and the shared JSON error shape.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the auth entry points, account/profile/event APIs and
//! the live profile websocket under a single Axum router. Presentation is
//! out of scope: handlers answer with redirects or JSON.

pub mod auth;
pub mod events;
pub mod profile;
pub mod settings;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::baas::BaasError;
use crate::services::account::AccountError;
use crate::services::avatar::MAX_AVATAR_BYTES;
use crate::services::events::EventError;
use crate::services::profile::ProfileError;
use crate::services::validate::FieldErrors;
use crate::state::AppState;

/// Largest multipart body accepted on the avatar route; the image itself is
/// capped separately.
const AVATAR_BODY_LIMIT: usize = MAX_AVATAR_BYTES + 64 * 1024;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auth/callback", get(auth::callback))
        .route("/auth/verify-email", get(auth::verify_email))
        .route("/verified", get(auth::verified))
        .route("/verify", get(auth::verify_page))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/resend", post(auth::resend))
        .route("/api/auth/destination", get(auth::destination))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/profile", get(profile::get_profile).patch(profile::patch_profile))
        .route("/api/profile/complete", post(profile::complete))
        .route(
            "/api/profile/avatar",
            post(profile::upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route("/api/profile/email", post(profile::change_email))
        .route("/api/profile/live", get(profile::live))
        .route("/api/settings/password", post(settings::change_password))
        .route("/api/events", get(events::list_events).post(events::create_event))
        .route("/api/my-events", get(events::my_events))
        .route("/api/my-tickets", get(events::my_tickets))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub fields: FieldErrors,
}

/// Error response: a status plus `{ error, fields }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, body: ErrorBody { error: message.into(), fields: FieldErrors::new() } }
    }

    #[must_use]
    pub fn validation(fields: FieldErrors) -> Self {
        Self { status: StatusCode::UNPROCESSABLE_ENTITY, body: ErrorBody { error: "validation failed".into(), fields } }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "not signed in")
    }

    #[must_use]
    pub fn unverified() -> Self {
        Self::new(StatusCode::FORBIDDEN, "email not confirmed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<BaasError> for ApiError {
    fn from(err: BaasError) -> Self {
        match &err {
            BaasError::Api { status, message } => {
                let code = match status {
                    401 | 403 => StatusCode::UNAUTHORIZED,
                    400..=499 => StatusCode::BAD_REQUEST,
                    _ => StatusCode::BAD_GATEWAY,
                };
                tracing::warn!(status, error = %err, "backend rejected request");
                Self::new(code, message.clone())
            }
            BaasError::Request(_) | BaasError::Parse(_) | BaasError::HttpClientBuild(_) => {
                tracing::error!(error = %err, "backend unavailable");
                Self::new(StatusCode::BAD_GATEWAY, "backend unavailable, please try again")
            }
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(fields) => Self::validation(fields),
            AccountError::Provider(e) => e.into(),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Validation(fields) => Self::validation(fields),
            ProfileError::Provider(e) => e.into(),
            ProfileError::NotFound => Self::new(StatusCode::NOT_FOUND, "profile not found"),
            ProfileError::Upload(message) => {
                let mut fields = FieldErrors::new();
                fields.insert("file", message);
                Self::validation(fields)
            }
        }
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Validation(fields) => Self::validation(fields),
            EventError::Provider(e) => e.into(),
        }
    }
}

#[cfg(test)]
#[path = "request_helpers_test.rs"]
pub(crate) mod request_helpers;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
