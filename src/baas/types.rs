//! BaaS types — wire records, provider traits, and errors.
//!
//! The auth provider, profile store, file store and event tables are all
//! owned by the hosted backend. This module only describes the slice of
//! their contracts the application consumes. Each contract is a trait so
//! route handlers and services can be exercised against in-memory fakes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by calls to the hosted backend.
#[derive(Debug, thiserror::Error)]
pub enum BaasError {
    /// The HTTP request never produced a response (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status. `message` is the
    /// provider's human-readable explanation.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl BaasError {
    /// True when the backend rejected the caller's credentials or token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }

    /// True when the backend itself rejected the request (as opposed to the
    /// backend being unreachable or answering garbage).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Api { status: 400..=499, .. })
    }
}

/// Pull the human-readable message out of a backend error body.
///
/// GoTrue uses `msg` or `error_description`, PostgREST and Storage use
/// `message`, older endpoints only set `error`.
#[must_use]
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                if !text.trim().is_empty() {
                    return text.to_owned();
                }
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() { format!("backend returned status {status}") } else { trimmed.to_owned() }
}

// =============================================================================
// AUTH RECORDS
// =============================================================================

/// Subset of the auth provider's user object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Set once the user clicked the confirmation link.
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
}

/// Token grant returned by sign-in, OTP verification and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// One-time-token flavours understood by `verify` and `resend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Signup,
    Invite,
    Magiclink,
    Recovery,
    EmailChange,
    Email,
}

impl OtpType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Invite => "invite",
            Self::Magiclink => "magiclink",
            Self::Recovery => "recovery",
            Self::EmailChange => "email_change",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "signup" => Ok(Self::Signup),
            "invite" => Ok(Self::Invite),
            "magiclink" => Ok(Self::Magiclink),
            "recovery" => Ok(Self::Recovery),
            "email_change" => Ok(Self::EmailChange),
            "email" => Ok(Self::Email),
            other => Err(format!("unknown otp type: {other}")),
        }
    }
}

/// Attributes accepted by `updateUser`. Unset fields are left untouched.
#[derive(Clone, Default, Serialize)]
pub struct UserAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// Passwords must never reach a log line.
impl fmt::Debug for UserAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAttributes")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// =============================================================================
// DATA RECORDS
// =============================================================================

/// Row of the remote `profiles` table, keyed by the auth user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub fname: Option<String>,
    #[serde(default)]
    pub lname: Option<String>,
    #[serde(default)]
    pub mname: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_no: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Whole years between `birthday` and the date of the last save.
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Row of the remote `events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// RFC 3339 timestamp; the first ten characters are the calendar date.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Insert payload for `events`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEvent {
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
}

/// Insert payload for `event_items`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEventItem {
    pub event_id: Uuid,
    pub item_name: String,
    pub item_description: Option<String>,
    pub item_quantity: i32,
}

/// Row of the remote `tickets` table with its embedded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub event_id: Option<Uuid>,
    #[serde(default, rename = "events")]
    pub event: Option<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

// =============================================================================
// PROVIDER CONTRACTS
// =============================================================================

/// Auth provider endpoints consumed by the session flows.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account. The confirmation mail links back to `redirect_to`.
    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<AuthUser, BaasError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BaasError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), BaasError>;

    /// Exchange an emailed token hash for a confirmed session.
    async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> Result<AuthSession, BaasError>;

    async fn resend(&self, otp_type: OtpType, email: &str) -> Result<(), BaasError>;

    /// Current user for an access token. Always a live read.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BaasError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BaasError>;

    async fn update_user(&self, access_token: &str, attrs: &UserAttributes) -> Result<AuthUser, BaasError>;
}

/// Keyed access to the `profiles` table, scoped by the caller's token.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when no row exists for `user_id`.
    async fn fetch_profile(&self, access_token: &str, user_id: Uuid) -> Result<Option<Profile>, BaasError>;

    async fn insert_profile(&self, access_token: &str, profile: &Profile) -> Result<Profile, BaasError>;

    /// Insert or replace on `id`.
    async fn upsert_profile(&self, access_token: &str, profile: &Profile) -> Result<Profile, BaasError>;

    /// Partial update. `Ok(None)` when no row matched.
    async fn update_profile(
        &self,
        access_token: &str,
        user_id: Uuid,
        changes: &serde_json::Value,
    ) -> Result<Option<Profile>, BaasError>;
}

/// Object storage used for profile pictures.
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// Object names directly under `prefix` in `bucket`.
    async fn list(&self, access_token: &str, bucket: &str, prefix: &str) -> Result<Vec<String>, BaasError>;

    async fn remove(&self, access_token: &str, bucket: &str, paths: &[String]) -> Result<(), BaasError>;

    /// Store `bytes` at `path`, overwriting, and return the public URL.
    async fn upload(
        &self,
        access_token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BaasError>;
}

/// Event and ticket tables.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Events newest first, optionally restricted to one owner.
    async fn list_events(&self, access_token: Option<&str>, owner: Option<Uuid>) -> Result<Vec<Event>, BaasError>;

    async fn create_event(&self, access_token: &str, event: &NewEvent) -> Result<Event, BaasError>;

    async fn insert_event_items(&self, access_token: &str, items: &[NewEventItem]) -> Result<(), BaasError>;

    async fn list_tickets(&self, access_token: &str, user_id: Uuid) -> Result<Vec<Ticket>, BaasError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
