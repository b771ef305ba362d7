//! Profile routes — completion, profile page, avatar, email change and the
//! live change feed.
//!
//! Every write goes through `services::profile`, which publishes the saved
//! row on `AppState::profile_feed`. `live` is the only consumer.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use super::auth::{CurrentSession, refreshed_cookies};
use crate::baas::types::Profile;
use crate::services::account;
use crate::services::avatar::{self, AvatarUpload};
use crate::services::gate::Destination;
use crate::services::profile::{self, CompleteProfileForm, ProfileEdit, ProfileError};
use crate::state::AppState;

/// Multipart field carrying the avatar image.
pub const AVATAR_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: Profile,
    pub complete: bool,
    pub missing_fields: Vec<&'static str>,
}

impl From<Profile> for ProfileView {
    fn from(profile: Profile) -> Self {
        let missing_fields = profile::missing_required_fields(&profile);
        Self { complete: missing_fields.is_empty(), missing_fields, profile }
    }
}

type ProfileReply = Result<(CookieJar, Json<ProfileView>), ApiError>;

/// `GET /api/profile`: the session user's row, created on first visit.
pub async fn get_profile(State(state): State<AppState>, CurrentSession(active): CurrentSession) -> ProfileReply {
    let profile = profile::load_or_create_profile(state.profiles.as_ref(), &state.profile_feed, &active).await?;
    let jar = refreshed_cookies(Some(&active), state.config.cookie_secure);
    Ok((jar, Json(profile.into())))
}

/// `PATCH /api/profile`
pub async fn patch_profile(
    State(state): State<AppState>,
    CurrentSession(active): CurrentSession,
    Json(edit): Json<ProfileEdit>,
) -> ProfileReply {
    let profile =
        profile::update_profile(state.profiles.as_ref(), &state.profile_feed, &active, &edit, profile::today_utc())
            .await?;
    let jar = refreshed_cookies(Some(&active), state.config.cookie_secure);
    Ok((jar, Json(profile.into())))
}

#[derive(Debug, Serialize)]
pub struct CompletedBody {
    pub profile: Profile,
    pub destination: Destination,
    pub redirect: &'static str,
}

/// `POST /api/profile/complete`: only for confirmed sessions.
pub async fn complete(
    State(state): State<AppState>,
    CurrentSession(active): CurrentSession,
    Json(form): Json<CompleteProfileForm>,
) -> Result<(CookieJar, Json<CompletedBody>), ApiError> {
    if !active.session.is_email_confirmed() {
        return Err(ApiError::unverified());
    }
    let profile =
        profile::complete_profile(state.profiles.as_ref(), &state.profile_feed, &active, &form, profile::today_utc())
            .await?;
    tracing::info!(user_id = %active.user_id(), "profile completed");
    let jar = refreshed_cookies(Some(&active), state.config.cookie_secure);
    let body = CompletedBody { profile, destination: Destination::Home, redirect: Destination::Home.path() };
    Ok((jar, Json(body)))
}

/// `POST /api/profile/avatar`: multipart upload under field `file`.
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentSession(active): CurrentSession,
    mut multipart: Multipart,
) -> ProfileReply {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some(AvatarUpload { file_name, content_type, bytes: bytes.to_vec() });
        break;
    }
    let upload = upload.ok_or_else(|| ProfileError::Upload("Please choose an image to upload".into()))?;

    let profile = avatar::replace_avatar(
        state.files.as_ref(),
        state.profiles.as_ref(),
        &state.profile_feed,
        &state.config.avatar_bucket,
        &active,
        upload,
        avatar::unix_millis(),
    )
    .await?;
    let jar = refreshed_cookies(Some(&active), state.config.cookie_secure);
    Ok((jar, Json(profile.into())))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    tracing::debug!(error = %err, "malformed multipart body");
    ApiError::new(err.status(), err.body_text())
}

#[derive(Deserialize)]
pub struct EmailChange {
    email: Option<String>,
}

/// `POST /api/profile/email`: move the account, then mirror the address
/// into the profile row.
pub async fn change_email(
    State(state): State<AppState>,
    CurrentSession(active): CurrentSession,
    Json(body): Json<EmailChange>,
) -> ProfileReply {
    let email = account::change_email(state.auth.as_ref(), active.access_token(), body.email.as_deref()).await?;
    profile::load_or_create_profile(state.profiles.as_ref(), &state.profile_feed, &active).await?;
    let profile = profile::save_changes(
        state.profiles.as_ref(),
        &state.profile_feed,
        &active,
        &serde_json::json!({ "email": email }),
    )
    .await?;
    let jar = refreshed_cookies(Some(&active), state.config.cookie_secure);
    Ok((jar, Json(profile.into())))
}

// =============================================================================
// LIVE FEED
// =============================================================================

/// `GET /api/profile/live`: WebSocket pushing the session user's profile
/// after every write.
pub async fn live(State(state): State<AppState>, CurrentSession(active): CurrentSession, ws: WebSocketUpgrade) -> Response {
    let user_id = active.user_id();
    ws.on_upgrade(move |socket| run_live(socket, state, user_id))
        .into_response()
}

async fn run_live(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let mut subscription = state.profile_feed.subscribe();
    tracing::info!(%user_id, subscribers = state.profile_feed.subscriber_count(), "profile feed: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                if matches!(msg, Message::Close(_)) {
                    break;
                }
            }
            change = subscription.next_matching(|c| c.user_id == user_id) => {
                let Some(change) = change else { break };
                let text = match serde_json::to_string(&change.profile) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(%user_id, error = %e, "profile feed: serialize failed");
                        continue;
                    }
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    subscription.release();
    tracing::info!(%user_id, "profile feed: client disconnected");
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
