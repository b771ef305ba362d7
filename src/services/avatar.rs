//! Profile picture upload.
//!
//! Each user owns the folder `{user_id}/` in the avatar bucket and keeps at
//! most one object there. A new upload clears the folder, stores
//! `avatar-{unix_ms}.{ext}` and points `profiles.avatar_url` at its public
//! URL with a `?v=` cache buster.

use time::OffsetDateTime;

use super::feed::Feed;
use super::profile::{self, ProfileChange, ProfileError};
use super::session::ActiveSession;
use crate::baas::types::{FileStore, Profile, ProfileStore};

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_EXTENSION: &str = "png";

pub struct AvatarUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl AvatarUpload {
    /// Lowercased extension of the uploaded file name, `png` when absent.
    #[must_use]
    pub fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.trim().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_owned())
    }

    fn content_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| format!("image/{}", self.extension()))
    }

    /// # Errors
    ///
    /// `Upload` for empty, oversized or non-image files.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.bytes.is_empty() {
            return Err(ProfileError::Upload("File is empty".into()));
        }
        if self.bytes.len() > MAX_AVATAR_BYTES {
            return Err(ProfileError::Upload("File must be 5 MB or smaller".into()));
        }
        if !self.content_type().starts_with("image/") {
            return Err(ProfileError::Upload("File must be an image".into()));
        }
        Ok(())
    }
}

#[must_use]
pub fn unix_millis() -> i64 {
    i64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

/// Replace the session user's avatar and return the updated profile.
///
/// # Errors
///
/// `Upload` for a rejected file, `Provider` for storage or profile failures.
pub async fn replace_avatar(
    files: &dyn FileStore,
    profiles: &dyn ProfileStore,
    feed: &Feed<ProfileChange>,
    bucket: &str,
    active: &ActiveSession,
    upload: AvatarUpload,
    stamp_ms: i64,
) -> Result<Profile, ProfileError> {
    upload.validate()?;
    let token = active.access_token();
    let folder = active.user_id().to_string();

    let stale: Vec<String> = files
        .list(token, bucket, &folder)
        .await?
        .into_iter()
        .map(|name| format!("{folder}/{name}"))
        .collect();
    if !stale.is_empty() {
        files.remove(token, bucket, &stale).await?;
        tracing::debug!(user_id = %active.user_id(), removed = stale.len(), "old avatars removed");
    }

    let path = format!("{folder}/avatar-{stamp_ms}.{}", upload.extension());
    let content_type = upload.content_type();
    let public_url = files.upload(token, bucket, &path, &content_type, upload.bytes).await?;
    let avatar_url = format!("{public_url}?v={stamp_ms}");

    profile::load_or_create_profile(profiles, feed, active).await?;
    let changes = serde_json::json!({ "avatar_url": avatar_url });
    let saved = profile::save_changes(profiles, feed, active, &changes).await?;
    tracing::info!(user_id = %active.user_id(), "avatar replaced");
    Ok(saved)
}

#[cfg(test)]
#[path = "avatar_test.rs"]
mod tests;
