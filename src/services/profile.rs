//! Profile service — completeness, completion form, profile edits.
//!
//! DESIGN
//! ======
//! The `profiles` row is owned by the backend; this module validates what
//! goes in and derives `age` from `birthday` on every save. Completeness is
//! one predicate (`is_complete`) shared by every caller.
//!
//! Every successful write is published on the profile feed as a
//! `ProfileChange` so live subscribers see it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::feed::{Feed, Subscription};
use super::session::ActiveSession;
use super::validate::{FieldErrors, non_empty, require};
use crate::baas::types::{BaasError, Profile, ProfileStore};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error(transparent)]
    Provider(#[from] BaasError),
    #[error("profile not found")]
    NotFound,
    #[error("upload rejected: {0}")]
    Upload(String),
}

/// A saved profile, as published to live subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileChange {
    pub user_id: Uuid,
    pub profile: Profile,
}

pub type ProfileSubscription = Subscription<ProfileChange>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Attendee,
    Organizer,
    Volunteer,
    Sponsor,
    Speaker,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attendee => "attendee",
            Self::Organizer => "organizer",
            Self::Volunteer => "volunteer",
            Self::Sponsor => "sponsor",
            Self::Speaker => "speaker",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "attendee" => Ok(Self::Attendee),
            "organizer" => Ok(Self::Organizer),
            "volunteer" => Ok(Self::Volunteer),
            "sponsor" => Ok(Self::Sponsor),
            "speaker" => Ok(Self::Speaker),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// =============================================================================
// COMPLETENESS
// =============================================================================

pub const REQUIRED_FIELDS: [&str; 7] = ["username", "fname", "lname", "address", "contact_no", "birthday", "gender"];

fn required_values(profile: &Profile) -> [Option<&str>; 7] {
    [
        profile.username.as_deref(),
        profile.fname.as_deref(),
        profile.lname.as_deref(),
        profile.address.as_deref(),
        profile.contact_no.as_deref(),
        profile.birthday.as_deref(),
        profile.gender.as_deref(),
    ]
}

/// Required fields that are absent or blank, in declaration order.
#[must_use]
pub fn missing_required_fields(profile: &Profile) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .zip(required_values(profile))
        .filter(|(_, value)| non_empty(*value).is_none())
        .map(|(name, _)| *name)
        .collect()
}

#[must_use]
pub fn is_complete(profile: &Profile) -> bool {
    missing_required_fields(profile).is_empty()
}

/// Fetch the profile and apply [`is_complete`]. A failed fetch or a
/// missing row counts as incomplete.
pub async fn is_profile_complete(store: &dyn ProfileStore, access_token: &str, user_id: Uuid) -> bool {
    match store.fetch_profile(access_token, user_id).await {
        Ok(Some(profile)) => is_complete(&profile),
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(%user_id, error = %e, "profile fetch failed; treating as incomplete");
            false
        }
    }
}

// =============================================================================
// DERIVED FIELDS
// =============================================================================

#[must_use]
pub fn parse_birthday(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Whole years from `birthday` to `today`. Never negative.
#[must_use]
pub fn compute_age(birthday: Date, today: Date) -> i32 {
    let mut years = today.year() - birthday.year();
    if (u8::from(today.month()), today.day()) < (u8::from(birthday.month()), birthday.day()) {
        years -= 1;
    }
    years.max(0)
}

#[must_use]
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Trim, drop blanks and duplicates (first occurrence wins). Empty -> `None`.
#[must_use]
pub fn normalize_interests(raw: &[String]) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for interest in raw.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
        if !out.iter().any(|seen| seen == interest) {
            out.push(interest.to_owned());
        }
    }
    if out.is_empty() { None } else { Some(out) }
}

/// `none` or blank means no role.
fn parse_role(errors: &mut FieldErrors, raw: Option<&str>) -> Option<Role> {
    let raw = non_empty(raw).filter(|r| !r.eq_ignore_ascii_case("none"))?;
    match raw.parse() {
        Ok(role) => Some(role),
        Err(_) => {
            errors.insert("role", "Role is invalid".into());
            None
        }
    }
}

fn check_birthday(errors: &mut FieldErrors, raw: &str) -> Option<Date> {
    let parsed = parse_birthday(raw);
    if parsed.is_none() {
        errors.insert("birthday", "Birthday must be a valid date (YYYY-MM-DD)".into());
    }
    parsed
}

fn now_rfc3339() -> Option<String> {
    OffsetDateTime::now_utc().format(&Rfc3339).ok()
}

// =============================================================================
// COMPLETION FORM
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteProfileForm {
    pub username: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub mname: Option<String>,
    pub suffix: Option<String>,
    pub address: Option<String>,
    pub contact_no: Option<String>,
    pub birthday: Option<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub role: Option<String>,
}

impl CompleteProfileForm {
    /// Field-level problems, without touching any stored row.
    ///
    /// # Errors
    ///
    /// Returns every field-level problem found.
    pub fn validate(&self, today: Date) -> Result<(), FieldErrors> {
        self.apply(Profile::default(), today).map(|_| ())
    }

    /// Validate and overlay the form onto `base`, recomputing `age`.
    ///
    /// # Errors
    ///
    /// Returns every field-level problem found.
    pub fn apply(&self, mut base: Profile, today: Date) -> Result<Profile, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = require(&mut errors, "username", self.username.as_deref(), "Username is required");
        let fname = require(&mut errors, "fname", self.fname.as_deref(), "First Name is required");
        let lname = require(&mut errors, "lname", self.lname.as_deref(), "Last Name is required");
        let address = require(&mut errors, "address", self.address.as_deref(), "Address is required");
        let contact_no = require(&mut errors, "contact_no", self.contact_no.as_deref(), "Contact Number is required");
        let birthday = require(&mut errors, "birthday", self.birthday.as_deref(), "Birthday is required")
            .and_then(|raw| check_birthday(&mut errors, raw));
        let gender = require(&mut errors, "gender", self.gender.as_deref(), "Gender is required");
        let role = parse_role(&mut errors, self.role.as_deref());

        if !errors.is_empty() {
            return Err(errors);
        }

        base.username = username.map(str::to_owned);
        base.fname = fname.map(str::to_owned);
        base.lname = lname.map(str::to_owned);
        base.mname = non_empty(self.mname.as_deref()).map(str::to_owned);
        base.suffix = non_empty(self.suffix.as_deref()).map(str::to_owned);
        base.address = address.map(str::to_owned);
        base.contact_no = contact_no.map(str::to_owned);
        base.birthday = birthday.map(|d| d.to_string());
        base.age = birthday.map(|d| compute_age(d, today));
        base.gender = gender.map(str::to_owned);
        base.interests = normalize_interests(&self.interests);
        base.role = role.map(|r| r.as_str().to_owned());
        Ok(base)
    }
}

/// Validate and upsert the completion form for the session user.
///
/// # Errors
///
/// `Validation` before any backend call; `Provider` when the backend fails.
pub async fn complete_profile(
    store: &dyn ProfileStore,
    feed: &Feed<ProfileChange>,
    active: &ActiveSession,
    form: &CompleteProfileForm,
    today: Date,
) -> Result<Profile, ProfileError> {
    let user_id = active.user_id();
    form.validate(today).map_err(ProfileError::Validation)?;

    let base = store
        .fetch_profile(active.access_token(), user_id)
        .await?
        .unwrap_or_else(|| Profile { id: user_id, ..Profile::default() });
    let mut profile = form.apply(base, today).map_err(ProfileError::Validation)?;
    if profile.email.is_none() {
        profile.email.clone_from(&active.session.email);
    }
    profile.updated_at = now_rfc3339();

    let saved = store.upsert_profile(active.access_token(), &profile).await?;
    tracing::info!(%user_id, "profile completed");
    publish(feed, &saved);
    Ok(saved)
}

// =============================================================================
// PROFILE PAGE
// =============================================================================

/// The session user's profile, inserting `{ id, email }` when absent.
///
/// # Errors
///
/// Returns `Provider` when the backend fails.
pub async fn load_or_create_profile(
    store: &dyn ProfileStore,
    feed: &Feed<ProfileChange>,
    active: &ActiveSession,
) -> Result<Profile, ProfileError> {
    let user_id = active.user_id();
    if let Some(profile) = store.fetch_profile(active.access_token(), user_id).await? {
        return Ok(profile);
    }
    let seed = Profile { id: user_id, email: active.session.email.clone(), ..Profile::default() };
    let created = store.insert_profile(active.access_token(), &seed).await?;
    tracing::info!(%user_id, "profile row created");
    publish(feed, &created);
    Ok(created)
}

/// Partial edit from the profile page. Absent fields are left alone, blank
/// strings clear the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileEdit {
    pub username: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub mname: Option<String>,
    pub suffix: Option<String>,
    pub address: Option<String>,
    pub contact_no: Option<String>,
    pub birthday: Option<String>,
    pub gender: Option<String>,
    pub interests: Option<Vec<String>>,
    pub role: Option<String>,
}

impl ProfileEdit {
    /// # Errors
    ///
    /// Returns field-level problems for a malformed birthday or role.
    pub fn validate(&self, today: Date) -> Result<(), FieldErrors> {
        self.to_changes(&Profile::default(), today).map(|_| ())
    }

    /// JSON patch for the backend, with `age` derived from the birthday the
    /// row will have after the edit.
    ///
    /// # Errors
    ///
    /// Returns field-level problems for a malformed birthday or role.
    pub fn to_changes(&self, existing: &Profile, today: Date) -> Result<serde_json::Value, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut changes = serde_json::Map::new();

        let text_fields = [
            ("username", &self.username),
            ("fname", &self.fname),
            ("lname", &self.lname),
            ("mname", &self.mname),
            ("suffix", &self.suffix),
            ("address", &self.address),
            ("contact_no", &self.contact_no),
            ("gender", &self.gender),
        ];
        for (name, value) in text_fields {
            if let Some(raw) = value {
                changes.insert(name.to_owned(), text_or_null(raw));
            }
        }

        let birthday = match self.birthday.as_deref() {
            Some(raw) => {
                let parsed = non_empty(Some(raw)).and_then(|raw| check_birthday(&mut errors, raw));
                changes.insert("birthday".into(), parsed.map_or(serde_json::Value::Null, |d| d.to_string().into()));
                parsed
            }
            None => existing.birthday.as_deref().and_then(parse_birthday),
        };
        changes.insert(
            "age".into(),
            birthday.map_or(serde_json::Value::Null, |d| compute_age(d, today).into()),
        );

        if let Some(interests) = &self.interests {
            changes.insert("interests".into(), serde_json::json!(normalize_interests(interests)));
        }
        if self.role.is_some() {
            let role = parse_role(&mut errors, self.role.as_deref());
            changes.insert("role".into(), role.map_or(serde_json::Value::Null, |r| r.as_str().into()));
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        if let Some(now) = now_rfc3339() {
            changes.insert("updated_at".into(), now.into());
        }
        Ok(serde_json::Value::Object(changes))
    }
}

fn text_or_null(raw: &str) -> serde_json::Value {
    non_empty(Some(raw)).map_or(serde_json::Value::Null, |v| v.into())
}

/// Apply a profile-page edit.
///
/// # Errors
///
/// `Validation`, `Provider`, or `NotFound` if the row vanished mid-edit.
pub async fn update_profile(
    store: &dyn ProfileStore,
    feed: &Feed<ProfileChange>,
    active: &ActiveSession,
    edit: &ProfileEdit,
    today: Date,
) -> Result<Profile, ProfileError> {
    edit.validate(today).map_err(ProfileError::Validation)?;
    let existing = load_or_create_profile(store, feed, active).await?;
    let changes = edit.to_changes(&existing, today).map_err(ProfileError::Validation)?;
    save_changes(store, feed, active, &changes).await
}

/// Write `changes` to the session user's row and publish the result.
///
/// # Errors
///
/// `Provider` on backend failure, `NotFound` when no row matched.
pub async fn save_changes(
    store: &dyn ProfileStore,
    feed: &Feed<ProfileChange>,
    active: &ActiveSession,
    changes: &serde_json::Value,
) -> Result<Profile, ProfileError> {
    let user_id = active.user_id();
    let saved = store
        .update_profile(active.access_token(), user_id, changes)
        .await?
        .ok_or(ProfileError::NotFound)?;
    tracing::debug!(%user_id, "profile updated");
    publish(feed, &saved);
    Ok(saved)
}

fn publish(feed: &Feed<ProfileChange>, profile: &Profile) {
    feed.publish(ProfileChange { user_id: profile.id, profile: profile.clone() });
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
