//! Table endpoints (`/rest/v1`).
//!
//! Filters use the backend's `column=op.value` query syntax. Writes ask for
//! `return=representation` so callers get the stored row back.

use reqwest::Method;
use uuid::Uuid;

use super::types::{BaasError, Event, EventStore, NewEvent, NewEventItem, Profile, ProfileStore, Ticket};
use super::{BaasClient, send, send_json};

const PROFILES: &str = "profiles";
const EVENTS: &str = "events";
const EVENT_ITEMS: &str = "event_items";
const TICKETS: &str = "tickets";

const RETURN_ROW: &str = "return=representation";
const UPSERT_RETURN_ROW: &str = "resolution=merge-duplicates,return=representation";

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Single-row writes come back as a one-element array.
fn first_row<T>(rows: Vec<T>, table: &str) -> Result<T, BaasError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BaasError::Parse(format!("{table}: write returned no row")))
}

// =============================================================================
// PROFILES
// =============================================================================

#[async_trait::async_trait]
impl ProfileStore for BaasClient {
    async fn fetch_profile(&self, access_token: &str, user_id: Uuid) -> Result<Option<Profile>, BaasError> {
        let request = self
            .request(Method::GET, &self.rest_url(PROFILES), Some(access_token))
            .query(&[("select", "*".to_owned()), ("id", eq(user_id))]);
        let rows: Vec<Profile> = send_json(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, access_token: &str, profile: &Profile) -> Result<Profile, BaasError> {
        let request = self
            .request(Method::POST, &self.rest_url(PROFILES), Some(access_token))
            .header("Prefer", RETURN_ROW)
            .json(profile);
        first_row(send_json(request).await?, PROFILES)
    }

    async fn upsert_profile(&self, access_token: &str, profile: &Profile) -> Result<Profile, BaasError> {
        let request = self
            .request(Method::POST, &self.rest_url(PROFILES), Some(access_token))
            .query(&[("on_conflict", "id")])
            .header("Prefer", UPSERT_RETURN_ROW)
            .json(profile);
        first_row(send_json(request).await?, PROFILES)
    }

    async fn update_profile(
        &self,
        access_token: &str,
        user_id: Uuid,
        changes: &serde_json::Value,
    ) -> Result<Option<Profile>, BaasError> {
        let request = self
            .request(Method::PATCH, &self.rest_url(PROFILES), Some(access_token))
            .query(&[("id", eq(user_id))])
            .header("Prefer", RETURN_ROW)
            .json(changes);
        let rows: Vec<Profile> = send_json(request).await?;
        Ok(rows.into_iter().next())
    }
}

// =============================================================================
// EVENTS + TICKETS
// =============================================================================

#[async_trait::async_trait]
impl EventStore for BaasClient {
    async fn list_events(&self, access_token: Option<&str>, owner: Option<Uuid>) -> Result<Vec<Event>, BaasError> {
        let mut query = vec![("select", "*".to_owned()), ("order", "date.desc".to_owned())];
        if let Some(owner) = owner {
            query.push(("user_id", eq(owner)));
        }
        let request = self
            .request(Method::GET, &self.rest_url(EVENTS), access_token)
            .query(&query);
        send_json(request).await
    }

    async fn create_event(&self, access_token: &str, event: &NewEvent) -> Result<Event, BaasError> {
        let request = self
            .request(Method::POST, &self.rest_url(EVENTS), Some(access_token))
            .header("Prefer", RETURN_ROW)
            .json(event);
        first_row(send_json(request).await?, EVENTS)
    }

    async fn insert_event_items(&self, access_token: &str, items: &[NewEventItem]) -> Result<(), BaasError> {
        let request = self
            .request(Method::POST, &self.rest_url(EVENT_ITEMS), Some(access_token))
            .header("Prefer", "return=minimal")
            .json(items);
        send(request).await.map(|_| ())
    }

    async fn list_tickets(&self, access_token: &str, user_id: Uuid) -> Result<Vec<Ticket>, BaasError> {
        let request = self
            .request(Method::GET, &self.rest_url(TICKETS), Some(access_token))
            .query(&[("select", "*,events(*)".to_owned()), ("user_id", eq(user_id))]);
        send_json(request).await
    }
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
