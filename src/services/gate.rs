//! Routing gate — where a user goes after any auth event.
//!
//! ARCHITECTURE
//! ============
//! Every entry point (callback, verify-email, login, destination check)
//! funnels through the same three steps:
//!
//! 1. read the session (`SessionOracle`)
//! 2. only for a confirmed session, check profile completeness
//! 3. `decide_destination`, a pure table lookup
//!
//! `resolve_destination` is the only caller of the completeness check, and
//! it never calls it before confirmation is established.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use super::feed::Delivery;
use super::profile;
use super::session::{ActiveSession, AuthEvent, Session, SessionOracle, SessionSubscription, SessionTokens};
use crate::baas::types::ProfileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Login,
    VerifyEmail,
    CompleteProfile,
    Home,
}

impl Destination {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::VerifyEmail => "/verify",
            Self::CompleteProfile => "/complete-profile",
            Self::Home => "/",
        }
    }
}

/// `/login` carrying an error flag for the login page to display.
#[must_use]
pub fn login_with_error(flag: &str) -> String {
    format!("{}?error={flag}", Destination::Login.path())
}

/// The routing table.
#[must_use]
pub fn decide_destination(session: Option<&Session>, profile_complete: bool) -> Destination {
    match session {
        None => Destination::Login,
        Some(s) if !s.is_email_confirmed() => Destination::VerifyEmail,
        Some(_) if !profile_complete => Destination::CompleteProfile,
        Some(_) => Destination::Home,
    }
}

/// Run the full table for `active`, fetching the profile only once the
/// session is known to be confirmed.
pub async fn resolve_destination(active: Option<&ActiveSession>, profiles: &dyn ProfileStore) -> Destination {
    let session = active.map(|a| &a.session);
    let complete = match active {
        Some(a) if a.session.is_email_confirmed() => {
            profile::is_profile_complete(profiles, a.access_token(), a.user_id()).await
        }
        _ => false,
    };
    let destination = decide_destination(session, complete);
    tracing::debug!(user_id = ?session.map(|s| s.user_id), ?destination, "destination resolved");
    destination
}

/// Wait on `subscription` for the sign-in of `user_id` and resolve it.
///
/// A sign-out for that user routes to `Login`, as do a closed feed and an
/// elapsed `wait`. Events for other users are ignored. If the subscription
/// fell behind, the sign-in may be among the dropped events, so the session
/// behind `tokens` is read again and resolved instead. The subscription is
/// released before returning.
pub async fn await_sign_in_destination(
    mut subscription: SessionSubscription,
    user_id: Uuid,
    tokens: &SessionTokens,
    oracle: &SessionOracle,
    profiles: &dyn ProfileStore,
    wait: Duration,
) -> Destination {
    let relevant = |event: &AuthEvent| match event {
        AuthEvent::TokenRefreshed(_) => false,
        other => other.user_id() == Some(user_id),
    };
    let next_relevant = async {
        loop {
            match subscription.recv().await {
                Delivery::Event(event) if relevant(&event) => return Delivery::Event(event),
                Delivery::Event(_) => {}
                other => return other,
            }
        }
    };

    let outcome = tokio::time::timeout(wait, next_relevant).await;
    subscription.release();

    match outcome {
        Ok(Delivery::Event(AuthEvent::SignedIn(active))) => resolve_destination(Some(&active), profiles).await,
        Ok(Delivery::Event(_)) => Destination::Login,
        Ok(Delivery::Missed(skipped)) => {
            tracing::warn!(%user_id, skipped, "session feed lagged; re-reading session");
            let current = oracle
                .get_session(Some(tokens))
                .await
                .filter(|active| active.user_id() == user_id);
            resolve_destination(current.as_ref(), profiles).await
        }
        Ok(Delivery::Closed) => {
            tracing::warn!(%user_id, "session feed closed before sign-in");
            Destination::Login
        }
        Err(_) => {
            tracing::warn!(%user_id, "timed out waiting for sign-in");
            Destination::Login
        }
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
