//! Session oracle — the application's only view of auth state.
//!
//! ARCHITECTURE
//! ============
//! The auth provider owns sessions. This module never caches them: every
//! `get_session` is a live provider read keyed by the caller's tokens. Any
//! failure to read is reported as "no session" so callers fail closed.
//!
//! Sign-in, sign-out and token refresh performed through the oracle are
//! published as `AuthEvent`s. `on_session_change` hands out an owned
//! subscription; releasing it stops delivery.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::feed::{Feed, Subscription};
use crate::baas::types::{AuthProvider, AuthSession, AuthUser, BaasError, OtpType};

// =============================================================================
// TYPES
// =============================================================================

/// Identity and confirmation state of a user, as last reported by the
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub email_confirmed_at: Option<String>,
}

impl Session {
    #[must_use]
    pub fn is_email_confirmed(&self) -> bool {
        self.email_confirmed_at
            .as_deref()
            .is_some_and(|at| !at.trim().is_empty())
    }
}

impl From<AuthUser> for Session {
    fn from(user: AuthUser) -> Self {
        Self { user_id: user.id, email: user.email, email_confirmed_at: user.email_confirmed_at }
    }
}

/// Bearer credentials carried by the client between requests.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A session the provider vouched for, with the tokens that proved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session: Session,
    pub tokens: SessionTokens,
    /// True when the tokens were re-issued during this lookup and the
    /// client must be handed the new pair.
    pub refreshed: bool,
}

impl ActiveSession {
    fn from_grant(grant: AuthSession, refreshed: bool) -> Self {
        Self {
            session: grant.user.into(),
            tokens: SessionTokens { access_token: grant.access_token, refresh_token: Some(grant.refresh_token) },
            refreshed,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.session.user_id
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }
}

#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(ActiveSession),
    SignedOut { user_id: Option<Uuid> },
    TokenRefreshed(ActiveSession),
}

impl AuthEvent {
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::SignedIn(active) | Self::TokenRefreshed(active) => Some(active.user_id()),
            Self::SignedOut { user_id } => *user_id,
        }
    }
}

pub type SessionSubscription = Subscription<AuthEvent>;

// =============================================================================
// ORACLE
// =============================================================================

#[derive(Clone)]
pub struct SessionOracle {
    auth: Arc<dyn AuthProvider>,
    events: Feed<AuthEvent>,
}

impl SessionOracle {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self { auth, events: Feed::default() }
    }

    /// Subscribe to sign-in, sign-out and refresh events.
    #[must_use]
    pub fn on_session_change(&self) -> SessionSubscription {
        self.events.subscribe()
    }

    /// Current session for `tokens`, or `None`.
    ///
    /// A rejected access token is refreshed once when a refresh token is
    /// available. Provider outages yield `None`.
    pub async fn get_session(&self, tokens: Option<&SessionTokens>) -> Option<ActiveSession> {
        let tokens = tokens?;
        match self.auth.get_user(&tokens.access_token).await {
            Ok(user) => Some(ActiveSession { session: user.into(), tokens: tokens.clone(), refreshed: false }),
            Err(e) if e.is_unauthorized() => self.refresh(tokens).await,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed; treating as signed out");
                None
            }
        }
    }

    async fn refresh(&self, tokens: &SessionTokens) -> Option<ActiveSession> {
        let refresh_token = tokens.refresh_token.as_deref()?;
        match self.auth.refresh_session(refresh_token).await {
            Ok(grant) => {
                let active = ActiveSession::from_grant(grant, true);
                tracing::debug!(user_id = %active.user_id(), "session refreshed");
                self.events.publish(AuthEvent::TokenRefreshed(active.clone()));
                Some(active)
            }
            Err(e) => {
                tracing::info!(error = %e, "session refresh rejected");
                None
            }
        }
    }

    /// Password sign-in.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged so its message can be shown.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ActiveSession, BaasError> {
        let grant = self.auth.sign_in_with_password(email, password).await?;
        Ok(self.signed_in(ActiveSession::from_grant(grant, false)))
    }

    /// Exchange an emailed token hash for a session.
    ///
    /// # Errors
    ///
    /// Returns the provider error when the token is invalid or expired.
    pub async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> Result<ActiveSession, BaasError> {
        let grant = self.auth.verify_otp(token_hash, otp_type).await?;
        Ok(self.signed_in(ActiveSession::from_grant(grant, false)))
    }

    /// Adopt tokens handed to us by a provider redirect.
    ///
    /// # Errors
    ///
    /// Returns the provider error when the tokens do not resolve to a user.
    pub async fn establish(&self, tokens: SessionTokens) -> Result<ActiveSession, BaasError> {
        let user = self.auth.get_user(&tokens.access_token).await?;
        Ok(self.signed_in(ActiveSession { session: user.into(), tokens, refreshed: true }))
    }

    fn signed_in(&self, active: ActiveSession) -> ActiveSession {
        tracing::info!(user_id = %active.user_id(), confirmed = active.session.is_email_confirmed(), "signed in");
        self.events.publish(AuthEvent::SignedIn(active.clone()));
        active
    }

    /// Revoke the session at the provider (best effort) and announce it.
    /// Local state is always considered signed out afterwards.
    pub async fn sign_out(&self, tokens: Option<&SessionTokens>, user_id: Option<Uuid>) {
        if let Some(tokens) = tokens {
            if let Err(e) = self.auth.sign_out(&tokens.access_token).await {
                tracing::warn!(error = %e, "provider sign-out failed");
            }
        }
        self.events.publish(AuthEvent::SignedOut { user_id });
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
