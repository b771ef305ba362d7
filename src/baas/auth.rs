//! Auth endpoints (`/auth/v1`).
//!
//! Thin HTTP wrappers. Response shaping that needs a decision lives in pure
//! functions (`parse_sign_up_response`) for testability.

use reqwest::Method;
use serde::Serialize;

use super::types::{AuthProvider, AuthSession, AuthUser, BaasError, OtpType, UserAttributes};
use super::{BaasClient, parse_json, send, send_json};

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    otp_type: OtpType,
    token_hash: &'a str,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    #[serde(rename = "type")]
    otp_type: OtpType,
    email: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

// =============================================================================
// PARSING
// =============================================================================

/// Sign-up answers with a full session when the project auto-confirms
/// addresses, and with the bare user object when confirmation is pending.
pub(crate) fn parse_sign_up_response(text: &str) -> Result<AuthUser, BaasError> {
    let value: serde_json::Value = parse_json(text)?;
    let user = value.get("user").filter(|u| !u.is_null()).unwrap_or(&value);
    serde_json::from_value(user.clone()).map_err(|e| BaasError::Parse(e.to_string()))
}

// =============================================================================
// PROVIDER
// =============================================================================

#[async_trait::async_trait]
impl AuthProvider for BaasClient {
    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<AuthUser, BaasError> {
        let request = self
            .request(Method::POST, &self.auth_url("signup"), None)
            .query(&[("redirect_to", redirect_to)])
            .json(&Credentials { email, password });
        let text = send(request).await?;
        parse_sign_up_response(&text)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BaasError> {
        let request = self
            .request(Method::POST, &self.auth_url("token"), None)
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });
        send_json(request).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BaasError> {
        let request = self.request(Method::POST, &self.auth_url("logout"), Some(access_token));
        send(request).await.map(|_| ())
    }

    async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> Result<AuthSession, BaasError> {
        let request = self
            .request(Method::POST, &self.auth_url("verify"), None)
            .json(&VerifyRequest { otp_type, token_hash });
        send_json(request).await
    }

    async fn resend(&self, otp_type: OtpType, email: &str) -> Result<(), BaasError> {
        let request = self
            .request(Method::POST, &self.auth_url("resend"), None)
            .json(&ResendRequest { otp_type, email });
        send(request).await.map(|_| ())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BaasError> {
        let request = self.request(Method::GET, &self.auth_url("user"), Some(access_token));
        send_json(request).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BaasError> {
        let request = self
            .request(Method::POST, &self.auth_url("token"), None)
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshRequest { refresh_token });
        send_json(request).await
    }

    async fn update_user(&self, access_token: &str, attrs: &UserAttributes) -> Result<AuthUser, BaasError> {
        let request = self
            .request(Method::PUT, &self.auth_url("user"), Some(access_token))
            .json(attrs);
        send_json(request).await
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
