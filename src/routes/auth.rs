//! Auth routes — the four gating entry points plus registration, resend,
//! destination check and logout.
//!
//! Session tokens travel in two HttpOnly cookies. Every handler that reads
//! a session re-validates it with the provider and re-issues the cookies
//! when the tokens were refreshed along the way.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use super::ApiError;
use crate::baas::types::OtpType;
use crate::config::VerifiedNoticePolicy;
use crate::services::account::{self, LoginForm, RegisterForm};
use crate::services::gate::{self, Destination};
use crate::services::session::{ActiveSession, SessionTokens};
use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "sb-access-token";
pub const REFRESH_COOKIE: &str = "sb-refresh-token";

// =============================================================================
// COOKIES
// =============================================================================

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

pub(crate) fn with_session_cookies(jar: CookieJar, tokens: &SessionTokens, secure: bool) -> CookieJar {
    let jar = jar.add(session_cookie(ACCESS_COOKIE, tokens.access_token.clone(), secure));
    match &tokens.refresh_token {
        Some(refresh) => jar.add(session_cookie(REFRESH_COOKIE, refresh.clone(), secure)),
        None => jar,
    }
}

pub(crate) fn without_session_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(expired_cookie(ACCESS_COOKIE, secure))
        .add(expired_cookie(REFRESH_COOKIE, secure))
}

/// Cookies to send back after a session read: the new pair when the tokens
/// were refreshed, nothing otherwise.
pub(crate) fn refreshed_cookies(active: Option<&ActiveSession>, secure: bool) -> CookieJar {
    match active {
        Some(active) if active.refreshed => with_session_cookies(CookieJar::new(), &active.tokens, secure),
        _ => CookieJar::new(),
    }
}

pub(crate) fn tokens_from_jar(jar: &CookieJar) -> Option<SessionTokens> {
    let access_token = jar
        .get(ACCESS_COOKIE)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())?;
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);
    Some(SessionTokens { access_token: access_token.to_owned(), refresh_token })
}

// =============================================================================
// SESSION EXTRACTORS
// =============================================================================

/// The request's session, if the provider still vouches for it.
pub struct MaybeSession(pub Option<ActiveSession>);

impl<S> FromRequestParts<S> for MaybeSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let tokens = tokens_from_jar(&CookieJar::from_headers(&parts.headers));
        Ok(Self(app_state.oracle.get_session(tokens.as_ref()).await))
    }
}

/// A required session. Rejects with 401 JSON.
pub struct CurrentSession(pub ActiveSession);

impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(MaybeSession(active)) = MaybeSession::from_request_parts(parts, state).await;
        active.map(Self).ok_or_else(ApiError::unauthenticated)
    }
}

#[derive(Debug, Serialize)]
pub struct DestinationBody {
    pub destination: Destination,
    pub redirect: &'static str,
}

impl From<Destination> for DestinationBody {
    fn from(destination: Destination) -> Self {
        Self { destination, redirect: destination.path() }
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

#[derive(Deserialize)]
pub struct CallbackQuery {
    access_token: Option<String>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// `GET /auth/callback`: adopt the provider's redirect tokens, wait for the
/// resulting sign-in event and route it.
pub async fn callback(State(state): State<AppState>, jar: CookieJar, Query(query): Query<CallbackQuery>) -> Response {
    if let Some(error) = query.error.as_deref() {
        tracing::warn!(error, description = ?query.error_description, "provider callback reported an error");
        return Redirect::temporary(&gate::login_with_error("callback_failed")).into_response();
    }
    let Some(access_token) = query.access_token.filter(|t| !t.is_empty()) else {
        return Redirect::temporary(Destination::Login.path()).into_response();
    };
    let tokens = SessionTokens { access_token, refresh_token: query.refresh_token.filter(|t| !t.is_empty()) };

    let subscription = state.oracle.on_session_change();
    let active = match state.oracle.establish(tokens).await {
        Ok(active) => active,
        Err(e) => {
            subscription.release();
            tracing::warn!(error = %e, "callback tokens rejected");
            return Redirect::temporary(&gate::login_with_error("callback_failed")).into_response();
        }
    };

    let destination = gate::await_sign_in_destination(
        subscription,
        active.user_id(),
        &active.tokens,
        &state.oracle,
        state.profiles.as_ref(),
        state.config.callback_wait,
    )
    .await;
    tracing::info!(user_id = %active.user_id(), ?destination, "callback routed");

    let jar = if destination == Destination::Login {
        jar
    } else {
        with_session_cookies(jar, &active.tokens, state.config.cookie_secure)
    };
    (jar, Redirect::temporary(destination.path())).into_response()
}

#[derive(Deserialize)]
pub struct VerifyEmailQuery {
    #[serde(alias = "token_hash")]
    token: Option<String>,
    #[serde(rename = "type")]
    otp_type: Option<String>,
}

/// `GET /auth/verify-email`: exchange the emailed token, then re-read the
/// session and route it through the full table.
pub async fn verify_email(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<VerifyEmailQuery>,
) -> Response {
    let token = query.token.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let otp_type = query.otp_type.as_deref().and_then(|t| t.parse::<OtpType>().ok());
    let (Some(token), Some(otp_type)) = (token, otp_type) else {
        return Redirect::temporary(&gate::login_with_error("invalid_verification_link")).into_response();
    };

    let verified = match state.oracle.verify_otp(token, otp_type).await {
        Ok(active) => active,
        Err(e) => {
            tracing::warn!(error = %e, %otp_type, "email verification failed");
            return Redirect::temporary(&gate::login_with_error("verification_failed")).into_response();
        }
    };

    let current = state.oracle.get_session(Some(&verified.tokens)).await;
    let destination = gate::resolve_destination(current.as_ref(), state.profiles.as_ref()).await;
    tracing::info!(user_id = %verified.user_id(), ?destination, "email verification routed");

    let jar = match &current {
        Some(active) => with_session_cookies(jar, &active.tokens, state.config.cookie_secure),
        None => jar,
    };
    (jar, Redirect::temporary(destination.path())).into_response()
}

/// `POST /api/auth/login`: password sign-in. A rejected sign-in answers
/// 401 with the provider's message and no destination.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(form): Json<LoginForm>,
) -> Result<(CookieJar, Json<DestinationBody>), ApiError> {
    let (email, password) = form.credentials().map_err(ApiError::validation)?;

    let active = match state.oracle.sign_in_with_password(email, password).await {
        Ok(active) => active,
        Err(e) if e.is_rejection() => {
            tracing::info!(error = %e, "login rejected");
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, e.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let destination = gate::resolve_destination(Some(&active), state.profiles.as_ref()).await;
    tracing::info!(user_id = %active.user_id(), ?destination, "login routed");
    let jar = with_session_cookies(jar, &active.tokens, state.config.cookie_secure);
    Ok((jar, Json(destination.into())))
}

#[derive(Debug, Serialize)]
pub struct VerifiedNotice {
    pub message: &'static str,
    pub continue_to: &'static str,
    pub signed_out: bool,
}

/// `GET /verified`: landing page of the confirmation email. Under the
/// `sign_out` policy the session is destroyed and cookies cleared.
pub async fn verified(State(state): State<AppState>, jar: CookieJar, MaybeSession(active): MaybeSession) -> Response {
    let secure = state.config.cookie_secure;
    let (jar, signed_out) = match state.config.verified_notice {
        VerifiedNoticePolicy::SignOut => {
            if let Some(active) = &active {
                state.oracle.sign_out(Some(&active.tokens), Some(active.user_id())).await;
            }
            (without_session_cookies(jar, secure), true)
        }
        VerifiedNoticePolicy::KeepSession => {
            let refreshed = refreshed_cookies(active.as_ref(), secure);
            (refreshed, false)
        }
    };
    let notice = VerifiedNotice {
        message: "Your email has been successfully verified. Please continue to complete your profile.",
        continue_to: Destination::CompleteProfile.path(),
        signed_out,
    };
    (jar, Json(notice)).into_response()
}

// =============================================================================
// REGISTRATION AND VERIFICATION PAGE
// =============================================================================

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let user = account::register(state.auth.as_ref(), &form, &state.config.sign_up_redirect()).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Registration successful! Please check your email to verify your account.",
            "email": user.email,
            "redirect": Destination::Login.path(),
        })),
    ))
}

/// `GET /verify`: waiting page. An already-confirmed session is sent to
/// sign in.
pub async fn verify_page(State(state): State<AppState>, MaybeSession(active): MaybeSession) -> Response {
    let jar = refreshed_cookies(active.as_ref(), state.config.cookie_secure);
    match active {
        Some(active) if active.session.is_email_confirmed() => {
            (jar, Redirect::temporary(Destination::Login.path())).into_response()
        }
        active => {
            let email = active.and_then(|a| a.session.email);
            (jar, Json(serde_json::json!({ "email": email }))).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct ResendBody {
    email: Option<String>,
}

/// `POST /api/auth/resend`
pub async fn resend(
    State(state): State<AppState>,
    MaybeSession(active): MaybeSession,
    Json(body): Json<ResendBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session_email = active.as_ref().and_then(|a| a.session.email.as_deref());
    let email = account::resend_confirmation(state.auth.as_ref(), body.email.as_deref(), session_email).await?;
    Ok(Json(serde_json::json!({ "message": "Verification email resent.", "email": email })))
}

// =============================================================================
// DESTINATION AND LOGOUT
// =============================================================================

/// `GET /api/auth/destination`: where the current session belongs.
pub async fn destination(
    State(state): State<AppState>,
    MaybeSession(active): MaybeSession,
) -> (CookieJar, Json<DestinationBody>) {
    let destination = gate::resolve_destination(active.as_ref(), state.profiles.as_ref()).await;
    let jar = refreshed_cookies(active.as_ref(), state.config.cookie_secure);
    (jar, Json(destination.into()))
}

/// `POST /api/auth/logout`: revoke at the provider (best effort), clear
/// cookies.
pub async fn logout(State(state): State<AppState>, jar: CookieJar, MaybeSession(active): MaybeSession) -> impl IntoResponse {
    let tokens = active.as_ref().map(|a| a.tokens.clone()).or_else(|| tokens_from_jar(&jar));
    if let Some(tokens) = &tokens {
        state.oracle.sign_out(Some(tokens), active.as_ref().map(ActiveSession::user_id)).await;
    }
    (without_session_cookies(jar, state.config.cookie_secure), StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
