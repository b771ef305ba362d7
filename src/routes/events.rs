//! Event listing, creation and the ticket wallet.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::ApiError;
use super::auth::{CurrentSession, MaybeSession, refreshed_cookies};
use crate::baas::types::{Event, Ticket};
use crate::services::events::{self, EventForm, TicketFilter};
use crate::services::profile::today_utc;
use crate::state::AppState;

/// `GET /api/events`: public listing, newest first.
pub async fn list_events(
    State(state): State<AppState>,
    MaybeSession(active): MaybeSession,
) -> Result<(CookieJar, Json<Vec<Event>>), ApiError> {
    let token = active.as_ref().map(|a| a.access_token());
    let listed = state.events.list_events(token, None).await?;
    Ok((refreshed_cookies(active.as_ref(), state.config.cookie_secure), Json(listed)))
}

/// `POST /api/events`
pub async fn create_event(
    State(state): State<AppState>,
    CurrentSession(active): CurrentSession,
    Json(form): Json<EventForm>,
) -> Result<(StatusCode, CookieJar, Json<Event>), ApiError> {
    let event = events::create_event(state.events.as_ref(), &active, &form).await?;
    let jar = refreshed_cookies(Some(&active), state.config.cookie_secure);
    Ok((StatusCode::CREATED, jar, Json(event)))
}

/// `GET /api/my-events`
pub async fn my_events(
    State(state): State<AppState>,
    CurrentSession(active): CurrentSession,
) -> Result<(CookieJar, Json<Vec<Event>>), ApiError> {
    let owned = state
        .events
        .list_events(Some(active.access_token()), Some(active.user_id()))
        .await?;
    Ok((refreshed_cookies(Some(&active), state.config.cookie_secure), Json(owned)))
}

#[derive(Deserialize)]
pub struct TicketsQuery {
    #[serde(default)]
    filter: TicketFilter,
}

/// `GET /api/my-tickets?filter=upcoming|past|all`
pub async fn my_tickets(
    State(state): State<AppState>,
    CurrentSession(active): CurrentSession,
    Query(query): Query<TicketsQuery>,
) -> Result<(CookieJar, Json<Vec<Ticket>>), ApiError> {
    let tickets = events::my_tickets(state.events.as_ref(), &active, query.filter, today_utc()).await?;
    Ok((refreshed_cookies(Some(&active), state.config.cookie_secure), Json(tickets)))
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
