//! Events and tickets.

use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use super::session::ActiveSession;
use super::validate::{FieldErrors, non_empty, require};
use crate::baas::types::{BaasError, Event, EventStore, NewEvent, NewEventItem, Ticket};

pub const CATEGORIES: [&str; 7] = ["Birthday Party", "Conference", "Wedding", "Meetup", "Concert", "Festival", "Other"];

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error(transparent)]
    Provider(#[from] BaasError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemForm {
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    #[serde(default = "default_quantity")]
    pub item_quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventForm {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemForm>,
}

impl EventForm {
    /// Insert payload for `owner`, or every field-level problem. Item errors
    /// are keyed `items` and name the 1-based item.
    ///
    /// # Errors
    ///
    /// Returns the collected field errors.
    pub fn to_new_event(&self, owner: Uuid) -> Result<NewEvent, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = require(&mut errors, "title", self.title.as_deref(), "Title is required");
        // An unknown category counts as no selection.
        let category = match require(&mut errors, "category", self.category.as_deref(), "Category is required") {
            Some(c) if !CATEGORIES.contains(&c) => {
                errors.insert("category", "Category is required".into());
                None
            }
            other => other,
        };

        for (index, item) in self.items.iter().enumerate() {
            let position = index + 1;
            if non_empty(item.item_name.as_deref()).is_none() {
                errors.insert("items", format!("Item {position}: name is required"));
                break;
            }
            if item.item_quantity < 1 {
                errors.insert("items", format!("Item {position}: quantity must be at least 1"));
                break;
            }
        }

        match (title, category) {
            (Some(title), Some(category)) if errors.is_empty() => Ok(NewEvent {
                user_id: owner,
                title: title.to_owned(),
                category: category.to_owned(),
                description: non_empty(self.description.as_deref()).map(str::to_owned),
                location: non_empty(self.location.as_deref()).map(str::to_owned),
                date: non_empty(self.date.as_deref()).map(str::to_owned),
            }),
            _ => Err(errors),
        }
    }

    fn new_items(&self, event_id: Uuid) -> Vec<NewEventItem> {
        self.items
            .iter()
            .map(|item| NewEventItem {
                event_id,
                item_name: non_empty(item.item_name.as_deref()).unwrap_or_default().to_owned(),
                item_description: non_empty(item.item_description.as_deref()).map(str::to_owned),
                item_quantity: item.item_quantity,
            })
            .collect()
    }
}

/// Insert the event owned by the session user, then its items.
///
/// # Errors
///
/// `Validation` before any backend call, otherwise the backend error.
pub async fn create_event(store: &dyn EventStore, active: &ActiveSession, form: &EventForm) -> Result<Event, EventError> {
    let new_event = form.to_new_event(active.user_id()).map_err(EventError::Validation)?;
    let event = store.create_event(active.access_token(), &new_event).await?;
    let items = form.new_items(event.id);
    if !items.is_empty() {
        store.insert_event_items(active.access_token(), &items).await?;
    }
    tracing::info!(user_id = %active.user_id(), event_id = %event.id, items = items.len(), "event created");
    Ok(event)
}

// =============================================================================
// TICKETS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketFilter {
    #[default]
    Upcoming,
    Past,
    All,
}

/// Keep tickets whose event falls in `filter` relative to `today`; tickets
/// without an event are dropped.
#[must_use]
pub fn filter_tickets(tickets: Vec<Ticket>, filter: TicketFilter, today: Date) -> Vec<Ticket> {
    let today = today.to_string();
    tickets
        .into_iter()
        .filter(|ticket| {
            let Some(event) = &ticket.event else {
                return false;
            };
            // Whole-value string comparison: a timestamp on `today` sorts
            // after the bare date and counts as upcoming.
            let date = event.date.as_deref();
            match filter {
                TicketFilter::All => true,
                TicketFilter::Upcoming => date.is_some_and(|d| d >= today.as_str()),
                TicketFilter::Past => date.is_some_and(|d| d < today.as_str()),
            }
        })
        .collect()
}

/// # Errors
///
/// Returns the backend error.
pub async fn my_tickets(
    store: &dyn EventStore,
    active: &ActiveSession,
    filter: TicketFilter,
    today: Date,
) -> Result<Vec<Ticket>, BaasError> {
    let tickets = store.list_tickets(active.access_token(), active.user_id()).await?;
    Ok(filter_tickets(tickets, filter, today))
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
