//! Domain services used by the HTTP and websocket routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the auth gating flow, form validation and backend
//! calls so route handlers can stay focused on protocol translation and
//! cookie plumbing.
//!
//! - `session`: live session reads, sign-in/out, change events
//! - `gate`: destination table shared by every auth entry point
//! - `profile`: completeness, completion form, profile edits
//! - `account`, `avatar`, `events`: the remaining forms

pub mod account;
pub mod avatar;
pub mod events;
pub mod feed;
pub mod gate;
pub mod profile;
pub mod session;
pub mod validate;
