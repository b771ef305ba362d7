//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds one handle per backend contract (all backed by the same
//! `BaasClient` in production), the session oracle, the profile change
//! feed and the typed config.

use std::sync::Arc;

use crate::baas::{AuthProvider, BaasClient, EventStore, FileStore, ProfileStore};
use crate::config::AppConfig;
use crate::services::feed::Feed;
use crate::services::profile::ProfileChange;
use crate::services::session::SessionOracle;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub files: Arc<dyn FileStore>,
    pub events: Arc<dyn EventStore>,
    pub oracle: SessionOracle,
    /// Saved-profile notifications for live subscribers.
    pub profile_feed: Feed<ProfileChange>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire every contract to the single shared backend client.
    #[must_use]
    pub fn new(baas: Arc<BaasClient>, config: AppConfig) -> Self {
        Self::with_providers(baas.clone(), baas.clone(), baas.clone(), baas, config)
    }

    #[must_use]
    pub fn with_providers(
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileStore>,
        files: Arc<dyn FileStore>,
        events: Arc<dyn EventStore>,
        config: AppConfig,
    ) -> Self {
        Self {
            oracle: SessionOracle::new(auth.clone()),
            auth,
            profiles,
            files,
            events,
            profile_feed: Feed::default(),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
