//! BaaS — HTTP adapter for the hosted backend.
//!
//! DESIGN
//! ======
//! One `BaasClient` is built at startup and shared (behind `Arc`) by every
//! component that talks to the backend. It owns the pooled `reqwest::Client`
//! and implements the provider traits in `types`:
//! - `auth`: auth endpoints (`/auth/v1/*`)
//! - `rest`: table endpoints (`/rest/v1/*`)
//! - `storage`: object endpoints (`/storage/v1/*`)
//!
//! Every request carries the project `apikey`. Requests made on behalf of a
//! user carry that user's access token as the bearer so row-level security
//! is enforced by the backend, not by this service.

pub mod auth;
pub mod rest;
pub mod storage;
pub mod types;

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::HttpTimeouts;
pub use types::{AuthProvider, BaasError, EventStore, FileStore, ProfileStore};

// =============================================================================
// CLIENT
// =============================================================================

pub struct BaasClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl BaasClient {
    /// Build the shared client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, anon_key: String, timeouts: HttpTimeouts) -> Result<Self, BaasError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| BaasError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned(), anon_key })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{path}", self.base_url)
    }

    /// Request with project headers. Without a user token the anon key is
    /// the bearer, which is what the backend expects for public calls.
    fn request(&self, method: Method, url: &str, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }
}

// =============================================================================
// RESPONSE HANDLING
// =============================================================================

/// Send and return the body of a 2xx response; anything else becomes
/// `BaasError::Api` carrying the backend's message.
async fn send(request: RequestBuilder) -> Result<String, BaasError> {
    let response = request
        .send()
        .await
        .map_err(|e| BaasError::Request(e.to_string()))?;

    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| BaasError::Request(e.to_string()))?;

    if !(200..300).contains(&status) {
        return Err(BaasError::Api { status, message: types::extract_error_message(status, &text) });
    }
    Ok(text)
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BaasError> {
    let text = send(request).await?;
    parse_json(&text)
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, BaasError> {
    serde_json::from_str(text).map_err(|e| BaasError::Parse(e.to_string()))
}
