//! Service configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BAAS_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BAAS_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CALLBACK_WAIT_SECS: u64 = 10;
pub const DEFAULT_AVATAR_BUCKET: &str = "avatars";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("config parse failed: {0}")]
    Parse(String),
}

/// What the "email verified" notice does with the session it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifiedNoticePolicy {
    /// Destroy the session; the user signs in again before completing
    /// their profile.
    SignOut,
    /// Leave the session alone and send the user straight on.
    KeepSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub baas_url: String,
    pub anon_key: String,
    pub port: u16,
    /// Public origin of this service, without trailing slash.
    pub site_url: String,
    pub cookie_secure: bool,
    pub verified_notice: VerifiedNoticePolicy,
    pub timeouts: HttpTimeouts,
    pub avatar_bucket: String,
    /// How long the callback handler waits for its sign-in event.
    pub callback_wait: Duration,
}

impl AppConfig {
    /// Build typed config from the process environment.
    ///
    /// Required:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SITE_URL`: default `http://localhost:{PORT}`
    /// - `COOKIE_SECURE`: inferred from `SITE_URL` when unset
    /// - `VERIFIED_NOTICE_POLICY`: `sign_out` (default) or `keep_session`
    /// - `BAAS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `BAAS_CONNECT_TIMEOUT_SECS`: default 10
    /// - `AVATAR_BUCKET`: default `avatars`
    /// - `CALLBACK_WAIT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or an enum value
    /// is not recognized.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let baas_url = lookup("SUPABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("SUPABASE_URL"))?
            .trim()
            .trim_end_matches('/')
            .to_owned();
        let anon_key = lookup("SUPABASE_ANON_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT);
        let site_url = lookup("SITE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        let cookie_secure = lookup("COOKIE_SECURE")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or_else(|| site_url.starts_with("https://"));
        let verified_notice = parse_verified_notice(lookup("VERIFIED_NOTICE_POLICY").as_deref())?;
        let timeouts = HttpTimeouts {
            request_secs: parse_or(&lookup, "BAAS_REQUEST_TIMEOUT_SECS", DEFAULT_BAAS_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(&lookup, "BAAS_CONNECT_TIMEOUT_SECS", DEFAULT_BAAS_CONNECT_TIMEOUT_SECS),
        };
        let avatar_bucket = lookup("AVATAR_BUCKET")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AVATAR_BUCKET.to_owned());
        let callback_wait = Duration::from_secs(parse_or(&lookup, "CALLBACK_WAIT_SECS", DEFAULT_CALLBACK_WAIT_SECS));

        Ok(Self {
            baas_url,
            anon_key,
            port,
            site_url,
            cookie_secure,
            verified_notice,
            timeouts,
            avatar_bucket,
            callback_wait,
        })
    }

    /// Where confirmation emails send the user back to.
    #[must_use]
    pub fn sign_up_redirect(&self) -> String {
        format!("{}/verified", self.site_url)
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_verified_notice(raw: Option<&str>) -> Result<VerifiedNoticePolicy, ConfigError> {
    match raw.map(str::trim).unwrap_or("sign_out") {
        "sign_out" => Ok(VerifiedNoticePolicy::SignOut),
        "keep_session" => Ok(VerifiedNoticePolicy::KeepSession),
        other => Err(ConfigError::Parse(format!(
            "unsupported VERIFIED_NOTICE_POLICY '{other}' (expected 'sign_out' or 'keep_session')"
        ))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
