use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

const REQUIRED: [(&str, &str); 2] = [("SUPABASE_URL", "https://proj.supabase.test/"), ("SUPABASE_ANON_KEY", "anon")];

// =============================================================================
// parse_bool
// =============================================================================

#[test]
fn parse_bool_true_variants() {
    for val in ["1", "true", "yes", "on", "TRUE", " On "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
}

#[test]
fn parse_bool_false_variants() {
    for val in ["0", "false", "no", "off", "No"] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
}

#[test]
fn parse_bool_invalid_returns_none() {
    assert_eq!(parse_bool("maybe"), None);
    assert_eq!(parse_bool(""), None);
}

// =============================================================================
// from_lookup
// =============================================================================

#[test]
fn defaults_when_only_required_set() {
    let cfg = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
    assert_eq!(cfg.baas_url, "https://proj.supabase.test");
    assert_eq!(cfg.anon_key, "anon");
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.site_url, "http://localhost:3000");
    assert!(!cfg.cookie_secure);
    assert_eq!(cfg.verified_notice, VerifiedNoticePolicy::SignOut);
    assert_eq!(
        cfg.timeouts,
        HttpTimeouts {
            request_secs: DEFAULT_BAAS_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_BAAS_CONNECT_TIMEOUT_SECS
        }
    );
    assert_eq!(cfg.avatar_bucket, DEFAULT_AVATAR_BUCKET);
    assert_eq!(cfg.callback_wait, Duration::from_secs(DEFAULT_CALLBACK_WAIT_SECS));
}

#[test]
fn missing_url_errors() {
    let err = AppConfig::from_lookup(lookup_from(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("SUPABASE_URL")));
}

#[test]
fn blank_anon_key_counts_as_missing() {
    let err = AppConfig::from_lookup(lookup_from(&[("SUPABASE_URL", "https://x.test"), ("SUPABASE_ANON_KEY", "  ")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Missing("SUPABASE_ANON_KEY")));
}

#[test]
fn overrides_are_parsed() {
    let mut pairs = REQUIRED.to_vec();
    pairs.extend([
        ("PORT", "8080"),
        ("SITE_URL", "https://events.test/"),
        ("VERIFIED_NOTICE_POLICY", "keep_session"),
        ("BAAS_REQUEST_TIMEOUT_SECS", "42"),
        ("BAAS_CONNECT_TIMEOUT_SECS", "7"),
        ("AVATAR_BUCKET", "pictures"),
        ("CALLBACK_WAIT_SECS", "3"),
    ]);
    let cfg = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.site_url, "https://events.test");
    assert!(cfg.cookie_secure, "https site implies secure cookies");
    assert_eq!(cfg.verified_notice, VerifiedNoticePolicy::KeepSession);
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.avatar_bucket, "pictures");
    assert_eq!(cfg.callback_wait, Duration::from_secs(3));
}

#[test]
fn explicit_cookie_secure_wins_over_inference() {
    let mut pairs = REQUIRED.to_vec();
    pairs.extend([("SITE_URL", "https://events.test"), ("COOKIE_SECURE", "off")]);
    let cfg = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
    assert!(!cfg.cookie_secure);
}

#[test]
fn malformed_numbers_fall_back_to_defaults() {
    let mut pairs = REQUIRED.to_vec();
    pairs.extend([("PORT", "eighty"), ("BAAS_REQUEST_TIMEOUT_SECS", "-1")]);
    let cfg = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_BAAS_REQUEST_TIMEOUT_SECS);
}

#[test]
fn unknown_verified_policy_errors() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("VERIFIED_NOTICE_POLICY", "sometimes"));
    let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err().to_string();
    assert!(err.contains("unsupported VERIFIED_NOTICE_POLICY"));
}

#[test]
fn sign_up_redirect_targets_verified_notice() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("SITE_URL", "https://events.test"));
    let cfg = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
    assert_eq!(cfg.sign_up_redirect(), "https://events.test/verified");
}
