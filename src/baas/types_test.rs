use super::*;

// =============================================================================
// extract_error_message
// =============================================================================

#[test]
fn error_message_prefers_msg() {
    let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
    assert_eq!(extract_error_message(400, body), "Invalid login credentials");
}

#[test]
fn error_message_reads_error_description() {
    let body = r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#;
    assert_eq!(extract_error_message(400, body), "Email not confirmed");
}

#[test]
fn error_message_reads_postgrest_message() {
    let body = r#"{"code":"42501","message":"new row violates row-level security policy"}"#;
    assert_eq!(extract_error_message(403, body), "new row violates row-level security policy");
}

#[test]
fn error_message_falls_back_to_raw_body() {
    assert_eq!(extract_error_message(502, "  upstream down  "), "upstream down");
}

#[test]
fn error_message_empty_body_mentions_status() {
    assert_eq!(extract_error_message(500, ""), "backend returned status 500");
}

#[test]
fn error_message_skips_blank_fields() {
    let body = r#"{"msg":"","message":"real reason"}"#;
    assert_eq!(extract_error_message(400, body), "real reason");
}

// =============================================================================
// BaasError
// =============================================================================

#[test]
fn api_error_displays_provider_message_verbatim() {
    let err = BaasError::Api { status: 400, message: "Invalid login credentials".into() };
    assert_eq!(err.to_string(), "Invalid login credentials");
}

#[test]
fn unauthorized_covers_401_and_403_only() {
    assert!(BaasError::Api { status: 401, message: String::new() }.is_unauthorized());
    assert!(BaasError::Api { status: 403, message: String::new() }.is_unauthorized());
    assert!(!BaasError::Api { status: 400, message: String::new() }.is_unauthorized());
    assert!(!BaasError::Request("timeout".into()).is_unauthorized());
}

#[test]
fn rejection_is_any_client_error() {
    assert!(BaasError::Api { status: 422, message: String::new() }.is_rejection());
    assert!(!BaasError::Api { status: 503, message: String::new() }.is_rejection());
    assert!(!BaasError::Parse("bad json".into()).is_rejection());
}

// =============================================================================
// OtpType
// =============================================================================

#[test]
fn otp_type_parses_known_values() {
    assert_eq!("email".parse::<OtpType>(), Ok(OtpType::Email));
    assert_eq!("signup".parse::<OtpType>(), Ok(OtpType::Signup));
    assert_eq!("email_change".parse::<OtpType>(), Ok(OtpType::EmailChange));
    assert_eq!(" magiclink ".parse::<OtpType>(), Ok(OtpType::Magiclink));
}

#[test]
fn otp_type_rejects_unknown() {
    assert!("sms".parse::<OtpType>().is_err());
    assert!("".parse::<OtpType>().is_err());
}

#[test]
fn otp_type_serializes_snake_case() {
    assert_eq!(serde_json::to_value(OtpType::EmailChange).unwrap(), "email_change");
    assert_eq!(OtpType::Recovery.to_string(), "recovery");
}

// =============================================================================
// Records
// =============================================================================

#[test]
fn user_attributes_debug_redacts_password() {
    let attrs = UserAttributes { email: None, password: Some("hunter22".into()) };
    let debug = format!("{attrs:?}");
    assert!(!debug.contains("hunter22"));
    assert!(debug.contains("redacted"));
}

#[test]
fn user_attributes_skip_unset_fields() {
    let attrs = UserAttributes { email: Some("a@b.co".into()), password: None };
    let json = serde_json::to_value(&attrs).unwrap();
    assert_eq!(json, serde_json::json!({ "email": "a@b.co" }));
}

#[test]
fn profile_deserializes_sparse_row() {
    let row = r#"{"id":"00000000-0000-0000-0000-000000000001","username":"jd"}"#;
    let profile: Profile = serde_json::from_str(row).unwrap();
    assert_eq!(profile.username.as_deref(), Some("jd"));
    assert!(profile.fname.is_none());
    assert!(profile.interests.is_none());
}

#[test]
fn profile_serialization_omits_unset_timestamps() {
    let profile = Profile { id: Uuid::nil(), ..Profile::default() };
    let json = serde_json::to_value(&profile).unwrap();
    assert!(json.get("created_at").is_none());
    assert!(json.get("updated_at").is_none());
    assert!(json["fname"].is_null());
}

#[test]
fn ticket_reads_embedded_event() {
    let row = r#"{
        "id":"00000000-0000-0000-0000-000000000010",
        "user_id":"00000000-0000-0000-0000-000000000001",
        "event_id":"00000000-0000-0000-0000-000000000020",
        "events":{"id":"00000000-0000-0000-0000-000000000020","title":"Meetup","date":"2030-05-01T18:00:00Z"}
    }"#;
    let ticket: Ticket = serde_json::from_str(row).unwrap();
    let event = ticket.event.unwrap();
    assert_eq!(event.title, "Meetup");
    assert_eq!(event.date.as_deref(), Some("2030-05-01T18:00:00Z"));
}
