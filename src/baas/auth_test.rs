use super::*;
use crate::config::HttpTimeouts;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "00000000-0000-0000-0000-0000000000aa";

fn client(server: &MockServer) -> BaasClient {
    BaasClient::new(&server.uri(), "anon-key".into(), HttpTimeouts { request_secs: 5, connect_secs: 5 }).unwrap()
}

fn session_body(confirmed: bool) -> serde_json::Value {
    json!({
        "access_token": "at-1",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "rt-1",
        "user": {
            "id": USER_ID,
            "email": "jane@example.com",
            "email_confirmed_at": if confirmed { json!("2024-01-01T00:00:00Z") } else { json!(null) }
        }
    })
}

// =============================================================================
// parse_sign_up_response
// =============================================================================

#[test]
fn sign_up_response_bare_user() {
    let text = json!({ "id": USER_ID, "email": "jane@example.com", "email_confirmed_at": null }).to_string();
    let user = parse_sign_up_response(&text).unwrap();
    assert_eq!(user.email.as_deref(), Some("jane@example.com"));
    assert!(user.email_confirmed_at.is_none());
}

#[test]
fn sign_up_response_with_session() {
    let text = session_body(true).to_string();
    let user = parse_sign_up_response(&text).unwrap();
    assert_eq!(user.id.to_string(), USER_ID);
    assert!(user.email_confirmed_at.is_some());
}

#[test]
fn sign_up_response_garbage_is_parse_error() {
    assert!(matches!(parse_sign_up_response("not json"), Err(BaasError::Parse(_))));
}

// =============================================================================
// HTTP
// =============================================================================

#[tokio::test]
async fn sign_in_posts_password_grant_with_apikey() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({ "email": "jane@example.com", "password": "secret1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(true)))
        .mount(&server)
        .await;

    let session = client(&server)
        .sign_in_with_password("jane@example.com", "secret1")
        .await
        .unwrap();
    assert_eq!(session.access_token, "at-1");
    assert_eq!(session.refresh_token, "rt-1");
    assert_eq!(session.expires_in, Some(3600));
}

#[tokio::test]
async fn sign_in_failure_keeps_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .sign_in_with_password("jane@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, BaasError::Api { status: 400, .. }));
    assert_eq!(err.to_string(), "Invalid login credentials");
}

#[tokio::test]
async fn get_user_sends_user_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": USER_ID, "email": "jane@example.com" })))
        .mount(&server)
        .await;

    let user = client(&server).get_user("at-1").await.unwrap();
    assert_eq!(user.id.to_string(), USER_ID);
    assert!(user.email_confirmed_at.is_none());
}

#[tokio::test]
async fn get_user_expired_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "JWT expired" })))
        .mount(&server)
        .await;

    let err = client(&server).get_user("stale").await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn verify_otp_posts_token_hash_and_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/verify"))
        .and(body_json(json!({ "type": "email", "token_hash": "hash-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(true)))
        .mount(&server)
        .await;

    let session = client(&server)
        .verify_otp("hash-1", OtpType::Email)
        .await
        .unwrap();
    assert!(session.user.email_confirmed_at.is_some());
}

#[tokio::test]
async fn sign_up_passes_redirect_target() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(query_param("redirect_to", "https://app.test/verified"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": USER_ID, "email": "jane@example.com" })))
        .mount(&server)
        .await;

    let user = client(&server)
        .sign_up("jane@example.com", "secret1", "https://app.test/verified")
        .await
        .unwrap();
    assert_eq!(user.email.as_deref(), Some("jane@example.com"));
}

#[tokio::test]
async fn refresh_uses_refresh_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "rt-0" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(true)))
        .mount(&server)
        .await;

    let session = client(&server).refresh_session("rt-0").await.unwrap();
    assert_eq!(session.refresh_token, "rt-1");
}

#[tokio::test]
async fn sign_out_and_resend_accept_empty_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/resend"))
        .and(body_json(json!({ "type": "signup", "email": "jane@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let baas = client(&server);
    baas.sign_out("at-1").await.unwrap();
    baas.resend(OtpType::Signup, "jane@example.com")
        .await
        .unwrap();
}

#[tokio::test]
async fn update_user_puts_only_set_attributes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(body_json(json!({ "password": "newsecret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": USER_ID })))
        .mount(&server)
        .await;

    let attrs = UserAttributes { email: None, password: Some("newsecret".into()) };
    let user = client(&server).update_user("at-1", &attrs).await.unwrap();
    assert_eq!(user.id.to_string(), USER_ID);
}

#[tokio::test]
async fn unreachable_backend_is_request_error() {
    let baas = BaasClient::new("http://127.0.0.1:9", "anon".into(), HttpTimeouts { request_secs: 2, connect_secs: 1 })
        .unwrap();
    let err = baas.get_user("at-1").await.unwrap_err();
    assert!(matches!(err, BaasError::Request(_)));
}
