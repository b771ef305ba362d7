use super::*;
use crate::routes::request_helpers::{body_json, get, send};
use crate::state::test_helpers::test_app_state;

fn api(status: u16, message: &str) -> BaasError {
    BaasError::Api { status, message: message.into() }
}

#[test]
fn provider_auth_failures_map_to_401() {
    let err = ApiError::from(api(401, "invalid JWT"));
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    assert_eq!(err.body.error, "invalid JWT");
    assert_eq!(ApiError::from(api(403, "forbidden")).status, StatusCode::UNAUTHORIZED);
}

#[test]
fn provider_client_errors_keep_message() {
    let err = ApiError::from(api(422, "User already registered"));
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.body.error, "User already registered");
}

#[test]
fn provider_outages_map_to_502() {
    assert_eq!(ApiError::from(api(500, "boom")).status, StatusCode::BAD_GATEWAY);
    let err = ApiError::from(BaasError::Request("connection refused".into()));
    assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    assert!(!err.body.error.contains("connection refused"));
    assert_eq!(ApiError::from(BaasError::Parse("eof".into())).status, StatusCode::BAD_GATEWAY);
}

#[test]
fn validation_errors_carry_fields() {
    let mut fields = FieldErrors::new();
    fields.insert("email", "Email is required".into());
    let err = ApiError::from(AccountError::Validation(fields));
    assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.body.fields["email"], "Email is required");
}

#[test]
fn upload_errors_are_reported_on_file_field() {
    let err = ApiError::from(ProfileError::Upload("File is empty".into()));
    assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.body.fields["file"], "File is empty");
    assert_eq!(ApiError::from(ProfileError::NotFound).status, StatusCode::NOT_FOUND);
}

#[test]
fn event_errors_map_like_profile_errors() {
    let err = ApiError::from(EventError::Provider(api(401, "expired")));
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn error_body_serializes_error_and_fields() {
    let response = ApiError::unverified().into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "email not confirmed");
    assert!(body["fields"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn healthz_is_ok() {
    let (state, _) = test_app_state();
    let response = send(app(state), get("/healthz", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (state, _) = test_app_state();
    let response = send(app(state), get("/nope", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
