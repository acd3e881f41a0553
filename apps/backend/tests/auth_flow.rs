mod common;

use std::time::{Duration, SystemTime};

use actix_web::http::StatusCode;
use actix_web::test;
use common::{auth_header, base_state, json_body, state_with_identity};
use jsonwebtoken::{encode, EncodingKey, Header};
use raseed_backend::auth::jwt::verify_session_token_at;
use raseed_backend::test_support::{
    bearer, create_test_app, test_security, test_user, StaticIdentityVerifier,
};
use raseed_test_support::problem_details::assert_problem_details;
use serde_json::json;

#[actix_web::test]
async fn google_sign_in_issues_session_token() {
    let user = test_user("google-sub-1");
    let app = create_test_app(state_with_identity(
        StaticIdentityVerifier::new().accept("good-id-token", user.clone()),
    ))
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/google")
        .set_json(json!({ "credential": "good-id-token" }))
        .to_request();
    let body = json_body(test::call_service(&app, req).await).await;

    assert_eq!(body["status"], "success");
    assert_eq!(body["user"]["sub"], "google-sub-1");
    assert_eq!(body["user"]["email"], "google-sub-1@example.test");

    let token = body["token"].as_str().unwrap();
    let verified = verify_session_token_at(token, &test_security(), SystemTime::now()).unwrap();
    assert_eq!(verified, user);
}

#[actix_web::test]
async fn session_token_round_trips_through_me() {
    let user = test_user("u-me");
    let app = create_test_app(state_with_identity(
        StaticIdentityVerifier::new().accept("cred", user.clone()),
    ))
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/google")
        .set_json(json!({ "credential": "cred" }))
        .to_request();
    let login = json_body(test::call_service(&app, req).await).await;
    let token = login["token"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let me = json_body(test::call_service(&app, req).await).await;

    assert_eq!(me["status"], "success");
    assert_eq!(me["user"]["sub"], "u-me");
    assert_eq!(me["user"]["name"], "User u-me");
}

#[actix_web::test]
async fn rejected_google_credential_is_401() {
    let app = create_test_app(state_with_identity(StaticIdentityVerifier::new())).await;

    let req = test::TestRequest::post()
        .uri("/auth/google")
        .set_json(json!({ "credential": "forged" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details(
        resp,
        StatusCode::UNAUTHORIZED,
        "INVALID_GOOGLE_CREDENTIAL",
        Some("Invalid Google credential"),
    )
    .await;
}

#[actix_web::test]
async fn missing_client_id_is_500() {
    let app = create_test_app(state_with_identity(StaticIdentityVerifier::unconfigured())).await;

    let req = test::TestRequest::post()
        .uri("/auth/google")
        .set_json(json!({ "credential": "anything" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details(
        resp,
        StatusCode::INTERNAL_SERVER_ERROR,
        "GOOGLE_CLIENT_ID_MISSING",
        Some("GOOGLE_CLIENT_ID is not configured"),
    )
    .await;
}

#[actix_web::test]
async fn empty_credential_is_bad_request() {
    let app = create_test_app(state_with_identity(StaticIdentityVerifier::new())).await;

    let req = test::TestRequest::post()
        .uri("/auth/google")
        .set_json(json!({ "credential": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details(resp, StatusCode::BAD_REQUEST, "INVALID_REQUEST", None).await;
}

#[actix_web::test]
async fn non_json_login_body_is_bad_request() {
    let app = create_test_app(state_with_identity(StaticIdentityVerifier::new())).await;

    let req = test::TestRequest::post()
        .uri("/auth/google")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details(resp, StatusCode::BAD_REQUEST, "INVALID_REQUEST", None).await;
}

#[actix_web::test]
async fn missing_bearer_is_401() {
    let app = create_test_app(base_state().build()).await;

    let req = test::TestRequest::get().uri("/receipts").to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details(
        resp,
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED_MISSING_BEARER",
        Some("Authorization header missing"),
    )
    .await;
}

#[actix_web::test]
async fn non_bearer_scheme_is_missing_credential() {
    let app = create_test_app(base_state().build()).await;

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details(resp, StatusCode::UNAUTHORIZED, "UNAUTHORIZED_MISSING_BEARER", None)
        .await;
}

#[actix_web::test]
async fn expired_session_is_401() {
    let user = test_user("u-old");
    let app = create_test_app(base_state().build()).await;
    // Default lifetime is a day; a token minted two days ago is dead.
    let stale = bearer(&user, &test_security(), Duration::from_secs(2 * 24 * 60 * 60));

    let req = test::TestRequest::get()
        .uri("/receipts")
        .insert_header(("Authorization", stale))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details(
        resp,
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED_EXPIRED_JWT",
        Some("Token expired"),
    )
    .await;
}

#[actix_web::test]
async fn token_signed_with_other_secret_is_invalid() {
    let user = test_user("u-x");
    let app = create_test_app(base_state().build()).await;
    let foreign = raseed_backend::SecurityConfig::new(b"some-other-secret".to_vec());

    let req = test::TestRequest::get()
        .uri("/receipts")
        .insert_header(("Authorization", bearer(&user, &foreign, Duration::ZERO)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details(resp, StatusCode::UNAUTHORIZED, "UNAUTHORIZED_INVALID_JWT", Some("Invalid token"))
        .await;
}

#[actix_web::test]
async fn token_without_subject_is_malformed() {
    let app = create_test_app(base_state().build()).await;
    let exp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 600;
    let token = encode(
        &Header::default(),
        &json!({ "email": "a@example.test", "iat": 0, "exp": exp }),
        &EncodingKey::from_secret(raseed_backend::test_support::TEST_JWT_SECRET),
    )
    .unwrap();

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details(
        resp,
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED_MALFORMED_JWT",
        Some("Malformed token payload"),
    )
    .await;
}

#[actix_web::test]
async fn lowercase_bearer_scheme_is_accepted() {
    let user = test_user("u-case");
    let app = create_test_app(base_state().build()).await;
    let header = auth_header(&user).replacen("Bearer", "bearer", 1);

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(("Authorization", header))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}
