//! Site settings endpoint tests
//!
//! - GET /api/config - Effective settings
//! - POST /api/config - Replace settings

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::common::{assertions::assert_error, send, TestApp, UserFixture};

async fn post_config(app: &TestApp, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    send(app.test_router(), Method::POST, "/api/config", token, Some(body)).await
}

async fn get_config(app: &TestApp) -> (StatusCode, Value) {
    send(app.test_router(), Method::GET, "/api/config", None, None).await
}

#[tokio::test]
async fn test_get_serves_configured_defaults() {
    let app = TestApp::new();

    let (status, body) = get_config(&app).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body,
        json!({
            "defaultRole": "civilian",
            "emailDomains": "mailroom.local",
            "adminContact": ""
        })
    );
}

#[tokio::test]
async fn test_update_is_visible_to_later_reads() {
    let app = TestApp::new();
    let admin = UserFixture::emperor(&app).unwrap();

    let (status, body) = post_config(
        &app,
        Some(&admin.jwt_token),
        json!({"defaultRole": "knight", "emailDomains": "a.test, b.test"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["config"]["defaultRole"], "knight");
    assert_eq!(body["config"]["emailDomains"], "a.test,b.test");

    let (_, body) = get_config(&app).await;
    assert_eq!(body["defaultRole"], "knight");
    assert_eq!(body["emailDomains"], "a.test,b.test");
    assert_eq!(body["adminContact"], "");
}

#[tokio::test]
async fn test_emperor_is_not_a_valid_default_role() {
    let app = TestApp::new();
    let admin = UserFixture::emperor(&app).unwrap();

    for role in ["emperor", "", "baron"] {
        let (status, body) =
            post_config(&app, Some(&admin.jwt_token), json!({"defaultRole": role})).await;
        assert_error(status, &body, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
    }

    let (_, body) = get_config(&app).await;
    assert_eq!(body["defaultRole"], "civilian");
}

#[tokio::test]
async fn test_update_requires_an_administrator() {
    let app = TestApp::new();
    let knight = UserFixture::knight(&app).unwrap();

    let (status, body) =
        post_config(&app, Some(&knight.jwt_token), json!({"defaultRole": "duke"})).await;
    assert_error(status, &body, StatusCode::FORBIDDEN, "FORBIDDEN");

    let (status, body) = post_config(&app, None, json!({"defaultRole": "duke"})).await;
    assert_error(status, &body, StatusCode::UNAUTHORIZED, "MISSING_AUTHORIZATION");
}
