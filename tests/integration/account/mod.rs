//! Current-user profile tests
//!
//! - GET /api/users/me

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};

use mailroom_common::RoleName;

use crate::common::{assertions::assert_error, send, TestApp, UserFixture};

#[tokio::test]
async fn test_me_returns_callers_entry_with_counts() {
    let app = TestApp::new();
    let knight = UserFixture::knight(&app).unwrap();
    app.add_mailbox(knight.user.id, Utc::now() + Duration::hours(1))
        .unwrap();

    let (status, me) = send(
        app.test_router(),
        Method::GET,
        "/api/users/me",
        Some(&knight.jwt_token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], knight.user.id.to_string());
    assert_eq!(me["username"], "knight-member");
    assert_eq!(me["role"], "knight");
    assert_eq!(me["maxEmails"], 1);
    assert_eq!(me["currentEmailCount"], 1);
}

#[tokio::test]
async fn test_me_for_unassigned_user_reads_civilian() {
    let app = TestApp::new();
    let fixture = UserFixture::with_role(&app, "fresh", None).unwrap();

    let (status, me) = send(
        app.test_router(),
        Method::GET,
        "/api/users/me",
        Some(&fixture.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], RoleName::Civilian.as_str());
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let app = TestApp::new();
    let (status, body) = send(app.test_router(), Method::GET, "/api/users/me", None, None).await;
    assert_error(status, &body, StatusCode::UNAUTHORIZED, "MISSING_AUTHORIZATION");
}
