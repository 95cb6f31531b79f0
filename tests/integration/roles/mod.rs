//! Role management endpoint tests
//!
//! - POST /api/roles/users - Find user by identifier
//! - POST /api/roles/promote - Set role
//! - DELETE /api/roles/delete-uncertified - Purge civilians

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use mailroom_common::RoleName;

use crate::common::{assertions::assert_error, send, TestApp, UserFixture};

async fn promote(app: &TestApp, admin: &UserFixture, user_id: &str, role: &str) -> (StatusCode, Value) {
    send(
        app.test_router(),
        Method::POST,
        "/api/roles/promote",
        Some(&admin.jwt_token),
        Some(json!({"userId": user_id, "roleName": role})),
    )
    .await
}

async fn find(app: &TestApp, admin: &UserFixture, text: &str) -> (StatusCode, Value) {
    send(
        app.test_router(),
        Method::POST,
        "/api/roles/users",
        Some(&admin.jwt_token),
        Some(json!({"searchText": text})),
    )
    .await
}

mod test_find_user {
    use super::*;

    #[tokio::test]
    async fn test_find_by_email_and_username() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let ada = app.create_user("ada", Some(RoleName::Knight), 4).unwrap();
        app.add_mailbox(ada.id, Utc::now() - Duration::hours(1)).unwrap();

        let (status, body) = find(&app, &admin, "ada@mailroom.test").await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["user"]["id"], ada.id.to_string());
        assert_eq!(body["user"]["maxEmails"], 4);
        assert_eq!(body["user"]["currentEmailCount"], 1);
        assert_eq!(body["user"]["role"], "knight");

        let (status, body) = find(&app, &admin, "ada").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], ada.id.to_string());
    }

    #[tokio::test]
    async fn test_find_rejects_blank_and_reports_missing() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();

        let (status, body) = find(&app, &admin, "  ").await;
        assert_error(status, &body, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");

        let (status, body) = find(&app, &admin, "nobody@mailroom.test").await;
        assert_error(status, &body, StatusCode::NOT_FOUND, "NOT_FOUND");
    }
}

mod test_promote {
    use super::*;

    #[tokio::test]
    async fn test_promote_then_repeat_is_unchanged() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let ada = app.create_user("ada", None, 1).unwrap();
        let id = ada.id.to_string();

        let (status, body) = promote(&app, &admin, &id, "duke").await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "updated");
        assert_eq!(body["previousRole"], "civilian");
        assert_eq!(body["role"], "duke");
        assert_eq!(app.user(ada.id).unwrap().role, RoleName::Duke);

        let (status, body) = promote(&app, &admin, &id, "duke").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "unchanged");
        assert_eq!(body["previousRole"], "duke");
        assert!(body["message"].as_str().unwrap().contains("already"));
    }

    #[tokio::test]
    async fn test_demote_back_to_civilian() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let ada = app.create_user("ada", Some(RoleName::Knight), 1).unwrap();

        let (status, body) = promote(&app, &admin, &ada.id.to_string(), "civilian").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "updated");
        assert_eq!(app.user(ada.id).unwrap().role, RoleName::Civilian);
    }

    #[tokio::test]
    async fn test_invalid_targets_are_rejected() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let ada = app.create_user("ada", None, 1).unwrap();

        for role in ["emperor", "baron", ""] {
            let (status, body) = promote(&app, &admin, &ada.id.to_string(), role).await;
            assert_error(status, &body, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
        }
        assert_eq!(app.user(ada.id).unwrap().role, RoleName::Civilian);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();

        let (status, body) = promote(&app, &admin, &Uuid::new_v4().to_string(), "knight").await;
        assert_error(status, &body, StatusCode::NOT_FOUND, "NOT_FOUND");
    }
}

mod test_delete_uncertified {
    use super::*;

    async fn purge(app: &TestApp, admin: &UserFixture) -> (StatusCode, Value) {
        send(
            app.test_router(),
            Method::DELETE,
            "/api/roles/delete-uncertified",
            Some(&admin.jwt_token),
            None,
        )
        .await
    }

    #[tokio::test]
    async fn test_purge_removes_civilians_including_unassigned() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let assigned = app.create_user("assigned", Some(RoleName::Civilian), 1).unwrap();
        let unassigned = app.create_user("unassigned", None, 1).unwrap();
        let knight = app.create_user("knight", Some(RoleName::Knight), 1).unwrap();
        let duke = app.create_user("duke", Some(RoleName::Duke), 1).unwrap();
        app.add_mailbox(unassigned.id, Utc::now() + Duration::days(1))
            .unwrap();

        let (status, body) = purge(&app, &admin).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["success"], true);
        assert_eq!(body["deleted"], 2);

        assert!(app.user(assigned.id).is_none());
        assert!(app.user(unassigned.id).is_none());
        assert!(app.user(knight.id).is_some());
        assert!(app.user(duke.id).is_some());
        assert!(app.user(admin.user.id).is_some());

        let (status, body) = purge(&app, &admin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 0);
    }

    #[tokio::test]
    async fn test_purge_without_civilian_reference_is_not_found() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let ghost = app.create_user("ghost", None, 1).unwrap();
        app.store.remove_role_reference(RoleName::Civilian).unwrap();

        let (status, body) = purge(&app, &admin).await;
        assert_error(status, &body, StatusCode::NOT_FOUND, "NOT_FOUND");
        assert!(app.user(ghost.id).is_some());
    }
}
