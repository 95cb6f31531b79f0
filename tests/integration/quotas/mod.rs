//! Quota update endpoint tests
//!
//! - PATCH /api/admin/users - Batch update
//! - PATCH /api/roles/users/{id}/max-emails - Single update

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::{assertions::assert_error, send, TestApp, UserFixture};

async fn batch(app: &TestApp, admin: &UserFixture, body: Value) -> (StatusCode, Value) {
    send(
        app.test_router(),
        Method::PATCH,
        "/api/admin/users",
        Some(&admin.jwt_token),
        Some(body),
    )
    .await
}

async fn single(app: &TestApp, admin: &UserFixture, id: &str, body: Value) -> (StatusCode, Value) {
    send(
        app.test_router(),
        Method::PATCH,
        &format!("/api/roles/users/{}/max-emails", id),
        Some(&admin.jwt_token),
        Some(body),
    )
    .await
}

mod test_batch_update {
    use super::*;

    #[tokio::test]
    async fn test_batch_update_applies_all_items() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let a = app.create_user("a", None, 1).unwrap();
        let b = app.create_user("b", None, 2).unwrap();

        let (status, body) = batch(
            &app,
            &admin,
            json!({"updates": [
                {"userId": a.id.to_string(), "maxEmails": 10},
                {"userId": b.id.to_string(), "maxEmails": 0},
            ]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["success"], true);
        assert_eq!(body["summary"], json!({"total": 2, "success": 2, "failure": 0}));
        assert_eq!(body["results"][0]["oldMaxEmails"], 1);
        assert_eq!(body["results"][0]["newMaxEmails"], 10);
        assert_eq!(body["results"][1]["newMaxEmails"], 0);
        assert_eq!(app.user(a.id).unwrap().max_emails, 10);
        assert_eq!(app.user(b.id).unwrap().max_emails, 0);
    }

    #[tokio::test]
    async fn test_vanished_user_fails_only_its_item() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let a = app.create_user("a", None, 1).unwrap();
        let gone = app.create_user("gone", None, 1).unwrap();
        app.store.remove_user(gone.id).unwrap();

        let (status, body) = batch(
            &app,
            &admin,
            json!({"updates": [
                {"userId": gone.id.to_string(), "maxEmails": 4},
                {"userId": a.id.to_string(), "maxEmails": 4},
            ]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], json!({"total": 2, "success": 1, "failure": 1}));
        assert_eq!(body["results"][0]["success"], false);
        assert_eq!(body["results"][0]["error"], "User not found");
        assert!(body["results"][0].get("oldMaxEmails").is_none());
        assert_eq!(body["results"][1]["success"], true);
        assert_eq!(app.user(a.id).unwrap().max_emails, 4);
    }

    #[tokio::test]
    async fn test_malformed_batches_change_nothing() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let a = app.create_user("a", None, 7).unwrap();
        let id = a.id.to_string();

        let bad_bodies = vec![
            json!({"updates": []}),
            json!({}),
            json!({"updates": [{"userId": id, "maxEmails": 3}, {"maxEmails": 3}]}),
            json!({"updates": [{"userId": id, "maxEmails": 3}, {"userId": id}]}),
            json!({"updates": [{"userId": id, "maxEmails": 3}, {"userId": id, "maxEmails": "3"}]}),
            json!({"updates": [{"userId": id, "maxEmails": 3}, {"userId": id, "maxEmails": 1001}]}),
            json!({"updates": [{"userId": id, "maxEmails": 3}, {"userId": id, "maxEmails": -1}]}),
            json!({"updates": [{"userId": id, "maxEmails": 2.5}]}),
        ];

        for body in bad_bodies {
            let (status, response) = batch(&app, &admin, body.clone()).await;
            assert_error(status, &response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
            assert_eq!(
                app.user(a.id).unwrap().max_emails,
                7,
                "batch {} partially applied",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_unparseable_user_id_is_a_per_item_failure() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();

        let (status, body) = batch(
            &app,
            &admin,
            json!({"updates": [{"userId": "user-42", "maxEmails": 3}]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["failure"], 1);
        assert_eq!(body["results"][0]["userId"], "user-42");
    }
}

mod test_single_update {
    use super::*;

    #[tokio::test]
    async fn test_single_update_reports_old_and_new() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let ada = app.create_user("ada", None, 1).unwrap();

        let (status, body) = single(&app, &admin, &ada.id.to_string(), json!({"maxEmails": 25})).await;

        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["success"], true);
        assert_eq!(body["oldMaxEmails"], 1);
        assert_eq!(body["newMaxEmails"], 25);
        assert!(body["message"].as_str().unwrap().contains("ada"));
        assert_eq!(app.user(ada.id).unwrap().max_emails, 25);
    }

    #[tokio::test]
    async fn test_bounds_are_inclusive() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let id = app.create_user("ada", None, 1).unwrap().id.to_string();

        for ok in [0, 1000] {
            let (status, _) = single(&app, &admin, &id, json!({"maxEmails": ok})).await;
            assert_eq!(status, StatusCode::OK);
        }
        for bad in [json!(-1), json!(1001), json!("12"), json!(1.5), json!(null)] {
            let (status, body) = single(&app, &admin, &id, json!({"maxEmails": bad})).await;
            assert_error(status, &body, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
        }
        let (status, body) = single(&app, &admin, &id, json!({})).await;
        assert_error(status, &body, StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();

        let (status, body) =
            single(&app, &admin, &Uuid::new_v4().to_string(), json!({"maxEmails": 3})).await;
        assert_error(status, &body, StatusCode::NOT_FOUND, "NOT_FOUND");

        let (status, body) = single(&app, &admin, "user-42", json!({"maxEmails": 3})).await;
        assert_error(status, &body, StatusCode::NOT_FOUND, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let app = TestApp::new();
        let admin = UserFixture::emperor(&app).unwrap();
        let id = app.create_user("ada", None, 1).unwrap().id;

        let (status, body) = send(
            app.test_router(),
            Method::PATCH,
            &format!("/api/roles/users/{}/max-emails", id),
            Some(&admin.jwt_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(app.user(id).unwrap().max_emails, 1);
    }
}
