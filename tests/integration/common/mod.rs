//! Common test utilities and fixtures for integration tests
//!
//! - An application over the in-memory directory store
//! - User fixtures with signed bearer tokens
//! - Request helpers and common assertions

use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use mailroom_auth::issue_token;
use mailroom_common::config::{
    DEFAULT_EMAIL_DOMAINS, DEFAULT_MAX_EMAILS, DEFAULT_MAX_EMAILS_CEILING,
};
use mailroom_common::{Config, RoleName, StoreBackend};
use mailroom_directory::{
    DirectoryStores, DirectoryUser, InMemoryDirectory, Mailbox, NewUser, QuotaPolicy,
};

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_only"; // pragma: allowlist secret

/// Token lifetime for fixtures
const TOKEN_TTL_SECONDS: u64 = 3600;

/// Test application over an in-memory directory
pub struct TestApp {
    pub store: InMemoryDirectory,
    pub config: Config,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            store: InMemoryDirectory::new(),
            config: Config {
                store_backend: StoreBackend::Memory,
                database_url: None,
                run_migrations: false,
                jwt_secret: TEST_JWT_SECRET.to_string(),
                jwt_issuer: Some("mailroom-test".to_string()),
                jwt_audience: Some("authenticated".to_string()),
                max_emails_ceiling: DEFAULT_MAX_EMAILS_CEILING,
                default_max_emails: DEFAULT_MAX_EMAILS,
                default_role: RoleName::Civilian,
                email_domains: DEFAULT_EMAIL_DOMAINS.to_string(),
                admin_contact: String::new(),
                cors_allowed_origins: "*".to_string(),
                port: 0,
            },
        }
    }

    /// Router sharing this app's store
    pub fn test_router(&self) -> Router {
        mailroom_app::create_app(&self.config, DirectoryStores::in_memory(self.store.clone()))
            .expect("test app should build")
    }

    pub fn policy(&self) -> QuotaPolicy {
        mailroom_app::quota_policy(&self.config).expect("test quota policy")
    }

    /// Insert a user; `role` of `None` leaves it without an assignment.
    pub fn create_user(
        &self,
        username: &str,
        role: Option<RoleName>,
        max_emails: i32,
    ) -> Result<DirectoryUser> {
        self.create_user_at(username, role, max_emails, Some(Utc::now()))
    }

    pub fn create_user_at(
        &self,
        username: &str,
        role: Option<RoleName>,
        max_emails: i32,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<DirectoryUser> {
        let id = self.store.insert_user(
            NewUser::new(&self.policy())
                .with_name(format!("Test {}", username))
                .with_username(username)
                .with_email(format!("{}@mailroom.test", username))
                .with_max_emails(max_emails)
                .with_created_at(created_at),
        )?;
        if let Some(role) = role {
            self.store.set_role(id, role)?;
        }
        self.store
            .get(id)?
            .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", id))
    }

    pub fn add_mailbox(&self, owner: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        let address = format!("{}@tmp.mailroom.test", Uuid::new_v4().simple());
        self.store
            .add_mailbox(Mailbox::new(owner, address, expires_at))?;
        Ok(())
    }

    pub fn user(&self, id: Uuid) -> Option<DirectoryUser> {
        self.store.get(id).expect("store readable")
    }
}

/// User fixture carrying a signed bearer token
#[derive(Debug, Clone)]
pub struct UserFixture {
    pub user: DirectoryUser,
    pub jwt_token: String,
}

impl UserFixture {
    pub fn with_role(app: &TestApp, username: &str, role: Option<RoleName>) -> Result<Self> {
        let user = app.create_user(username, role, DEFAULT_MAX_EMAILS)?;
        let jwt_token = create_test_jwt(app, user.id)?;
        Ok(Self { user, jwt_token })
    }

    pub fn emperor(app: &TestApp) -> Result<Self> {
        Self::with_role(app, "emperor-admin", Some(RoleName::Emperor))
    }

    pub fn knight(app: &TestApp) -> Result<Self> {
        Self::with_role(app, "knight-member", Some(RoleName::Knight))
    }
}

/// Sign a token the way the external session issuer would
pub fn create_test_jwt(app: &TestApp, user_id: Uuid) -> Result<String> {
    let auth_config = mailroom_app::auth_config(&app.config);
    Ok(issue_token(user_id, &auth_config, TOKEN_TTL_SECONDS)?)
}

/// Send one request and decode the JSON body (`Value::Null` when not JSON)
pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub mod assertions {
    use axum::http::StatusCode;
    use serde_json::Value;

    /// Assert the standard `{"error": {"code", "message"}}` shape
    pub fn assert_error(status: StatusCode, body: &Value, expected: StatusCode, code: &str) {
        assert_eq!(status, expected, "unexpected status, body: {}", body);
        assert_eq!(body["error"]["code"], code, "unexpected error body: {}", body);
        assert!(body["error"]["message"].is_string());
    }
}
