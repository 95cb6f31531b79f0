//! Postgres directory and mailbox stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use mailroom_auth::{AuthIdentity, IdentityLookup};
use mailroom_common::{RepositoryError, RoleName};

use super::{DirectoryStore, MailboxStore, SiteConfigStore, StoreResult};
use crate::domain::entities::{DirectoryUser, NewUser, QuotaBucket};

const SELECT_USERS: &str = r#"
    SELECT u.id, u.name, u.username, u.email, u.max_emails, u.created_at,
           r.name AS role_name
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: Option<String>,
    username: Option<String>,
    email: Option<String>,
    max_emails: i32,
    created_at: Option<DateTime<Utc>>,
    role_name: Option<String>,
}

impl TryFrom<UserRow> for DirectoryUser {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        let role = RoleName::resolve(row.role_name.as_deref())
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;
        Ok(DirectoryUser {
            id: row.id,
            name: row.name,
            username: row.username,
            email: row.email,
            max_emails: row.max_emails,
            created_at: row.created_at,
            role,
        })
    }
}

/// Escape LIKE metacharacters and wrap for a substring match
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, filter: &str, value: &str) -> StoreResult<Option<DirectoryUser>> {
        let sql = format!("{} WHERE {} = $1", SELECT_USERS, filter);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(DirectoryUser::try_from).transpose()
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<Uuid> {
        let user = user
            .into_user(RoleName::Civilian)
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, username, email, max_emails, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.max_emails)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user.id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(RepositoryError::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn search_users(&self, search: Option<&str>) -> StoreResult<Vec<DirectoryUser>> {
        let sql = format!(
            r#"{}
            WHERE $1::text IS NULL
               OR u.name ILIKE $1 ESCAPE '\'
               OR u.username ILIKE $1 ESCAPE '\'
               OR u.email ILIKE $1 ESCAPE '\'
            ORDER BY u.id
            "#,
            SELECT_USERS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(search.map(like_pattern))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(DirectoryUser::try_from).collect()
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<DirectoryUser>> {
        let sql = format!("{} WHERE u.id = $1", SELECT_USERS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(DirectoryUser::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<DirectoryUser>> {
        self.find_one("u.email", email).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<DirectoryUser>> {
        self.find_one("u.username", username).await
    }

    async fn update_max_emails(&self, id: Uuid, max_emails: i32) -> StoreResult<Option<i32>> {
        let previous = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users u
            SET max_emails = $2
            FROM (SELECT id, max_emails FROM users WHERE id = $1 FOR UPDATE) old
            WHERE u.id = old.id
            RETURNING old.max_emails
            "#,
        )
        .bind(id)
        .bind(max_emails)
        .fetch_optional(&self.pool)
        .await?;

        Ok(previous)
    }

    async fn assign_role(&self, id: Uuid, role: RoleName) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT u.id, r.id
            FROM users u, roles r
            WHERE u.id = $1 AND r.name = $2
            ON CONFLICT (user_id) DO UPDATE SET role_id = EXCLUDED.role_id
            "#,
        )
        .bind(id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn role_exists(&self, role: RoleName) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1)",
        )
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn delete_users_with_role(&self, role: RoleName) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM users u
            WHERE COALESCE(
                (SELECT r.name
                 FROM user_roles ur
                 JOIN roles r ON r.id = ur.role_id
                 WHERE ur.user_id = u.id),
                'civilian'
            ) = $1
            "#,
        )
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_users_created_after(&self, since: DateTime<Utc>) -> StoreResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE created_at > $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn count_users_by_role(&self) -> StoreResult<HashMap<RoleName, i64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT COALESCE(r.name, 'civilian') AS role_name, COUNT(*) AS user_count
            FROM users u
            LEFT JOIN user_roles ur ON ur.user_id = u.id
            LEFT JOIN roles r ON r.id = ur.role_id
            GROUP BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(name, count)| {
                name.parse::<RoleName>()
                    .map(|role| (role, count))
                    .map_err(|e| RepositoryError::InvalidData(e.to_string()))
            })
            .collect()
    }

    async fn quota_distribution(&self) -> StoreResult<Vec<QuotaBucket>> {
        let buckets = sqlx::query_as::<_, QuotaBucket>(
            r#"
            SELECT max_emails, COUNT(*) AS user_count
            FROM users
            GROUP BY max_emails
            ORDER BY max_emails
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(buckets)
    }
}

#[async_trait]
impl SiteConfigStore for PgDirectoryStore {
    async fn site_settings(&self) -> StoreResult<HashMap<String, String>> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM site_config")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn put_site_settings(&self, entries: &[(&'static str, String)]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO site_config (key, value, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(*key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityLookup for PgDirectoryStore {
    async fn find_identity(&self, user_id: Uuid) -> Result<Option<AuthIdentity>, RepositoryError> {
        Ok(self.find_user(user_id).await?.map(AuthIdentity::from))
    }
}

#[derive(Clone)]
pub struct PgMailboxStore {
    pool: PgPool,
}

impl PgMailboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MailboxStore for PgMailboxStore {
    async fn count_by_owners(&self, owners: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        if owners.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT user_id, COUNT(*)
            FROM emails
            WHERE user_id = ANY($1)
            GROUP BY user_id
            "#,
        )
        .bind(owners.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn count_all(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM emails")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_active_at(&self, at: DateTime<Utc>) -> StoreResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM emails WHERE expires_at > $1")
                .bind(at)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
