use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::db::models::{Session, User};
use crate::db::store::CredentialStore;
use crate::error::StoreError;

/// Postgres-backed credential store.
///
/// Queries are bound at runtime so the crate builds without a reachable
/// database; the schema comes from the embedded `./migrations`.
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Create the `users` and `sessions` tables if absent.
    ///
    /// Idempotent; bootstrap runs this before the first request is served.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn get_user_by_user_name(&self, user_name: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT ulid, user_name, password_hash FROM users WHERE user_name = $1",
        )
        .bind(user_name)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (ulid, user_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING ulid, user_name, password_hash
            "#,
        )
        .bind(&user.ulid)
        .bind(&user.user_name)
        .bind(&user.password_hash)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(created)
    }

    async fn get_session(&self, user_ulid: &str) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT user_ulid, access_token, expired FROM sessions WHERE user_ulid = $1",
        )
        .bind(user_ulid)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(session)
    }

    async fn put_session(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (user_ulid, access_token, expired)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_ulid)
            DO UPDATE SET access_token = EXCLUDED.access_token, expired = EXCLUDED.expired
            "#,
        )
        .bind(&session.user_ulid)
        .bind(&session.access_token)
        .bind(session.expired)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn swap_session_token(
        &self,
        user_ulid: &str,
        current_token: &str,
        next: &Session,
    ) -> Result<bool, StoreError> {
        // Single conditional row update: of N concurrent rotations with the
        // same token, the database lets exactly one through.
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET access_token = $3, expired = $4
            WHERE user_ulid = $1 AND access_token = $2
            "#,
        )
        .bind(user_ulid)
        .bind(current_token)
        .bind(&next.access_token)
        .bind(next.expired)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
