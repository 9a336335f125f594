//! Postgres-backed credential store

use super::{CredentialStore, UserQuery, UserRecord, UserUpdate};
use crate::config::DatabaseConfig;
use crate::error::{AuthError, AuthResult};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Credential store backed by a Postgres pool
///
/// Uniqueness of email, session_id, and reset_token is enforced by
/// unique constraints in the schema (see migrations/).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> AuthResult<Self> {
        let connect_options =
            PgConnectOptions::from_str(&config.url).map_err(AuthError::Database)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .test_before_acquire(true)
            .connect_with(connect_options.application_name("authgate"))
            .await?;

        info!("Database pool created: max={}", config.max_connections);
        Ok(Self::new(pool))
    }

    /// Run the schema migrations for the users table
    pub async fn migrate(pool: &PgPool) -> AuthResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| AuthError::Internal(e.into()))?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn add_user(&self, email: &str, hashed_password: &str) -> AuthResult<UserRecord> {
        let result = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, hashed_password)
            VALUES ($1, $2)
            RETURNING id, email, hashed_password, session_id, reset_token, created_at
            "#,
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                AuthError::AlreadyExists(format!("user with email {email} already exists")),
            ),
            Err(e) => Err(AuthError::Database(e)),
        }
    }

    async fn find_user_by(&self, query: UserQuery) -> AuthResult<UserRecord> {
        const COLUMNS: &str = "id, email, hashed_password, session_id, reset_token, created_at";

        let user = match query {
            UserQuery::Id(id) => {
                sqlx::query_as::<_, UserRecord>(&format!(
                    "SELECT {COLUMNS} FROM users WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            UserQuery::Email(email) => {
                sqlx::query_as::<_, UserRecord>(&format!(
                    "SELECT {COLUMNS} FROM users WHERE email = $1"
                ))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?
            }
            UserQuery::SessionId(session_id) => {
                sqlx::query_as::<_, UserRecord>(&format!(
                    "SELECT {COLUMNS} FROM users WHERE session_id = $1"
                ))
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?
            }
            UserQuery::ResetToken(token) => {
                sqlx::query_as::<_, UserRecord>(&format!(
                    "SELECT {COLUMNS} FROM users WHERE reset_token = $1"
                ))
                .bind(token)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        user.ok_or_else(|| AuthError::NotFound("no matching user".to_string()))
    }

    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> AuthResult<()> {
        if update.is_empty() {
            // Still verify the user exists so the NotFound contract holds
            self.find_user_by(UserQuery::Id(user_id)).await?;
            return Ok(());
        }

        // Single statement: all touched fields land atomically
        let result = sqlx::query(
            r#"
            UPDATE users SET
                hashed_password = COALESCE($2, hashed_password),
                session_id = CASE WHEN $3 THEN $4 ELSE session_id END,
                reset_token = CASE WHEN $5 THEN $6 ELSE reset_token END
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(update.hashed_password)
        .bind(update.session_id.is_some())
        .bind(update.session_id.flatten())
        .bind(update.reset_token.is_some())
        .bind(update.reset_token.flatten())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(format!("no user with id {user_id}")));
        }
        Ok(())
    }
}
