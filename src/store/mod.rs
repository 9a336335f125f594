//! Credential store
//!
//! The persistence contract consumed by the session, reset, and account
//! services. Two implementations exist: a Postgres store and an
//! in-process store for tests and small deployments.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::{AuthError, AuthResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Persisted user record
///
/// `hashed_password` is an opaque PHC string; the plaintext never reaches
/// the store. `session_id` and `reset_token`, when set, are unique across
/// all users.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub session_id: Option<String>,
    pub reset_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Typed lookup predicate over the user record's queryable fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserQuery {
    Id(Uuid),
    Email(String),
    SessionId(String),
    ResetToken(String),
}

impl UserQuery {
    /// Build a predicate from a textual field/value pair.
    ///
    /// Unrecognized field names fail with `InvalidQuery`, as does an id
    /// value that does not parse. Used by form-driven callers; typed
    /// variants are the primary API.
    pub fn parse(field: &str, value: &str) -> AuthResult<Self> {
        match field {
            "id" => {
                let id = Uuid::parse_str(value)
                    .map_err(|_| AuthError::InvalidQuery(format!("invalid user id: {value}")))?;
                Ok(UserQuery::Id(id))
            }
            "email" => Ok(UserQuery::Email(value.to_string())),
            "session_id" => Ok(UserQuery::SessionId(value.to_string())),
            "reset_token" => Ok(UserQuery::ResetToken(value.to_string())),
            other => Err(AuthError::InvalidQuery(format!(
                "unsupported lookup field: {other}"
            ))),
        }
    }
}

/// Field updates applied to a user record
///
/// Outer `Option` means "touch this field"; the inner `Option` on
/// `session_id`/`reset_token` carries the new value, including clearing
/// to null. All touched fields are applied in one store write.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub hashed_password: Option<String>,
    pub session_id: Option<Option<String>>,
    pub reset_token: Option<Option<String>>,
}

impl UserUpdate {
    pub fn hashed_password(mut self, hash: impl Into<String>) -> Self {
        self.hashed_password = Some(hash.into());
        self
    }

    pub fn session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn reset_token(mut self, reset_token: Option<String>) -> Self {
        self.reset_token = Some(reset_token);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hashed_password.is_none() && self.session_id.is_none() && self.reset_token.is_none()
    }

    /// Build an update from textual field/value pairs.
    ///
    /// A field name the user record does not have fails with
    /// `UnknownField` and the whole update is discarded.
    pub fn parse<'a, I>(fields: I) -> AuthResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut update = UserUpdate::default();
        for (field, value) in fields {
            match field {
                "hashed_password" => update.hashed_password = Some(value.to_string()),
                "session_id" => update.session_id = Some(Some(value.to_string())),
                "reset_token" => update.reset_token = Some(Some(value.to_string())),
                other => return Err(AuthError::UnknownField(other.to_string())),
            }
        }
        Ok(update)
    }
}

/// Persistence contract for user credentials
///
/// Implementations enforce the uniqueness invariants (email, session_id,
/// reset_token) at write time and provide read-your-writes consistency
/// within a process. Operations may block on I/O; callers hold no
/// in-process lock across them.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create a user. Duplicate email fails with `AlreadyExists`.
    async fn add_user(&self, email: &str, hashed_password: &str) -> AuthResult<UserRecord>;

    /// Look up the single user matching the predicate.
    /// Zero matches fail with `NotFound`.
    async fn find_user_by(&self, query: UserQuery) -> AuthResult<UserRecord>;

    /// Apply field updates to a user. All touched fields are written
    /// atomically; an absent user fails with `NotFound`.
    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parse_known_fields() {
        let id = Uuid::new_v4();
        assert_eq!(
            UserQuery::parse("id", &id.to_string()).unwrap(),
            UserQuery::Id(id)
        );
        assert_eq!(
            UserQuery::parse("email", "a@b.c").unwrap(),
            UserQuery::Email("a@b.c".to_string())
        );
    }

    #[test]
    fn test_query_parse_unknown_field() {
        let err = UserQuery::parse("no_email", "a@b.c").unwrap_err();
        assert!(matches!(err, AuthError::InvalidQuery(_)));
    }

    #[test]
    fn test_query_parse_bad_id() {
        let err = UserQuery::parse("id", "not-a-uuid").unwrap_err();
        assert!(matches!(err, AuthError::InvalidQuery(_)));
    }

    #[test]
    fn test_update_parse_unknown_field() {
        let err = UserUpdate::parse([("no_password", "x")]).unwrap_err();
        assert!(matches!(err, AuthError::UnknownField(f) if f == "no_password"));
    }

    #[test]
    fn test_update_builder() {
        let update = UserUpdate::default()
            .hashed_password("h")
            .reset_token(None);
        assert_eq!(update.hashed_password.as_deref(), Some("h"));
        assert_eq!(update.reset_token, Some(None));
        assert!(update.session_id.is_none());
        assert!(!update.is_empty());
    }
}
