//! In-process credential store
//!
//! Enforces the same uniqueness invariants the Postgres schema does.
//! Used by the test suite and suitable for single-process deployments
//! that do not need durable credentials.

use super::{CredentialStore, UserQuery, UserRecord, UserUpdate};
use crate::error::{AuthError, AuthResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(user: &UserRecord, query: &UserQuery) -> bool {
        match query {
            UserQuery::Id(id) => user.id == *id,
            UserQuery::Email(email) => user.email == *email,
            UserQuery::SessionId(sid) => user.session_id.as_deref() == Some(sid.as_str()),
            UserQuery::ResetToken(token) => user.reset_token.as_deref() == Some(token.as_str()),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn add_user(&self, email: &str, hashed_password: &str) -> AuthResult<UserRecord> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(AuthError::AlreadyExists(format!(
                "user with email {email} already exists"
            )));
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            session_id: None,
            reset_token: None,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by(&self, query: UserQuery) -> AuthResult<UserRecord> {
        let users = self.users.read().await;
        users
            .values()
            .find(|u| Self::matches(u, &query))
            .cloned()
            .ok_or_else(|| AuthError::NotFound("no matching user".to_string()))
    }

    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> AuthResult<()> {
        let mut users = self.users.write().await;

        // Uniqueness checks before touching the record
        if let Some(Some(sid)) = &update.session_id {
            if users
                .values()
                .any(|u| u.id != user_id && u.session_id.as_deref() == Some(sid.as_str()))
            {
                return Err(AuthError::AlreadyExists("session id in use".to_string()));
            }
        }
        if let Some(Some(token)) = &update.reset_token {
            if users
                .values()
                .any(|u| u.id != user_id && u.reset_token.as_deref() == Some(token.as_str()))
            {
                return Err(AuthError::AlreadyExists("reset token in use".to_string()));
            }
        }

        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AuthError::NotFound(format!("no user with id {user_id}")))?;

        // Applied under the write lock: other requests observe all of the
        // touched fields or none of them
        if let Some(hash) = update.hashed_password {
            user.hashed_password = hash;
        }
        if let Some(sid) = update.session_id {
            user.session_id = sid;
        }
        if let Some(token) = update.reset_token {
            user.reset_token = token;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_find_by_email() {
        let store = MemoryStore::new();
        let user = store.add_user("a@example.com", "hash").await.unwrap();
        let found = store
            .find_user_by(UserQuery::Email("a@example.com".to_string()))
            .await
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.hashed_password, "hash");
        assert!(found.session_id.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.add_user("a@example.com", "h1").await.unwrap();
        let err = store.add_user("a@example.com", "h2").await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_email_is_case_sensitive() {
        let store = MemoryStore::new();
        store.add_user("a@example.com", "h1").await.unwrap();
        // Different case is a different email
        store.add_user("A@example.com", "h2").await.unwrap();
        let err = store
            .find_user_by(UserQuery::Email("a@EXAMPLE.com".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .find_user_by(UserQuery::SessionId("nope".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_sets_and_clears_fields() {
        let store = MemoryStore::new();
        let user = store.add_user("a@example.com", "hash").await.unwrap();

        store
            .update_user(
                user.id,
                UserUpdate::default().session_id(Some("sid-1".to_string())),
            )
            .await
            .unwrap();
        let found = store
            .find_user_by(UserQuery::SessionId("sid-1".to_string()))
            .await
            .unwrap();
        assert_eq!(found.id, user.id);

        store
            .update_user(user.id, UserUpdate::default().session_id(None))
            .await
            .unwrap();
        let err = store
            .find_user_by(UserQuery::SessionId("sid-1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_user(Uuid::new_v4(), UserUpdate::default().hashed_password("h"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_password_and_token_update_is_atomic() {
        let store = MemoryStore::new();
        let user = store.add_user("a@example.com", "old").await.unwrap();
        store
            .update_user(
                user.id,
                UserUpdate::default().reset_token(Some("tok".to_string())),
            )
            .await
            .unwrap();

        store
            .update_user(
                user.id,
                UserUpdate::default().hashed_password("new").reset_token(None),
            )
            .await
            .unwrap();

        let found = store.find_user_by(UserQuery::Id(user.id)).await.unwrap();
        assert_eq!(found.hashed_password, "new");
        assert!(found.reset_token.is_none());
    }
}
