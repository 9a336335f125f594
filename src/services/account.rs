//! Account service for registration, login, and session-bound access
//!
//! # Performance
//!
//! Password hashing and verification run on the blocking thread pool
//! via `spawn_blocking`; the store may block on I/O and is awaited
//! without holding any in-process lock.

use crate::auth::PasswordService;
use crate::error::{AuthError, AuthResult};
use crate::services::SessionManager;
use crate::store::{CredentialStore, UserQuery, UserRecord};
use tracing::info;
use validator::ValidateEmail;

pub struct AccountService;

impl AccountService {
    /// Register a new user
    ///
    /// Hashes the password and stores the credential; a duplicate email
    /// fails with `AlreadyExists` and reaches the boundary as a 409.
    pub async fn register(
        store: &dyn CredentialStore,
        email: &str,
        password: &str,
    ) -> AuthResult<UserRecord> {
        if !email.validate_email() {
            return Err(AuthError::Validation("Invalid email format".to_string()));
        }

        let hashed = PasswordService::hash_async(password.to_string())
            .await
            .map_err(AuthError::Internal)?;

        let user = store.add_user(email, &hashed).await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Login with email and password, minting a new session
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller: both fail with `Unauthorized`.
    pub async fn login(
        store: &dyn CredentialStore,
        email: &str,
        password: &str,
    ) -> AuthResult<String> {
        let user = match store
            .find_user_by(UserQuery::Email(email.to_string()))
            .await
        {
            Ok(user) => user,
            Err(AuthError::NotFound(_)) => {
                return Err(AuthError::Unauthorized("Invalid credentials".to_string()))
            }
            Err(e) => return Err(e),
        };

        let valid = PasswordService::verify_async(password.to_string(), user.hashed_password)
            .await
            .map_err(AuthError::Internal)?;
        if !valid {
            return Err(AuthError::Unauthorized("Invalid credentials".to_string()));
        }

        let session_id = SessionManager::create_session(store, user.id)
            .await?
            // The user resolved above; a miss here means it vanished mid-login
            .ok_or_else(|| AuthError::Unauthorized("Invalid credentials".to_string()))?;
        info!(user_id = %user.id, "user logged in");
        Ok(session_id)
    }

    /// Destroy the session identified by `session_id`
    ///
    /// A session that does not resolve to a user fails with `Forbidden`.
    pub async fn logout(store: &dyn CredentialStore, session_id: &str) -> AuthResult<()> {
        let user_id = SessionManager::user_id_for_session(store, session_id)
            .await?
            .ok_or_else(|| AuthError::Forbidden("unknown session".to_string()))?;
        SessionManager::destroy_session(store, user_id).await?;
        info!(%user_id, "user logged out");
        Ok(())
    }

    /// Fetch the user bound to a live session
    pub async fn profile(store: &dyn CredentialStore, session_id: &str) -> AuthResult<UserRecord> {
        let user_id = SessionManager::user_id_for_session(store, session_id)
            .await?
            .ok_or_else(|| AuthError::Forbidden("unknown session".to_string()))?;
        store.find_user_by(UserQuery::Id(user_id)).await
    }
}
