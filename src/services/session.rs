//! Session lifecycle
//!
//! Two session mechanisms share the same token shape (UUIDv4, 128-bit
//! random, text-encoded) but differ in where the binding lives:
//! `SessionManager` persists the session id on the user record through
//! the credential store; `SessionRegistry` keeps an in-process map
//! scoped to the process lifetime.

use crate::auth::{session_token, Credentials, SessionSource};
use crate::error::{AuthError, AuthResult};
use crate::store::{CredentialStore, UserQuery, UserUpdate};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Store-backed session manager
///
/// At most one active session per user: creating a session overwrites
/// any prior session id.
pub struct SessionManager;

impl SessionManager {
    /// Mint a session id for the user and persist it
    ///
    /// Returns `Ok(None)` if the user does not exist.
    pub async fn create_session(
        store: &dyn CredentialStore,
        user_id: Uuid,
    ) -> AuthResult<Option<String>> {
        let user = match store.find_user_by(UserQuery::Id(user_id)).await {
            Ok(user) => user,
            Err(AuthError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let session_id = Uuid::new_v4().to_string();
        store
            .update_user(
                user.id,
                UserUpdate::default().session_id(Some(session_id.clone())),
            )
            .await?;
        debug!(user_id = %user.id, "session created");
        Ok(Some(session_id))
    }

    /// Reverse lookup: session id to user id
    ///
    /// Blank input short-circuits to `None` before any store access.
    pub async fn user_id_for_session(
        store: &dyn CredentialStore,
        session_id: &str,
    ) -> AuthResult<Option<Uuid>> {
        if session_id.trim().is_empty() {
            return Ok(None);
        }
        match store
            .find_user_by(UserQuery::SessionId(session_id.to_string()))
            .await
        {
            Ok(user) => Ok(Some(user.id)),
            Err(AuthError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Clear the user's session id
    ///
    /// Idempotent: destroying an already-cleared or unknown session
    /// succeeds silently.
    pub async fn destroy_session(store: &dyn CredentialStore, user_id: Uuid) -> AuthResult<()> {
        match store
            .update_user(user_id, UserUpdate::default().session_id(None))
            .await
        {
            Ok(()) => {
                debug!(%user_id, "session destroyed");
                Ok(())
            }
            Err(AuthError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Process-wide session registry, independent of the credential store
///
/// Shared mutable state accessed by concurrently handled requests; all
/// access goes through the internal mutex. Entries live for the process
/// lifetime unless destroyed.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Uuid>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh session id for the user and return it
    pub fn create_session(&self, user_id: Uuid) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .expect("session registry poisoned")
            .insert(session_id.clone(), user_id);
        debug!(%user_id, "registry session created");
        session_id
    }

    /// Look up the user bound to a session id
    pub fn user_id_for_session(&self, session_id: &str) -> Option<Uuid> {
        if session_id.trim().is_empty() {
            return None;
        }
        self.sessions
            .lock()
            .expect("session registry poisoned")
            .get(session_id)
            .copied()
    }

    /// Remove the session carried by the request's credentials
    ///
    /// Returns whether a removal occurred.
    pub fn destroy_session<C>(&self, creds: &C, source: SessionSource, cookie_name: &str) -> bool
    where
        C: Credentials + ?Sized,
    {
        let Some(session_id) = session_token(creds, source, cookie_name) else {
            return false;
        };
        let removed = self
            .sessions
            .lock()
            .expect("session registry poisoned")
            .remove(&session_id)
            .is_some();
        if removed {
            debug!("registry session destroyed");
        }
        removed
    }
}
