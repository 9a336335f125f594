//! Password-reset tokens
//!
//! Single-use opaque tokens permitting one password change. Delivery of
//! the token to the user (e.g. email) is outside this crate.

use crate::auth::PasswordService;
use crate::error::{AuthError, AuthResult};
use crate::store::{CredentialStore, UserQuery, UserUpdate};
use tracing::debug;
use uuid::Uuid;

pub struct ResetTokenManager;

impl ResetTokenManager {
    /// Issue a reset token for the user with this email
    ///
    /// Replaces any outstanding token, so exactly one is valid per user.
    /// An unknown email surfaces as `Forbidden`: the single signal the
    /// boundary is allowed to leak about email existence.
    pub async fn issue_reset_token(
        store: &dyn CredentialStore,
        email: &str,
    ) -> AuthResult<String> {
        let user = match store
            .find_user_by(UserQuery::Email(email.to_string()))
            .await
        {
            Ok(user) => user,
            Err(AuthError::NotFound(_)) => {
                return Err(AuthError::Forbidden("reset not permitted".to_string()))
            }
            Err(e) => return Err(e),
        };

        let token = Uuid::new_v4().to_string();
        store
            .update_user(user.id, UserUpdate::default().reset_token(Some(token.clone())))
            .await?;
        debug!(user_id = %user.id, "reset token issued");
        Ok(token)
    }

    /// Consume a reset token and set a new password
    ///
    /// Writes the new password hash and clears the token in a single
    /// store update, so the token can never outlive a completed password
    /// change. A missing or already-consumed token fails with
    /// `InvalidToken`.
    pub async fn consume_reset_token(
        store: &dyn CredentialStore,
        token: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        let user = match store
            .find_user_by(UserQuery::ResetToken(token.to_string()))
            .await
        {
            Ok(user) => user,
            Err(AuthError::NotFound(_)) => return Err(AuthError::InvalidToken),
            Err(e) => return Err(e),
        };

        let hashed = PasswordService::hash_async(new_password.to_string())
            .await
            .map_err(AuthError::Internal)?;

        store
            .update_user(
                user.id,
                UserUpdate::default().hashed_password(hashed).reset_token(None),
            )
            .await?;
        debug!(user_id = %user.id, "reset token consumed");
        Ok(())
    }
}
