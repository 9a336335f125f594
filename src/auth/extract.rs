//! Transport glue for the authorization engine
//!
//! Provides an Axum extractor for handlers that always require an
//! identity, and a middleware layer that runs the full decision:
//! excluded-path check, then scheme-specific identity extraction.

use super::paths::requires_auth;
use crate::error::AuthError;
use crate::state::AppState;
use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

/// Authenticated user resolved by the active scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        // A previous middleware pass may already have resolved the user
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let auth = &state.config.auth;
        let identity = auth
            .scheme
            .extract_identity(&parts.headers, state.store.as_ref(), auth)
            .await?;

        match identity {
            Some(user_id) => Ok(AuthUser { user_id }),
            None if auth.scheme.presents_credentials(&parts.headers, auth) => Err(
                AuthError::Forbidden("credentials did not resolve to a user".to_string()),
            ),
            None => Err(AuthError::Unauthorized(
                "authentication required".to_string(),
            )),
        }
    }
}

/// Middleware running the full authorization decision
///
/// Exempt paths pass through unauthenticated. For checked paths the
/// resolved `AuthUser` is inserted into request extensions; requests
/// without credentials are rejected with 401, requests whose
/// credentials fail to resolve with 403. One pass per request, no
/// retries.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = &state.config.auth;
    let path = request.uri().path().to_string();

    if !requires_auth(&path, &auth.excluded_paths, auth.match_policy) {
        debug!(%path, "path exempt from authentication");
        return Ok(next.run(request).await);
    }

    let identity = auth
        .scheme
        .extract_identity(request.headers(), state.store.as_ref(), auth)
        .await?;

    let user_id = match identity {
        Some(user_id) => user_id,
        None if auth.scheme.presents_credentials(request.headers(), auth) => {
            return Err(AuthError::Forbidden(
                "credentials did not resolve to a user".to_string(),
            ));
        }
        None => {
            return Err(AuthError::Unauthorized(
                "authentication required".to_string(),
            ));
        }
    };

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}
