//! Request-authorization schemes
//!
//! One contract, three variants: `None` (never yields an identity),
//! `Basic` (RFC 7617 email:password against the credential store), and
//! `Session` (session id from a cookie or the Authorization header,
//! resolved through the session manager). The active variant is chosen
//! by configuration, not subclassing.

use crate::auth::PasswordService;
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::services::SessionManager;
use crate::store::{CredentialStore, UserQuery};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Which authorization scheme is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    /// No identity extraction capability; the default/fallback
    #[default]
    None,
    /// HTTP Basic: base64(email:password) in the Authorization header
    Basic,
    /// Opaque session id correlated to a previously authenticated user
    Session,
}

/// Where the session scheme reads the session id from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    /// Named cookie (name from configuration)
    #[default]
    Cookie,
    /// Raw Authorization header value used directly as the session id
    AuthorizationHeader,
}

/// Credential carrier delivered by the transport layer
///
/// The core never parses raw wire bytes; the transport exposes headers
/// and cookies through this trait.
pub trait Credentials {
    /// Header value by case-insensitive name, if present and valid text
    fn header(&self, name: &str) -> Option<&str>;
    /// Cookie value by exact name, if present
    fn cookie(&self, name: &str) -> Option<&str>;
}

impl Credentials for axum::http::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        let raw = self
            .get(axum::http::header::COOKIE)
            .and_then(|v| v.to_str().ok())?;
        raw.split(';').find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then_some(v)
        })
    }
}

/// Plain credential carrier for non-HTTP callers and tests
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }
}

impl Credentials for StaticCredentials {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Raw Authorization header value, or none if absent
pub fn authorization_header<C: Credentials + ?Sized>(creds: &C) -> Option<&str> {
    creds.header("authorization")
}

/// Session id from the request, per the configured carrier
pub fn session_token<C: Credentials + ?Sized>(
    creds: &C,
    source: SessionSource,
    cookie_name: &str,
) -> Option<String> {
    let token = match source {
        SessionSource::Cookie => creds.cookie(cookie_name)?,
        SessionSource::AuthorizationHeader => authorization_header(creds)?,
    };
    if token.trim().is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Decode an Authorization header carrying Basic credentials
///
/// Requires the exact case-sensitive `"Basic "` prefix, valid base64,
/// valid UTF-8, and a `:` separator. The decoded text is split on the
/// first `:` only, so the password may itself contain `:`.
pub fn decode_basic(header: &str) -> AuthResult<(String, String)> {
    let encoded = header
        .strip_prefix("Basic ")
        .ok_or_else(|| AuthError::MalformedCredential("missing Basic prefix".to_string()))?;
    let decoded = BASE64
        .decode(encoded)
        .map_err(|_| AuthError::MalformedCredential("invalid base64 payload".to_string()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AuthError::MalformedCredential("payload is not UTF-8".to_string()))?;
    let (email, password) = decoded
        .split_once(':')
        .ok_or_else(|| AuthError::MalformedCredential("missing ':' separator".to_string()))?;
    Ok((email.to_string(), password.to_string()))
}

impl SchemeKind {
    /// Extract the caller's identity from the request credentials
    ///
    /// Returns `Ok(None)` whenever no identity can be established:
    /// absent or malformed credentials, unknown user, failed password
    /// verification, or a session miss. Only store/hasher failures
    /// surface as errors.
    pub async fn extract_identity<C>(
        &self,
        creds: &C,
        store: &dyn CredentialStore,
        auth: &AuthConfig,
    ) -> AuthResult<Option<Uuid>>
    where
        C: Credentials + Sync + ?Sized,
    {
        match self {
            SchemeKind::None => Ok(None),
            SchemeKind::Basic => {
                let Some(header) = authorization_header(creds) else {
                    return Ok(None);
                };
                let (email, password) = match decode_basic(header) {
                    Ok(parts) => parts,
                    Err(AuthError::MalformedCredential(reason)) => {
                        debug!(%reason, "rejecting malformed Basic credential");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };
                let user = match store.find_user_by(UserQuery::Email(email)).await {
                    Ok(user) => user,
                    Err(AuthError::NotFound(_)) => return Ok(None),
                    Err(e) => return Err(e),
                };
                let valid = PasswordService::verify_async(password, user.hashed_password)
                    .await
                    .map_err(AuthError::Internal)?;
                Ok(valid.then_some(user.id))
            }
            SchemeKind::Session => {
                let Some(token) = session_token(creds, auth.session_source, &auth.session_cookie)
                else {
                    return Ok(None);
                };
                SessionManager::user_id_for_session(store, &token).await
            }
        }
    }

    /// Whether the request presents credentials for this scheme at all
    ///
    /// Distinguishes "no credentials" (401) from "credentials that failed
    /// to resolve to an identity" (403) at the boundary.
    pub fn presents_credentials<C>(&self, creds: &C, auth: &AuthConfig) -> bool
    where
        C: Credentials + ?Sized,
    {
        match self {
            SchemeKind::None => false,
            SchemeKind::Basic => authorization_header(creds).is_some(),
            SchemeKind::Session => {
                session_token(creds, auth.session_source, &auth.session_cookie).is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordService;
    use crate::store::MemoryStore;

    fn basic_header(email: &str, password: &str) -> String {
        format!("Basic {}", BASE64.encode(format!("{email}:{password}")))
    }

    fn session_config() -> AuthConfig {
        AuthConfig {
            scheme: SchemeKind::Session,
            session_cookie: "_session_id".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_decode_basic_roundtrip() {
        let header = basic_header("bob@example.com", "sec:ret");
        let (email, password) = decode_basic(&header).unwrap();
        assert_eq!(email, "bob@example.com");
        // Split on the first ':' only
        assert_eq!(password, "sec:ret");
    }

    #[test]
    fn test_decode_basic_rejects_wrong_prefix() {
        for header in ["basic Ym9iOnB3", "Bearer Ym9iOnB3", "BasicYm9iOnB3"] {
            let err = decode_basic(header).unwrap_err();
            assert!(matches!(err, AuthError::MalformedCredential(_)), "{header}");
        }
    }

    #[test]
    fn test_decode_basic_rejects_bad_payload() {
        // Not base64
        assert!(decode_basic("Basic !!!").is_err());
        // No separator
        let no_colon = format!("Basic {}", BASE64.encode("bobexample"));
        assert!(decode_basic(&no_colon).is_err());
    }

    #[tokio::test]
    async fn test_none_scheme_never_yields_identity() {
        let store = MemoryStore::new();
        let creds =
            StaticCredentials::new().with_header("authorization", "Basic anything");
        let identity = SchemeKind::None
            .extract_identity(&creds, &store, &AuthConfig::default())
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_basic_scheme_accepts_valid_credentials() {
        let store = MemoryStore::new();
        let hash = PasswordService::hash("secret").unwrap();
        let user = store.add_user("bob@example.com", &hash).await.unwrap();

        let creds = StaticCredentials::new()
            .with_header("authorization", &basic_header("bob@example.com", "secret"));
        let identity = SchemeKind::Basic
            .extract_identity(&creds, &store, &AuthConfig::default())
            .await
            .unwrap();
        assert_eq!(identity, Some(user.id));
    }

    #[tokio::test]
    async fn test_basic_scheme_rejects_wrong_password() {
        let store = MemoryStore::new();
        let hash = PasswordService::hash("secret").unwrap();
        store.add_user("bob@example.com", &hash).await.unwrap();

        let creds = StaticCredentials::new()
            .with_header("authorization", &basic_header("bob@example.com", "nope"));
        let identity = SchemeKind::Basic
            .extract_identity(&creds, &store, &AuthConfig::default())
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_basic_scheme_rejects_unknown_user_and_bad_header() {
        let store = MemoryStore::new();
        let cfg = AuthConfig::default();

        let unknown = StaticCredentials::new()
            .with_header("authorization", &basic_header("ghost@example.com", "pw"));
        assert!(SchemeKind::Basic
            .extract_identity(&unknown, &store, &cfg)
            .await
            .unwrap()
            .is_none());

        let no_prefix =
            StaticCredentials::new().with_header("authorization", "Token abc");
        assert!(SchemeKind::Basic
            .extract_identity(&no_prefix, &store, &cfg)
            .await
            .unwrap()
            .is_none());

        let absent = StaticCredentials::new();
        assert!(SchemeKind::Basic
            .extract_identity(&absent, &store, &cfg)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_session_scheme_resolves_cookie() {
        let store = MemoryStore::new();
        let user = store.add_user("bob@example.com", "hash").await.unwrap();
        let sid = SessionManager::create_session(&store, user.id)
            .await
            .unwrap()
            .unwrap();

        let cfg = session_config();
        let creds = StaticCredentials::new().with_cookie("_session_id", &sid);
        let identity = SchemeKind::Session
            .extract_identity(&creds, &store, &cfg)
            .await
            .unwrap();
        assert_eq!(identity, Some(user.id));

        let wrong_cookie = StaticCredentials::new().with_cookie("other", &sid);
        assert!(SchemeKind::Session
            .extract_identity(&wrong_cookie, &store, &cfg)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_session_scheme_header_variant() {
        let store = MemoryStore::new();
        let user = store.add_user("bob@example.com", "hash").await.unwrap();
        let sid = SessionManager::create_session(&store, user.id)
            .await
            .unwrap()
            .unwrap();

        let cfg = AuthConfig {
            session_source: SessionSource::AuthorizationHeader,
            ..session_config()
        };
        let creds = StaticCredentials::new().with_header("authorization", &sid);
        let identity = SchemeKind::Session
            .extract_identity(&creds, &store, &cfg)
            .await
            .unwrap();
        assert_eq!(identity, Some(user.id));
    }

    #[test]
    fn test_header_map_cookie_parsing() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "theme=dark; _session_id=abc123; lang=en".parse().unwrap(),
        );
        assert_eq!(headers.cookie("_session_id"), Some("abc123"));
        assert_eq!(headers.cookie("lang"), Some("en"));
        assert_eq!(headers.cookie("missing"), None);
    }
}
