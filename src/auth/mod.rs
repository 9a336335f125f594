//! Authorization engine
//!
//! Password hashing, excluded-path matching, and the pluggable
//! request-authorization schemes (none, HTTP Basic, session).

mod extract;
mod password;
mod paths;
mod scheme;

pub use extract::{auth_middleware, AuthUser};
pub use password::PasswordService;
pub use paths::{requires_auth, MatchPolicy};
pub use scheme::{
    authorization_header, decode_basic, session_token, Credentials, SchemeKind, SessionSource,
    StaticCredentials,
};
