//! Authgate
//!
//! User-authentication primitives for a small web backend: password-based
//! registration and login, session-token issuance and lookup, single-use
//! password-reset tokens, and pluggable request-authorization schemes
//! (none, HTTP Basic, session).
//!
//! This crate is a library core. It owns the credential and session
//! lifecycle and the authorization decision; HTTP routing and process
//! startup belong to the consuming application.

pub mod auth;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod store;
