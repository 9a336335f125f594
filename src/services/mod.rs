//! Credential and session lifecycle services

mod account;
mod reset;
mod session;

pub use account::AccountService;
pub use reset::ResetTokenManager;
pub use session::{SessionManager, SessionRegistry};
