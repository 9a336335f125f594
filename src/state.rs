//! Application state management
//!
//! Shared state handed to the transport layer's handlers via Axum's
//! state extraction.
//!
//! # Design Principles
//!
//! 1. **Built once at startup**: store and registry are created once
//! 2. **Cheap cloning**: all fields are Arc'd, cloning is O(1)
//! 3. **Immutable wiring**: configuration is read-only during request
//!    handling; the registry's interior mutex owns its mutation

use crate::config::AppConfig;
use crate::services::SessionRegistry;
use crate::store::CredentialStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Credential store (Postgres in production, in-memory elsewhere)
    pub store: Arc<dyn CredentialStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process-wide session registry for the non-store-backed variant
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn CredentialStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            registry: Arc::new(SessionRegistry::new()),
        }
    }

    /// Get a reference to the credential store
    #[inline]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the session registry
    #[inline]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}
