//! Request handlers and shared application state.

pub mod auth;
pub mod pages;
pub mod panel;

pub use auth::{login, login_page, logout, register, register_page};
pub use pages::{dashboard, index};
pub use panel::{panel, superuser_login, superuser_login_page};

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::{CredentialResolver, SessionManager, UsernameOrEmailResolver};
use crate::config::SessionConfig;
use crate::web::templates::Templates;
use crate::{Database, Result};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Account store.
    pub db: Database,
    /// Strategy used to turn login credentials into an account.
    pub resolver: Arc<dyn CredentialResolver>,
    /// Active sessions and the login limiter.
    pub sessions: Arc<Mutex<SessionManager>>,
    pub templates: Arc<Templates>,
    pub session_config: SessionConfig,
}

impl AppState {
    /// Create state with the username-or-email resolver.
    pub fn new(db: Database, session_config: SessionConfig) -> Result<Self> {
        let resolver = Arc::new(UsernameOrEmailResolver::new(db.pool().clone()));
        Ok(Self {
            sessions: Arc::new(Mutex::new(SessionManager::new(&session_config))),
            templates: Arc::new(Templates::new()?),
            resolver,
            db,
            session_config,
        })
    }

    /// Replace the credential resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn CredentialResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}
