//! Web UI for vpspanel.
//!
//! Server-rendered pages for registration, login and the superuser panel,
//! with cookie-backed sessions.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod templates;

pub use error::WebError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
