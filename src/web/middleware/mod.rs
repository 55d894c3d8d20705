//! Middleware and extractors for the web layer.

pub mod auth;
pub mod security;

pub use auth::{principal_for_token, removal_cookie, session_cookie, CurrentPrincipal};
pub use security::security_headers;
