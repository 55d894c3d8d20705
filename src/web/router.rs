//! Router configuration for the web UI.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use super::handlers::{
    dashboard, index, login, login_page, logout, panel, register, register_page,
    superuser_login, superuser_login_page, AppState,
};
use super::middleware::security_headers;

/// Create the main page router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Account pages (open to everyone)
    let account_routes = Router::new()
        .route("/register/", get(register_page).post(register))
        .route("/login/", get(login_page).post(login))
        .route("/logout/", post(logout));

    // Administration (gated inside the handlers)
    let superuser_routes = Router::new()
        .route("/login/", get(superuser_login_page).post(superuser_login))
        .route("/panel/", get(panel));

    Router::new()
        .route("/", get(index))
        .route("/dashboard/", get(dashboard))
        .merge(account_routes)
        .nest("/superuser", superuser_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(security_headers))
                .layer(CompressionLayer::new()),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
