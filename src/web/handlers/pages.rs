//! Public pages.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};

use super::AppState;
use crate::web::middleware::CurrentPrincipal;
use crate::web::templates::page_context;

/// GET / - landing page.
pub async fn index(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Response {
    state
        .templates
        .page(StatusCode::OK, "index.html", &page_context(principal.as_ref()))
}

/// GET /dashboard/ - greets the logged-in account.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Response {
    state.templates.page(
        StatusCode::OK,
        "dashboard.html",
        &page_context(principal.as_ref()),
    )
}
