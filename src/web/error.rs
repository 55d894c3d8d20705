//! Error responses for the web layer.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::auth::{AccessError, FORBIDDEN_MESSAGE};
use crate::PanelError;

/// Where unauthenticated panel requests are sent.
pub const SUPERUSER_LOGIN_PATH: &str = "/superuser/login/";

/// The gated administration page.
pub const PANEL_PATH: &str = "/superuser/panel/";

/// Web error type.
#[derive(Debug)]
pub enum WebError {
    /// No session: redirect to the superuser login, returning to `next`.
    Unauthorized { next: String },
    /// Authenticated but not allowed.
    Forbidden,
    /// Anything the client cannot fix. The detail is logged, not shown.
    Internal(String),
}

impl WebError {
    pub fn internal(message: impl Into<String>) -> Self {
        WebError::Internal(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::Unauthorized { .. } => StatusCode::SEE_OTHER,
            WebError::Forbidden => StatusCode::FORBIDDEN,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Redirect target for an unauthenticated request to `next`.
pub fn login_redirect_target(next: &str) -> String {
    format!("{SUPERUSER_LOGIN_PATH}?next={}", urlencoding::encode(next))
}

fn error_page(title: &str, message: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n<p>{message}</p>\n<p><a href=\"/\">Home</a></p>\n</body>\n</html>\n"
    ))
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            WebError::Unauthorized { next } => {
                Redirect::to(&login_redirect_target(&next)).into_response()
            }
            WebError::Forbidden => (
                status,
                error_page("403 Forbidden", FORBIDDEN_MESSAGE),
            )
                .into_response(),
            WebError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    status,
                    error_page("Server Error (500)", "A server error occurred."),
                )
                    .into_response()
            }
        }
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebError::Unauthorized { next } => write!(f, "unauthorized (next: {next})"),
            WebError::Forbidden => write!(f, "forbidden"),
            WebError::Internal(detail) => write!(f, "internal error: {detail}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<PanelError> for WebError {
    fn from(err: PanelError) -> Self {
        WebError::Internal(err.to_string())
    }
}

impl From<AccessError> for WebError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthorized => WebError::Unauthorized {
                next: PANEL_PATH.to_string(),
            },
            AccessError::Forbidden => WebError::Forbidden,
            AccessError::Store(detail) => WebError::Internal(detail),
        }
    }
}
