//! Superuser login and the administration panel.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use super::auth::{attempt_login, render_login, start_session, LoginAttempt};
use super::AppState;
use crate::auth::{authorize_panel_access, Principal, FORBIDDEN_MESSAGE};
use crate::db::AccountRepository;
use crate::web::dto::{safe_next, LoginForm, NextQuery, ValidatedForm};
use crate::web::error::{WebError, PANEL_PATH, SUPERUSER_LOGIN_PATH};
use crate::web::middleware::CurrentPrincipal;
use crate::web::templates::{page_context, AccountRow, LoginView};

const HEADING: &str = "Site administration";

fn wrong_account_notice(principal: Option<&Principal>) -> Option<String> {
    principal.filter(|p| !p.is_superuser).map(|p| {
        format!(
            "You are authenticated as {}, but are not authorized to access this page. \
             Would you like to log in to a different account?",
            p.username
        )
    })
}

/// GET /superuser/login/
pub async fn superuser_login_page(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());

    if principal.as_ref().is_some_and(|p| p.is_superuser) {
        return Redirect::to(next.unwrap_or(PANEL_PATH)).into_response();
    }

    let view = LoginView {
        heading: HEADING,
        form_action: SUPERUSER_LOGIN_PATH,
        username: "",
        next,
        error: None,
        notice: wrong_account_notice(principal.as_ref()),
    };
    render_login(&state, StatusCode::OK, view, principal.as_ref())
}

/// POST /superuser/login/ - like the regular login, but only superusers get
/// a session.
pub async fn superuser_login(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    jar: CookieJar,
    ValidatedForm(form, errors): ValidatedForm<LoginForm>,
) -> Result<Response, WebError> {
    let next = safe_next(form.next.as_deref());
    let identifier = form.username.trim();

    let (status, message) = match attempt_login(&state, &form, &errors).await? {
        LoginAttempt::Authenticated(account) if account.is_superuser => {
            let jar = start_session(&state, jar, &account, Some(identifier)).await;
            let target = next.unwrap_or(PANEL_PATH);
            return Ok((jar, Redirect::to(target)).into_response());
        }
        LoginAttempt::Authenticated(account) => {
            info!(
                account_id = account.id,
                "Superuser login refused for ordinary account"
            );
            (StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE)
        }
        LoginAttempt::Rejected { status, message } => (status, message),
    };

    let view = LoginView {
        heading: HEADING,
        form_action: SUPERUSER_LOGIN_PATH,
        username: identifier,
        next,
        error: Some(message),
        notice: wrong_account_notice(principal.as_ref()),
    };
    Ok(render_login(&state, status, view, principal.as_ref()))
}

/// GET /superuser/panel/ - every account, for superusers only.
pub async fn panel(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Response, WebError> {
    let repo = AccountRepository::new(state.db.pool());
    let accounts = authorize_panel_access(principal.as_ref(), &repo).await?;

    let rows: Vec<AccountRow> = accounts.into_iter().map(AccountRow::from).collect();
    let mut context = page_context(principal.as_ref());
    context.insert("accounts", &rows);

    Ok(state.templates.page(StatusCode::OK, "panel.html", &context))
}
