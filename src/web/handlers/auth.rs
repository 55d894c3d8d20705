//! Login, logout and registration handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use super::AppState;
use crate::auth::{
    self, FieldErrors, LimitKey, Principal, RegistrationError, RegistrationRequest, ResolveError,
    SessionError, GENERIC_LOGIN_ERROR,
};
use crate::db::{Account, AccountRepository};
use crate::web::dto::{safe_next, LoginForm, NextQuery, RegisterForm, ValidatedForm};
use crate::web::error::WebError;
use crate::web::middleware::{removal_cookie, session_cookie, CurrentPrincipal};
use crate::web::templates::{register_context, LoginView};

/// Where a successful login or registration lands by default.
pub const DASHBOARD_PATH: &str = "/dashboard/";

const LOCKED_MESSAGE: &str = "Too many failed login attempts. Please try again later.";

/// Result of checking submitted login credentials.
pub(crate) enum LoginAttempt {
    Authenticated(Account),
    Rejected {
        status: StatusCode,
        message: &'static str,
    },
}

impl LoginAttempt {
    fn locked() -> Self {
        LoginAttempt::Rejected {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: LOCKED_MESSAGE,
        }
    }

    fn failed() -> Self {
        LoginAttempt::Rejected {
            status: StatusCode::UNAUTHORIZED,
            message: GENERIC_LOGIN_ERROR,
        }
    }
}

async fn is_locked(state: &AppState, key: &LimitKey) -> bool {
    matches!(
        state.sessions.lock().await.check_login_allowed(key),
        Err(SessionError::Locked(_))
    )
}

/// Throttle, then resolve the submitted credentials.
///
/// Failures against a known account count toward that account whichever
/// identifier was typed; other failures count toward the identifier.
/// Every credential failure yields the same message; only store faults
/// are errors.
pub(crate) async fn attempt_login(
    state: &AppState,
    form: &LoginForm,
    errors: &FieldErrors,
) -> Result<LoginAttempt, WebError> {
    let identifier = form.username.trim();
    if !errors.is_empty() || identifier.is_empty() {
        return Ok(LoginAttempt::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: GENERIC_LOGIN_ERROR,
        });
    }

    if is_locked(state, &LimitKey::identifier(identifier)).await {
        return Ok(LoginAttempt::locked());
    }

    match state.resolver.resolve(identifier, &form.password).await {
        Ok(account) => {
            if is_locked(state, &LimitKey::Account(account.id)).await {
                return Ok(LoginAttempt::locked());
            }
            Ok(LoginAttempt::Authenticated(account))
        }
        Err(ResolveError::InvalidCredential { account_id }) => {
            let key = LimitKey::Account(account_id);
            if is_locked(state, &key).await {
                return Ok(LoginAttempt::locked());
            }
            state.sessions.lock().await.record_failure(key);
            warn!(identifier = %identifier, account_id, "Login failed: invalid credential");
            Ok(LoginAttempt::failed())
        }
        Err(e) if e.is_credential_failure() => {
            state
                .sessions
                .lock()
                .await
                .record_failure(LimitKey::identifier(identifier));
            warn!(identifier = %identifier, reason = %e, "Login failed");
            Ok(LoginAttempt::failed())
        }
        Err(e) => Err(WebError::internal(e.to_string())),
    }
}

/// Open a session for `account` and attach its cookie.
///
/// Any session the browser already carried is destroyed first, so a login
/// always issues a fresh token. `identifier` is the login name whose
/// failure count is cleared along with the account's.
pub(crate) async fn start_session(
    state: &AppState,
    jar: CookieJar,
    account: &Account,
    identifier: Option<&str>,
) -> CookieJar {
    let repo = AccountRepository::new(state.db.pool());
    if let Err(e) = repo.update_last_login(account.id).await {
        warn!(account_id = account.id, error = %e, "Failed to record last login");
    }

    let session = {
        let mut sessions = state.sessions.lock().await;
        if let Some(old) = jar.get(&state.session_config.cookie_name) {
            sessions.logout(old.value());
        }
        match identifier {
            Some(identifier) => sessions.login(identifier, account.id),
            None => sessions.create(account.id),
        }
    };

    info!(
        username = %account.username,
        account_id = account.id,
        "Login successful"
    );
    jar.add(session_cookie(&state.session_config, session.token))
}

pub(crate) fn render_login(
    state: &AppState,
    status: StatusCode,
    view: LoginView<'_>,
    principal: Option<&Principal>,
) -> Response {
    state
        .templates
        .page(status, "login.html", &view.into_context(principal))
}

/// GET /login/
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<NextQuery>,
) -> Response {
    let view = LoginView {
        heading: "Log in",
        form_action: "/login/",
        username: "",
        next: safe_next(query.next.as_deref()),
        error: None,
        notice: None,
    };
    render_login(&state, StatusCode::OK, view, principal.as_ref())
}

/// POST /login/ - username-or-email login.
pub async fn login(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    jar: CookieJar,
    ValidatedForm(form, errors): ValidatedForm<LoginForm>,
) -> Result<Response, WebError> {
    let next = safe_next(form.next.as_deref());
    let identifier = form.username.trim();

    match attempt_login(&state, &form, &errors).await? {
        LoginAttempt::Authenticated(account) => {
            let jar = start_session(&state, jar, &account, Some(identifier)).await;
            let target = next.unwrap_or(DASHBOARD_PATH);
            Ok((jar, Redirect::to(target)).into_response())
        }
        LoginAttempt::Rejected { status, message } => {
            let view = LoginView {
                heading: "Log in",
                form_action: "/login/",
                username: identifier,
                next,
                error: Some(message),
                notice: None,
            };
            Ok(render_login(&state, status, view, principal.as_ref()))
        }
    }
}

/// POST /logout/
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(&state.session_config.cookie_name) {
        state.sessions.lock().await.logout(cookie.value());
    }

    (
        jar.remove(removal_cookie(&state.session_config)),
        Redirect::to("/"),
    )
}

/// GET /register/
pub async fn register_page(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Response {
    let context = register_context(principal.as_ref(), "", "", &FieldErrors::new());
    state
        .templates
        .page(StatusCode::OK, "register.html", &context)
}

/// POST /register/ - create an ordinary account and log it in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    jar: CookieJar,
    ValidatedForm(form, form_errors): ValidatedForm<RegisterForm>,
) -> Result<Response, WebError> {
    let username = form.username.trim();
    let email = form.email.trim();

    let rejected = |errors: &FieldErrors| {
        let context = register_context(principal.as_ref(), username, email, errors);
        state
            .templates
            .page(StatusCode::UNPROCESSABLE_ENTITY, "register.html", &context)
    };

    if !form_errors.is_empty() {
        return Ok(rejected(&form_errors));
    }

    let request = RegistrationRequest::new(username, form.password1.as_str())
        .with_confirmation(form.password2.as_str())
        .with_email(email);

    let repo = AccountRepository::new(state.db.pool());
    match auth::register(&repo, request).await {
        Ok(account) => {
            let jar = start_session(&state, jar, &account, None).await;
            Ok((jar, Redirect::to(DASHBOARD_PATH)).into_response())
        }
        Err(RegistrationError::Validation(errors)) => Ok(rejected(&errors)),
        Err(e) => Err(WebError::internal(e.to_string())),
    }
}
