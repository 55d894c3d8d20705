//! Session cookie handling and the principal extractor.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;

use crate::auth::Principal;
use crate::config::SessionConfig;
use crate::db::AccountRepository;
use crate::web::error::WebError;
use crate::web::handlers::AppState;

/// The principal behind the request, if its session is valid.
///
/// Never rejects for a missing or stale session; handlers decide what an
/// anonymous request may see. Only store failures are errors.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentPrincipal {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar
            .get(&state.session_config.cookie_name)
            .map(|c| c.value().to_string())
        else {
            return Ok(CurrentPrincipal(None));
        };

        principal_for_token(state, &token)
            .await
            .map(CurrentPrincipal)
    }
}

/// Resolve a session token to a fresh principal.
///
/// The account is reloaded on every call. When the account has been removed
/// or deactivated, every session it holds is destroyed and the request is
/// treated as anonymous.
pub async fn principal_for_token(
    state: &AppState,
    token: &str,
) -> Result<Option<Principal>, WebError> {
    let account_id = {
        let mut sessions = state.sessions.lock().await;
        match sessions.get(token) {
            Ok(session) => session.account_id,
            Err(e) => {
                debug!(error = %e, "Ignoring session cookie");
                return Ok(None);
            }
        }
    };

    let repo = AccountRepository::new(state.db.pool());
    match repo.get_by_id(account_id).await? {
        Some(account) if account.can_authenticate() => Ok(Some(Principal::from(&account))),
        _ => {
            debug!(account_id = account_id, "Session account missing or inactive");
            state.sessions.lock().await.logout_account(account_id);
            Ok(None)
        }
    }
}

/// Build the session cookie for a new session token.
pub fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .path("/")
        .build()
}

/// Cookie matching [`session_cookie`]'s name and path, for removal.
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), ""))
        .path("/")
        .build()
}
