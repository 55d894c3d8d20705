//! Server-side HTML rendering with Tera.
//!
//! Templates are compiled into the binary; no filesystem access is needed
//! at runtime. Tera autoescapes every `.html` template.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tera::{Context, Tera};

use crate::auth::{FieldErrors, Principal};
use crate::db::Account;

const TPL_BASE: &str = include_str!("../../templates/base.html");
const TPL_INDEX: &str = include_str!("../../templates/index.html");
const TPL_DASHBOARD: &str = include_str!("../../templates/dashboard.html");
const TPL_LOGIN: &str = include_str!("../../templates/login.html");
const TPL_REGISTER: &str = include_str!("../../templates/register.html");
const TPL_PANEL: &str = include_str!("../../templates/panel.html");

/// Compiled page templates.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Compile the embedded templates.
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        // Added together so child templates can resolve `base.html`.
        tera.add_raw_templates(vec![
            ("base.html", TPL_BASE),
            ("index.html", TPL_INDEX),
            ("dashboard.html", TPL_DASHBOARD),
            ("login.html", TPL_LOGIN),
            ("register.html", TPL_REGISTER),
            ("panel.html", TPL_PANEL),
        ])?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, context)
    }

    /// Render a page with the given status; template failures become a
    /// plain-text 500.
    pub fn page(&self, status: StatusCode, name: &str, context: &Context) -> Response {
        match self.render(name, context) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(err) => {
                tracing::error!(template = name, error = %err, "Template error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A server error occurred.",
                )
                    .into_response()
            }
        }
    }
}

/// Base context shared by every page: the navigation needs the principal.
pub fn page_context(principal: Option<&Principal>) -> Context {
    let mut context = Context::new();
    context.insert("principal", &principal.map(PrincipalView::from));
    context
}

#[derive(Serialize)]
struct PrincipalView<'a> {
    username: &'a str,
    is_superuser: bool,
}

impl<'a> From<&'a Principal> for PrincipalView<'a> {
    fn from(p: &'a Principal) -> Self {
        Self {
            username: &p.username,
            is_superuser: p.is_superuser,
        }
    }
}

/// Values for the login form.
pub struct LoginView<'a> {
    pub heading: &'a str,
    pub form_action: &'a str,
    pub username: &'a str,
    pub next: Option<&'a str>,
    pub error: Option<&'a str>,
    pub notice: Option<String>,
}

impl LoginView<'_> {
    pub fn into_context(self, principal: Option<&Principal>) -> Context {
        let mut context = page_context(principal);
        context.insert("heading", self.heading);
        context.insert("form_action", self.form_action);
        context.insert("username", self.username);
        context.insert("next", &self.next.unwrap_or_default());
        context.insert("error", &self.error.unwrap_or_default());
        context.insert("notice", &self.notice.unwrap_or_default());
        context
    }
}

/// Field errors laid out for the registration template.
#[derive(Debug, Default, Serialize)]
pub struct RegisterErrors {
    pub username: Vec<String>,
    pub email: Vec<String>,
    pub password1: Vec<String>,
    pub password2: Vec<String>,
}

impl From<&FieldErrors> for RegisterErrors {
    fn from(errors: &FieldErrors) -> Self {
        Self {
            username: errors.get("username").to_vec(),
            email: errors.get("email").to_vec(),
            password1: errors.get("password1").to_vec(),
            password2: errors.get("password2").to_vec(),
        }
    }
}

/// Context for the registration form, echoing back non-secret fields.
pub fn register_context(
    principal: Option<&Principal>,
    username: &str,
    email: &str,
    errors: &FieldErrors,
) -> Context {
    let mut context = page_context(principal);
    context.insert("username", username);
    context.insert("email", email);
    context.insert("errors", &RegisterErrors::from(errors));
    context
}

/// One row of the administration table. The password hash stays out.
#[derive(Debug, Serialize)]
pub struct AccountRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: String,
    pub last_login: String,
}

impl From<Account> for AccountRow {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email.unwrap_or_default(),
            is_superuser: account.is_superuser,
            is_active: account.is_active,
            date_joined: account.date_joined,
            last_login: account.last_login.unwrap_or_else(|| "never".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Principal {
        Principal {
            account_id: 1,
            username: "root".to_string(),
            is_superuser: true,
        }
    }

    #[test]
    fn test_templates_compile() {
        assert!(Templates::new().is_ok());
    }

    #[test]
    fn test_index_navigation_depends_on_principal() {
        let templates = Templates::new().unwrap();

        let anonymous = templates.render("index.html", &page_context(None)).unwrap();
        assert!(anonymous.contains("href=\"/login/\""));
        assert!(!anonymous.contains("Log out"));

        let root = root();
        let signed_in = templates
            .render("index.html", &page_context(Some(&root)))
            .unwrap();
        assert!(signed_in.contains("Signed in as root"));
        assert!(signed_in.contains("/superuser/panel/"));
    }

    #[test]
    fn test_login_escapes_user_input() {
        let templates = Templates::new().unwrap();
        let view = LoginView {
            heading: "Log in",
            form_action: "/login/",
            username: "<script>alert(1)</script>",
            next: None,
            error: Some("Bad"),
            notice: None,
        };

        let html = templates
            .render("login.html", &view.into_context(None))
            .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Bad"));
    }

    #[test]
    fn test_register_shows_field_errors() {
        let templates = Templates::new().unwrap();
        let mut errors = FieldErrors::new();
        errors.add("username", "A user with that username already exists.");

        let html = templates
            .render("register.html", &register_context(None, "bob", "", &errors))
            .unwrap();
        assert!(html.contains("A user with that username already exists."));
        assert!(html.contains("value=\"bob\""));
    }

    #[test]
    fn test_panel_lists_accounts() {
        let templates = Templates::new().unwrap();
        let rows = vec![AccountRow::from(Account {
            id: 3,
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            password: "secret-hash".to_string(),
            is_superuser: false,
            is_active: true,
            date_joined: "2024-01-01 00:00:00".to_string(),
            last_login: None,
        })];
        let mut context = page_context(Some(&root()));
        context.insert("accounts", &rows);

        let html = templates.render("panel.html", &context).unwrap();
        assert!(html.contains("alice@example.com"));
        assert!(html.contains("never"));
        assert!(!html.contains("secret-hash"));
    }

    #[test]
    fn test_page_falls_back_on_missing_template() {
        let templates = Templates::new().unwrap();
        let response = templates.page(StatusCode::OK, "missing.html", &Context::new());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
