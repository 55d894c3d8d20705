//! Request forms.

use serde::Deserialize;
use validator::Validate;

use super::validation::no_control_chars;

/// Login form, shared by the regular and superuser login pages.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    /// Username or email.
    #[serde(default)]
    #[validate(
        length(min = 1, message = "This field is required."),
        custom(function = "no_control_chars")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    /// Where to go after logging in.
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub username: String,
    /// Optional; an empty field means no email.
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// `?next=` on the login pages.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// Accept `next` only when it is a path on this site.
///
/// # Examples
///
/// ```
/// use vpspanel::web::dto::safe_next;
///
/// assert_eq!(safe_next(Some("/dashboard/")), Some("/dashboard/"));
/// assert_eq!(safe_next(Some("//evil.example")), None);
/// assert_eq!(safe_next(Some("https://evil.example")), None);
/// ```
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form_requires_fields() {
        let form = LoginForm {
            username: String::new(),
            password: String::new(),
            next: None,
        };
        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_login_form_rejects_control_chars() {
        let form = LoginForm {
            username: "bob\u{0}".to_string(),
            password: "x".to_string(),
            next: None,
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_register_form_valid() {
        let form = RegisterForm {
            username: "bob".to_string(),
            email: String::new(),
            password1: "Secret123!".to_string(),
            password2: "Secret123!".to_string(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(None), None);
        assert_eq!(safe_next(Some("/superuser/panel/")), Some("/superuser/panel/"));
        assert_eq!(safe_next(Some("dashboard/")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(Some("")), None);
    }
}
