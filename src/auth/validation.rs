//! Registration input validation.
//!
//! Field rules follow the usual account-creation form: a short username
//! made of letters, digits and `@.+-_`, a password that is long enough and
//! not trivially guessable, a matching confirmation, and an optional email.

use std::collections::BTreeMap;

use thiserror::Error;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors. The display text is what the form shows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("This field is required.")]
    Required,

    #[error("Ensure this value has at most {MAX_USERNAME_LENGTH} characters.")]
    UsernameTooLong,

    #[error("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.")]
    UsernameInvalidChars,

    #[error("A user with that username already exists.")]
    UsernameTaken,

    #[error("This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters.")]
    PasswordTooShort,

    #[error("This password is too long. It must contain at most {MAX_PASSWORD_LENGTH} characters.")]
    PasswordTooLong,

    #[error("This password is entirely numeric.")]
    PasswordEntirelyNumeric,

    #[error("This password is too common.")]
    PasswordTooCommon,

    #[error("The password is too similar to the username.")]
    PasswordTooSimilar,

    #[error("The two password fields didn't match.")]
    PasswordMismatch,

    #[error("Ensure this value has at most {MAX_EMAIL_LENGTH} characters.")]
    EmailTooLong,

    #[error("Enter a valid email address.")]
    EmailInvalidFormat,

    #[error("Enter an email address using only ASCII characters.")]
    EmailNonAscii,

    #[error("A user with that email already exists.")]
    EmailTaken,
}

/// Passwords rejected regardless of length.
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "qwertyuiop",
    "iloveyou",
    "sunshine",
    "princess",
    "football",
    "baseball",
    "welcome1",
    "letmein1",
    "trustno1",
    "abc12345",
    "superman",
    "starwars",
    "passw0rd",
];

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record the result of a field check, if it failed.
    pub fn check(&mut self, field: &str, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.add(field, e.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for one field.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validate a username.
///
/// # Examples
///
/// ```
/// use vpspanel::auth::validation::validate_username;
///
/// assert!(validate_username("john.doe+vps@host").is_ok());
/// assert!(validate_username("").is_err());
/// assert!(validate_username("john doe").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Required);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    // ASCII only: the store folds case with SQLite's NOCASE, which only
    // knows ASCII letters.
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate a new password against the username it will belong to.
///
/// # Examples
///
/// ```
/// use vpspanel::auth::validation::validate_new_password;
///
/// assert!(validate_new_password("Secret123!", "bob").is_ok());
/// assert!(validate_new_password("short", "bob").is_err());
/// assert!(validate_new_password("12345678901", "bob").is_err());
/// ```
pub fn validate_new_password(password: &str, username: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Required);
    }
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }

    let lower = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lower.as_str()) {
        return Err(ValidationError::PasswordTooCommon);
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordEntirelyNumeric);
    }

    let username = username.to_lowercase();
    if username.len() >= 3 && (lower.contains(&username) || username.contains(&lower)) {
        return Err(ValidationError::PasswordTooSimilar);
    }

    Ok(())
}

/// Check that the confirmation field repeats the password.
pub fn validate_password_confirmation(
    password: &str,
    confirmation: &str,
) -> Result<(), ValidationError> {
    if confirmation.is_empty() {
        return Err(ValidationError::Required);
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Validate an email address.
///
/// Only the shape is checked: one `@`, a non-empty local part, and a
/// dotted domain without whitespace. The address must be ASCII, since the
/// store only folds the case of ASCII letters.
///
/// # Examples
///
/// ```
/// use vpspanel::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("user@localhost").is_err());
/// assert!(validate_email("élise@example.com").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if !email.is_ascii() {
        return Err(ValidationError::EmailNonAscii);
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::EmailInvalidFormat);
    }
    let valid_domain = domain.contains('.')
        && domain
            .split('.')
            .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'));
    if !valid_domain {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Run every field check for a registration and collect the failures.
///
/// Store-dependent checks (uniqueness) are added by the caller.
pub fn validate_registration(
    username: &str,
    password: &str,
    confirmation: &str,
    email: Option<&str>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    errors.check("username", validate_username(username));
    if let Some(email) = email {
        errors.check("email", validate_email(email));
    }
    errors.check("password1", validate_new_password(password, username));
    errors.check(
        "password2",
        validate_password_confirmation(password, confirmation),
    );

    errors
}
