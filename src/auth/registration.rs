//! Account registration.

use thiserror::Error;
use tracing::{info, warn};

use super::password::{hash_password_blocking, PasswordError};
use super::validation::{
    validate_email, validate_new_password, validate_registration, validate_username,
    FieldErrors, ValidationError,
};
use crate::config::AdminConfig;
use crate::db::{Account, AccountRepository, NewAccount};
use crate::PanelError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// One or more fields were rejected.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    /// Must repeat `password`.
    pub password_confirmation: String,
    pub email: Option<String>,
}

impl RegistrationRequest {
    /// Create a request whose confirmation repeats the password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            username: username.into(),
            password_confirmation: password.clone(),
            password,
            email: None,
        }
    }

    pub fn with_confirmation(mut self, confirmation: impl Into<String>) -> Self {
        self.password_confirmation = confirmation.into();
        self
    }

    /// Set the email address. An empty string means no email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        self.email = (!email.is_empty()).then_some(email);
        self
    }
}

/// Register an ordinary account.
///
/// Field checks run first and are reported together. Uniqueness is checked
/// against both username and email of every existing account; if another
/// registration wins the race between that check and the insert, the
/// store's constraint is reported as the same field error.
///
/// # Examples
///
/// ```ignore
/// let db = Database::open_in_memory().await?;
/// let repo = AccountRepository::new(db.pool());
///
/// let account = register(&repo, RegistrationRequest::new("bob", "Secret123!")).await?;
/// assert!(!account.is_superuser);
/// ```
pub async fn register(
    repo: &AccountRepository<'_>,
    request: RegistrationRequest,
) -> Result<Account, RegistrationError> {
    let mut errors = validate_registration(
        &request.username,
        &request.password,
        &request.password_confirmation,
        request.email.as_deref(),
    );

    if !errors.contains("username") && identifier_taken(repo, &request.username).await? {
        errors.check("username", Err(ValidationError::UsernameTaken));
    }
    if let Some(email) = request.email.as_deref() {
        if !errors.contains("email") && identifier_taken(repo, email).await? {
            errors.check("email", Err(ValidationError::EmailTaken));
        }
    }

    if !errors.is_empty() {
        info!(username = %request.username, errors = %errors, "Registration rejected");
        return Err(RegistrationError::Validation(errors));
    }

    create_account(repo, request, false).await
}

/// Register a superuser account.
///
/// Applies the field rules without a confirmation field. Collisions with
/// existing accounts surface as a `username` or `email` field error.
pub async fn register_superuser(
    repo: &AccountRepository<'_>,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> Result<Account, RegistrationError> {
    let mut errors = FieldErrors::new();
    errors.check("username", validate_username(username));
    errors.check("password1", validate_new_password(password, username));
    if let Some(email) = email {
        errors.check("email", validate_email(email));
    }
    if !errors.is_empty() {
        return Err(RegistrationError::Validation(errors));
    }

    let mut request = RegistrationRequest::new(username, password);
    if let Some(email) = email {
        request = request.with_email(email);
    }
    create_account(repo, request, true).await
}

/// Create the configured superuser if none exists yet.
///
/// Returns the new account, or `None` when nothing was configured or a
/// superuser is already present.
pub async fn bootstrap_superuser(
    repo: &AccountRepository<'_>,
    admin: &AdminConfig,
) -> Result<Option<Account>, RegistrationError> {
    if !admin.is_configured() {
        return Ok(None);
    }

    let existing = repo
        .count_superusers()
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?;
    if existing > 0 {
        info!("Superuser already present, skipping bootstrap");
        return Ok(None);
    }

    let account =
        register_superuser(repo, &admin.username, &admin.password, admin.email.as_deref()).await?;
    info!(username = %account.username, "Bootstrap superuser created");
    Ok(Some(account))
}

/// Decide which field a store uniqueness failure belongs to.
///
/// The cross-column trigger does not say which side collided, so the email
/// is looked up again in that case.
async fn conflict_is_on_email(
    repo: &AccountRepository<'_>,
    detail: &str,
    email: Option<&str>,
) -> Result<bool, RegistrationError> {
    let Some(email) = email else {
        return Ok(false);
    };
    if detail.contains("accounts.email") {
        return Ok(true);
    }
    if detail.contains("accounts.username") {
        return Ok(false);
    }
    identifier_taken(repo, email).await
}

async fn identifier_taken(
    repo: &AccountRepository<'_>,
    value: &str,
) -> Result<bool, RegistrationError> {
    repo.identifier_exists(value)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))
}

async fn create_account(
    repo: &AccountRepository<'_>,
    request: RegistrationRequest,
    is_superuser: bool,
) -> Result<Account, RegistrationError> {
    let password_hash = hash_password_blocking(request.password).await?;

    let mut new_account =
        NewAccount::new(&request.username, password_hash).with_superuser(is_superuser);
    if let Some(email) = request.email.as_deref() {
        new_account = new_account.with_email(email);
    }

    let account = match repo.create(&new_account).await {
        Ok(account) => account,
        Err(PanelError::Conflict(detail)) => {
            warn!(username = %request.username, detail = %detail, "Registration lost a uniqueness race");
            let mut errors = FieldErrors::new();
            if conflict_is_on_email(repo, &detail, request.email.as_deref()).await? {
                errors.check("email", Err(ValidationError::EmailTaken));
            } else {
                errors.check("username", Err(ValidationError::UsernameTaken));
            }
            return Err(RegistrationError::Validation(errors));
        }
        Err(e) => return Err(RegistrationError::Database(e.to_string())),
    };

    info!(
        username = %account.username,
        account_id = account.id,
        is_superuser = account.is_superuser,
        "New account registered"
    );
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn field_errors(result: Result<Account, RegistrationError>) -> FieldErrors {
        match result {
            Err(RegistrationError::Validation(errors)) => errors,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        let account = register(&repo, RegistrationRequest::new("bob", "Secret123!"))
            .await
            .unwrap();

        assert_eq!(account.username, "bob");
        assert!(!account.is_superuser);
        assert!(account.is_active);
        assert_eq!(account.email, None);
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        let account = register(&repo, RegistrationRequest::new("bob", "Secret123!"))
            .await
            .unwrap();

        assert_ne!(account.password, "Secret123!");
        assert!(account.password.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_any_case() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        register(&repo, RegistrationRequest::new("bob", "Secret123!"))
            .await
            .unwrap();
        let errors =
            field_errors(register(&repo, RegistrationRequest::new("BOB", "Other456!")).await);

        assert_eq!(
            errors.get("username"),
            &["A user with that username already exists.".to_string()]
        );
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_username_matching_existing_email() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        register(
            &repo,
            RegistrationRequest::new("dave", "Secret123!").with_email("dave@example.com"),
        )
        .await
        .unwrap();
        let errors = field_errors(
            register(&repo, RegistrationRequest::new("Dave@Example.com", "Secret123!")).await,
        );

        assert!(errors.contains("username"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_email_matching_existing_username() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        register(&repo, RegistrationRequest::new("erin@example.com", "Secret123!"))
            .await
            .unwrap();
        let errors = field_errors(
            register(
                &repo,
                RegistrationRequest::new("erin", "Secret123!").with_email("ERIN@example.com"),
            )
            .await,
        );

        assert_eq!(
            errors.get("email"),
            &["A user with that email already exists.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_lost_email_race_is_reported_on_email() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());
        register(
            &repo,
            RegistrationRequest::new("alice", "Secret123!").with_email("alice@example.com"),
        )
        .await
        .unwrap();
        register(&repo, RegistrationRequest::new("erin@example.com", "Secret123!"))
            .await
            .unwrap();

        // Straight to the insert, as if the pre-checks had raced another request.
        for email in ["ALICE@example.com", "Erin@Example.com"] {
            let request = RegistrationRequest::new("other", "Secret123!").with_email(email);
            let errors = field_errors(create_account(&repo, request, false).await);
            assert_eq!(
                errors.get("email"),
                &["A user with that email already exists.".to_string()]
            );
            assert!(!errors.contains("username"));
        }

        let request = RegistrationRequest::new("ALICE", "Secret123!").with_email("new@example.com");
        let errors = field_errors(create_account(&repo, request, false).await);
        assert!(errors.contains("username"));
        assert!(!errors.contains("email"));
    }

    #[tokio::test]
    async fn test_register_rejects_non_ascii_email_variants() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        for (username, email) in [("elise", "Élise@example.com"), ("elise2", "élise@example.com")] {
            let errors = field_errors(
                register(
                    &repo,
                    RegistrationRequest::new(username, "Secret123!").with_email(email),
                )
                .await,
            );
            assert_eq!(
                errors.get("email"),
                &["Enter an email address using only ASCII characters.".to_string()]
            );
        }
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_collects_field_errors() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        let request = RegistrationRequest::new("bad name", "short")
            .with_confirmation("different")
            .with_email("not-an-email");
        let errors = field_errors(register(&repo, request).await);

        assert!(errors.contains("username"));
        assert!(errors.contains("email"));
        assert!(errors.contains("password1"));
        assert!(errors.contains("password2"));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_superuser() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        let account = register_superuser(&repo, "root", "Sup3r-secret!", Some("root@example.com"))
            .await
            .unwrap();

        assert!(account.is_superuser);
        assert_eq!(account.email.as_deref(), Some("root@example.com"));
        assert!(register_superuser(&repo, "root2", "123", None).await.is_err());
    }

    #[tokio::test]
    async fn test_register_superuser_duplicate_is_field_error() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        register_superuser(&repo, "root", "Sup3r-secret!", None)
            .await
            .unwrap();
        let errors = field_errors(register_superuser(&repo, "ROOT", "Sup3r-secret!", None).await);

        assert!(errors.contains("username"));
    }

    #[tokio::test]
    async fn test_bootstrap_superuser() {
        let db = setup().await;
        let repo = AccountRepository::new(db.pool());

        let unconfigured = AdminConfig::default();
        assert!(bootstrap_superuser(&repo, &unconfigured)
            .await
            .unwrap()
            .is_none());

        let admin = AdminConfig {
            username: "root".to_string(),
            password: "Sup3r-secret!".to_string(),
            email: None,
        };
        let created = bootstrap_superuser(&repo, &admin).await.unwrap().unwrap();
        assert!(created.is_superuser);

        // Second run is a no-op.
        assert!(bootstrap_superuser(&repo, &admin).await.unwrap().is_none());
        assert_eq!(repo.count_superusers().await.unwrap(), 1);
    }

    #[test]
    fn test_registration_request_builder() {
        let request = RegistrationRequest::new("user", "pass")
            .with_confirmation("other")
            .with_email("");

        assert_eq!(request.password, "pass");
        assert_eq!(request.password_confirmation, "other");
        assert_eq!(request.email, None);
    }
}
