//! Account model.

use sqlx::FromRow;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Account {
    /// Unique account ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Email address (unique, case-insensitive when present).
    pub email: Option<String>,
    /// Password hash (Argon2 PHC string).
    pub password: String,
    /// Elevated privilege: may view the administrative panel.
    pub is_superuser: bool,
    /// Whether the account may authenticate.
    pub is_active: bool,
    /// Creation timestamp.
    pub date_joined: String,
    /// Last successful login.
    pub last_login: Option<String>,
}

impl Account {
    /// The "may authenticate" predicate applied after password verification.
    pub fn can_authenticate(&self) -> bool {
        self.is_active
    }
}

/// Data for creating a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Login username.
    pub username: String,
    /// Password hash (already hashed).
    pub password: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Privilege flag (defaults to false).
    pub is_superuser: bool,
    /// Active flag (defaults to true).
    pub is_active: bool,
}

impl NewAccount {
    /// Create an ordinary, active account.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            email: None,
            is_superuser: false,
            is_active: true,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Grant or withhold superuser privilege.
    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    /// Set the active flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_defaults() {
        let account = NewAccount::new("alice", "hash");

        assert_eq!(account.username, "alice");
        assert_eq!(account.email, None);
        assert!(!account.is_superuser);
        assert!(account.is_active);
    }

    #[test]
    fn test_new_account_builder() {
        let account = NewAccount::new("root", "hash")
            .with_email("root@example.com")
            .with_superuser(true)
            .with_active(false);

        assert_eq!(account.email.as_deref(), Some("root@example.com"));
        assert!(account.is_superuser);
        assert!(!account.is_active);
    }
}
