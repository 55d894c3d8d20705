//! Account repository.
//!
//! All identifier comparisons use `COLLATE NOCASE`, matching the unique
//! indexes on the accounts table.

use sqlx::SqlitePool;

use super::account::{Account, NewAccount};
use crate::{PanelError, Result};

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password, is_superuser, is_active, date_joined, last_login";

/// Repository for account persistence.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new repository over the given pool.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new account and return it with its assigned ID.
    ///
    /// Uniqueness violations (including cross-field collisions between
    /// username and email) come back as [`PanelError::Conflict`].
    pub async fn create(&self, new_account: &NewAccount) -> Result<Account> {
        let result = sqlx::query(
            "INSERT INTO accounts (username, email, password, is_superuser, is_active)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_account.username)
        .bind(&new_account.email)
        .bind(&new_account.password)
        .bind(new_account.is_superuser)
        .bind(new_account.is_active)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| PanelError::NotFound("account".to_string()))
    }

    /// Get an account by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(account)
    }

    /// Find accounts whose username or email equals `identifier`.
    ///
    /// At most two rows are fetched: callers only need to tell "none",
    /// "exactly one" and "more than one" apart.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Vec<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts
             WHERE username = ? COLLATE NOCASE OR email = ? COLLATE NOCASE
             ORDER BY id LIMIT 2"
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(identifier)
            .bind(identifier)
            .fetch_all(self.pool)
            .await?;
        Ok(accounts)
    }

    /// Check whether `value` is already used as a username or an email.
    pub async fn identifier_exists(&self, value: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM accounts
                           WHERE username = ? COLLATE NOCASE OR email = ? COLLATE NOCASE)",
        )
        .bind(value)
        .bind(value)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// List every account, ordered by ID.
    pub async fn list_all(&self) -> Result<Vec<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id");
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(accounts)
    }

    /// Count all accounts.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Count superuser accounts.
    pub async fn count_superusers(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE is_superuser = 1")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Record a successful login.
    pub async fn update_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE accounts SET last_login = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Enable or disable an account. Returns false if the account does not exist.
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_account() {
        let db = setup_db().await;
        let repo = AccountRepository::new(db.pool());

        let account = repo
            .create(&NewAccount::new("alice", "hashedpw").with_email("alice@example.com"))
            .await
            .unwrap();

        assert_eq!(account.id, 1);
        assert_eq!(account.username, "alice");
        assert_eq!(account.email.as_deref(), Some("alice@example.com"));
        assert!(!account.is_superuser);
        assert!(account.is_active);
        assert!(account.last_login.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_username_is_conflict() {
        let db = setup_db().await;
        let repo = AccountRepository::new(db.pool());

        repo.create(&NewAccount::new("alice", "pw")).await.unwrap();
        let result = repo.create(&NewAccount::new("ALICE", "pw")).await;

        assert!(matches!(result, Err(PanelError::Conflict(_))));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_cross_field_collision_is_conflict() {
        let db = setup_db().await;
        let repo = AccountRepository::new(db.pool());

        repo.create(&NewAccount::new("dave@example.com", "pw"))
            .await
            .unwrap();
        let result = repo
            .create(&NewAccount::new("dave", "pw").with_email("Dave@Example.com"))
            .await;

        assert!(matches!(result, Err(PanelError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_accounts_without_email_do_not_collide() {
        let db = setup_db().await;
        let repo = AccountRepository::new(db.pool());

        repo.create(&NewAccount::new("one", "pw")).await.unwrap();
        repo.create(&NewAccount::new("two", "pw")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_by_identifier_username_and_email() {
        let db = setup_db().await;
        let repo = AccountRepository::new(db.pool());
        let created = repo
            .create(&NewAccount::new("alice", "pw").with_email("alice@example.com"))
            .await
            .unwrap();

        let by_username = repo.find_by_identifier("ALICE").await.unwrap();
        assert_eq!(by_username, vec![created.clone()]);

        let by_email = repo.find_by_identifier("Alice@Example.COM").await.unwrap();
        assert_eq!(by_email, vec![created]);

        assert!(repo.find_by_identifier("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identifier_exists_checks_both_columns() {
        let db = setup_db().await;
        let repo = AccountRepository::new(db.pool());
        repo.create(&NewAccount::new("alice", "pw").with_email("alice@example.com"))
            .await
            .unwrap();

        assert!(repo.identifier_exists("Alice").await.unwrap());
        assert!(repo.identifier_exists("ALICE@example.com").await.unwrap());
        assert!(!repo.identifier_exists("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_all_and_count_superusers() {
        let db = setup_db().await;
        let repo = AccountRepository::new(db.pool());
        repo.create(&NewAccount::new("alice", "pw")).await.unwrap();
        repo.create(&NewAccount::new("root", "pw").with_superuser(true))
            .await
            .unwrap();
        repo.create(&NewAccount::new("zed", "pw").with_active(false))
            .await
            .unwrap();

        let all = repo.list_all().await.unwrap();
        let names: Vec<_> = all.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "root", "zed"]);
        assert_eq!(repo.count_superusers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_last_login() {
        let db = setup_db().await;
        let repo = AccountRepository::new(db.pool());
        let account = repo.create(&NewAccount::new("alice", "pw")).await.unwrap();

        repo.update_last_login(account.id).await.unwrap();

        let reloaded = repo.get_by_id(account.id).await.unwrap().unwrap();
        assert!(reloaded.last_login.is_some());
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = setup_db().await;
        let repo = AccountRepository::new(db.pool());
        let account = repo.create(&NewAccount::new("alice", "pw")).await.unwrap();

        assert!(repo.set_active(account.id, false).await.unwrap());
        let reloaded = repo.get_by_id(account.id).await.unwrap().unwrap();
        assert!(!reloaded.can_authenticate());

        assert!(!repo.set_active(999, false).await.unwrap());
    }
}
