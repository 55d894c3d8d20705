//! Database schema and migrations.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: accounts table
    r#"
CREATE TABLE accounts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL COLLATE NOCASE,
    email         TEXT COLLATE NOCASE,
    password      TEXT NOT NULL,            -- Argon2 PHC string
    is_superuser  INTEGER NOT NULL DEFAULT 0,
    is_active     INTEGER NOT NULL DEFAULT 1,
    date_joined   TEXT NOT NULL DEFAULT (datetime('now')),
    last_login    TEXT
);

CREATE UNIQUE INDEX idx_accounts_username_nocase ON accounts(username COLLATE NOCASE);
CREATE UNIQUE INDEX idx_accounts_email_nocase ON accounts(email COLLATE NOCASE);
"#,
    // v2: a login identifier must not match two accounts across both columns
    r#"
CREATE TRIGGER trg_accounts_identifier_insert
BEFORE INSERT ON accounts
WHEN EXISTS (
    SELECT 1 FROM accounts
    WHERE username = NEW.email OR email = NEW.username
)
BEGIN
    SELECT RAISE(ABORT, 'UNIQUE constraint failed: accounts.identifier');
END;

CREATE TRIGGER trg_accounts_identifier_update
BEFORE UPDATE OF username, email ON accounts
WHEN EXISTS (
    SELECT 1 FROM accounts
    WHERE id != NEW.id AND (username = NEW.email OR email = NEW.username)
)
BEGIN
    SELECT RAISE(ABORT, 'UNIQUE constraint failed: accounts.identifier');
END;
"#,
    // v3: NOCASE folds ASCII letters only, so identifiers must be ASCII
    r#"
CREATE TRIGGER trg_accounts_ascii_insert
BEFORE INSERT ON accounts
WHEN NEW.username GLOB '*[^ -~]*' OR NEW.email GLOB '*[^ -~]*'
BEGIN
    SELECT RAISE(ABORT, 'CHECK constraint failed: accounts.ascii_identifier');
END;

CREATE TRIGGER trg_accounts_ascii_update
BEFORE UPDATE OF username, email ON accounts
WHEN NEW.username GLOB '*[^ -~]*' OR NEW.email GLOB '*[^ -~]*'
BEGIN
    SELECT RAISE(ABORT, 'CHECK constraint failed: accounts.ascii_identifier');
END;
"#,
];
