//! Shared helpers for the web integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::{TestResponse, TestServer};
use serde::Serialize;

use vpspanel::auth::{register, register_superuser, RegistrationRequest};
use vpspanel::config::SessionConfig;
use vpspanel::web::{create_health_router, create_router, AppState};
use vpspanel::{Account, AccountRepository, Database};

pub const COOKIE: &str = "vpspanel_session";
pub const ROOT_PASSWORD: &str = "Sup3r-secret!";
pub const ALICE_PASSWORD: &str = "Wonderland-42";
pub const GENERIC_ERROR: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Test fixture: a server over an in-memory database.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
}

#[derive(Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<&'a str>,
}

#[derive(Serialize)]
pub struct RegisterForm<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password1: &'a str,
    pub password2: &'a str,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_session_config(SessionConfig::default()).await
    }

    pub async fn with_session_config(session_config: SessionConfig) -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let state = AppState::new(db.clone(), session_config).expect("Failed to build state");
        Self::from_state(db, state)
    }

    pub fn from_state(db: Database, state: AppState) -> Self {
        let router = create_router(Arc::new(state)).merge(create_health_router());
        let server = TestServer::new(router).expect("Failed to create test server");
        Self { server, db }
    }

    pub fn repo(&self) -> AccountRepository<'_> {
        AccountRepository::new(self.db.pool())
    }

    /// `root`, a superuser with an email address.
    pub async fn create_root(&self) -> Account {
        register_superuser(
            &self.repo(),
            "root",
            ROOT_PASSWORD,
            Some("root@example.com"),
        )
        .await
        .expect("Failed to create root")
    }

    /// `alice`, an ordinary account with an email address.
    pub async fn create_alice(&self) -> Account {
        let request = RegistrationRequest::new("alice", ALICE_PASSWORD)
            .with_confirmation(ALICE_PASSWORD)
            .with_email("alice@example.com");
        register(&self.repo(), request)
            .await
            .expect("Failed to create alice")
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.server
            .post("/login/")
            .form(&LoginForm {
                username,
                password,
                next: None,
            })
            .await
    }

    pub async fn superuser_login(&self, username: &str, password: &str) -> TestResponse {
        self.server
            .post("/superuser/login/")
            .form(&LoginForm {
                username,
                password,
                next: None,
            })
            .await
    }
}

pub fn location(response: &TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("location is not ASCII")
        .to_string()
}

pub fn sets_cookie(response: &TestResponse) -> bool {
    response.headers().contains_key("set-cookie")
}
