//! vpspanel - account front end for a VPS hosting panel.
//!
//! Visitors register, log in with either their username or their email
//! address, and superusers get a panel listing every account.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use auth::{hash_password, verify_password};
pub use config::Config;
pub use db::{Account, AccountRepository, Database};
pub use error::{PanelError, Result};
