//! Authentication and authorization.
//!
//! Password hashing, credential resolution, registration, sessions and the
//! panel access gate.

pub mod gate;
mod password;
mod registration;
pub mod resolver;
mod session;
pub mod validation;

pub use gate::{
    authorize_panel_access, check_guards, AccessError, Guard, Principal, FORBIDDEN_MESSAGE,
    PANEL_GUARDS,
};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
    PasswordError,
};
pub use registration::{
    bootstrap_superuser, register, register_superuser, RegistrationError, RegistrationRequest,
};
pub use resolver::{CredentialResolver, ResolveError, UsernameOrEmailResolver, GENERIC_LOGIN_ERROR};
pub use session::{
    AuthSession, LimitKey, LimitResult, LoginLimiter, SessionError, SessionManager,
};
pub use validation::{FieldErrors, ValidationError};
