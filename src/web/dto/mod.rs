//! Form payloads and their validation.

pub mod request;
pub mod validation;

pub use request::*;
pub use validation::{field_errors_from, ValidatedForm};
