//! Form extraction with validation.

use axum::{
    async_trait,
    extract::{rejection::FormRejection, FromRequest, Request},
    Form,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::FieldErrors;

/// A form extractor that also runs `validator` checks.
///
/// Malformed bodies are rejected outright; field-level failures are handed
/// to the handler so it can re-render the form.
pub struct ValidatedForm<T>(pub T, pub FieldErrors);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Form<T>: FromRequest<S, Rejection = FormRejection>,
{
    type Rejection = FormRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state).await?;

        let errors = match value.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => field_errors_from(&e),
        };

        Ok(ValidatedForm(value, errors))
    }
}

/// Flatten `validator` errors into per-field messages.
pub fn field_errors_from(errors: &validator::ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();

    for (field, field_errors) in errors.field_errors() {
        let field = field.to_string();
        for e in field_errors {
            let message = e
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for {field}."));
            out.add(&field, message);
        }
    }

    out
}

/// Validate that a string does not contain control characters or NULL bytes.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value.chars().any(char::is_control) {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters.".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "This field is required."))]
        name: String,
        #[validate(custom(function = "no_control_chars"))]
        note: String,
    }

    #[test]
    fn test_no_control_chars() {
        assert!(no_control_chars("Hello, world!").is_ok());
        assert!(no_control_chars("bob@example.com").is_ok());

        assert!(no_control_chars("Hello\x00World").is_err());
        assert!(no_control_chars("Line\nbreak").is_err());
        assert!(no_control_chars("Hello\x1bWorld").is_err());
    }

    #[test]
    fn test_field_errors_from() {
        let sample = Sample {
            name: String::new(),
            note: "bad\x07".to_string(),
        };
        let errors = field_errors_from(&sample.validate().unwrap_err());

        assert_eq!(errors.get("name"), &["This field is required.".to_string()]);
        assert_eq!(
            errors.get("note"),
            &["Must not contain control characters.".to_string()]
        );
    }
}
