//! Validated JSON extractor with automatic validation.
//!
//! This module provides [`ValidateJson`], an enhanced JSON extractor that
//! combines deserialization with automatic validation using the `validator` crate.

use std::borrow::Cow;
use std::collections::HashMap;

use axum::extract::{FromRequest, Request};
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::Json;
use crate::handler::{Error, ErrorKind};

/// Tracing target for request validation.
const TRACING_TARGET: &str = "kestrel_server::extract::validate";

/// Enhanced JSON extractor with automatic validation using the `validator` crate.
///
/// Works with any type that implements both `serde::Deserialize` and
/// `validator::Validate`. Also see [`Json`].
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Creates a new instance of [`ValidateJson`].
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;

        data.validate()?;
        Ok(Self::new(data))
    }
}

/// Formats length validation errors.
fn format_length_error(
    field: &str,
    params: &HashMap<Cow<'static, str>, serde_json::Value>,
) -> String {
    let number = |key: &str| params.get(key).and_then(serde_json::Value::as_u64);

    match (number("min"), number("max")) {
        (Some(min), Some(max)) => {
            format!("Field '{}' must have between {} and {} elements", field, min, max)
        }
        (Some(min), None) => format!("Field '{}' must have at least {} elements", field, min),
        (None, Some(max)) => format!("Field '{}' must have at most {} elements", field, max),
        _ => format!("Field '{}' has invalid length", field),
    }
}

/// Formats range validation errors.
fn format_range_error(
    field: &str,
    params: &HashMap<Cow<'static, str>, serde_json::Value>,
) -> String {
    let number = |key: &str| params.get(key).and_then(serde_json::Value::as_f64);

    match (number("min"), number("max")) {
        (Some(min), Some(max)) => {
            format!("Field '{}' must be between {} and {}", field, min, max)
        }
        (Some(min), None) => format!("Field '{}' must be at least {}", field, min),
        (None, Some(max)) => format!("Field '{}' must be at most {}", field, max),
        _ => format!("Field '{}' is out of valid range", field),
    }
}

/// Formats one validation error without quoting the rejected value.
fn format_validation_error(field: &str, error: &validator::ValidationError) -> String {
    if let Some(custom_message) = &error.message {
        return format!("Field '{}': {}", field, custom_message);
    }

    match error.code.as_ref() {
        "length" => format_length_error(field, &error.params),
        "range" => format_range_error(field, &error.params),
        "required" => format!("Field '{}' is required", field),
        code => format!("Field '{}' failed validation: {}", field, code),
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors.field_errors();

        let mut error_messages: Vec<(&str, String)> = field_errors
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors
                    .iter()
                    .map(move |error| (&**field, format_validation_error(field, error)))
            })
            .collect();
        error_messages.sort();

        let fields: Vec<&str> = error_messages.iter().map(|(field, _)| *field).collect();
        tracing::warn!(
            target: TRACING_TARGET,
            fields = ?fields,
            "Request validation failed"
        );

        let user_message = match error_messages.as_slice() {
            [] => "Validation failed".to_string(),
            [(_, single_error)] => single_error.clone(),
            multiple => multiple
                .iter()
                .map(|(_, message)| message.as_str())
                .collect::<Vec<_>>()
                .join(". "),
        };

        ErrorKind::BadRequest
            .with_message(user_message)
            .with_resource("request")
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[derive(Debug, Validate)]
    struct Selection {
        #[validate(length(min = 1, max = 2))]
        provider_ids: Vec<String>,
    }

    #[test]
    fn length_errors_name_the_field() {
        let selection = Selection {
            provider_ids: Vec::new(),
        };
        let error: Error = selection.validate().unwrap_err().into();

        assert_eq!(error.kind(), ErrorKind::BadRequest);
        let message = error.message().unwrap();
        assert!(message.contains("provider_ids"));
        assert!(message.contains("between 1 and 2"));
    }
}
