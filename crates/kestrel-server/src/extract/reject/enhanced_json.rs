//! Enhanced JSON extractor with improved error handling.
//!
//! This module provides [`Json`], a drop-in replacement for [`axum::Json`]
//! whose rejections are [`Error`]s with a stable JSON body.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Json as AxumJson, OptionalFromRequest, Request};
use axum::response::{IntoResponse, Response};
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::handler::{Error, ErrorKind};

/// Tracing target for JSON extraction.
const TRACING_TARGET: &str = "kestrel_server::extract::json";

/// Enhanced JSON extractor with improved error handling.
///
/// Request bodies carry credential configurations, so deserialization errors
/// are reported by field name only. The offending value is never echoed back.
///
/// [`Json`]: AxumJson
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Creates a new [`Json`] wrapper around the provided value.
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extractor = <AxumJson<T> as FromRequest<S>>::from_request(req, state).await;
        extractor.map(|x| Self::new(x.0)).map_err(Into::into)
    }
}

impl<T, S> OptionalFromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <Self as FromRequest<S>>::from_request(req, state).await {
            Ok(json) => Ok(Some(json)),
            // Client errors such as malformed JSON mean no body was given.
            Err(error) => match error.kind() {
                ErrorKind::InternalServerError => Err(error),
                _ => Ok(None),
            },
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let detail = describe_data_error(&err.body_text());
                tracing::debug!(target: TRACING_TARGET, detail = %detail, "JSON data rejected");

                ErrorKind::BadRequest
                    .with_message("Invalid request data format")
                    .with_context(detail)
            }
            JsonRejection::JsonSyntaxError(_) => ErrorKind::BadRequest
                .with_message("Invalid JSON syntax in request body")
                .with_context("Ensure the request body contains well-formed JSON"),
            JsonRejection::MissingJsonContentType(_) => ErrorKind::BadRequest
                .with_message("Invalid content type")
                .with_context("Request must have Content-Type header set to 'application/json'"),
            JsonRejection::BytesRejection(err) => {
                if err.body_text().contains("length limit") {
                    ErrorKind::PayloadTooLarge.into_error()
                } else {
                    ErrorKind::BadRequest
                        .with_message("Failed to read request body")
                        .with_context("Body may be incomplete or the connection was interrupted")
                }
            }
            other => {
                tracing::error!(
                    target: TRACING_TARGET,
                    rejection = %other.body_text(),
                    "unexpected JSON rejection"
                );
                ErrorKind::InternalServerError.with_message("Request processing failed")
            }
        }
    }
}

/// Reduces a serde error to the field it concerns.
///
/// Type and value errors from `serde_json` quote the rejected input, which
/// may be a secret, so only missing and unknown field names are kept.
fn describe_data_error(message: &str) -> String {
    let field = super::extract_field_name_from_error(message);

    match field {
        Some(field) if message.contains("missing field") => {
            format!("The field '{field}' is required but was not provided")
        }
        Some(field) if message.contains("unknown field") => {
            format!("The field '{field}' is not recognized")
        }
        _ => "A field has an unexpected type or value".to_owned(),
    }
}
