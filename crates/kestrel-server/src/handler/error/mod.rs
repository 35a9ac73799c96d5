//! [`Error`], [`ErrorKind`] and [`Result`].

mod http_error;
mod pg_error;
mod pg_integration;
mod service_error;

pub use http_error::{Error, ErrorKind, Result};
