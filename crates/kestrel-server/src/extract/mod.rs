//! Enhanced HTTP request extractors.
//!
//! - [`Json`] - JSON deserialization that never echoes rejected values
//! - [`ValidateJson`] - JSON extraction with automatic validation
//! - [`Path`] - Path parameter extraction with format hints
//! - [`Query`] - Query parameter extraction naming the offending parameter

pub mod reject;

pub use crate::extract::reject::{Json, Path, Query, ValidateJson};
