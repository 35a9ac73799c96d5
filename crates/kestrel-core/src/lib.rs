#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for vault operations.
pub const TRACING_TARGET_VAULT: &str = "kestrel_core::vault";

/// Tracing target for registry operations.
pub const TRACING_TARGET_REGISTRY: &str = "kestrel_core::registry";

mod error;

#[cfg(feature = "encryption")]
#[cfg_attr(docsrs, doc(cfg(feature = "encryption")))]
pub mod crypto;
pub mod integration;
pub mod vault;

pub use error::{BoxedError, ProviderError, ProviderErrorKind, ProviderResult};
