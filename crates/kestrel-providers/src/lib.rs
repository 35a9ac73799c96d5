#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;

pub mod cloudflare;
pub mod github;
#[cfg(test)]
mod testing;

pub use crate::client::TRACING_TARGET;
pub use crate::cloudflare::CloudflareProvider;
pub use crate::config::{DEFAULT_TIMEOUT, HttpClientConfig};
pub use crate::github::GitHubProvider;
