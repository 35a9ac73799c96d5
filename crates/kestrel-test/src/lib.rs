#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod mock_provider;

pub use mock_provider::{MockCalls, MockHealth, MockProvider};
