//! Request types for HTTP handlers.

mod credentials;
mod integration_types;
mod integrations;
mod paginations;
mod paths;

pub use credentials::*;
pub use integration_types::*;
pub use integrations::*;
pub use paginations::*;
pub use paths::*;
