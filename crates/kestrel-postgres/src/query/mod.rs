//! Database query repositories.
//!
//! Repositories are traits implemented for [`PgConnection`] so that they can
//! be called both on pooled connections and inside transactions. Every read
//! skips soft-deleted rows.
//!
//! [`PgConnection`]: crate::PgConnection

mod credential;
mod integration;
mod integration_type_setup;

pub use credential::CredentialRepository;
pub use integration::IntegrationRepository;
pub use integration_type_setup::IntegrationTypeSetupRepository;
