//! Database models for credentials, integrations and type setups.
//!
//! Each table has a queryable model, an insertable `New*` struct and, where
//! rows are mutable, an `Update*` changeset.

mod credential;
mod integration;
mod integration_type_setup;

pub use credential::{Credential, NewCredential, UpdateCredential};
pub use integration::{
    INTEGRATION_DOCUMENT_LEN, INTEGRATION_TEXT_LEN, Integration, NewIntegration,
    UpdateIntegration, check_integration_columns,
};
pub use integration_type_setup::{IntegrationTypeSetup, NewIntegrationTypeSetup};
