//! Enumerations mirroring PostgreSQL enum types.

mod integration_state;

pub use integration_state::IntegrationState;
