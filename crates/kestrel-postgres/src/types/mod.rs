//! Contains constraints, enumerations and other custom types.

mod constraint;
mod enums;
mod filtering;
mod pagination;
mod utilities;

pub use constraint::{
    ConstraintCategory, ConstraintViolation, CredentialConstraints, IntegrationConstraints,
    IntegrationTypeSetupConstraints,
};
pub use enums::IntegrationState;
pub use filtering::{CredentialFilter, IntegrationFilter};
pub use pagination::{DEFAULT_LIMIT, MAX_LIMIT, OffsetPagination};
pub use utilities::{
    HasCreatedAt, HasDeletedAt, HasLastCheck, HasUpdatedAt, from_string_map, jsonb_text_len,
    to_string_map,
};
