//! Integration type setup model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::integration_type_setups;

/// Administrative enable flag for an integration type.
///
/// A type without a row is considered enabled.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = integration_type_setups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IntegrationTypeSetup {
    pub integration_type: String,
    pub enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Data for inserting or replacing a setup row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = integration_type_setups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewIntegrationTypeSetup {
    pub integration_type: String,
    pub enabled: bool,
}
