//! Integration lifecycle state and its transitions.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle state of an integration.
///
/// Corresponds to the `INTEGRATION_STATE` PostgreSQL enum. Every transition is
/// a pure function on this type so that all stores apply the same rules.
///
/// | From \ Event      | healthy  | unhealthy | credential deleted | archive  | unarchive |
/// |-------------------|----------|-----------|--------------------|----------|-----------|
/// | Active            | Active   | Inactive  | Archived           | Archived | -         |
/// | Inactive          | Active   | Inactive  | Archived           | Archived | -         |
/// | SampleIntegration | Active   | Inactive  | Archived           | Archived | -         |
/// | Archived          | Archived | Archived  | Archived           | Archived | Inactive  |
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::IntegrationState"]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationState {
    /// Last health check succeeded.
    #[db_rename = "active"]
    Active,

    /// Last health check failed, or the integration was never checked.
    #[db_rename = "inactive"]
    #[default]
    Inactive,

    /// Withdrawn from service; only an operator can bring it back.
    #[db_rename = "archived"]
    Archived,

    /// Demo or seed data.
    #[db_rename = "sample_integration"]
    SampleIntegration,
}

impl IntegrationState {
    /// Initial state of a freshly discovered candidate.
    #[inline]
    pub fn from_health(healthy: bool) -> Self {
        if healthy { Self::Active } else { Self::Inactive }
    }

    /// State after a health check. Archived integrations never move.
    #[inline]
    pub fn after_health_check(self, healthy: bool) -> Self {
        match self {
            Self::Archived => Self::Archived,
            _ => Self::from_health(healthy),
        }
    }

    /// State after the owning credential is deleted.
    #[inline]
    pub fn orphaned(self) -> Self {
        Self::Archived
    }

    /// State after an explicit operator archive.
    #[inline]
    pub fn archived(self) -> Self {
        Self::Archived
    }

    /// State after an explicit operator un-archive, or `None` if not archived.
    #[inline]
    pub fn unarchived(self) -> Option<Self> {
        match self {
            Self::Archived => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Returns `true` for archived integrations.
    #[inline]
    pub fn is_archived(self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Returns `true` if batch health checks pick this integration up.
    #[inline]
    pub fn is_schedulable(self) -> bool {
        matches!(self, Self::Active | Self::Inactive)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn health_transition_table() {
        for state in IntegrationState::iter() {
            let healthy = state.after_health_check(true);
            let unhealthy = state.after_health_check(false);

            if state.is_archived() {
                assert_eq!(healthy, IntegrationState::Archived);
                assert_eq!(unhealthy, IntegrationState::Archived);
            } else {
                assert_eq!(healthy, IntegrationState::Active, "{state}");
                assert_eq!(unhealthy, IntegrationState::Inactive, "{state}");
            }
        }
    }

    #[test]
    fn health_transition_is_idempotent() {
        for state in IntegrationState::iter() {
            for healthy in [true, false] {
                let once = state.after_health_check(healthy);
                assert_eq!(once.after_health_check(healthy), once);
            }
        }
    }

    #[test]
    fn orphaning_always_archives() {
        for state in IntegrationState::iter() {
            assert_eq!(state.orphaned(), IntegrationState::Archived);
        }
    }

    #[test]
    fn only_archived_can_be_unarchived() {
        assert_eq!(
            IntegrationState::Archived.unarchived(),
            Some(IntegrationState::Inactive)
        );
        assert_eq!(IntegrationState::Active.unarchived(), None);
        assert_eq!(IntegrationState::SampleIntegration.unarchived(), None);
    }

    #[test]
    fn scheduling_excludes_archived_and_samples() {
        assert!(IntegrationState::Active.is_schedulable());
        assert!(IntegrationState::Inactive.is_schedulable());
        assert!(!IntegrationState::Archived.is_schedulable());
        assert!(!IntegrationState::SampleIntegration.is_schedulable());
    }

    #[test]
    fn wire_names() {
        assert_eq!(
            serde_json::to_string(&IntegrationState::SampleIntegration).unwrap(),
            "\"SAMPLE_INTEGRATION\""
        );
        assert_eq!(IntegrationState::Active.to_string(), "ACTIVE");
        assert_eq!(
            "ARCHIVED".parse::<IntegrationState>().unwrap(),
            IntegrationState::Archived
        );
    }
}
