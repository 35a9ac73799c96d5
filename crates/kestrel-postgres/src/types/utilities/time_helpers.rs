//! Time-related traits for database models.

use jiff::{SignedDuration, Timestamp};

/// Trait for models that have creation timestamps.
pub trait HasCreatedAt {
    /// Returns the creation timestamp.
    fn created_at(&self) -> Timestamp;

    /// Returns the age of the entity since creation.
    fn creation_age(&self) -> SignedDuration {
        Timestamp::now().duration_since(self.created_at())
    }
}

/// Trait for models that have update timestamps.
pub trait HasUpdatedAt {
    /// Returns the last update timestamp.
    fn updated_at(&self) -> Timestamp;
}

/// Trait for models that support soft deletion.
pub trait HasDeletedAt {
    /// Returns the deletion timestamp if the entity is soft-deleted.
    fn deleted_at(&self) -> Option<Timestamp>;

    /// Returns whether the entity is soft-deleted.
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Trait for models that record their last health check.
pub trait HasLastCheck {
    /// Returns the last health check timestamp, if checked at all.
    fn last_check(&self) -> Option<Timestamp>;

    /// Returns whether the entity was never checked or checked before `cutoff`.
    fn is_due_for_check(&self, cutoff: Timestamp) -> bool {
        self.last_check().is_none_or(|at| at < cutoff)
    }
}
