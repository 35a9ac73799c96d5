use kestrel_postgres::types::OffsetPagination;
use serde::{Deserialize, Serialize};

/// Offset pagination parameters shared by list queries.
///
/// Out-of-range values are clamped rather than rejected.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationRequest {
    /// The number of records to skip before starting to return results.
    pub offset: Option<u32>,
    /// The maximum number of records to return.
    pub limit: Option<u32>,
}

impl PaginationRequest {
    /// Default pagination limit.
    const DEFAULT_LIMIT: u32 = 50;

    /// Returns a new [`PaginationRequest`].
    #[inline]
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            offset: Some(offset),
            limit: Some(limit),
        }
    }

    /// Returns the pagination offset.
    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or_default()
    }

    /// Returns the pagination limit.
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

impl From<PaginationRequest> for OffsetPagination {
    fn from(pagination: PaginationRequest) -> Self {
        OffsetPagination::new(pagination.limit().into(), pagination.offset().into())
    }
}

#[cfg(test)]
mod tests {
    use kestrel_postgres::types::MAX_LIMIT;

    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let pagination = OffsetPagination::from(PaginationRequest::default());
        assert_eq!(pagination.limit, 50);
        assert_eq!(pagination.offset, 0);

        let pagination = OffsetPagination::from(PaginationRequest::new(10, 100_000));
        assert_eq!(pagination.limit, MAX_LIMIT);
        assert_eq!(pagination.offset, 10);
    }
}
