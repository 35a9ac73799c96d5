//! Response types for HTTP handlers.

use kestrel_postgres::types::OffsetPagination;
use serde::{Deserialize, Serialize};

mod credentials;
mod errors;
mod integration_types;
mod integrations;
mod monitors;

pub use credentials::*;
pub use errors::*;
pub use integration_types::*;
pub use integrations::*;
pub use monitors::*;

/// Generic paginated response wrapper.
///
/// When `nextOffset` is present, there may be more items to fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Offset this page starts at.
    pub offset: i64,
    /// Offset of the next page. Present only when this page is full.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<i64>,
}

impl<T> Page<T> {
    /// Creates a page from items fetched with `pagination`.
    pub fn new(items: Vec<T>, pagination: OffsetPagination) -> Self {
        let len = items.len() as i64;
        let next_offset = (len == pagination.limit).then_some(pagination.offset + len);
        Self {
            items,
            offset: pagination.offset,
            next_offset,
        }
    }

    /// Maps items from one type to another.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            offset: self.offset,
            next_offset: self.next_offset,
        }
    }

    /// Returns true if there may be more items to fetch.
    pub fn has_more(&self) -> bool {
        self.next_offset.is_some()
    }
}
