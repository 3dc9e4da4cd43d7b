use serde::{Deserialize, Serialize};
use validator::Validate;

/// Offset pagination for list endpoints.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, Validate)]
pub struct PaginationRequest {
    /// The number of records to skip.
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    /// The maximum number of records to return.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl PaginationRequest {
    const DEFAULT_LIMIT: i64 = 25;

    /// Returns the pagination offset.
    #[inline]
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }

    /// Returns the pagination limit.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}
