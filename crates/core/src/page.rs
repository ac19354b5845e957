//! Pagination parameters shared by the activity and audit query services.
//!
//! All log/audit queries are paginated by default and return a total count
//! that is independent of the requested page.

use serde::{Deserialize, Serialize};

/// Pagination parameters for log queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of entries to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50, // Safe default
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(1000), // Cap at 1000 for safety
            offset: offset.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let page = Pagination::default();
        assert_eq!(page.limit, 50);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn limit_is_capped() {
        let page = Pagination::new(Some(10_000), Some(5));
        assert_eq!(page.limit, 1000);
        assert_eq!(page.offset, 5);
    }
}
