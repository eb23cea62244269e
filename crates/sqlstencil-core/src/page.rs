// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Paging requests and paged results.

use crate::{ToValue, Value};

/// Capacity of a list read without a known limit.
pub const DEFAULT_CAPACITY: usize = 16;

/// Largest preallocation derived from a caller-supplied limit.
pub const MAX_PREALLOCATION: usize = 1024;

/// Preallocation for a list read bounded by `limit`.
///
/// ```rust
/// use sqlstencil_core::page::capacity_for;
///
/// assert_eq!(capacity_for(10_i64), 10);
/// assert_eq!(capacity_for(1_000_000_i64), 1024);
/// assert_eq!(capacity_for(-5_i64), 0);
/// assert_eq!(capacity_for(Option::<i64>::None), 16);
/// ```
#[must_use]
pub fn capacity_for<V: ToValue>(limit: V) -> usize {
    match limit.to_value() {
        Value::Int(limit) => usize::try_from(limit).map_or(0, |limit| limit.min(MAX_PREALLOCATION)),
        _ => DEFAULT_CAPACITY
    }
}

/// Pagination parameters for `{{page --param p}}`.
///
/// # Example
///
/// ```rust
/// use sqlstencil_core::Pagination;
///
/// let page = Pagination::new(10, 0); // First 10 items
/// let next = Pagination::new(10, 10); // Next 10 items
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pagination {
    /// Maximum number of results to return.
    pub limit: i64,

    /// Number of results to skip.
    pub offset: i64
}

impl Pagination {
    /// Create new pagination parameters.
    #[must_use]
    pub const fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit,
            offset
        }
    }

    /// Create pagination for a specific page.
    ///
    /// # Arguments
    ///
    /// * `page`: Page number (0-indexed)
    /// * `per_page`: Items per page
    ///
    /// # Example
    ///
    /// ```rust
    /// use sqlstencil_core::Pagination;
    ///
    /// let page_0 = Pagination::page(0, 25); // offset=0, limit=25
    /// let page_2 = Pagination::page(2, 25); // offset=50, limit=25
    /// ```
    #[must_use]
    pub const fn page(page: i64, per_page: i64) -> Self {
        Self {
            limit:  per_page,
            offset: page * per_page
        }
    }

    /// Limit clamped to `0..=max`, as a capacity hint.
    #[must_use]
    pub fn capacity_hint(&self, max: usize) -> usize {
        usize::try_from(self.limit).map_or(0, |limit| limit.min(max))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit:  100,
            offset: 0
        }
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page<T> {
    /// Rows of this page.
    pub items: Vec<T>,

    /// Rows matching the query without paging.
    pub total: u64,

    /// Request that produced this page.
    pub pagination: Pagination
}

impl<T> Page<T> {
    /// Whether rows exist after this page.
    #[must_use]
    pub fn has_next(&self) -> bool {
        let seen = u64::try_from(self.pagination.offset).unwrap_or(0) + self.items.len() as u64;
        seen < self.total
    }

    /// Number of pages at the current page size.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        match u64::try_from(self.pagination.limit) {
            Ok(0) | Err(_) => 0,
            Ok(limit) => self.total.div_ceil(limit)
        }
    }
}
