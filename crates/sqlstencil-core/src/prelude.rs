// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Convenient re-exports for common usage.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlstencil::prelude::*;
//! ```

pub use crate::{
    CancellationToken, Column, Dialect, Entity, Error, Page, Pagination, Predicate, Rows, Sort,
    SortDirection, UpdateOutcome, Value
};
