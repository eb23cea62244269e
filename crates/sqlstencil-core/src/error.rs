// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime error type shared by drivers and generated repositories.
//!
//! Generated methods never translate errors: a driver failure reaches the
//! caller as [`Error::Database`] holding the driver's own error value, which
//! can be recovered with [`Error::downcast_database`]. Optimistic-concurrency
//! conflicts are *not* errors; see [`UpdateOutcome`](crate::UpdateOutcome).

use std::fmt;

/// Error returned by drivers and generated repository methods.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying database command failed.
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// A dynamic SQL fragment failed its allow-list or shape check.
    ///
    /// The rejected value is deliberately not part of this error.
    #[error("dynamic SQL fragment rejected for parameter `{parameter}`: {reason}")]
    DynamicSqlRejected {
        /// Name of the offending method parameter.
        parameter: &'static str,

        /// Why the value was rejected.
        reason: RejectReason
    },

    /// A column requested by name is absent from the result set.
    #[error("column `{column}` is not part of the result set")]
    ColumnNotFound {
        /// Requested column name.
        column: String
    },

    /// An ordinal is outside the current row shape.
    #[error("ordinal {ordinal} is out of range for {count} columns")]
    OrdinalOutOfRange {
        /// Requested ordinal.
        ordinal: usize,

        /// Number of columns in the row.
        count: usize
    },

    /// Row metadata was requested before a successful advance.
    #[error("no current row")]
    NoCurrentRow,

    /// A value could not be converted into the requested Rust type.
    #[error("cannot decode column {ordinal}: expected {expected}, found {found}")]
    Decode {
        /// Column ordinal.
        ordinal: usize,

        /// Rust type name that was requested.
        expected: &'static str,

        /// Value kind that was found.
        found: &'static str
    },

    /// A scalar query produced a value of the wrong kind.
    #[error("cannot decode scalar result: expected {expected}, found {found}")]
    Scalar {
        /// Rust type name that was requested.
        expected: &'static str,

        /// Value kind that was found.
        found: &'static str
    },

    /// The caller's cancellation token fired before execution.
    #[error("operation cancelled")]
    Cancelled
}

impl Error {
    /// Wrap a driver error without altering it.
    pub fn database<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static
    {
        Self::Database(Box::new(error))
    }

    /// Borrow the original driver error if it has type `E`.
    #[must_use]
    pub fn downcast_database<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static
    {
        match self {
            Self::Database(inner) => inner.downcast_ref::<E>(),
            _ => None
        }
    }

    /// Whether this is a dynamic-SQL rejection.
    #[must_use]
    pub const fn is_dynamic_rejection(&self) -> bool {
        matches!(self, Self::DynamicSqlRejected { .. })
    }
}

/// Reason a dynamic SQL fragment was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The value was empty.
    Empty,

    /// The value exceeded the maximum identifier length.
    TooLong,

    /// The value is not a plain (optionally dotted) identifier.
    InvalidShape,

    /// The value is not on the allow-list.
    NotAllowed
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Empty => "value is empty",
            Self::TooLong => "value is too long",
            Self::InvalidShape => "value is not a plain identifier",
            Self::NotAllowed => "value is not on the allow-list"
        };
        f.write_str(text)
    }
}
