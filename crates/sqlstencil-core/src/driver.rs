// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Database command abstraction.
//!
//! Generated repositories talk to the database only through these traits.
//! A driver implements the sync family, the async family, or both:
//!
//! ```text
//! Session ─────────── type Transaction
//!    │
//!    ├── Connection ──────── create_command() → Command
//!    │                                            ├── set_text / set_timeout
//!    │                                            ├── add_parameter
//!    │                                            ├── set_transaction
//!    │                                            └── execute_* → RowCursor
//!    │
//!    └── AsyncConnection ─── create_command() → AsyncCommand
//!                                                 └── execute_* (async) → AsyncRowCursor
//! ```
//!
//! Parameters are added with their *logical* name in marker order, so every
//! parameter style (positional, anonymous, named) can be driven by the same
//! generated code.
//!
//! # Row Access
//!
//! [`RowAccess::ordinal`] may fail before the first successful advance; many
//! drivers only know the row shape once a row has been read. Generated code
//! therefore resolves ordinals lazily after `advance()` returned `true`.

use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, FromValue, Value};

/// Anything that owns a transaction type.
pub trait Session {
    /// Driver transaction handle associated with commands.
    type Transaction: Send + Sync;
}

/// Read access to the current row of a cursor.
pub trait RowAccess {
    /// Number of columns in the row shape.
    ///
    /// # Errors
    ///
    /// Fails when the shape is not yet known.
    fn column_count(&self) -> Result<usize, Error>;

    /// Column name at `ordinal`.
    ///
    /// # Errors
    ///
    /// Fails when the shape is not yet known or `ordinal` is out of range.
    fn column_name(&self, ordinal: usize) -> Result<&str, Error>;

    /// Ordinal of the column named `column`.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`] when absent, [`Error::NoCurrentRow`] when
    /// the shape is not yet known.
    fn ordinal(&self, column: &str) -> Result<usize, Error>;

    /// Raw value at `ordinal` in the current row.
    ///
    /// # Errors
    ///
    /// Fails without a current row or for an out-of-range ordinal.
    fn value(&self, ordinal: usize) -> Result<Value, Error>;

    /// Whether the value at `ordinal` is `NULL`.
    ///
    /// # Errors
    ///
    /// Same as [`RowAccess::value`].
    fn is_null(&self, ordinal: usize) -> Result<bool, Error> {
        self.value(ordinal).map(|value| value.is_null())
    }

    /// Typed value at `ordinal`.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] when the value does not convert to `T`.
    fn get<T: FromValue>(&self, ordinal: usize) -> Result<T, Error>
    where
        Self: Sized
    {
        let value = self.value(ordinal)?;
        T::from_value(value).map_err(|e| Error::Decode {
            ordinal,
            expected: e.expected,
            found: e.found
        })
    }
}

/// Forward-only synchronous cursor.
pub trait RowCursor: RowAccess {
    /// Move to the next row; `false` once exhausted.
    ///
    /// # Errors
    ///
    /// Driver failures while fetching.
    fn advance(&mut self) -> Result<bool, Error>;
}

/// One synchronous database command.
pub trait Command {
    /// Transaction handle type.
    type Transaction;

    /// Cursor produced by [`Command::execute_reader`].
    type Cursor: RowCursor;

    /// Set the statement text.
    fn set_text(&mut self, text: &str);

    /// Set the command timeout.
    fn set_timeout(&mut self, timeout: Duration);

    /// Append a parameter value under its logical name.
    fn add_parameter(&mut self, name: &str, value: Value);

    /// Associate the command with a transaction.
    fn set_transaction(&mut self, transaction: &Self::Transaction);

    /// Execute, returning the affected row count.
    ///
    /// # Errors
    ///
    /// Driver failures as [`Error::Database`].
    fn execute_non_query(&mut self) -> Result<u64, Error>;

    /// Execute, returning the first column of the first row.
    ///
    /// # Errors
    ///
    /// Driver failures as [`Error::Database`].
    fn execute_scalar(&mut self) -> Result<Value, Error>;

    /// Execute, returning a row cursor.
    ///
    /// # Errors
    ///
    /// Driver failures as [`Error::Database`].
    fn execute_reader(&mut self) -> Result<Self::Cursor, Error>;
}

/// Synchronous connection.
pub trait Connection: Session {
    /// Command type.
    type Command: Command<Transaction = Self::Transaction>;

    /// Create a fresh command.
    ///
    /// # Errors
    ///
    /// Driver failures as [`Error::Database`].
    fn create_command(&self) -> Result<Self::Command, Error>;
}

/// Forward-only asynchronous cursor.
#[async_trait]
pub trait AsyncRowCursor: RowAccess + Send {
    /// Move to the next row; `false` once exhausted.
    ///
    /// # Errors
    ///
    /// Driver failures while fetching.
    async fn advance(&mut self) -> Result<bool, Error>;
}

/// One asynchronous database command.
#[async_trait]
pub trait AsyncCommand: Send {
    /// Transaction handle type.
    type Transaction: Send + Sync;

    /// Cursor produced by [`AsyncCommand::execute_reader`].
    type Cursor: AsyncRowCursor;

    /// Set the statement text.
    fn set_text(&mut self, text: &str);

    /// Set the command timeout.
    fn set_timeout(&mut self, timeout: Duration);

    /// Append a parameter value under its logical name.
    fn add_parameter(&mut self, name: &str, value: Value);

    /// Associate the command with a transaction.
    fn set_transaction(&mut self, transaction: &Self::Transaction);

    /// Execute, returning the affected row count.
    ///
    /// # Errors
    ///
    /// Driver failures as [`Error::Database`].
    async fn execute_non_query(&mut self) -> Result<u64, Error>;

    /// Execute, returning the first column of the first row.
    ///
    /// # Errors
    ///
    /// Driver failures as [`Error::Database`].
    async fn execute_scalar(&mut self) -> Result<Value, Error>;

    /// Execute, returning a row cursor.
    ///
    /// # Errors
    ///
    /// Driver failures as [`Error::Database`].
    async fn execute_reader(&mut self) -> Result<Self::Cursor, Error>;
}

/// Asynchronous connection.
pub trait AsyncConnection: Session + Send + Sync {
    /// Command type.
    type Command: AsyncCommand<Transaction = Self::Transaction>;

    /// Create a fresh command.
    ///
    /// # Errors
    ///
    /// Driver failures as [`Error::Database`].
    fn create_command(&self) -> Result<Self::Command, Error>;
}

/// Decode a scalar result.
///
/// # Errors
///
/// [`Error::Scalar`] when the value does not convert to `T`.
pub fn decode_scalar<T: FromValue>(value: Value) -> Result<T, Error> {
    T::from_value(value).map_err(|e| Error::Scalar {
        expected: e.expected,
        found:    e.found
    })
}
