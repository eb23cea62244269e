// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Buffered raw rows and ordinal lookup.

use crate::{AsyncRowCursor, Error, RowAccess, RowCursor, Value};

/// Resolve the ordinals of `names` against the current row.
///
/// Call only after `advance()` returned `true`.
///
/// # Errors
///
/// The first failing [`RowAccess::ordinal`] lookup.
pub fn resolve_ordinals<R, const N: usize>(row: &R, names: &[&str; N]) -> Result<[usize; N], Error>
where
    R: RowAccess + ?Sized
{
    let mut ordinals = [0_usize; N];
    for (slot, name) in ordinals.iter_mut().zip(names) {
        *slot = row.ordinal(name)?;
    }
    Ok(ordinals)
}

/// Result set materialized without an entity mapping.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rows {
    columns: Vec<String>,
    rows:    Vec<Vec<Value>>
}

impl Rows {
    /// Drain a synchronous cursor.
    ///
    /// # Errors
    ///
    /// Cursor failures.
    pub fn read<C: RowCursor>(cursor: &mut C) -> Result<Self, Error> {
        let mut out = Self::default();
        while cursor.advance()? {
            out.push_current(cursor)?;
        }
        Ok(out)
    }

    /// Drain an asynchronous cursor.
    ///
    /// # Errors
    ///
    /// Cursor failures.
    pub async fn read_async<C: AsyncRowCursor>(cursor: &mut C) -> Result<Self, Error> {
        let mut out = Self::default();
        while cursor.advance().await? {
            out.push_current(cursor)?;
        }
        Ok(out)
    }

    fn push_current<R: RowAccess + ?Sized>(&mut self, row: &R) -> Result<(), Error> {
        if self.rows.is_empty() {
            let count = row.column_count()?;
            self.columns = (0..count)
                .map(|i| row.column_name(i).map(str::to_string))
                .collect::<Result<_, _>>()?;
        }
        let values = (0..self.columns.len())
            .map(|i| row.value(i))
            .collect::<Result<_, _>>()?;
        self.rows.push(values);
        Ok(())
    }

    /// Column names; empty when no row was read.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row was read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Value of `column` in row `row`.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let ordinal = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(ordinal)
    }
}
