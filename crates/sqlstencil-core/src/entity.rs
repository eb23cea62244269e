// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Mapped entities and typed column handles.
//!
//! For every `#[entity]` struct the schema macro implements [`Entity`] and
//! adds one associated [`Column`] constant per mapped member:
//!
//! ```rust,ignore
//! impl User {
//!     pub const ID: Column<User, i64> = Column::new(0, "id");
//!     pub const NAME: Column<User, String> = Column::new(1, "name");
//! }
//!
//! let filter = User::NAME.starts_with("An") & User::ID.gt(10_i64);
//! ```
//!
//! Column handles carry the member *index*; the concrete column spelling is
//! supplied by the repository when the predicate is rendered, so one
//! predicate value works for any dialect.

use std::{fmt, marker::PhantomData};

use crate::{
    LikeKind, Predicate, SortDirection, ToValue,
    predicate::{CompareOp, Node},
    sort::Sort
};

/// A struct mapped to a table.
pub trait Entity {
    /// Struct name.
    const TYPE_NAME: &'static str;

    /// Mapped member names in column order.
    const MEMBERS: &'static [&'static str];
}

/// Typed handle to one mapped member of `E` with Rust type `T`.
pub struct Column<E, T> {
    index:   usize,
    member:  &'static str,
    _marker: PhantomData<fn() -> (E, T)>
}

impl<E, T> Clone for Column<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Column<E, T> {}

impl<E, T> fmt::Debug for Column<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("index", &self.index)
            .field("member", &self.member)
            .finish()
    }
}

impl<E, T> Column<E, T> {
    /// Create a handle for the member at `index`.
    #[must_use]
    pub const fn new(index: usize, member: &'static str) -> Self {
        Self {
            index,
            member,
            _marker: PhantomData
        }
    }

    /// Member index in column order.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Member name.
    #[must_use]
    pub const fn member(&self) -> &'static str {
        self.member
    }

    fn compare<V: ToValue>(self, op: CompareOp, value: V) -> Predicate<E> {
        Predicate::from_node(Node::Compare {
            index: self.index,
            member: self.member,
            op,
            value: value.to_value()
        })
    }

    /// `column = value` (`IS NULL` for a `NULL` value).
    pub fn eq<V: ToValue>(self, value: V) -> Predicate<E> {
        self.compare(CompareOp::Eq, value)
    }

    /// `column <> value` (`IS NOT NULL` for a `NULL` value).
    pub fn ne<V: ToValue>(self, value: V) -> Predicate<E> {
        self.compare(CompareOp::Ne, value)
    }

    /// `column < value`
    pub fn lt<V: ToValue>(self, value: V) -> Predicate<E> {
        self.compare(CompareOp::Lt, value)
    }

    /// `column <= value`
    pub fn le<V: ToValue>(self, value: V) -> Predicate<E> {
        self.compare(CompareOp::Le, value)
    }

    /// `column > value`
    pub fn gt<V: ToValue>(self, value: V) -> Predicate<E> {
        self.compare(CompareOp::Gt, value)
    }

    /// `column >= value`
    pub fn ge<V: ToValue>(self, value: V) -> Predicate<E> {
        self.compare(CompareOp::Ge, value)
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(self) -> Predicate<E> {
        Predicate::from_node(Node::Null {
            index:   self.index,
            member:  self.member,
            negated: false
        })
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn is_not_null(self) -> Predicate<E> {
        Predicate::from_node(Node::Null {
            index:   self.index,
            member:  self.member,
            negated: true
        })
    }

    /// `column IN (…)`; an empty list matches nothing.
    pub fn is_in<I>(self, values: I) -> Predicate<E>
    where
        I: IntoIterator,
        I::Item: ToValue
    {
        Predicate::from_node(Node::In {
            index:   self.index,
            member:  self.member,
            values:  values.into_iter().map(|v| v.to_value()).collect(),
            negated: false
        })
    }

    /// `column NOT IN (…)`; an empty list matches everything.
    pub fn not_in<I>(self, values: I) -> Predicate<E>
    where
        I: IntoIterator,
        I::Item: ToValue
    {
        Predicate::from_node(Node::In {
            index:   self.index,
            member:  self.member,
            values:  values.into_iter().map(|v| v.to_value()).collect(),
            negated: true
        })
    }

    /// Ascending sort key.
    #[must_use]
    pub fn asc(self) -> Sort<E> {
        Sort::by(self.index, self.member, SortDirection::Asc)
    }

    /// Descending sort key.
    #[must_use]
    pub fn desc(self) -> Sort<E> {
        Sort::by(self.index, self.member, SortDirection::Desc)
    }

    fn like(self, value: &str, kind: LikeKind) -> Predicate<E> {
        Predicate::from_node(Node::Like {
            index: self.index,
            member: self.member,
            value: value.to_string(),
            kind
        })
    }
}

impl<E> Column<E, String> {
    /// `column LIKE 'value%'` with wildcards in `value` escaped.
    pub fn starts_with(self, value: impl AsRef<str>) -> Predicate<E> {
        self.like(value.as_ref(), LikeKind::Prefix)
    }

    /// `column LIKE '%value'` with wildcards in `value` escaped.
    pub fn ends_with(self, value: impl AsRef<str>) -> Predicate<E> {
        self.like(value.as_ref(), LikeKind::Suffix)
    }

    /// `column LIKE '%value%'` with wildcards in `value` escaped.
    pub fn contains(self, value: impl AsRef<str>) -> Predicate<E> {
        self.like(value.as_ref(), LikeKind::Contains)
    }
}

impl<E> Column<E, Option<String>> {
    /// `column LIKE 'value%'` with wildcards in `value` escaped.
    pub fn starts_with(self, value: impl AsRef<str>) -> Predicate<E> {
        self.like(value.as_ref(), LikeKind::Prefix)
    }

    /// `column LIKE '%value'` with wildcards in `value` escaped.
    pub fn ends_with(self, value: impl AsRef<str>) -> Predicate<E> {
        self.like(value.as_ref(), LikeKind::Suffix)
    }

    /// `column LIKE '%value%'` with wildcards in `value` escaped.
    pub fn contains(self, value: impl AsRef<str>) -> Predicate<E> {
        self.like(value.as_ref(), LikeKind::Contains)
    }
}
