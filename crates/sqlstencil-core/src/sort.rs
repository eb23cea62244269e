// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Sort order for `{{orderby --param s}}`.

use std::marker::PhantomData;

use crate::{Error, StatementBuilder};

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,

    /// Descending order (Z-A, 9-0, newest first).
    Desc
}

impl SortDirection {
    /// Convert to SQL keyword.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC"
        }
    }
}

/// Ordered list of sort keys over members of `E`.
///
/// ```rust,ignore
/// let order = User::NAME.asc().then(User::ID.desc());
/// ```
pub struct Sort<E> {
    keys:    Vec<(usize, &'static str, SortDirection)>,
    _entity: PhantomData<fn() -> E>
}

impl<E> Clone for Sort<E> {
    fn clone(&self) -> Self {
        Self {
            keys:    self.keys.clone(),
            _entity: PhantomData
        }
    }
}

impl<E> std::fmt::Debug for Sort<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.keys.iter().map(|(_, member, dir)| (member, dir)))
            .finish()
    }
}

impl<E> Default for Sort<E> {
    fn default() -> Self {
        Self::unsorted()
    }
}

impl<E> Sort<E> {
    /// No ordering; renders nothing.
    #[must_use]
    pub const fn unsorted() -> Self {
        Self {
            keys:    Vec::new(),
            _entity: PhantomData
        }
    }

    pub(crate) fn by(index: usize, member: &'static str, direction: SortDirection) -> Self {
        Self {
            keys:    vec![(index, member, direction)],
            _entity: PhantomData
        }
    }

    /// Append the keys of `next` after the current ones.
    #[must_use]
    pub fn then(mut self, next: Self) -> Self {
        self.keys.extend(next.keys);
        self
    }

    /// Whether no key is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn render(&self, out: &mut StatementBuilder, columns: &[&str]) -> Result<(), Error> {
        if self.keys.is_empty() {
            return Ok(());
        }
        out.push_sql("ORDER BY ");
        for (position, (index, member, direction)) in self.keys.iter().enumerate() {
            let column = columns.get(*index).ok_or_else(|| Error::ColumnNotFound {
                column: (*member).to_string()
            })?;
            if position > 0 {
                out.push_sql(", ");
            }
            out.push_sql(column).push_sql(" ").push_sql(direction.as_sql());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, Dialect, Entity};

    struct Post;

    impl Entity for Post {
        const TYPE_NAME: &'static str = "Post";
        const MEMBERS: &'static [&'static str] = &["id", "title"];
    }

    const ID: Column<Post, i64> = Column::new(0, "id");
    const TITLE: Column<Post, String> = Column::new(1, "title");

    #[test]
    fn sort_direction_sql() {
        assert_eq!(SortDirection::Asc.as_sql(), "ASC");
        assert_eq!(SortDirection::Desc.as_sql(), "DESC");
    }

    #[test]
    fn sort_direction_default() {
        assert_eq!(SortDirection::default(), SortDirection::Asc);
    }

    #[test]
    fn renders_keys_in_order() {
        let mut b = StatementBuilder::new(Dialect::SqlServer);
        b.push_sort(&TITLE.asc().then(ID.desc()), &["[Id]", "[Title]"])
            .unwrap();
        assert_eq!(b.text(), "ORDER BY [Title] ASC, [Id] DESC");
    }

    #[test]
    fn unsorted_renders_nothing() {
        let mut b = StatementBuilder::new(Dialect::Postgres);
        b.push_sort(&Sort::<Post>::unsorted(), &["\"id\""]).unwrap();
        assert_eq!(b.text(), "");
    }
}
