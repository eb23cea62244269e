// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime predicates.
//!
//! A [`Predicate`] is an expression tree over [`Column`](crate::Column)
//! handles. It is rendered into a `WHERE` body by the repository that
//! receives it, with one bound parameter per value; values are never inlined
//! into the statement text.
//!
//! ```rust,ignore
//! let p = User::NAME.eq("Ann") & !User::ID.is_in([1_i64, 2]);
//! repo.find(p)?;
//! // … WHERE ("name" = $1 AND NOT ("id" IN ($2, $3)))
//! ```

use std::{
    marker::PhantomData,
    ops::{BitAnd, BitOr, Not}
};

use crate::{Error, LikeKind, StatementBuilder, Value, like};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge
}

impl CompareOp {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => " = ",
            Self::Ne => " <> ",
            Self::Lt => " < ",
            Self::Le => " <= ",
            Self::Gt => " > ",
            Self::Ge => " >= "
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Const(bool),
    Compare {
        index:  usize,
        member: &'static str,
        op:     CompareOp,
        value:  Value
    },
    Null {
        index:   usize,
        member:  &'static str,
        negated: bool
    },
    Like {
        index:  usize,
        member: &'static str,
        value:  String,
        kind:   LikeKind
    },
    In {
        index:   usize,
        member:  &'static str,
        values:  Vec<Value>,
        negated: bool
    },
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>)
}

/// Boolean condition over the members of `E`.
pub struct Predicate<E> {
    node:    Node,
    _entity: PhantomData<fn() -> E>
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<E> std::fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Predicate").field(&self.node).finish()
    }
}

impl<E> Default for Predicate<E> {
    fn default() -> Self {
        Self::always()
    }
}

impl<E> Predicate<E> {
    pub(crate) const fn from_node(node: Node) -> Self {
        Self {
            node,
            _entity: PhantomData
        }
    }

    /// Predicate that matches every row.
    #[must_use]
    pub const fn always() -> Self {
        Self::from_node(Node::Const(true))
    }

    /// Predicate that matches no row.
    #[must_use]
    pub const fn never() -> Self {
        Self::from_node(Node::Const(false))
    }

    /// Both conditions.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::from_node(Node::And(Box::new(self.node), Box::new(other.node)))
    }

    /// Either condition.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::from_node(Node::Or(Box::new(self.node), Box::new(other.node)))
    }

    /// Number of values this predicate binds.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Const(_) | Node::Null { .. } => 0,
                Node::Compare { value, .. } => usize::from(!value.is_null()),
                Node::Like { .. } => 1,
                Node::In { values, .. } => values.len(),
                Node::And(a, b) | Node::Or(a, b) => count(a) + count(b),
                Node::Not(inner) => count(inner)
            }
        }
        count(&self.node)
    }

    pub(crate) fn render(
        &self,
        out: &mut StatementBuilder,
        name: &str,
        columns: &[&str]
    ) -> Result<(), Error> {
        render_node(&self.node, out, name, columns)
    }
}

fn column<'c>(columns: &[&'c str], index: usize, member: &str) -> Result<&'c str, Error> {
    columns.get(index).copied().ok_or_else(|| Error::ColumnNotFound {
        column: member.to_string()
    })
}

fn render_node(
    node: &Node,
    out: &mut StatementBuilder,
    name: &str,
    columns: &[&str]
) -> Result<(), Error> {
    match node {
        Node::Const(value) => {
            out.push_sql(if *value { "1 = 1" } else { "1 = 0" });
        }
        Node::Compare {
            index,
            member,
            op,
            value
        } => {
            let col = column(columns, *index, member)?;
            out.push_sql(col);
            match (op, value) {
                (CompareOp::Eq, Value::Null) => {
                    out.push_sql(" IS NULL");
                }
                (CompareOp::Ne, Value::Null) => {
                    out.push_sql(" IS NOT NULL");
                }
                _ => {
                    out.push_sql(op.as_sql());
                    out.push_fresh_param(&format!("{name}_0"), value.clone());
                }
            }
        }
        Node::Null {
            index,
            member,
            negated
        } => {
            let col = column(columns, *index, member)?;
            out.push_sql(col);
            out.push_sql(if *negated { " IS NOT NULL" } else { " IS NULL" });
        }
        Node::Like {
            index,
            member,
            value,
            kind
        } => {
            let col = column(columns, *index, member)?;
            out.push_sql(col);
            out.push_sql(" LIKE ");
            out.push_fresh_param(&format!("{name}_0"), like::pattern(value, *kind));
            out.push_like_escape();
        }
        Node::In {
            index,
            member,
            values,
            negated
        } => {
            let col = column(columns, *index, member)?;
            out.push_in_values(col, name, values.clone(), *negated);
        }
        Node::And(a, b) => {
            out.push_sql("(");
            render_node(a, out, name, columns)?;
            out.push_sql(" AND ");
            render_node(b, out, name, columns)?;
            out.push_sql(")");
        }
        Node::Or(a, b) => {
            out.push_sql("(");
            render_node(a, out, name, columns)?;
            out.push_sql(" OR ");
            render_node(b, out, name, columns)?;
            out.push_sql(")");
        }
        Node::Not(inner) => {
            out.push_sql("NOT (");
            render_node(inner, out, name, columns)?;
            out.push_sql(")");
        }
    }
    Ok(())
}

impl<E> BitAnd for Predicate<E> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl<E> BitOr for Predicate<E> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl<E> Not for Predicate<E> {
    type Output = Self;

    fn not(self) -> Self {
        Self::from_node(Node::Not(Box::new(self.node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, Dialect, Entity};

    struct User;

    impl Entity for User {
        const TYPE_NAME: &'static str = "User";
        const MEMBERS: &'static [&'static str] = &["id", "name", "email"];
    }

    const ID: Column<User, i64> = Column::new(0, "id");
    const NAME: Column<User, String> = Column::new(1, "name");
    const EMAIL: Column<User, Option<String>> = Column::new(2, "email");
    const COLUMNS: &[&str] = &["\"id\"", "\"name\"", "\"email\""];

    fn render(dialect: Dialect, p: &Predicate<User>) -> crate::Statement {
        let mut b = StatementBuilder::new(dialect);
        b.push_predicate("filter", p, COLUMNS).unwrap();
        b.finish()
    }

    #[test]
    fn single_comparison_binds_one_value() {
        let s = render(Dialect::Postgres, &NAME.eq("Ann"));
        assert_eq!(s.text, "\"name\" = $1");
        assert_eq!(s.parameters.len(), 1);
        assert_eq!(s.parameters[0].value, Value::Text("Ann".into()));
    }

    #[test]
    fn null_comparison_becomes_is_null() {
        let s = render(Dialect::Postgres, &EMAIL.eq(None::<String>));
        assert_eq!(s.text, "\"email\" IS NULL");
        assert!(s.parameters.is_empty());
        let s = render(Dialect::Postgres, &EMAIL.ne(None::<String>));
        assert_eq!(s.text, "\"email\" IS NOT NULL");
    }

    #[test]
    fn combinators_parenthesize() {
        let p = (NAME.eq("a") | NAME.eq("b")) & !ID.lt(5_i64);
        let s = render(Dialect::Postgres, &p);
        assert_eq!(
            s.text,
            "((\"name\" = $1 OR \"name\" = $2) AND NOT (\"id\" < $3))"
        );
        assert_eq!(p.parameter_count(), 3);
    }

    #[test]
    fn like_escapes_value() {
        let s = render(Dialect::Sqlite, &NAME.contains("50%"));
        assert_eq!(s.text, "\"name\" LIKE @filter_0 ESCAPE '!'");
        assert_eq!(s.parameters[0].value, Value::Text("%50!%%".into()));
    }

    #[test]
    fn empty_in_matches_nothing() {
        let s = render(Dialect::Postgres, &ID.is_in(Vec::<i64>::new()));
        assert_eq!(s.text, "1 = 0");
    }

    #[test]
    fn in_list_binds_every_value() {
        let s = render(Dialect::Postgres, &ID.is_in([1_i64, 2, 3]));
        assert_eq!(s.text, "\"id\" IN ($1, $2, $3)");
        assert_eq!(s.parameters.len(), 3);
    }

    #[test]
    fn unknown_index_is_an_error() {
        let stray: Column<User, i64> = Column::new(9, "ghost");
        let mut b = StatementBuilder::new(Dialect::Postgres);
        let err = b.push_predicate("f", &stray.eq(1_i64), COLUMNS).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { column } if column == "ghost"));
    }

    #[test]
    fn names_are_identical_across_dialects() {
        let p = NAME.eq("Ann") & ID.gt(3_i64);
        let names = |d| {
            render(d, &p)
                .parameters
                .into_iter()
                .map(|param| (param.name, param.value))
                .collect::<Vec<_>>()
        };
        let reference = names(Dialect::Postgres);
        for dialect in Dialect::ALL {
            assert_eq!(names(dialect), reference);
        }
    }
}
