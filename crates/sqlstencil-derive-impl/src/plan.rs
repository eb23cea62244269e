// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Resolved statement plans.
//!
//! The resolver turns template nodes into a [`Plan`]: an ordered list of
//! [`Segment`]s plus the [`BindingSpec`]s their markers refer to. Rewrite
//! passes edit the segments; the emission backend turns them into either a
//! `const` statement (every segment static) or a sequence of
//! `StatementBuilder` calls.
//!
//! ```text
//! "SELECT {{columns}} FROM {{table}} WHERE {{where}}"
//!                      │ resolve
//!                      ▼
//! [Sql("SELECT \"id\", \"name\" FROM \"users\" WHERE \"name\" = "), Param(0)]
//! bindings: [name ← parameter `name`]
//! ```

use sqlstencil_core::{Dialect, LikeKind, StatementBuilder, Value};
use syn::Expr;

use crate::method::{attrs::DynamicKind, shape::ReturnShape};

/// Statement shape, from the template's leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT` or `WITH`.
    Select,

    /// `INSERT`.
    Insert,

    /// `UPDATE`.
    Update,

    /// `DELETE`.
    Delete,

    /// Anything else.
    Other
}

impl StatementKind {
    /// Classify a leading keyword.
    #[must_use]
    pub fn from_keyword(keyword: Option<&str>) -> Self {
        match keyword {
            Some("SELECT" | "WITH") => Self::Select,
            Some("INSERT") => Self::Insert,
            Some("UPDATE") => Self::Update,
            Some("DELETE") => Self::Delete,
            _ => Self::Other
        }
    }

    /// Statements that change rows.
    #[must_use]
    pub const fn is_dml(self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

/// Where a bound value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingSource {
    /// A method parameter.
    Param(String),

    /// One member of an entity parameter.
    Field {
        /// Entity parameter.
        param: String,

        /// Member name.
        member: String
    },

    /// A literal written in a `#[filter]` closure.
    Literal(Expr),

    /// A `LIKE` pattern computed at compile time.
    Pattern(String),

    /// A `LIKE` pattern computed from a text parameter at run time.
    Like {
        /// Text parameter.
        param: String,

        /// Match kind.
        kind: LikeKind
    },

    /// `limit` or `offset` of a `Pagination` parameter.
    PageField {
        /// Pagination parameter.
        param: String,

        /// `limit` or `offset`.
        field: &'static str
    }
}

/// One logical parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSpec {
    /// Dialect-independent name.
    pub name: String,

    /// Value source.
    pub source: BindingSource
}

/// Runtime test of a conditional block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondKind {
    /// `notnull`
    NotNull,

    /// `null`
    Null,

    /// `notempty`
    NotEmpty,

    /// `empty`
    Empty,

    /// `true`
    True,

    /// `false`
    False
}

impl CondKind {
    /// Parse a test name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "notnull" => Self::NotNull,
            "null" => Self::Null,
            "notempty" => Self::NotEmpty,
            "empty" => Self::Empty,
            "true" => Self::True,
            "false" => Self::False,
            _ => return None
        })
    }

    /// Known test names.
    pub const NAMES: &'static [&'static str] =
        &["notnull", "null", "notempty", "empty", "true", "false"];
}

/// One piece of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal SQL.
    Sql(String),

    /// Marker for `bindings[index]`.
    Param(usize),

    /// `column [NOT] IN (...)` over a sequence parameter.
    InList {
        /// Sequence parameter.
        param: String,

        /// Rendered column.
        column: String,

        /// `NOT IN`.
        negated: bool
    },

    /// A `Predicate<E>` parameter.
    Predicate {
        /// Predicate parameter.
        param: String,

        /// Rendered column per mapped member.
        columns: Vec<String>
    },

    /// A `Sort<E>` parameter; renders `ORDER BY ...` or nothing.
    Sort {
        /// Sort parameter.
        param: String,

        /// Rendered column per mapped member.
        columns: Vec<String>,

        /// SQL used when the sort is empty.
        fallback: Option<String>
    },

    /// A checked `#[dynamic_sql]` splice.
    Dynamic {
        /// Text parameter.
        param: String,

        /// Accepted shape.
        kind: DynamicKind,

        /// Accepted values.
        allow: Vec<String>
    },

    /// A block decided at run time.
    Conditional {
        /// Tested parameter.
        param: String,

        /// Test.
        kind: CondKind,

        /// Segments when the test holds.
        then: Vec<Segment>,

        /// Segments otherwise.
        otherwise: Vec<Segment>
    },

    /// Multi-row `(...), (...)` tuples from an entity sequence.
    Batch {
        /// Entity sequence parameter.
        param: String,

        /// Members per row, in column order.
        members: Vec<String>,

        /// SQL expressions appended to every row.
        extras: Vec<String>
    }
}

/// Paging value.
#[derive(Debug, Clone, PartialEq)]
pub enum PagingValue {
    /// Validated literal.
    Literal(i64),

    /// Bound value.
    Binding(usize)
}

/// `limit` / `offset` request, rendered at the end of the statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PagingSpec {
    /// Row limit.
    pub limit: Option<PagingValue>,

    /// Rows skipped.
    pub offset: Option<PagingValue>,

    /// `{{page}}` parameter supplying both.
    pub page_param: Option<String>
}

impl PagingSpec {
    /// Whether any paging was requested.
    #[must_use]
    pub const fn is_requested(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }
}

/// Fully resolved statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Statement kind as written.
    pub kind: StatementKind,

    /// Target dialect.
    pub dialect: Dialect,

    /// Statement pieces.
    pub segments: Vec<Segment>,

    /// Logical parameters.
    pub bindings: Vec<BindingSpec>,

    /// Paging request.
    pub paging: PagingSpec,

    /// `SELECT COUNT(*)` companion for paged results.
    pub count: Option<Vec<Segment>>,

    /// Scalar query run after an `INSERT` to fetch the generated key.
    pub follow_up: Option<String>,

    /// Member names in result column order, when a column list was
    /// projected.
    pub projection: Option<Vec<String>>,

    /// Result columns sit at known positions.
    pub fixed_order: bool,

    /// Alias of the main table.
    pub table_alias: Option<String>,

    /// A soft-delete rewrite turned the `DELETE` into an `UPDATE`.
    pub soft_deleted: bool,

    /// A version check was added.
    pub version_checked: bool,

    /// A key return clause was added.
    pub returns_key: bool,

    /// Rows per batch statement.
    pub batch_size: usize,

    /// Result classification.
    pub output: ReturnShape
}

impl Plan {
    /// Empty plan.
    #[must_use]
    pub fn new(kind: StatementKind, dialect: Dialect, output: ReturnShape) -> Self {
        Self {
            kind,
            dialect,
            segments: Vec::new(),
            bindings: Vec::new(),
            paging: PagingSpec::default(),
            count: None,
            follow_up: None,
            projection: None,
            fixed_order: false,
            table_alias: None,
            soft_deleted: false,
            version_checked: false,
            returns_key: false,
            batch_size: 1000,
            output
        }
    }

    /// Register a binding and return its index.
    ///
    /// A name already bound to the same source is reused; a name bound to
    /// a different source gets a numeric suffix.
    pub fn bind(&mut self, name: &str, source: BindingSource) -> usize {
        let mut candidate = name.to_string();
        let mut suffix = 0_usize;
        loop {
            match self.bindings.iter().position(|b| b.name == candidate) {
                Some(index) if self.bindings[index].source == source => return index,
                Some(_) => {
                    suffix += 1;
                    candidate = format!("{name}_{suffix}");
                }
                None => {
                    self.bindings.push(BindingSpec {
                        name: candidate,
                        source
                    });
                    return self.bindings.len() - 1;
                }
            }
        }
    }

    /// Whether a batch segment drives execution.
    #[must_use]
    pub fn batch(&self) -> Option<&Segment> {
        self.segments
            .iter()
            .find(|segment| matches!(segment, Segment::Batch { .. }))
    }
}

/// Append literal SQL, merging with a trailing SQL segment.
pub fn push_sql(segments: &mut Vec<Segment>, sql: &str) {
    if sql.is_empty() {
        return;
    }
    if let Some(Segment::Sql(last)) = segments.last_mut() {
        last.push_str(sql);
    } else {
        segments.push(Segment::Sql(sql.to_string()));
    }
}

/// Append segments, merging adjacent SQL.
pub fn extend(segments: &mut Vec<Segment>, more: Vec<Segment>) {
    for segment in more {
        match segment {
            Segment::Sql(sql) => push_sql(segments, &sql),
            other => segments.push(other)
        }
    }
}

/// Compile-time rendering of static segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticStatement {
    /// Final SQL text.
    pub text: String,

    /// Binding index per parameter, in marker order.
    pub parameters: Vec<usize>
}

/// Render static segments with the runtime builder's marker rules.
///
/// Returns `None` when a segment needs run-time data.
#[must_use]
pub fn render_static(
    segments: &[Segment],
    bindings: &[BindingSpec],
    dialect: Dialect
) -> Option<StaticStatement> {
    let mut builder = StatementBuilder::new(dialect);
    for segment in segments {
        match segment {
            Segment::Sql(sql) => {
                builder.push_sql(sql);
            }
            Segment::Param(index) => {
                builder.push_param(&bindings.get(*index)?.name, Value::Null);
            }
            _ => return None
        }
    }
    let statement = builder.finish();
    let parameters = statement
        .parameters
        .iter()
        .map(|p| bindings.iter().position(|b| b.name == p.name))
        .collect::<Option<Vec<_>>>()?;
    Some(StaticStatement {
        text: statement.text,
        parameters
    })
}
