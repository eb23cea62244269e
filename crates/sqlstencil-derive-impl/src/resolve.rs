// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Placeholder resolver.
//!
//! Walks the parsed template of one method and produces a [`Plan`].
//! Placeholders are resolved independently and concatenated in source
//! order; every problem is reported to the method's [`Diagnostics`] sink and
//! resolution continues, so one compilation shows all findings.
//!
//! # Architecture
//!
//! ```text
//! resolve.rs (Resolver, dispatch, post-resolve checks)
//! ├── options.rs  - `--flag arg` option text
//! ├── columns.rs  - columns, values, set, column, by_key, batch
//! ├── clauses.rs  - table, where, orderby, limit/offset/page, dynamic, if
//! ├── filter.rs   - FilterExpr → SQL segments
//! ├── text.rs     - `@name` references in literal text
//! └── suggest.rs  - edit-distance hints
//! ```
//!
//! # Placeholders
//!
//! | Name | Output |
//! |------|--------|
//! | `table` | quoted, schema-qualified table |
//! | `columns` | quoted mapped columns |
//! | `values` | markers for the same member set |
//! | `set` | `column = marker` pairs, keys excluded |
//! | `column <member>` | one quoted column |
//! | `by_key` | `key = marker` |
//! | `where` | lowered `#[filter]`, or a `Predicate<E>` parameter |
//! | `orderby` | `ORDER BY` from members or a `Sort<E>` parameter |
//! | `limit` / `offset` / `page` | paging, rendered at the end of the statement |
//! | `dynamic` | checked `#[dynamic_sql]` splice |
//! | `batch` | multi-row value tuples |
//!
//! In `INSERT` and `UPDATE` statements, generated keys (insert) and members
//! a rewrite pass supplies are left out of `columns`, `values` and `set`.

mod clauses;
mod columns;
mod filter;
pub mod options;
pub mod suggest;
mod text;

#[cfg(test)]
mod tests;

use sqlstencil_core::dialect::DialectSpec;

use self::options::{Options, Token};
use crate::{
    diagnostics::{Anchor, Diagnostics},
    entity::EntityDescriptor,
    method::{MethodSpec, ParamSpec, shape::{ReturnShape, TypeShape}},
    plan::{Plan, Segment, StatementKind},
    template::{Placeholder, TemplateNode, leading_keyword}
};

/// Placeholder names the resolver understands.
pub const PLACEHOLDERS: &[&str] = &[
    "table", "columns", "values", "set", "column", "by_key", "where", "orderby", "limit",
    "offset", "page", "dynamic", "batch", "if", "else", "/if"
];

/// What the resolver works against.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// Repository entity, for the repository's dialect.
    pub entity: &'a EntityDescriptor,

    /// The method being compiled.
    pub method: &'a MethodSpec,

    /// Repository default rows per batch statement.
    pub batch_size: usize
}

/// Role of a recorded member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListRole {
    Columns,
    Values
}

/// Member list produced by `columns`, `values` or `batch`.
#[derive(Debug, Clone)]
struct MemberList {
    role:    ListRole,
    members: Vec<usize>,
    anchor:  Anchor
}

struct Resolver<'a> {
    entity:       &'a EntityDescriptor,
    method:       &'a MethodSpec,
    spec:         &'static DialectSpec,
    sink:         &'a Diagnostics,
    plan:         Plan,
    depth:        usize,
    dynamic_used: Vec<String>,
    lists:        Vec<MemberList>
}

/// Resolve parsed template `nodes` into a plan.
///
/// The plan is always returned; callers check the sink for errors before
/// emitting it.
#[must_use]
pub fn resolve(nodes: &[TemplateNode], cx: &Context<'_>, sink: &Diagnostics) -> Plan {
    let kind = StatementKind::from_keyword(leading_keyword(nodes).as_deref());
    let mut plan = Plan::new(kind, cx.entity.dialect, cx.method.output.clone());
    plan.batch_size = cx.method.batch_size.unwrap_or(cx.batch_size).max(1);

    let mut resolver = Resolver {
        entity: cx.entity,
        method: cx.method,
        spec: cx.entity.spec(),
        sink,
        plan,
        depth: 0,
        dynamic_used: Vec::new(),
        lists: Vec::new()
    };
    let segments = resolver.nodes(nodes);
    resolver.plan.segments = segments;
    resolver.finish();
    resolver.plan
}

impl<'a> Resolver<'a> {
    fn nodes(&mut self, nodes: &[TemplateNode]) -> Vec<Segment> {
        let mut out = Vec::new();
        for (index, node) in nodes.iter().enumerate() {
            match node {
                TemplateNode::Text {
                    text,
                    offset
                } => self.text(text, *offset, &mut out),
                TemplateNode::Placeholder(placeholder) => {
                    self.placeholder(placeholder, nodes.get(index + 1), &mut out);
                }
                TemplateNode::Conditional(conditional) => self.conditional(conditional, &mut out)
            }
        }
        out
    }

    fn placeholder(&mut self, p: &Placeholder, next: Option<&TemplateNode>, out: &mut Vec<Segment>) {
        let options = Options::parse(&p.options, p.options_offset);
        let anchor = Anchor::Template {
            offset: p.offset,
            text:   p.source.clone()
        };
        match p.name.as_str() {
            "table" => self.table(&options, next, out),
            "columns" => self.columns(&options, &anchor, out),
            "values" => self.values(&options, &anchor, out),
            "set" => self.set(&options, &anchor, out),
            "column" => self.column(&options, &anchor, out),
            "by_key" => self.by_key(&options, &anchor, out),
            "where" => self.where_clause(&options, &anchor, out),
            "orderby" => self.order_by(&options, &anchor, out),
            "limit" | "offset" => self.paging_value(&p.name, &options, &anchor),
            "page" => self.page(&options, &anchor),
            "dynamic" => self.dynamic(&options, &anchor, out),
            "batch" => self.batch(&options, &anchor, out),
            other => {
                let message = suggest::with_hint(
                    format!("unknown placeholder `{other}`"),
                    other,
                    PLACEHOLDERS.iter().copied()
                );
                self.sink.error("PH-UNKNOWN", anchor, message);
            }
        }
    }

    /// Method parameter named by `token`; reports `PARAM-UNKNOWN`.
    fn param(&self, token: &Token) -> Option<&'a ParamSpec> {
        let method = self.method;
        let found = method.param(&token.text);
        if found.is_none() {
            let message = suggest::with_hint(
                format!("`{}` is not a parameter of `{}`", token.text, method.name()),
                &token.text,
                method.params.iter().map(|p| p.name.as_str())
            );
            self.sink.error("PARAM-UNKNOWN", token_anchor(token), message);
        }
        found
    }

    /// Method parameter named by `token` whose shape passes `accept`;
    /// reports `PARAM-UNKNOWN` or `PARAM-TYPE`.
    fn typed_param(
        &self,
        token: &Token,
        accept: impl Fn(&TypeShape) -> bool,
        expected: &str
    ) -> Option<&'a ParamSpec> {
        let param = self.param(token)?;
        if accept(&param.shape) {
            return Some(param);
        }
        self.sink.error(
            "PARAM-TYPE",
            token_anchor(token),
            format!(
                "parameter `{}` is {}, expected {expected}",
                param.name,
                param.shape.describe()
            )
        );
        None
    }

    /// Report `MEMBER-UNKNOWN` for `name`.
    fn unknown_member(&self, name: &str, anchor: Anchor) {
        let message = suggest::with_hint(
            format!("`{}` has no mapped member `{name}`", self.entity.ident),
            name,
            self.entity.member_names()
        );
        self.sink.error("MEMBER-UNKNOWN", anchor, message);
    }

    /// Mapped member named by `token`; reports `MEMBER-UNKNOWN`.
    fn member(&self, token: &Token) -> Option<usize> {
        let found = self.entity.find(&token.text);
        if found.is_none() {
            self.unknown_member(&token.text, token_anchor(token));
        }
        found
    }

    fn prefix<'o>(&self, options: &'o Options) -> Option<&'o str> {
        options
            .single("prefix", self.sink)
            .map(|token| token.text.as_str())
    }

    fn no_positional(&self, options: &Options, placeholder: &str) {
        if let Some(extra) = options.positional.first() {
            self.sink.error(
                "OPT-INVALID",
                token_anchor(extra),
                format!("`{placeholder}` takes no arguments")
            );
        }
    }

    fn finish(&mut self) {
        self.check_order();
        for param in &self.method.params {
            if param.dynamic.is_some() && !self.dynamic_used.contains(&param.name) {
                self.sink.warning(
                    "DYN-UNUSED",
                    Anchor::Param(param.name.clone()),
                    format!(
                        "parameter `{}` is marked #[dynamic_sql] but no `dynamic` placeholder uses it",
                        param.name
                    )
                );
            }
        }
        if self.plan.output == ReturnShape::Page && !self.plan.paging.is_requested() {
            self.sink.error(
                "PAGE-REQUIRES-PAGING",
                Anchor::ReturnType,
                "`Page<E>` results need `{{page}}` or `{{limit}}`/`{{offset}}` in the template"
            );
        }
    }

    /// Every `values`/`batch` list must match the `columns` list.
    fn check_order(&self) {
        let Some(columns) = self.lists.iter().find(|l| l.role == ListRole::Columns) else {
            return;
        };
        for values in self.lists.iter().filter(|l| l.role == ListRole::Values) {
            if values.members != columns.members {
                let names = |list: &MemberList| {
                    list.members
                        .iter()
                        .map(|index| self.entity.columns[*index].member.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                self.sink.error(
                    "ORDER-MISMATCH",
                    values.anchor.clone(),
                    format!(
                        "value list ({}) does not match column list ({})",
                        names(values),
                        names(columns)
                    )
                );
            }
        }
    }
}

fn token_anchor(token: &Token) -> Anchor {
    Anchor::Template {
        offset: token.offset,
        text:   token.text.clone()
    }
}
