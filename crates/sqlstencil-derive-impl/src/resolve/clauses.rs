// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Clause placeholders: `table`, `where`, `orderby`, `limit`, `offset`,
//! `page`, `dynamic`, and `if` blocks.

use super::{Resolver, options::Options, token_anchor};
use crate::{
    diagnostics::Anchor,
    method::{attrs::DynamicKind, shape::TypeShape},
    plan::{BindingSource, CondKind, PagingValue, Segment, extend, push_sql},
    template::{Conditional, TemplateNode}
};

/// Words that end a table reference instead of aliasing it.
const NOT_ALIASES: &[&str] = &[
    "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "OUTER", "NATURAL", "ON", "USING",
    "SET", "VALUES", "DEFAULT", "SELECT", "ORDER", "GROUP", "HAVING", "LIMIT", "OFFSET", "FETCH",
    "UNION", "EXCEPT", "INTERSECT", "RETURNING", "OUTPUT", "WINDOW", "FOR", "WITH"
];

/// Alias written right after the table placeholder, if any.
fn alias_after(next: Option<&TemplateNode>) -> Option<String> {
    let Some(TemplateNode::Text {
        text, ..
    }) = next
    else {
        return None;
    };
    if !text.starts_with(char::is_whitespace) {
        return None;
    }
    let mut words = text.split_whitespace().map(|word| {
        word.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .next()
            .unwrap_or_default()
    });
    let mut word = words.next()?;
    if word.eq_ignore_ascii_case("AS") {
        word = words.next()?;
    }
    let upper = word.to_ascii_uppercase();
    let valid = word
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    (valid && !NOT_ALIASES.contains(&upper.as_str())).then(|| word.to_string())
}

impl Resolver<'_> {
    pub(super) fn table(
        &mut self,
        options: &Options,
        next: Option<&TemplateNode>,
        out: &mut Vec<Segment>
    ) {
        options.check("table", &[], self.sink);
        self.no_positional(options, "table");
        push_sql(out, &self.entity.qualified_table());
        if self.depth == 0 && self.plan.table_alias.is_none() {
            self.plan.table_alias = alias_after(next);
        }
    }

    pub(super) fn where_clause(&mut self, options: &Options, anchor: &Anchor, out: &mut Vec<Segment>) {
        options.check("where", &["param", "prefix"], self.sink);
        self.no_positional(options, "where");
        let prefix = self
            .prefix(options)
            .map(str::to_string)
            .or_else(|| self.plan.table_alias.clone());

        if options.has("param") {
            let Some(token) = options.single("param", self.sink) else {
                return;
            };
            let Some(param) =
                self.typed_param(token, |s| *s == TypeShape::Predicate, "a `Predicate<E>`")
            else {
                return;
            };
            out.push(Segment::Predicate {
                param:   param.name.clone(),
                columns: self.entity.quoted_columns(prefix.as_deref())
            });
            return;
        }

        let method = self.method;
        match &method.filter {
            Some(filter) => {
                let lowered = self.lower_filter(filter, prefix.as_deref());
                extend(out, lowered);
            }
            None if method.has_filter_attr => {}
            None => {
                let hint = match method.sole_param(&TypeShape::Predicate) {
                    Some(param) => format!("; did you mean `where --param {}`?", param.name),
                    None => String::new()
                };
                self.sink.error(
                    "FILTER-MISSING",
                    anchor.clone(),
                    format!("`where` needs a #[filter(...)] closure or `--param` with a `Predicate<E>`{hint}")
                );
            }
        }
    }

    pub(super) fn order_by(&mut self, options: &Options, anchor: &Anchor, out: &mut Vec<Segment>) {
        options.check("orderby", &["param", "desc", "prefix"], self.sink);
        let prefix = self
            .prefix(options)
            .map(str::to_string)
            .or_else(|| self.plan.table_alias.clone());
        if let Some(flag) = options.flag("desc")
            && let Some(extra) = flag.args.first()
        {
            self.sink.error("OPT-INVALID", token_anchor(extra), "`--desc` takes no arguments");
        }
        let descending = options.has("desc");

        let mut keys = Vec::new();
        for token in &options.positional {
            let (name, direction) = match token.text.split_once(':') {
                Some((name, direction)) => (name, Some(direction)),
                None => (token.text.as_str(), None)
            };
            let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
                None if descending => "DESC",
                None | Some("asc") => "ASC",
                Some("desc") => "DESC",
                Some(other) => {
                    self.sink.error(
                        "OPT-INVALID",
                        token_anchor(token),
                        format!("unknown direction `{other}`, expected `asc` or `desc`")
                    );
                    continue;
                }
            };
            let Some(index) = self.entity.find(name) else {
                self.unknown_member(name, token_anchor(token));
                continue;
            };
            keys.push(format!("{} {direction}", self.entity.quoted(index, prefix.as_deref())));
        }
        let fixed = (!keys.is_empty()).then(|| format!("ORDER BY {}", keys.join(", ")));

        if options.has("param") {
            let Some(token) = options.single("param", self.sink) else {
                return;
            };
            let Some(param) = self.typed_param(token, |s| *s == TypeShape::Sort, "a `Sort<E>`")
            else {
                return;
            };
            out.push(Segment::Sort {
                param:    param.name.clone(),
                columns:  self.entity.quoted_columns(prefix.as_deref()),
                fallback: fixed
            });
            return;
        }
        match fixed {
            Some(sql) => push_sql(out, &sql),
            None if options.positional.is_empty() => self.sink.error(
                "OPT-MISSING",
                anchor.clone(),
                "`orderby` needs members (`orderby name created_at:desc`) or `--param` with a `Sort<E>`"
            ),
            None => {}
        }
    }

    pub(super) fn paging_value(&mut self, name: &str, options: &Options, anchor: &Anchor) {
        options.check(name, &["param"], self.sink);
        if self.depth > 0 {
            self.sink.error(
                "OPT-INVALID",
                anchor.clone(),
                format!("`{name}` cannot appear inside an `if` block")
            );
            return;
        }
        let taken = match name {
            "limit" => self.plan.paging.limit.is_some(),
            _ => self.plan.paging.offset.is_some()
        };
        if taken {
            self.sink.error(
                "PAGING-DUPLICATE",
                anchor.clone(),
                format!("`{name}` is already set for this statement")
            );
            return;
        }

        let value = if options.has("param") {
            let Some(token) = options.single("param", self.sink) else {
                return;
            };
            let Some(param) = self.typed_param(token, |s| *s == TypeShape::Scalar, "an integer")
            else {
                return;
            };
            PagingValue::Binding(
                self.plan
                    .bind(&param.name, BindingSource::Param(param.name.clone()))
            )
        } else {
            let Some(token) = options.positional.first() else {
                self.sink.error(
                    "OPT-MISSING",
                    anchor.clone(),
                    format!("`{name}` needs a number or `--param`")
                );
                return;
            };
            match token.text.parse::<i64>() {
                Ok(value) if value < 0 => {
                    self.sink.error(
                        "PAGING-NEGATIVE",
                        token_anchor(token),
                        format!("`{name}` cannot be negative")
                    );
                    return;
                }
                Ok(value) => PagingValue::Literal(value),
                Err(_) => {
                    self.sink.error(
                        "OPT-INVALID",
                        token_anchor(token),
                        format!("`{}` is not an integer", token.text)
                    );
                    return;
                }
            }
        };
        match name {
            "limit" => self.plan.paging.limit = Some(value),
            _ => self.plan.paging.offset = Some(value)
        }
    }

    pub(super) fn page(&mut self, options: &Options, anchor: &Anchor) {
        options.check("page", &["param"], self.sink);
        self.no_positional(options, "page");
        if self.depth > 0 {
            self.sink.error(
                "OPT-INVALID",
                anchor.clone(),
                "`page` cannot appear inside an `if` block"
            );
            return;
        }
        if self.plan.paging.is_requested() {
            self.sink.error(
                "PAGING-DUPLICATE",
                anchor.clone(),
                "paging is already set for this statement"
            );
            return;
        }
        let method = self.method;
        let param = if options.has("param") {
            options.single("param", self.sink).and_then(|token| {
                self.typed_param(token, |s| *s == TypeShape::Pagination, "a `Pagination`")
            })
        } else {
            let sole = method.sole_param(&TypeShape::Pagination);
            if sole.is_none() {
                self.sink.error(
                    "OPT-MISSING",
                    anchor.clone(),
                    "`page` needs `--param` with a `Pagination`"
                );
            }
            sole
        };
        if let Some(param) = param {
            self.bind_page(&param.name);
        }
    }

    fn bind_page(&mut self, param: &str) {
        let limit = self.plan.bind("page_limit", BindingSource::PageField {
            param: param.to_string(),
            field: "limit"
        });
        let offset = self.plan.bind("page_offset", BindingSource::PageField {
            param: param.to_string(),
            field: "offset"
        });
        self.plan.paging.limit = Some(PagingValue::Binding(limit));
        self.plan.paging.offset = Some(PagingValue::Binding(offset));
        self.plan.paging.page_param = Some(param.to_string());
    }

    pub(super) fn dynamic(&mut self, options: &Options, anchor: &Anchor, out: &mut Vec<Segment>) {
        options.check("dynamic", &["param"], self.sink);
        self.no_positional(options, "dynamic");
        let Some(token) = options.single("param", self.sink) else {
            if !options.has("param") {
                self.sink.error(
                    "OPT-MISSING",
                    anchor.clone(),
                    "`dynamic` needs `--param` naming a #[dynamic_sql] parameter"
                );
            }
            return;
        };
        let Some(param) = self.param(token) else {
            return;
        };
        let Some(attr) = &param.dynamic else {
            self.sink.error(
                "DYN-ATTR-REQUIRED",
                token_anchor(token),
                format!(
                    "parameter `{}` is spliced into SQL text and must be marked #[dynamic_sql]",
                    param.name
                )
            );
            return;
        };
        self.dynamic_used.push(param.name.clone());
        if param.shape != TypeShape::Text {
            self.sink.error(
                "PARAM-TYPE",
                token_anchor(token),
                format!(
                    "dynamic parameter `{}` is {}, expected text",
                    param.name,
                    param.shape.describe()
                )
            );
            return;
        }
        if attr.kind == DynamicKind::Fragment && attr.allow.is_empty() {
            self.sink.error(
                "DYN-ALLOW-REQUIRED",
                Anchor::Param(param.name.clone()),
                format!(
                    "#[dynamic_sql(fragment)] on `{}` needs an allow list: #[dynamic_sql(fragment, allow(\"...\"))]",
                    param.name
                )
            );
            return;
        }
        out.push(Segment::Dynamic {
            param: param.name.clone(),
            kind:  attr.kind,
            allow: attr.allow.clone()
        });
    }

    pub(super) fn conditional(&mut self, block: &Conditional, out: &mut Vec<Segment>) {
        let anchor = Anchor::Template {
            offset: block.offset,
            text:   block.source.clone()
        };
        self.depth += 1;
        let then = self.nodes(&block.body);
        let otherwise = self.nodes(&block.otherwise);
        self.depth -= 1;

        let Some(kind) = CondKind::from_name(&block.kind) else {
            let message = super::suggest::with_hint(
                format!("unknown `if` test `{}`", block.kind),
                &block.kind,
                CondKind::NAMES.iter().copied()
            );
            self.sink.error("COND-KIND-UNKNOWN", anchor, message);
            return;
        };
        let method = self.method;
        let Some(param) = method.param(&block.param) else {
            let message = super::suggest::with_hint(
                format!("`{}` is not a parameter of `{}`", block.param, method.name()),
                &block.param,
                method.params.iter().map(|p| p.name.as_str())
            );
            self.sink.error("PARAM-UNKNOWN", anchor, message);
            return;
        };

        match decide(kind, &param.shape) {
            Decision::Static(taken) => {
                self.sink.info(
                    "COND-STATIC",
                    anchor,
                    format!(
                        "`if {}` on `{}` is decided at compile time: it is {}",
                        block.kind,
                        param.name,
                        param.shape.describe()
                    )
                );
                extend(out, if taken { then } else { otherwise });
            }
            Decision::Runtime => out.push(Segment::Conditional {
                param: param.name.clone(),
                kind,
                then,
                otherwise
            }),
            Decision::Invalid => self.sink.error(
                "PARAM-TYPE",
                anchor,
                format!(
                    "`if {}` cannot test `{}`: it is {}",
                    block.kind,
                    param.name,
                    param.shape.describe()
                )
            )
        }
    }
}

/// How an `if` test is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Static(bool),
    Runtime,
    Invalid
}

fn has_length(shape: &TypeShape) -> bool {
    matches!(shape, TypeShape::Text | TypeShape::List | TypeShape::Entities)
}

/// Decide a test from the parameter's declared shape where possible.
fn decide(kind: CondKind, shape: &TypeShape) -> Decision {
    match (kind, shape) {
        (CondKind::NotNull | CondKind::Null, TypeShape::Optional(_)) => Decision::Runtime,
        (CondKind::NotNull, _) => Decision::Static(true),
        (CondKind::Null, _) => Decision::Static(false),
        (CondKind::NotEmpty | CondKind::Empty, TypeShape::Optional(inner)) if has_length(inner) => {
            Decision::Runtime
        }
        (CondKind::NotEmpty | CondKind::Empty, shape) if has_length(shape) => Decision::Runtime,
        (CondKind::True | CondKind::False, TypeShape::Bool) => Decision::Runtime,
        (CondKind::True | CondKind::False, TypeShape::Optional(inner))
            if **inner == TypeShape::Bool =>
        {
            Decision::Runtime
        }
        _ => Decision::Invalid
    }
}
