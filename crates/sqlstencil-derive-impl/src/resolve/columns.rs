// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Member-list placeholders: `columns`, `values`, `set`, `column`,
//! `by_key` and `batch`.

use super::{ListRole, MemberList, Resolver, options::Options, token_anchor};
use crate::{
    diagnostics::Anchor,
    entity::KeyResolution,
    method::shape::{ReturnShape, TypeShape},
    plan::{BindingSource, Segment, StatementKind, push_sql}
};

/// Which placeholder asks for a member set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListUse {
    Columns,
    Values,
    Set,
    Batch
}

impl ListUse {
    const fn name(self) -> &'static str {
        match self {
            Self::Columns => "columns",
            Self::Values => "values",
            Self::Set => "set",
            Self::Batch => "batch"
        }
    }
}

/// Where member values come from.
enum ValueSource {
    /// Members of an entity parameter.
    Entity(String),

    /// Parameters named after the members.
    Params
}

impl Resolver<'_> {
    /// Whether the statement context leaves member `index` out.
    fn write_excluded(&self, index: usize, list: ListUse) -> bool {
        let column = &self.entity.columns[index];
        let key_in_set = list == ListUse::Set && column.key;
        match self.plan.kind {
            StatementKind::Insert => column.generated || self.entity.managed_on_insert(index),
            StatementKind::Update => key_in_set || self.entity.managed_on_update(index),
            _ => key_in_set
        }
    }

    /// Member set selected by `--only` / `--exclude` and the statement
    /// context, in declaration order.
    fn member_set(&self, options: &Options, list: ListUse, anchor: &Anchor) -> Option<Vec<usize>> {
        if options.has("only") && options.has("exclude") {
            self.sink.error(
                "OPT-CONFLICT",
                anchor.clone(),
                "`--only` and `--exclude` cannot be combined"
            );
            return None;
        }
        let named = |flag: &str| -> Option<Vec<usize>> {
            let tokens = options.list(flag, self.sink)?;
            Some(tokens.iter().filter_map(|token| self.member(token)).collect())
        };
        let members: Vec<usize> = if let Some(only) = named("only") {
            self.entity
                .mapped()
                .map(|(index, _)| index)
                .filter(|index| only.contains(index))
                .filter(|index| !(list == ListUse::Set && self.entity.columns[*index].key))
                .collect()
        } else {
            let excluded = named("exclude").unwrap_or_default();
            self.entity
                .mapped()
                .map(|(index, _)| index)
                .filter(|index| !excluded.contains(index) && !self.write_excluded(*index, list))
                .collect()
        };
        if members.is_empty() {
            self.sink.error(
                "COLUMNS-EMPTY",
                anchor.clone(),
                format!("`{}` selects no member of `{}`", list.name(), self.entity.ident)
            );
            return None;
        }
        Some(members)
    }

    /// Source for member values: `--param`, the sole entity parameter, or
    /// same-named parameters.
    fn value_source(&self, options: &Options) -> Option<ValueSource> {
        if options.has("param") {
            let token = options.single("param", self.sink)?;
            let param = self.typed_param(token, |s| *s == TypeShape::Entity, "the entity")?;
            return Some(ValueSource::Entity(param.name.clone()));
        }
        Some(match self.method.sole_param(&TypeShape::Entity) {
            Some(param) => ValueSource::Entity(param.name.clone()),
            None => ValueSource::Params
        })
    }

    /// Binding for member `index`; reports `BIND-UNRESOLVED`.
    fn member_binding(&mut self, index: usize, source: &ValueSource, anchor: &Anchor) -> Option<usize> {
        let member = self.entity.columns[index].member.clone();
        match source {
            ValueSource::Entity(param) => Some(self.plan.bind(&member, BindingSource::Field {
                param:  param.clone(),
                member: member.clone()
            })),
            ValueSource::Params => match self.method.param(&member) {
                Some(param) if param.shape.is_bindable() => {
                    Some(self.plan.bind(&member, BindingSource::Param(member.clone())))
                }
                _ => {
                    self.sink.error(
                        "BIND-UNRESOLVED",
                        anchor.clone(),
                        format!(
                            "no value for member `{member}`: add an entity parameter or a parameter named `{member}`"
                        )
                    );
                    None
                }
            }
        }
    }

    pub(super) fn columns(&mut self, options: &Options, anchor: &Anchor, out: &mut Vec<Segment>) {
        options.check("columns", &["exclude", "only", "prefix"], self.sink);
        self.no_positional(options, "columns");
        let prefix = self.prefix(options);
        let Some(members) = self.member_set(options, ListUse::Columns, anchor) else {
            return;
        };
        let rendered: Vec<String> = members
            .iter()
            .map(|index| self.entity.quoted(*index, prefix))
            .collect();

        if self.depth == 0 && self.plan.projection.is_none() && self.plan.kind == StatementKind::Select {
            self.plan.fixed_order = projects_first(out);
            self.plan.projection = Some(
                members
                    .iter()
                    .map(|index| self.entity.columns[*index].member.clone())
                    .collect()
            );
        }
        push_sql(out, &rendered.join(", "));
        self.lists.push(MemberList {
            role: ListRole::Columns,
            members,
            anchor: anchor.clone()
        });
    }

    pub(super) fn values(&mut self, options: &Options, anchor: &Anchor, out: &mut Vec<Segment>) {
        options.check("values", &["exclude", "only", "param"], self.sink);
        self.no_positional(options, "values");
        let Some(members) = self.member_set(options, ListUse::Values, anchor) else {
            return;
        };
        let Some(source) = self.value_source(options) else {
            return;
        };
        for (position, index) in members.iter().enumerate() {
            if position > 0 {
                push_sql(out, ", ");
            }
            if let Some(binding) = self.member_binding(*index, &source, anchor) {
                out.push(Segment::Param(binding));
            }
        }
        self.lists.push(MemberList {
            role: ListRole::Values,
            members,
            anchor: anchor.clone()
        });
    }

    pub(super) fn set(&mut self, options: &Options, anchor: &Anchor, out: &mut Vec<Segment>) {
        options.check("set", &["exclude", "only", "param"], self.sink);
        self.no_positional(options, "set");
        let Some(members) = self.member_set(options, ListUse::Set, anchor) else {
            return;
        };
        let Some(source) = self.value_source(options) else {
            return;
        };
        for (position, index) in members.iter().enumerate() {
            if position > 0 {
                push_sql(out, ", ");
            }
            push_sql(out, &format!("{} = ", self.entity.quoted(*index, None)));
            if let Some(binding) = self.member_binding(*index, &source, anchor) {
                out.push(Segment::Param(binding));
            }
        }
    }

    pub(super) fn column(&mut self, options: &Options, anchor: &Anchor, out: &mut Vec<Segment>) {
        options.check("column", &["prefix"], self.sink);
        let prefix = self.prefix(options);
        let Some((first, rest)) = options.positional.split_first() else {
            self.sink.error(
                "OPT-MISSING",
                anchor.clone(),
                "`column` needs a member name, e.g. `column name`"
            );
            return;
        };
        if let Some(extra) = rest.first() {
            self.sink.error(
                "OPT-INVALID",
                token_anchor(extra),
                "`column` takes exactly one member"
            );
        }
        if let Some(index) = self.member(first) {
            push_sql(out, &self.entity.quoted(index, prefix));
        }
    }

    pub(super) fn by_key(&mut self, options: &Options, anchor: &Anchor, out: &mut Vec<Segment>) {
        options.check("by_key", &["param", "prefix"], self.sink);
        self.no_positional(options, "by_key");
        let prefix = self.prefix(options);
        let Some(key) = self.entity.key_index() else {
            let message = match &self.entity.key {
                KeyResolution::Ambiguous(candidates) => format!(
                    "`{}` has several key candidates ({}); mark one with #[key] or write the predicate explicitly",
                    self.entity.ident,
                    candidates.join(", ")
                ),
                _ => format!(
                    "`{}` has no key member; mark one with #[key]",
                    self.entity.ident
                )
            };
            self.sink.error("KEY-REQUIRED", anchor.clone(), message);
            return;
        };
        let member = self.entity.columns[key].member.clone();

        let source = if options.has("param") {
            let Some(token) = options.single("param", self.sink) else {
                return;
            };
            let Some(param) = self.typed_param(
                token,
                |s| *s == TypeShape::Entity || s.is_bindable(),
                "the entity or a key value"
            ) else {
                return;
            };
            if param.shape == TypeShape::Entity {
                BindingSource::Field {
                    param:  param.name.clone(),
                    member: member.clone()
                }
            } else {
                BindingSource::Param(param.name.clone())
            }
        } else if let Some(param) = self.method.param(&member).filter(|p| p.shape.is_bindable()) {
            BindingSource::Param(param.name.clone())
        } else if let Some(param) = self.method.sole_param(&TypeShape::Entity) {
            BindingSource::Field {
                param:  param.name.clone(),
                member: member.clone()
            }
        } else {
            self.sink.error(
                "BIND-UNRESOLVED",
                anchor.clone(),
                format!("no value for key `{member}`: add a parameter named `{member}` or an entity parameter")
            );
            return;
        };
        let name = match &source {
            BindingSource::Param(name) => name.clone(),
            _ => member
        };
        let binding = self.plan.bind(&name, source);
        push_sql(out, &format!("{} = ", self.entity.quoted(key, prefix)));
        out.push(Segment::Param(binding));
    }

    pub(super) fn batch(&mut self, options: &Options, anchor: &Anchor, out: &mut Vec<Segment>) {
        options.check("batch", &["exclude", "only", "param"], self.sink);
        self.no_positional(options, "batch");
        if self.plan.kind != StatementKind::Insert || self.depth > 0 {
            self.sink.error(
                "BATCH-PARAM",
                anchor.clone(),
                "`batch` is only valid in the value list of an INSERT, outside `if` blocks"
            );
            return;
        }
        if out.iter().any(|s| matches!(s, Segment::Batch { .. })) {
            self.sink.error("BATCH-PARAM", anchor.clone(), "only one `batch` per statement");
            return;
        }
        if !matches!(self.plan.output, ReturnShape::Unit | ReturnShape::Integer(_)) {
            self.sink.error(
                "BATCH-PARAM",
                anchor.clone(),
                "batch methods return `()` or an affected-row count"
            );
            return;
        }
        let param = if options.has("param") {
            let Some(token) = options.single("param", self.sink) else {
                return;
            };
            let Some(param) =
                self.typed_param(token, |s| *s == TypeShape::Entities, "a sequence of entities")
            else {
                return;
            };
            param
        } else if let Some(param) = self.method.sole_param(&TypeShape::Entities) {
            param
        } else {
            self.sink.error(
                "BATCH-PARAM",
                anchor.clone(),
                "`batch` needs one parameter of type `&[E]` or `Vec<E>`, or `--param items`"
            );
            return;
        };
        let Some(members) = self.member_set(options, ListUse::Batch, anchor) else {
            return;
        };
        out.push(Segment::Batch {
            param:   param.name.clone(),
            members: members
                .iter()
                .map(|index| self.entity.columns[*index].member.clone())
                .collect(),
            extras:  Vec::new()
        });
        self.lists.push(MemberList {
            role: ListRole::Values,
            members,
            anchor: anchor.clone()
        });
    }
}

/// Whether only `SELECT` or `SELECT DISTINCT` precedes the column list.
fn projects_first(before: &[Segment]) -> bool {
    let mut text = String::new();
    for segment in before {
        match segment {
            Segment::Sql(sql) => text.push_str(sql),
            _ => return false
        }
    }
    let words: Vec<String> = text
        .split_whitespace()
        .map(str::to_ascii_uppercase)
        .collect();
    matches!(
        words.iter().map(String::as_str).collect::<Vec<_>>().as_slice(),
        ["SELECT"] | ["SELECT", "DISTINCT"]
    )
}
