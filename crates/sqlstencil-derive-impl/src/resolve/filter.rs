// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `#[filter]` expressions to SQL.
//!
//! | Expression | SQL |
//! |------------|-----|
//! | `e.m == x` | `"m" = <x>` |
//! | `e.m == None` | `"m" IS NULL` |
//! | `e.m.starts_with(x)` | `"m" LIKE <x%> ESCAPE '!'` |
//! | `[1, 2].contains(&e.m)` | `"m" IN (1, 2)` |
//! | `ids.contains(&e.m)` | `"m" IN (<ids_0>, ...)`, expanded at run time |
//! | `e.flag` | `"flag" = TRUE` |
//! | `a \|\| b` | `(a OR b)` |
//! | `!a` | `NOT (a)` |

use syn::{Expr, Lit, UnOp};

use super::Resolver;
use crate::{
    diagnostics::Anchor,
    method::{
        filter::{FilterExpr, Operand},
        shape::TypeShape
    },
    plan::{BindingSource, Segment, extend, push_sql}
};

impl Resolver<'_> {
    /// Lower `expr`, qualifying columns with `prefix`.
    pub(super) fn lower_filter(&mut self, expr: &FilterExpr, prefix: Option<&str>) -> Vec<Segment> {
        let mut out = Vec::new();
        self.lower_into(expr, prefix, &mut out);
        out
    }

    fn lower_into(&mut self, expr: &FilterExpr, prefix: Option<&str>, out: &mut Vec<Segment>) {
        match expr {
            FilterExpr::And(left, right) => {
                self.lower_into(left, prefix, out);
                push_sql(out, " AND ");
                self.lower_into(right, prefix, out);
            }
            FilterExpr::Or(left, right) => {
                push_sql(out, "(");
                self.lower_into(left, prefix, out);
                push_sql(out, " OR ");
                self.lower_into(right, prefix, out);
                push_sql(out, ")");
            }
            FilterExpr::Not(inner) => {
                push_sql(out, "NOT (");
                self.lower_into(inner, prefix, out);
                push_sql(out, ")");
            }
            FilterExpr::Compare {
                member,
                op,
                value
            } => {
                let Some(column) = self.filter_column(member, prefix) else {
                    return;
                };
                push_sql(out, &format!("{column}{}", op.as_sql()));
                if let Some(binding) = self.operand_binding(member, value) {
                    out.push(Segment::Param(binding));
                }
            }
            FilterExpr::Null {
                member,
                negated
            } => {
                let Some(column) = self.filter_column(member, prefix) else {
                    return;
                };
                let test = if *negated { "IS NOT NULL" } else { "IS NULL" };
                push_sql(out, &format!("{column} {test}"));
            }
            FilterExpr::Like {
                member,
                kind,
                value
            } => {
                let Some(column) = self.filter_column(member, prefix) else {
                    return;
                };
                let source = match value {
                    Operand::Param(param) => {
                        let shape = self.method.param(param).map(|p| &p.shape);
                        if shape != Some(&TypeShape::Text) {
                            self.filter_error(
                                "PARAM-TYPE",
                                format!("`{param}` is used as a LIKE pattern and must be text")
                            );
                            return;
                        }
                        (param.clone(), BindingSource::Like {
                            param: param.clone(),
                            kind:  *kind
                        })
                    }
                    Operand::Literal(literal) => {
                        let Some(text) = string_literal(literal) else {
                            self.filter_error(
                                "FILTER-UNSUPPORTED",
                                format!("`{member}` patterns must be string literals or text parameters")
                            );
                            return;
                        };
                        let pattern = sqlstencil_core::like::pattern(&text, *kind);
                        (member.clone(), BindingSource::Pattern(pattern))
                    }
                };
                let binding = self.plan.bind(&source.0, source.1);
                push_sql(out, &format!("{column} LIKE "));
                out.push(Segment::Param(binding));
                push_sql(out, self.spec.like_escape);
            }
            FilterExpr::InLiterals {
                member,
                values
            } => {
                let Some(column) = self.filter_column(member, prefix) else {
                    return;
                };
                if values.is_empty() {
                    push_sql(out, self.spec.constant_predicate(false));
                    return;
                }
                let mut rendered = Vec::with_capacity(values.len());
                for value in values {
                    match self.inline_literal(value) {
                        Some(text) => rendered.push(text),
                        None => {
                            self.filter_error(
                                "FILTER-UNSUPPORTED",
                                format!("`{member}` membership lists hold literals only")
                            );
                            return;
                        }
                    }
                }
                push_sql(out, &format!("{column} IN ({})", rendered.join(", ")));
            }
            FilterExpr::InParam {
                member,
                param
            } => {
                let Some(column) = self.filter_column(member, prefix) else {
                    return;
                };
                let shape = self.method.param(param).map(|p| &p.shape);
                if shape != Some(&TypeShape::List) {
                    self.filter_error(
                        "PARAM-TYPE",
                        format!("`{param}.contains(..)` needs `{param}` to be a sequence of values")
                    );
                    return;
                }
                extend(out, vec![Segment::InList {
                    param: param.clone(),
                    column,
                    negated: false
                }]);
            }
            FilterExpr::Flag {
                member,
                value
            } => {
                let Some(column) = self.filter_column(member, prefix) else {
                    return;
                };
                push_sql(out, &format!("{column} = {}", self.spec.bool_literal(*value)));
            }
        }
    }

    fn filter_column(&self, member: &str, prefix: Option<&str>) -> Option<String> {
        match self.entity.find(member) {
            Some(index) => Some(self.entity.quoted(index, prefix)),
            None => {
                self.unknown_member(member, Anchor::Filter);
                None
            }
        }
    }

    fn filter_error(&self, code: &'static str, message: String) {
        self.sink.error(code, Anchor::Filter, message);
    }

    fn operand_binding(&mut self, member: &str, value: &Operand) -> Option<usize> {
        match value {
            Operand::Param(param) => {
                let bindable = self
                    .method
                    .param(param)
                    .is_some_and(|p| p.shape.is_bindable());
                if !bindable {
                    self.filter_error(
                        "PARAM-TYPE",
                        format!("`{param}` cannot be compared with `{member}`")
                    );
                    return None;
                }
                Some(self.plan.bind(param, BindingSource::Param(param.clone())))
            }
            Operand::Literal(literal) => {
                Some(self.plan.bind(member, BindingSource::Literal(literal.clone())))
            }
        }
    }

    /// SQL spelling of a literal inlined into an `IN` list.
    fn inline_literal(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Lit(lit) => match &lit.lit {
                Lit::Str(s) => Some(self.spec.string_literal(&s.value())),
                Lit::Char(c) => Some(self.spec.string_literal(&c.value().to_string())),
                Lit::Int(i) => Some(i.base10_digits().to_string()),
                Lit::Float(f) => Some(f.base10_digits().to_string()),
                Lit::Bool(b) => Some(self.spec.bool_literal(b.value).to_string()),
                _ => None
            },
            Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
                self.inline_literal(&unary.expr).map(|text| format!("-{text}"))
            }
            Expr::Paren(paren) => self.inline_literal(&paren.expr),
            Expr::Group(group) => self.inline_literal(&group.expr),
            _ => None
        }
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None
        },
        _ => None
    }
}
