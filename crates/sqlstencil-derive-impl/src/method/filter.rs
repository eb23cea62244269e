// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `#[filter(|e| ...)]` closures.
//!
//! The closure is never compiled; its body is read as a small expression
//! language over the entity's members and the method's parameters.
//!
//! | Rust | Meaning |
//! |------|---------|
//! | `a && b`, `a \|\| b`, `!a` | connectives |
//! | `e.m == x`, `!=`, `<`, `<=`, `>`, `>=` | comparison; either side may be the member |
//! | `e.m == None`, `e.m.is_none()`, `e.m.is_some()` | null tests |
//! | `e.m.starts_with(x)`, `ends_with`, `contains` | `LIKE` |
//! | `[a, b].contains(&e.m)` | `IN` with inlined literals |
//! | `p.contains(&e.m)` | `IN` expanded from parameter `p` at run time |
//! | `e.m`, `!e.m` | boolean member |
//!
//! `x` is a method parameter or a literal.

use sqlstencil_core::LikeKind;
use syn::{
    BinOp, Expr, ExprClosure, ExprMethodCall, Pat, UnOp, ext::IdentExt, spanned::Spanned
};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,

    /// `!=`
    Ne,

    /// `<`
    Lt,

    /// `<=`
    Le,

    /// `>`
    Gt,

    /// `>=`
    Ge
}

impl CompareOp {
    /// SQL spelling with surrounding spaces.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => " = ",
            Self::Ne => " <> ",
            Self::Lt => " < ",
            Self::Le => " <= ",
            Self::Gt => " > ",
            Self::Ge => " >= "
        }
    }

    /// Operator with its operands swapped.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
            other => other
        }
    }

    fn from_bin_op(op: &BinOp) -> Option<Self> {
        Some(match op {
            BinOp::Eq(_) => Self::Eq,
            BinOp::Ne(_) => Self::Ne,
            BinOp::Lt(_) => Self::Lt,
            BinOp::Le(_) => Self::Le,
            BinOp::Gt(_) => Self::Gt,
            BinOp::Ge(_) => Self::Ge,
            _ => return None
        })
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A method parameter.
    Param(String),

    /// A literal, kept as written.
    Literal(Expr)
}

/// Lowered filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Both hold.
    And(Box<FilterExpr>, Box<FilterExpr>),

    /// Either holds.
    Or(Box<FilterExpr>, Box<FilterExpr>),

    /// Negation.
    Not(Box<FilterExpr>),

    /// `member <op> value`.
    Compare {
        /// Entity member.
        member: String,

        /// Operator, member on the left.
        op: CompareOp,

        /// Compared value.
        value: Operand
    },

    /// `member IS [NOT] NULL`.
    Null {
        /// Entity member.
        member: String,

        /// `IS NOT NULL`.
        negated: bool
    },

    /// `member LIKE pattern`.
    Like {
        /// Entity member.
        member: String,

        /// Match kind.
        kind: LikeKind,

        /// Pattern source.
        value: Operand
    },

    /// `member IN (literal, ...)`.
    InLiterals {
        /// Entity member.
        member: String,

        /// Inlined literals.
        values: Vec<Expr>
    },

    /// `member IN (...)` from a sequence parameter.
    InParam {
        /// Entity member.
        member: String,

        /// Sequence parameter.
        param: String
    },

    /// `member = <bool literal>`.
    Flag {
        /// Entity member.
        member: String,

        /// Expected value.
        value: bool
    }
}

struct Lowering<'a> {
    var:    String,
    params: &'a [String]
}

/// Lower a filter closure.
///
/// # Errors
///
/// Closures with other than one plain argument and expressions outside the
/// supported subset.
pub fn lower(closure: &ExprClosure, params: &[String]) -> syn::Result<FilterExpr> {
    if closure.inputs.len() != 1 {
        return Err(syn::Error::new_spanned(
            &closure.inputs,
            "filter closures take exactly one argument"
        ));
    }
    let var = match &closure.inputs[0] {
        Pat::Ident(pat) => pat.ident.unraw().to_string(),
        Pat::Type(typed) => match typed.pat.as_ref() {
            Pat::Ident(pat) => pat.ident.unraw().to_string(),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "filter closure argument must be a plain name"
                ));
            }
        },
        other => {
            return Err(syn::Error::new_spanned(
                other,
                "filter closure argument must be a plain name"
            ));
        }
    };
    Lowering {
        var,
        params
    }
    .expr(&closure.body)
}

fn unsupported(expr: &impl Spanned, what: &str) -> syn::Error {
    syn::Error::new(expr.span(), format!("unsupported filter expression: {what}"))
}

impl Lowering<'_> {
    fn expr(&self, expr: &Expr) -> syn::Result<FilterExpr> {
        match expr {
            Expr::Paren(inner) => self.expr(&inner.expr),
            Expr::Group(inner) => self.expr(&inner.expr),
            Expr::Block(block) if block.block.stmts.len() == 1 => match &block.block.stmts[0] {
                syn::Stmt::Expr(inner, None) => self.expr(inner),
                _ => Err(unsupported(block, "statements are not allowed"))
            },
            Expr::Binary(binary) => match binary.op {
                BinOp::And(_) => Ok(FilterExpr::And(
                    Box::new(self.expr(&binary.left)?),
                    Box::new(self.expr(&binary.right)?)
                )),
                BinOp::Or(_) => Ok(FilterExpr::Or(
                    Box::new(self.expr(&binary.left)?),
                    Box::new(self.expr(&binary.right)?)
                )),
                ref op => {
                    let op = CompareOp::from_bin_op(op)
                        .ok_or_else(|| unsupported(expr, "only comparisons and `&&`/`||`"))?;
                    self.comparison(expr, &binary.left, op, &binary.right)
                }
            },
            Expr::Unary(unary) if matches!(unary.op, UnOp::Not(_)) => {
                if let Some(member) = self.member(&unary.expr) {
                    return Ok(FilterExpr::Flag {
                        member,
                        value: false
                    });
                }
                Ok(FilterExpr::Not(Box::new(self.expr(&unary.expr)?)))
            }
            Expr::MethodCall(call) => self.method_call(call),
            Expr::Field(_) => self
                .member(expr)
                .map(|member| FilterExpr::Flag {
                    member,
                    value: true
                })
                .ok_or_else(|| unsupported(expr, "fields must belong to the closure argument")),
            _ => Err(unsupported(expr, "not part of the filter language"))
        }
    }

    fn comparison(
        &self,
        expr: &Expr,
        left: &Expr,
        op: CompareOp,
        right: &Expr
    ) -> syn::Result<FilterExpr> {
        let (member, op, other) = match (self.member(left), self.member(right)) {
            (Some(member), None) => (member, op, right),
            (None, Some(member)) => (member, op.flip(), left),
            (Some(_), Some(_)) => {
                return Err(unsupported(expr, "comparing two members"));
            }
            (None, None) => {
                return Err(unsupported(expr, "a comparison must mention a member"));
            }
        };
        if is_none(other) {
            return match op {
                CompareOp::Eq => Ok(FilterExpr::Null {
                    member,
                    negated: false
                }),
                CompareOp::Ne => Ok(FilterExpr::Null {
                    member,
                    negated: true
                }),
                _ => Err(unsupported(expr, "`None` only compares with `==` or `!=`"))
            };
        }
        Ok(FilterExpr::Compare {
            member,
            op,
            value: self.operand(other)?
        })
    }

    fn method_call(&self, call: &ExprMethodCall) -> syn::Result<FilterExpr> {
        let method = call.method.to_string();
        if let Some(member) = self.member(&call.receiver) {
            return match (method.as_str(), call.args.len()) {
                ("is_none", 0) => Ok(FilterExpr::Null {
                    member,
                    negated: false
                }),
                ("is_some", 0) => Ok(FilterExpr::Null {
                    member,
                    negated: true
                }),
                ("starts_with" | "ends_with" | "contains", 1) => {
                    let kind = match method.as_str() {
                        "starts_with" => LikeKind::Prefix,
                        "ends_with" => LikeKind::Suffix,
                        _ => LikeKind::Contains
                    };
                    Ok(FilterExpr::Like {
                        member,
                        kind,
                        value: self.operand(&call.args[0])?
                    })
                }
                _ => Err(unsupported(call, "unknown member method"))
            };
        }
        if method != "contains" || call.args.len() != 1 {
            return Err(unsupported(call, "only `contains` is supported on collections"));
        }
        let member = self
            .member(&call.args[0])
            .ok_or_else(|| unsupported(&call.args[0], "`contains` takes `&e.member`"))?;
        match strip_reference(&call.receiver) {
            Expr::Array(array) => Ok(FilterExpr::InLiterals {
                member,
                values: array.elems.iter().cloned().collect()
            }),
            receiver => match self.param(receiver) {
                Some(param) => Ok(FilterExpr::InParam {
                    member,
                    param
                }),
                None => Err(unsupported(
                    receiver,
                    "`contains` receiver must be an array literal or a parameter"
                ))
            }
        }
    }

    /// `var.member`, possibly behind `&`, `*` or parentheses.
    fn member(&self, expr: &Expr) -> Option<String> {
        match strip_reference(expr) {
            Expr::Field(field) => {
                let Expr::Path(base) = strip_reference(&field.base) else {
                    return None;
                };
                let ident = base.path.get_ident()?;
                if ident.unraw() != self.var {
                    return None;
                }
                match &field.member {
                    syn::Member::Named(name) => Some(name.unraw().to_string()),
                    syn::Member::Unnamed(_) => None
                }
            }
            _ => None
        }
    }

    fn param(&self, expr: &Expr) -> Option<String> {
        let Expr::Path(path) = strip_reference(expr) else {
            return None;
        };
        let name = path.path.get_ident()?.unraw().to_string();
        self.params.contains(&name).then_some(name)
    }

    fn operand(&self, expr: &Expr) -> syn::Result<Operand> {
        if let Some(param) = self.param(expr) {
            return Ok(Operand::Param(param));
        }
        match strip_reference(expr) {
            literal @ Expr::Lit(_) => Ok(Operand::Literal(literal.clone())),
            negative @ Expr::Unary(unary)
                if matches!(unary.op, UnOp::Neg(_)) && matches!(*unary.expr, Expr::Lit(_)) =>
            {
                Ok(Operand::Literal(negative.clone()))
            }
            Expr::Path(path) if path.path.get_ident().is_some() => Err(unsupported(
                expr,
                "captured names must be method parameters"
            )),
            _ => Err(unsupported(expr, "values must be parameters or literals"))
        }
    }
}

fn strip_reference(expr: &Expr) -> &Expr {
    match expr {
        Expr::Reference(reference) => strip_reference(&reference.expr),
        Expr::Unary(unary) if matches!(unary.op, UnOp::Deref(_)) => strip_reference(&unary.expr),
        Expr::Paren(paren) => strip_reference(&paren.expr),
        Expr::Group(group) => strip_reference(&group.expr),
        other => other
    }
}

fn is_none(expr: &Expr) -> bool {
    matches!(strip_reference(expr), Expr::Path(path) if path.path.is_ident("None"))
}
