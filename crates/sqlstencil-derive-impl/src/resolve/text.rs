// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `@name` references in literal template text.
//!
//! `@name` binds method parameter `name`; `@p.member` binds one member of
//! entity parameter `p`. References inside quotes and comments are left
//! alone, as are `@@` system variables. Brackets quote only where the
//! dialect quotes identifiers with them; elsewhere `ARRAY[@a]` binds `a`.

use super::{Resolver, suggest};
use crate::{
    diagnostics::Anchor,
    method::shape::TypeShape,
    plan::{BindingSource, Segment, push_sql}
};

/// One reference found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Byte offset of `@`.
    pub start: usize,

    /// Byte offset after the reference.
    pub end: usize,

    /// Parameter name.
    pub name: String,

    /// Member after a dot.
    pub member: Option<String>
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn ident_end(bytes: &[u8], from: usize) -> usize {
    let mut end = from;
    while end < bytes.len() && is_ident(bytes[end]) {
        end += 1;
    }
    end
}

/// Find `@name` references outside quotes and comments.
///
/// `brackets` treats `[...]` as a quoted identifier.
#[must_use]
pub fn references(text: &str, brackets: bool) -> Vec<Reference> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i = skip_to(bytes, i + 1, quote);
            }
            b'[' if brackets => i = skip_to(bytes, i + 1, b']'),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = skip_to(bytes, i + 2, b'\n');
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..].find("*/").map_or(bytes.len(), |at| i + 2 + at + 2);
            }
            b'@' if bytes.get(i + 1) == Some(&b'@') => {
                i = ident_end(bytes, i + 2);
            }
            b'@' if bytes.get(i + 1).copied().is_some_and(is_ident_start) => {
                let name_end = ident_end(bytes, i + 1);
                let mut end = name_end;
                let mut member = None;
                if bytes.get(name_end) == Some(&b'.')
                    && bytes.get(name_end + 1).copied().is_some_and(is_ident_start)
                {
                    end = ident_end(bytes, name_end + 1);
                    member = Some(text[name_end + 1..end].to_string());
                }
                found.push(Reference {
                    start: i,
                    end,
                    name: text[i + 1..name_end].to_string(),
                    member
                });
                i = end;
            }
            _ => i += 1
        }
    }
    found
}

fn skip_to(bytes: &[u8], from: usize, close: u8) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|b| *b == close)
        .map_or(bytes.len(), |at| from + at + 1)
}

impl Resolver<'_> {
    /// Literal text with its references bound.
    pub(super) fn text(&mut self, text: &str, offset: usize, out: &mut Vec<Segment>) {
        let mut last = 0;
        for reference in references(text, self.spec.quote.0 == "[") {
            push_sql(out, &text[last..reference.start]);
            last = reference.end;
            let source = &text[reference.start..reference.end];
            match self.reference(&reference, offset, source) {
                Some(index) => out.push(Segment::Param(index)),
                None => push_sql(out, source)
            }
        }
        push_sql(out, &text[last..]);
    }

    fn reference(&mut self, reference: &Reference, offset: usize, source: &str) -> Option<usize> {
        let anchor = Anchor::Template {
            offset: offset + reference.start,
            text:   source.to_string()
        };
        let method = self.method;
        let Some(param) = method.param(&reference.name) else {
            let message = suggest::with_hint(
                format!("`@{}` is not a parameter of `{}`", reference.name, method.name()),
                &reference.name,
                method.params.iter().map(|p| p.name.as_str())
            );
            self.sink.error("PARAM-UNKNOWN", anchor, message);
            return None;
        };
        match (&reference.member, &param.shape) {
            (Some(member), TypeShape::Entity) => {
                if self.entity.find(member).is_none() {
                    self.unknown_member(member, anchor);
                    return None;
                }
                Some(self.plan.bind(member, BindingSource::Field {
                    param:  param.name.clone(),
                    member: member.clone()
                }))
            }
            (None, shape) if shape.is_bindable() => {
                Some(self.plan.bind(&param.name, BindingSource::Param(param.name.clone())))
            }
            (_, shape) => {
                self.sink.error(
                    "PARAM-TYPE",
                    anchor,
                    format!(
                        "`{source}` cannot be bound: parameter `{}` is {}",
                        param.name,
                        shape.describe()
                    )
                );
                None
            }
        }
    }
}
