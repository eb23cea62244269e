// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Statement text and parameter binding.
//!
//! | Segments | Emitted |
//! |----------|---------|
//! | all static | `const SQL: &str` and one `add_parameter` per marker |
//! | any runtime segment | `StatementBuilder` calls, then `Statement::bind` |

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use sqlstencil_core::{Dialect, LikeKind};
use syn::Ident;

use super::{Emitter, Flavor};
use crate::{
    method::{attrs::DynamicKind, shape::TypeShape},
    plan::{BindingSource, CondKind, Segment, render_static}
};

/// Builder headroom per runtime segment.
const SEGMENT_RESERVE: usize = 24;

/// A statement ready to be attached to `__command`.
pub struct Prepared {
    /// Items and statements evaluated before the command exists.
    pub setup: TokenStream,

    /// `&str` expression of the final text.
    pub text: TokenStream,

    /// `usize` expression of the bound parameter count.
    pub count: TokenStream,

    /// Statements attaching text and parameters.
    pub attach: TokenStream
}

impl Prepared {
    /// Parameterless text known at compile time.
    pub fn constant(name: &Ident, text: &str, flavor: Flavor) -> Self {
        let command = flavor.command();
        Self {
            setup:  quote! { const #name: &str = #text; },
            text:   quote!(#name),
            count:  quote!(0_usize),
            attach: quote! { #command::set_text(&mut __command, #name); }
        }
    }
}

/// Path of `dialect` in generated code.
pub fn dialect_path(dialect: Dialect) -> TokenStream {
    match dialect {
        Dialect::Postgres => quote!(::sqlstencil::Dialect::Postgres),
        Dialect::MySql => quote!(::sqlstencil::Dialect::MySql),
        Dialect::Sqlite => quote!(::sqlstencil::Dialect::Sqlite),
        Dialect::SqlServer => quote!(::sqlstencil::Dialect::SqlServer),
        Dialect::Oracle => quote!(::sqlstencil::Dialect::Oracle)
    }
}

impl Emitter<'_> {
    /// Prepare `segments` under the constant name `name`.
    pub(super) fn prepare(&self, segments: &[Segment], name: &str) -> Prepared {
        let command = self.flavor().command();
        if let Some(rendered) = render_static(segments, &self.plan.bindings, self.plan.dialect) {
            let constant = format_ident!("{name}");
            let text = rendered.text;
            let parameters = rendered
                .parameters
                .iter()
                .filter_map(|index| self.plan.bindings.get(*index))
                .map(|binding| {
                    let name = &binding.name;
                    let value = self.value(&binding.source);
                    quote! {
                        #command::add_parameter(&mut __command, #name, ::sqlstencil::ToValue::to_value(&(#value)));
                    }
                });
            let count = rendered.parameters.len();
            return Prepared {
                setup:  quote! { const #constant: &str = #text; },
                text:   quote!(#constant),
                count:  quote!(#count),
                attach: quote! {
                    #command::set_text(&mut __command, #constant);
                    #(#parameters)*
                }
            };
        }

        let statement = format_ident!("__{}", name.to_lowercase());
        let dialect = dialect_path(self.plan.dialect);
        let capacity = capacity(segments);
        let pushes = self.pushes(segments);
        let bind = if self.method.is_async {
            quote!(bind_async)
        } else {
            quote!(bind)
        };
        Prepared {
            setup:  quote! {
                let #statement = {
                    let mut __builder = ::sqlstencil::StatementBuilder::with_capacity(#dialect, #capacity);
                    #pushes
                    __builder.finish()
                };
            },
            text:   quote!(#statement.text.as_str()),
            count:  quote!(#statement.parameters.len()),
            attach: quote! { #statement.#bind(&mut __command); }
        }
    }

    fn pushes(&self, segments: &[Segment]) -> TokenStream {
        segments.iter().map(|segment| self.push(segment)).collect()
    }

    fn push(&self, segment: &Segment) -> TokenStream {
        match segment {
            Segment::Sql(sql) => quote! { __builder.push_sql(#sql); },
            Segment::Param(index) => {
                let Some(binding) = self.plan.bindings.get(*index) else {
                    return TokenStream::new();
                };
                let name = &binding.name;
                let value = self.value(&binding.source);
                quote! { __builder.push_param(#name, &(#value)); }
            }
            Segment::InList {
                param,
                column,
                negated
            } => {
                let values = self.param_ident(param);
                quote! { __builder.push_in(#column, #param, #values.iter(), #negated); }
            }
            Segment::Predicate {
                param,
                columns
            } => {
                let predicate = self.borrowed(param);
                quote! { __builder.push_predicate(#param, #predicate, &[#(#columns),*])?; }
            }
            Segment::Sort {
                param,
                columns,
                fallback
            } => {
                let sort = self.borrowed(param);
                let push = quote! { __builder.push_sort(#sort, &[#(#columns),*])?; };
                match fallback {
                    Some(fallback) => {
                        let ident = self.param_ident(param);
                        quote! {
                            if #ident.is_empty() {
                                __builder.push_sql(#fallback);
                            } else {
                                #push
                            }
                        }
                    }
                    None => push
                }
            }
            Segment::Dynamic {
                param,
                kind,
                allow
            } => {
                let ident = self.param_ident(param);
                let kind = match kind {
                    DynamicKind::Identifier => quote!(Identifier),
                    DynamicKind::Fragment => quote!(Fragment)
                };
                quote! {{
                    const RULE: ::sqlstencil::dynamic::DynamicRule = ::sqlstencil::dynamic::DynamicRule {
                        parameter: #param,
                        kind:      ::sqlstencil::dynamic::FragmentKind::#kind,
                        allow:     &[#(#allow),*]
                    };
                    __builder.push_sql(::sqlstencil::dynamic::check(
                        &RULE,
                        ::core::convert::AsRef::<str>::as_ref(&#ident)
                    )?);
                }}
            }
            Segment::Conditional {
                param,
                kind,
                then,
                otherwise
            } => {
                let test = self.test(param, *kind);
                let then = self.pushes(then);
                let otherwise = self.pushes(otherwise);
                quote! {
                    if #test {
                        #then
                    } else {
                        #otherwise
                    }
                }
            }
            Segment::Batch {
                members,
                extras,
                ..
            } => self.batch_rows(members, extras)
        }
    }

    /// `(…), (…)` for every item of `__chunk`.
    fn batch_rows(&self, members: &[String], extras: &[String]) -> TokenStream {
        let cells = members.iter().enumerate().map(|(index, member)| {
            let separator = (index > 0).then(|| quote! { __builder.push_sql(", "); });
            let field = self.member_ident(member);
            quote! {
                #separator
                __builder.push_indexed_param(#member, __row, &__item.#field);
            }
        });
        let extras = if extras.is_empty() {
            None
        } else {
            let lead = if members.is_empty() { "" } else { ", " };
            let sql = format!("{lead}{}", extras.join(", "));
            Some(quote! { __builder.push_sql(#sql); })
        };
        quote! {
            for (__row, __item) in __chunk.iter().enumerate() {
                if __row > 0 {
                    __builder.push_sql(", ");
                }
                __builder.push_sql("(");
                #(#cells)*
                #extras
                __builder.push_sql(")");
            }
        }
    }

    /// Runtime test of a conditional block.
    fn test(&self, param: &str, kind: CondKind) -> TokenStream {
        let ident = self.param_ident(param);
        let optional = self
            .method
            .param(param)
            .is_some_and(|p| matches!(p.shape, TypeShape::Optional(_)));
        let owned = self.owned(param);
        match (kind, optional) {
            (CondKind::NotNull, _) => quote!(#ident.is_some()),
            (CondKind::Null, _) => quote!(#ident.is_none()),
            (CondKind::NotEmpty, true) => quote!(#ident.as_ref().is_some_and(|__v| !__v.is_empty())),
            (CondKind::NotEmpty, false) => quote!(!#ident.is_empty()),
            (CondKind::Empty, true) => quote!(#ident.as_ref().is_none_or(|__v| __v.is_empty())),
            (CondKind::Empty, false) => quote!(#ident.is_empty()),
            (CondKind::True, true) => quote!(::core::matches!(#owned, ::core::option::Option::Some(true))),
            (CondKind::True, false) => quote!(#owned),
            (CondKind::False, true) => quote!(::core::matches!(#owned, ::core::option::Option::Some(false))),
            (CondKind::False, false) => quote!(!#owned)
        }
    }

    /// Expression producing the value of one binding.
    pub(super) fn value(&self, source: &BindingSource) -> TokenStream {
        match source {
            BindingSource::Param(name) => {
                let ident = self.param_ident(name);
                quote!(#ident)
            }
            BindingSource::Field {
                param,
                member
            } => {
                let ident = self.param_ident(param);
                let field = self.member_ident(member);
                quote!(#ident.#field)
            }
            BindingSource::Literal(expr) => quote!(#expr),
            BindingSource::Pattern(pattern) => quote!(#pattern),
            BindingSource::Like {
                param,
                kind
            } => {
                let ident = self.param_ident(param);
                let kind = match kind {
                    LikeKind::Prefix => quote!(Prefix),
                    LikeKind::Suffix => quote!(Suffix),
                    LikeKind::Contains => quote!(Contains)
                };
                quote! {
                    ::sqlstencil::like::pattern(
                        ::core::convert::AsRef::<str>::as_ref(&#ident),
                        ::sqlstencil::LikeKind::#kind
                    )
                }
            }
            BindingSource::PageField {
                param,
                field
            } => {
                let ident = self.param_ident(param);
                let field = format_ident!("{field}");
                quote!(#ident.#field)
            }
        }
    }

    fn member_ident(&self, member: &str) -> Ident {
        self.entity
            .find(member)
            .map_or_else(|| format_ident!("{member}"), |index| self.entity.columns[index].ident.clone())
    }
}

/// Builder preallocation: static text plus headroom per runtime segment.
fn capacity(segments: &[Segment]) -> usize {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Sql(sql) => sql.len(),
            _ => SEGMENT_RESERVE
        })
        .sum()
}

