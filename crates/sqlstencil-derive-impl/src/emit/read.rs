// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Row materialization.
//!
//! | Projection | Ordinals |
//! |------------|----------|
//! | `SELECT {{columns}}` first in the statement | literal positions |
//! | anything else | resolved by name on the first row, then reused |
//!
//! Members excluded from mapping, or absent from the projection, receive
//! `Default::default()`.

use proc_macro2::{Literal, TokenStream};
use quote::quote;

use super::{Emitter, execute::Execute};
use crate::plan::{PagingValue, Segment};

/// Where one field's value comes from.
enum Source {
    /// Known column position.
    Ordinal(usize),

    /// Slot of the resolved ordinal array.
    Slot(usize),

    /// Not read from the row.
    Default
}

/// Generated row-to-entity conversion.
pub(super) struct Mapping {
    /// Statements before the first `advance()`.
    pub declare: TokenStream,

    /// Statements after each successful `advance()`, before `literal`.
    pub resolve: TokenStream,

    /// Struct literal reading from `__cursor`.
    pub literal: TokenStream
}

impl Emitter<'_> {
    pub(super) fn mapping(&self) -> Mapping {
        let entity = self.entity;
        let plan = self.plan;

        let (sources, names): (Vec<Source>, Vec<String>) = match &plan.projection {
            Some(projection) if plan.fixed_order => (
                entity
                    .columns
                    .iter()
                    .map(|column| {
                        if column.excluded {
                            return Source::Default;
                        }
                        projection
                            .iter()
                            .position(|member| *member == column.member)
                            .map_or(Source::Default, Source::Ordinal)
                    })
                    .collect(),
                Vec::new()
            ),
            projection => {
                let read: Vec<&str> = match projection {
                    Some(projection) => projection
                        .iter()
                        .map(String::as_str)
                        .filter(|member| entity.find(member).is_some())
                        .collect(),
                    None => entity.member_names()
                };
                let sources = entity
                    .columns
                    .iter()
                    .map(|column| {
                        if column.excluded {
                            return Source::Default;
                        }
                        read.iter()
                            .position(|member| *member == column.member)
                            .map_or(Source::Default, Source::Slot)
                    })
                    .collect();
                let names = read
                    .iter()
                    .filter_map(|member| entity.find(member))
                    .map(|index| entity.columns[index].column.clone())
                    .collect();
                (sources, names)
            }
        };

        let fields = entity.columns.iter().zip(&sources).map(|(column, source)| {
            let ident = &column.ident;
            let value = match source {
                Source::Ordinal(ordinal) => {
                    let ordinal = Literal::usize_unsuffixed(*ordinal);
                    quote!(::sqlstencil::RowAccess::get(&__cursor, #ordinal)?)
                }
                Source::Slot(slot) => {
                    let slot = Literal::usize_unsuffixed(*slot);
                    quote!(::sqlstencil::RowAccess::get(&__cursor, __slots[#slot])?)
                }
                Source::Default => quote!(::core::default::Default::default())
            };
            quote!(#ident: #value)
        });
        let ty = &entity.ident;
        let literal = quote!(#ty { #(#fields),* });

        if names.is_empty() {
            return Mapping {
                declare: TokenStream::new(),
                resolve: TokenStream::new(),
                literal
            };
        }
        let count = Literal::usize_unsuffixed(names.len());
        Mapping {
            declare: quote! {
                let mut __ordinals: ::core::option::Option<[usize; #count]> = ::core::option::Option::None;
            },
            resolve: quote! {
                let __slots = match __ordinals {
                    ::core::option::Option::Some(__slots) => __slots,
                    ::core::option::Option::None => *__ordinals.insert(
                        ::sqlstencil::resolve_ordinals(&__cursor, &[#(#names),*])?
                    )
                };
            },
            literal
        }
    }

    /// Run `segments` as a reader and collect every row into `__items`.
    pub(super) fn read_list(&self, segments: &[Segment], name: &str) -> TokenStream {
        let prepared = self.prepare(segments, name);
        let run = self.run(&prepared, Execute::Reader);
        let advance = self.advance();
        let capacity = self.capacity();
        let Mapping {
            declare,
            resolve,
            literal
        } = self.mapping();
        let ty = &self.entity.ident;
        quote! {
            let mut __cursor = #run;
            let mut __items: ::std::vec::Vec<#ty> = ::std::vec::Vec::with_capacity(#capacity);
            #declare
            while #advance {
                #resolve
                __items.push(#literal);
            }
        }
    }

    /// List preallocation from the paging limit.
    fn capacity(&self) -> TokenStream {
        match &self.plan.paging.limit {
            Some(PagingValue::Literal(limit)) => {
                let limit = Literal::i64_suffixed(*limit);
                quote!(::sqlstencil::page::capacity_for(#limit))
            }
            Some(PagingValue::Binding(index)) => match self.plan.bindings.get(*index) {
                Some(binding) => {
                    let value = self.value(&binding.source);
                    quote!(::sqlstencil::page::capacity_for(&(#value)))
                }
                None => quote!(::sqlstencil::page::DEFAULT_CAPACITY)
            },
            None => quote!(::sqlstencil::page::DEFAULT_CAPACITY)
        }
    }
}
