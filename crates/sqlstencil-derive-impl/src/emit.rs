// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Code emission backend.
//!
//! Turns a rewritten [`Plan`] into the body of one trait method. Generated
//! code only names `::sqlstencil::…` paths, so it compiles against the
//! facade crate without further imports.
//!
//! # Architecture
//!
//! ```text
//! emit.rs (Emitter, method bodies per result shape)
//! ├── statement.rs  - const SQL or StatementBuilder calls, bound values
//! ├── execute.rs    - command setup, cancellation, hooks, execution
//! ├── read.rs       - row materialization and ordinals
//! ├── entity.rs     - Entity impl and Column consts
//! ├── repository.rs - {Trait}Impl<C> struct and trait impl
//! └── findings.rs   - diagnostics as compile errors and warnings
//! ```
//!
//! # Result Shapes
//!
//! | Return | Execution | Value |
//! |--------|-----------|-------|
//! | `()` | non-query | `()` |
//! | integer on DML | non-query | affected rows, saturating |
//! | integer / scalar otherwise | scalar | `decode_scalar` |
//! | `Option<E>` | reader | first row |
//! | `Vec<E>` | reader | every row |
//! | `Page<E>` | scalar `COUNT(*)`, then reader | `Page { items, total, pagination }` |
//! | `Rows` | reader | `Rows::read` |
//! | `UpdateOutcome` | non-query | `UpdateOutcome::from_rows` |
//!
//! Every body runs inside a closure (sync) or `async` block returning
//! `Result<T, sqlstencil::Error>`; the result is converted into the
//! author's error type with `From` at the end.

pub mod entity;
mod execute;
pub mod findings;
mod read;
pub mod repository;
mod statement;

#[cfg(test)]
mod tests;

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::{ReturnType, Signature, Type};

pub use self::execute::Flavor;
use self::execute::Execute;
use crate::{
    entity::EntityDescriptor,
    method::{MethodSpec, shape::ReturnShape},
    plan::{PagingValue, Plan, Segment},
    utils::types::{first_argument, is_reference, type_name}
};

/// Everything one method body is generated from.
#[derive(Debug, Clone, Copy)]
pub struct Emitter<'a> {
    /// Method model.
    pub method: &'a MethodSpec,

    /// Rewritten plan.
    pub plan: &'a Plan,

    /// Repository entity.
    pub entity: &'a EntityDescriptor,

    /// Generated repository type name, reported to hooks.
    pub repository: &'a str,

    /// Emit execution hook calls.
    pub hooks: bool
}

impl Emitter<'_> {
    /// Driver family of this method.
    #[must_use]
    pub const fn flavor(&self) -> Flavor {
        Flavor {
            is_async: self.method.is_async
        }
    }

    /// The complete method item for the trait impl.
    ///
    /// `sig` is the trait method's signature with helper attributes removed.
    #[must_use]
    pub fn method(&self, sig: &Signature) -> TokenStream {
        let ok = ok_type(&sig.output);
        let body = self.body(&ok);
        let runner = if self.method.is_async {
            quote! { async move { #body }.await }
        } else {
            quote! { (|| -> ::core::result::Result<#ok, ::sqlstencil::Error> { #body })() }
        };

        quote! {
            #[allow(unused_variables, unused_mut, clippy::needless_question_mark, clippy::let_unit_value)]
            #sig {
                let __result: ::core::result::Result<#ok, ::sqlstencil::Error> = #runner;
                __result.map_err(::core::convert::From::from)
            }
        }
    }

    fn body(&self, ok: &TokenStream) -> TokenStream {
        if self.plan.batch().is_some() {
            return self.batch(ok);
        }
        let plan = self.plan;
        match &plan.output {
            ReturnShape::Unit | ReturnShape::Outcome => self.affected(ok),
            ReturnShape::Integer(_) if plan.kind.is_dml() && !plan.returns_key => self.affected(ok),
            ReturnShape::Integer(ty) | ReturnShape::Scalar(ty) => self.scalar(ok, ty),
            ReturnShape::Single => self.single(ok),
            ReturnShape::List => self.list(ok),
            ReturnShape::Page => self.page(ok),
            ReturnShape::Rows => self.rows(ok)
        }
    }

    fn affected(&self, ok: &TokenStream) -> TokenStream {
        let prepared = self.prepare(&self.plan.segments, "SQL");
        let run = self.run(&prepared, Execute::NonQuery);
        let value = self.convert_rows(&quote!(__rows));
        quote! {
            let __rows: u64 = #run;
            ::core::result::Result::Ok::<#ok, ::sqlstencil::Error>(#value)
        }
    }

    fn scalar(&self, ok: &TokenStream, ty: &Type) -> TokenStream {
        let main = self.prepare(&self.plan.segments, "SQL");
        let fetch = match &self.plan.follow_up {
            Some(follow_up) => {
                let insert = self.run(&main, Execute::NonQuery);
                let key = statement::Prepared::constant(&format_ident!("KEY_SQL"), follow_up, self.flavor());
                let fetch = self.run(&key, Execute::Scalar);
                quote! {
                    let _: u64 = #insert;
                    let __value: ::sqlstencil::Value = #fetch;
                }
            }
            None => {
                let fetch = self.run(&main, Execute::Scalar);
                quote! { let __value: ::sqlstencil::Value = #fetch; }
            }
        };
        quote! {
            #fetch
            ::core::result::Result::Ok::<#ok, ::sqlstencil::Error>(::sqlstencil::decode_scalar::<#ty>(__value)?)
        }
    }

    fn single(&self, ok: &TokenStream) -> TokenStream {
        let prepared = self.prepare(&self.plan.segments, "SQL");
        let run = self.run(&prepared, Execute::Reader);
        let advance = self.advance();
        let mapping = self.mapping();
        let declare = &mapping.declare;
        let resolve = &mapping.resolve;
        let literal = &mapping.literal;
        quote! {
            let mut __cursor = #run;
            #declare
            let __found = if #advance {
                #resolve
                ::core::option::Option::Some(#literal)
            } else {
                ::core::option::Option::None
            };
            ::core::result::Result::Ok::<#ok, ::sqlstencil::Error>(__found)
        }
    }

    fn list(&self, ok: &TokenStream) -> TokenStream {
        let read = self.read_list(&self.plan.segments, "SQL");
        quote! {
            #read
            ::core::result::Result::Ok::<#ok, ::sqlstencil::Error>(__items)
        }
    }

    fn page(&self, ok: &TokenStream) -> TokenStream {
        let count = self.plan.count.as_deref().unwrap_or_default();
        let counted = self.prepare(count, "COUNT_SQL");
        let total = self.run(&counted, Execute::Scalar);
        let read = self.read_list(&self.plan.segments, "SQL");
        let pagination = self.pagination();
        quote! {
            let __total: ::sqlstencil::Value = #total;
            let __total = u64::try_from(::sqlstencil::decode_scalar::<i64>(__total)?).unwrap_or(0);
            #read
            ::core::result::Result::Ok::<#ok, ::sqlstencil::Error>(::sqlstencil::Page {
                items: __items,
                total: __total,
                pagination: #pagination
            })
        }
    }

    fn rows(&self, ok: &TokenStream) -> TokenStream {
        let prepared = self.prepare(&self.plan.segments, "SQL");
        let run = self.run(&prepared, Execute::Reader);
        let read = if self.method.is_async {
            quote! { ::sqlstencil::Rows::read_async(&mut __cursor).await? }
        } else {
            quote! { ::sqlstencil::Rows::read(&mut __cursor)? }
        };
        quote! {
            let mut __cursor = #run;
            ::core::result::Result::Ok::<#ok, ::sqlstencil::Error>(#read)
        }
    }

    /// One statement per chunk of the entity sequence, summing affected rows.
    fn batch(&self, ok: &TokenStream) -> TokenStream {
        let Some(Segment::Batch {
            param,
            members,
            ..
        }) = self.plan.batch()
        else {
            return TokenStream::new();
        };
        let items = self.param_ident(param);
        let prepared = self.prepare(&self.plan.segments, "SQL");
        let run = self.run(&prepared, Execute::NonQuery);
        let chunk = Literal::usize_unsuffixed(self.chunk_size(members.len()));
        let value = self.convert_rows(&quote!(__rows));
        quote! {
            let mut __rows: u64 = 0;
            for __chunk in #items.chunks(#chunk) {
                let __affected: u64 = #run;
                __rows += __affected;
            }
            ::core::result::Result::Ok::<#ok, ::sqlstencil::Error>(#value)
        }
    }

    /// Rows per batch statement within the dialect's parameter limit.
    fn chunk_size(&self, width: usize) -> usize {
        let limit = self.entity.spec().max_parameters;
        let fixed = self
            .plan
            .segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Param(_)))
            .count();
        let per_limit = limit.saturating_sub(fixed) / width.max(1);
        self.plan.batch_size.min(per_limit).max(1)
    }

    /// Affected-row count converted to the method's result.
    fn convert_rows(&self, rows: &TokenStream) -> TokenStream {
        match &self.plan.output {
            ReturnShape::Outcome => quote!(::sqlstencil::UpdateOutcome::from_rows(#rows)),
            ReturnShape::Integer(ty) if type_name(ty).as_deref() == Some("u64") => quote!(#rows),
            ReturnShape::Integer(ty) => quote!(<#ty>::try_from(#rows).unwrap_or(<#ty>::MAX)),
            _ => quote!(())
        }
    }

    fn pagination(&self) -> TokenStream {
        let paging = &self.plan.paging;
        if let Some(param) = &paging.page_param {
            return self.owned(param);
        }
        let limit = paging
            .limit
            .as_ref()
            .map_or_else(|| quote!(i64::MAX), |value| self.paging_value(value));
        let offset = paging
            .offset
            .as_ref()
            .map_or_else(|| quote!(0_i64), |value| self.paging_value(value));
        quote!(::sqlstencil::Pagination::new(#limit, #offset))
    }

    fn paging_value(&self, value: &PagingValue) -> TokenStream {
        match value {
            PagingValue::Literal(n) => {
                let n = Literal::i64_suffixed(*n);
                quote!(#n)
            }
            PagingValue::Binding(index) => match self.plan.bindings.get(*index) {
                Some(binding) => {
                    let value = self.value(&binding.source);
                    quote! {
                        match ::sqlstencil::ToValue::to_value(&(#value)) {
                            ::sqlstencil::Value::Int(__n) => __n,
                            _ => 0_i64
                        }
                    }
                }
                None => quote!(0_i64)
            }
        }
    }

    fn param_ident(&self, name: &str) -> syn::Ident {
        self.method
            .param(name)
            .map_or_else(|| format_ident!("{name}"), |param| param.ident.clone())
    }

    /// The parameter as a reference.
    fn borrowed(&self, name: &str) -> TokenStream {
        let ident = self.param_ident(name);
        match self.method.param(name) {
            Some(param) if is_reference(&param.ty) => quote!(#ident),
            _ => quote!(&#ident)
        }
    }

    /// The parameter as a value, dereferencing reference parameters.
    fn owned(&self, name: &str) -> TokenStream {
        let ident = self.param_ident(name);
        match self.method.param(name) {
            Some(param) if is_reference(&param.ty) => quote!((*#ident)),
            _ => quote!(#ident)
        }
    }
}

/// `T` of `Result<T, E>`, or `_` when it cannot be named.
fn ok_type(output: &ReturnType) -> TokenStream {
    match output {
        ReturnType::Type(_, ty) => first_argument(ty).map_or_else(|| quote!(_), |ok| quote!(#ok)),
        ReturnType::Default => quote!(())
    }
}
