// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity trait impl and typed column handles.
//!
//! ```rust,ignore
//! impl ::sqlstencil::Entity for User {
//!     const TYPE_NAME: &'static str = "User";
//!     const MEMBERS: &'static [&'static str] = &["id", "name"];
//! }
//!
//! impl User {
//!     pub const ID: ::sqlstencil::Column<User, i64> = ::sqlstencil::Column::new(0, "id");
//!     pub const NAME: ::sqlstencil::Column<User, String> = ::sqlstencil::Column::new(1, "name");
//! }
//! ```
//!
//! Column indexes count mapped members only, matching the column slices the
//! runtime predicate and sort renderers receive.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Visibility;

use crate::entity::{EntityDescriptor, naming::column_const};

/// `Entity` impl and `Column` consts for `entity`.
#[must_use]
pub fn generate(entity: &EntityDescriptor, vis: &Visibility) -> TokenStream {
    let ident = &entity.ident;
    let type_name = entity.name();
    let members = entity.member_names();

    let columns = entity.mapped().enumerate().map(|(position, (_, column))| {
        let constant = format_ident!("{}", column_const(&column.member), span = column.ident.span());
        let ty = &column.ty;
        let member = &column.member;
        let doc = format!("Column `{}` of [`{ident}`].", column.column);
        quote! {
            #[doc = #doc]
            #vis const #constant: ::sqlstencil::Column<#ident, #ty> = ::sqlstencil::Column::new(#position, #member);
        }
    });

    quote! {
        impl ::sqlstencil::Entity for #ident {
            const TYPE_NAME: &'static str = #type_name;
            const MEMBERS: &'static [&'static str] = &[#(#members),*];
        }

        #[allow(dead_code)]
        impl #ident {
            #(#columns)*
        }
    }
}
