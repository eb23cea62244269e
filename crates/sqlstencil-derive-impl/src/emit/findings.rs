// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Diagnostics as compiler output.
//!
//! | Severity | Rendered as |
//! |----------|-------------|
//! | `Error` | `compile_error!` at the anchor |
//! | `Warning` | use of a `#[deprecated]` item whose note carries the message |
//! | `Info` | nothing |
//!
//! Stable Rust has no warning API for procedural macros; a deprecation note
//! is the one that lands at an arbitrary span.

use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};

use crate::{
    diagnostics::{Anchor, Diagnostic, Severity},
    entity::EntityDescriptor,
    method::MethodSpec
};

/// Span lookup for anchors of one compilation site.
#[derive(Debug, Clone, Copy)]
pub struct Spans<'a> {
    /// Method being compiled, when the site is a method.
    pub method: Option<&'a MethodSpec>,

    /// Repository entity.
    pub entity: Option<&'a EntityDescriptor>,

    /// Repository trait or entity struct identifier.
    pub item: Span
}

impl Spans<'_> {
    /// Source span of `anchor`.
    #[must_use]
    pub fn of(&self, anchor: &Anchor) -> Span {
        let method = self.method;
        let found = match anchor {
            Anchor::Template {
                ..
            } => method.and_then(|m| m.template.as_ref().map(syn::LitStr::span)),
            Anchor::Method => method.map(|m| m.ident.span()),
            Anchor::Param(name) => method.and_then(|m| m.param(name).map(|p| p.ident.span())),
            Anchor::Filter => method.and_then(|m| m.filter_span),
            Anchor::ReturnType => method.map(|m| m.output_span),
            Anchor::Entity => self.entity.map(|e| e.ident.span()),
            Anchor::Member(member) => self.entity.and_then(|e| {
                e.columns
                    .iter()
                    .find(|column| column.member == *member)
                    .map(|column| column.ident.span())
            }),
            Anchor::Repository => None
        };
        found
            .or_else(|| method.map(|m| m.ident.span()))
            .unwrap_or(self.item)
    }
}

/// Rendered findings.
#[derive(Debug, Default)]
pub struct Rendered {
    /// `compile_error!` invocations.
    pub errors: Vec<TokenStream>,

    /// Module-level warning items.
    pub warnings: Vec<TokenStream>
}

impl Rendered {
    /// Whether any finding was an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Render `diagnostics` at the spans of `spans`.
#[must_use]
pub fn render(diagnostics: &[Diagnostic], spans: &Spans<'_>) -> Rendered {
    let mut rendered = Rendered::default();
    for diagnostic in diagnostics {
        let span = spans.of(&diagnostic.anchor);
        match diagnostic.severity {
            Severity::Error => rendered
                .errors
                .push(syn::Error::new(span, diagnostic.to_string()).to_compile_error()),
            Severity::Warning => rendered.warnings.push(warning(&diagnostic.to_string(), span)),
            Severity::Info => {}
        }
    }
    rendered
}

/// A warning carrying `message` at `span`.
#[must_use]
pub fn warning(message: &str, span: Span) -> TokenStream {
    quote_spanned! {span=>
        const _: () = {
            #[deprecated(note = #message)]
            #[allow(non_camel_case_types)]
            struct sqlstencil_warning;
            let _ = sqlstencil_warning;
        };
    }
}

/// A method item whose body reports `errors`.
#[must_use]
pub fn failed_method(sig: &syn::Signature, errors: &[TokenStream]) -> TokenStream {
    quote! {
        #[allow(unused_variables, unreachable_code)]
        #sig {
            #(#errors)*
            ::core::unimplemented!()
        }
    }
}
