// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository method model.
//!
//! A [`MethodSpec`] is the typed view of one trait method: its template,
//! markers, classified parameters and result shape. Later stages never read
//! the method's attributes again.
//!
//! # Architecture
//!
//! ```text
//! method.rs (MethodSpec)
//! ├── attrs.rs   - #[sql], #[filter], markers, #[dynamic_sql]
//! ├── shape.rs   - parameter and result classification
//! └── filter.rs  - #[filter] closure → FilterExpr
//! ```

pub mod attrs;
pub mod filter;
pub mod shape;


use proc_macro2::Span;
use syn::{FnArg, Ident, LitStr, Pat, TraitItemFn, Type, ext::IdentExt, spanned::Spanned};

use self::{
    attrs::{DynamicAttr, METHOD_ATTRIBUTES, MethodAttrs, PARAM_ATTRIBUTES, dynamic_attr},
    filter::FilterExpr,
    shape::{ReturnShape, TypeShape}
};
use crate::diagnostics::{Anchor, Diagnostics};

/// One method parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Identifier as declared.
    pub ident: Ident,

    /// Name without raw prefix.
    pub name: String,

    /// Declared type.
    pub ty: Type,

    /// Structural class.
    pub shape: TypeShape,

    /// `#[dynamic_sql]` marker.
    pub dynamic: Option<DynamicAttr>
}

/// Typed view of one repository method.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// Method identifier.
    pub ident: Ident,

    /// `async fn`.
    pub is_async: bool,

    /// `#[sql]` template.
    pub template: Option<LitStr>,

    /// Lowered `#[filter]` closure.
    pub filter: Option<FilterExpr>,

    /// `#[filter]` present, whether or not it lowered.
    pub has_filter_attr: bool,

    /// Span of `#[filter]`.
    pub filter_span: Option<Span>,

    /// `#[include_deleted]`.
    pub include_deleted: bool,

    /// `#[hard_delete]`.
    pub hard_delete: bool,

    /// `#[returning_key]`.
    pub returning_key: bool,

    /// `#[batch(size)]`.
    pub batch_size: Option<usize>,

    /// Parameters after the receiver.
    pub params: Vec<ParamSpec>,

    /// Result classification.
    pub output: ReturnShape,

    /// Span of the return type.
    pub output_span: Span,

    /// The trait provides a default body.
    pub has_default: bool
}

impl MethodSpec {
    /// Build the method model.
    ///
    /// Signature problems the backend cannot implement are reported to
    /// `sink` as `SHAPE-UNSUPPORTED`; filter closures outside the supported
    /// subset as `FILTER-UNSUPPORTED`.
    ///
    /// # Errors
    ///
    /// Malformed helper attributes.
    pub fn parse(item: &TraitItemFn, entity: &Ident, sink: &Diagnostics) -> darling::Result<Self> {
        let attrs = MethodAttrs::parse(&item.attrs)?;
        let sig = &item.sig;

        check_signature(item, sink);
        let params = parse_params(item, entity, sink)?;

        let output = ReturnShape::classify(&sig.output, entity).unwrap_or_else(|message| {
            sink.error("SHAPE-UNSUPPORTED", Anchor::ReturnType, message);
            ReturnShape::Unit
        });

        let names: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
        let filter = attrs
            .filter
            .as_ref()
            .and_then(|closure| match filter::lower(closure, &names) {
                Ok(expr) => Some(expr),
                Err(error) => {
                    sink.error("FILTER-UNSUPPORTED", Anchor::Filter, error.to_string());
                    None
                }
            });

        Ok(Self {
            ident: sig.ident.clone(),
            is_async: sig.asyncness.is_some(),
            template: attrs.sql,
            filter,
            has_filter_attr: attrs.filter.is_some(),
            filter_span: attrs.filter_span,
            include_deleted: attrs.include_deleted,
            hard_delete: attrs.hard_delete,
            returning_key: attrs.returning_key,
            batch_size: attrs.batch_size,
            params,
            output,
            output_span: sig.output.span(),
            has_default: item.default.is_some()
        })
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> String {
        self.ident.unraw().to_string()
    }

    /// Parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Parameters of one shape.
    pub fn params_of<'a>(&'a self, shape: &'a TypeShape) -> impl Iterator<Item = &'a ParamSpec> {
        self.params.iter().filter(move |p| &p.shape == shape)
    }

    /// The single parameter of `shape`, if exactly one exists.
    #[must_use]
    pub fn sole_param(&self, shape: &TypeShape) -> Option<&ParamSpec> {
        let mut found = self.params.iter().filter(|p| &p.shape == shape);
        let first = found.next()?;
        found.next().is_none().then_some(first)
    }

    /// The cancellation token parameter.
    #[must_use]
    pub fn cancellation(&self) -> Option<&ParamSpec> {
        self.params_of(&TypeShape::Cancellation).next()
    }
}

fn check_signature(item: &TraitItemFn, sink: &Diagnostics) {
    let sig = &item.sig;
    if !sig.generics.params.is_empty() {
        sink.error(
            "SHAPE-UNSUPPORTED",
            Anchor::Method,
            "generated methods cannot be generic"
        );
    }
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => sink.error(
            "SHAPE-UNSUPPORTED",
            Anchor::Method,
            "generated methods must take `&self`"
        )
    }
    if sig.variadic.is_some() || sig.unsafety.is_some() {
        sink.error(
            "SHAPE-UNSUPPORTED",
            Anchor::Method,
            "generated methods cannot be unsafe or variadic"
        );
    }
}

fn parse_params(
    item: &TraitItemFn,
    entity: &Ident,
    sink: &Diagnostics
) -> darling::Result<Vec<ParamSpec>> {
    let mut params = Vec::new();
    for input in &item.sig.inputs {
        let FnArg::Typed(typed) = input else {
            continue;
        };
        let Pat::Ident(pat) = typed.pat.as_ref() else {
            sink.error(
                "SHAPE-UNSUPPORTED",
                Anchor::Method,
                "parameters must be plain names"
            );
            continue;
        };
        params.push(ParamSpec {
            ident:   pat.ident.clone(),
            name:    pat.ident.unraw().to_string(),
            ty:      typed.ty.as_ref().clone(),
            shape:   TypeShape::classify(&typed.ty, entity),
            dynamic: dynamic_attr(&typed.attrs).map_err(darling::Error::from)?
        });
    }
    Ok(params)
}

/// Remove helper attributes from a trait method before it is re-emitted.
pub fn strip_attributes(item: &mut TraitItemFn) {
    item.attrs.retain(|attr| {
        !METHOD_ATTRIBUTES
            .iter()
            .any(|name| attr.path().is_ident(name))
    });
    for input in &mut item.sig.inputs {
        if let FnArg::Typed(typed) = input {
            typed.attrs.retain(|attr| {
                !PARAM_ATTRIBUTES
                    .iter()
                    .any(|name| attr.path().is_ident(name))
            });
        }
    }
}
