// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Method and parameter attribute parsing.
//!
//! | Attribute | Target | Effect |
//! |-----------|--------|--------|
//! | `#[sql("...")]` | method | query template |
//! | `#[filter(\|e\| ...)]` | method | source of `{{where}}` |
//! | `#[include_deleted]` | method | no soft-delete predicate |
//! | `#[hard_delete]` | method | keep `DELETE` on soft-delete entities |
//! | `#[returning_key]` | method | return the generated key of an `INSERT` |
//! | `#[batch(size = N)]` | method | rows per batch statement |
//! | `#[dynamic_sql]` | parameter | identifier splice |
//! | `#[dynamic_sql(allow("a", "b"))]` | parameter | allow-listed splice |
//! | `#[dynamic_sql(fragment, allow(...))]` | parameter | allow-listed SQL fragment |

use darling::FromMeta;
use proc_macro2::Span;
use syn::{Attribute, ExprClosure, LitStr, Meta, spanned::Spanned};

/// Method attribute names consumed by the schema macro.
pub const METHOD_ATTRIBUTES: &[&str] = &[
    "sql",
    "filter",
    "include_deleted",
    "hard_delete",
    "returning_key",
    "batch"
];

/// Parameter attribute names consumed by the schema macro.
pub const PARAM_ATTRIBUTES: &[&str] = &["dynamic_sql"];

/// `#[batch(size = N)]`.
#[derive(Debug, FromMeta)]
struct BatchArgs {
    size: usize
}

/// Parsed method attributes.
#[derive(Debug, Default)]
pub struct MethodAttrs {
    /// `#[sql]` template.
    pub sql: Option<LitStr>,

    /// `#[filter]` closure.
    pub filter: Option<ExprClosure>,

    /// Span of the `#[filter]` attribute.
    pub filter_span: Option<Span>,

    /// `#[include_deleted]`.
    pub include_deleted: bool,

    /// `#[hard_delete]`.
    pub hard_delete: bool,

    /// `#[returning_key]`.
    pub returning_key: bool,

    /// `#[batch(size)]`.
    pub batch_size: Option<usize>
}

impl MethodAttrs {
    /// Parse every recognised attribute in `attrs`.
    ///
    /// # Errors
    ///
    /// All malformed attributes, accumulated.
    pub fn parse(attrs: &[Attribute]) -> darling::Result<Self> {
        let mut errors = darling::Error::accumulator();
        let mut out = Self::default();
        for attr in attrs {
            let path = attr.path();
            if path.is_ident("sql") {
                out.sql = errors.handle(attr.parse_args::<LitStr>().map_err(Into::into));
            } else if path.is_ident("filter") {
                out.filter = errors.handle(attr.parse_args::<ExprClosure>().map_err(Into::into));
                out.filter_span = Some(attr.span());
            } else if path.is_ident("include_deleted") {
                out.include_deleted = errors.handle(marker(attr)).is_some();
            } else if path.is_ident("hard_delete") {
                out.hard_delete = errors.handle(marker(attr)).is_some();
            } else if path.is_ident("returning_key") {
                out.returning_key = errors.handle(marker(attr)).is_some();
            } else if path.is_ident("batch") {
                out.batch_size = errors
                    .handle(BatchArgs::from_meta(&attr.meta))
                    .map(|args| args.size);
            }
        }
        errors.finish_with(out)
    }
}

fn marker(attr: &Attribute) -> darling::Result<()> {
    match attr.meta {
        Meta::Path(_) => Ok(()),
        _ => Err(darling::Error::custom("this attribute takes no arguments").with_span(attr))
    }
}

/// Accepted shape of a dynamic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicKind {
    /// Plain identifier.
    Identifier,

    /// Allow-listed SQL fragment.
    Fragment
}

/// Parsed `#[dynamic_sql]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicAttr {
    /// Accepted shape.
    pub kind: DynamicKind,

    /// Exact accepted values.
    pub allow: Vec<String>
}

/// Parse the `#[dynamic_sql]` attribute of a parameter, if present.
///
/// # Errors
///
/// Malformed attribute arguments.
pub fn dynamic_attr(attrs: &[Attribute]) -> syn::Result<Option<DynamicAttr>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("dynamic_sql")) else {
        return Ok(None);
    };
    let mut parsed = DynamicAttr {
        kind:  DynamicKind::Identifier,
        allow: Vec::new()
    };
    if matches!(attr.meta, Meta::Path(_)) {
        return Ok(Some(parsed));
    }

    attr.parse_nested_meta(|nested| {
        let ident = nested
            .path
            .get_ident()
            .ok_or_else(|| syn::Error::new_spanned(&nested.path, "expected identifier"))?;
        match ident.to_string().as_str() {
            "fragment" => parsed.kind = DynamicKind::Fragment,
            "allow" => {
                let content;
                syn::parenthesized!(content in nested.input);
                let values =
                    syn::punctuated::Punctuated::<LitStr, syn::Token![,]>::parse_terminated(
                        &content
                    )?;
                parsed.allow.extend(values.iter().map(LitStr::value));
            }
            other => {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("unknown option '{other}', expected: fragment, allow")
                ));
            }
        }
        Ok(())
    })?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use syn::{ItemFn, parse_quote};

    use super::*;

    fn attrs_of(item: ItemFn) -> Vec<Attribute> {
        item.attrs
    }

    #[test]
    fn method_attributes() {
        let attrs = attrs_of(parse_quote! {
            #[sql("SELECT 1")]
            #[filter(|u| u.id == id)]
            #[include_deleted]
            #[returning_key]
            #[batch(size = 50)]
            fn f() {}
        });
        let parsed = MethodAttrs::parse(&attrs).unwrap();
        assert_eq!(parsed.sql.unwrap().value(), "SELECT 1");
        assert!(parsed.filter.is_some());
        assert!(parsed.include_deleted);
        assert!(!parsed.hard_delete);
        assert!(parsed.returning_key);
        assert_eq!(parsed.batch_size, Some(50));
    }

    #[test]
    fn marker_with_arguments_is_rejected() {
        let attrs = attrs_of(parse_quote! {
            #[hard_delete(yes)]
            fn f() {}
        });
        assert!(MethodAttrs::parse(&attrs).is_err());
    }

    #[test]
    fn non_string_template_is_rejected() {
        let attrs = attrs_of(parse_quote! {
            #[sql(42)]
            fn f() {}
        });
        assert!(MethodAttrs::parse(&attrs).is_err());
    }

    #[test]
    fn bare_dynamic_is_identifier() {
        let attrs = attrs_of(parse_quote! {
            #[dynamic_sql]
            fn f() {}
        });
        assert_eq!(
            dynamic_attr(&attrs).unwrap(),
            Some(DynamicAttr {
                kind:  DynamicKind::Identifier,
                allow: Vec::new()
            })
        );
    }

    #[test]
    fn allow_list_is_collected() {
        let attrs = attrs_of(parse_quote! {
            #[dynamic_sql(allow("name", "created_at"))]
            fn f() {}
        });
        let parsed = dynamic_attr(&attrs).unwrap().unwrap();
        assert_eq!(parsed.kind, DynamicKind::Identifier);
        assert_eq!(parsed.allow, vec!["name", "created_at"]);
    }

    #[test]
    fn fragment_kind() {
        let attrs = attrs_of(parse_quote! {
            #[dynamic_sql(fragment, allow("a > 1"))]
            fn f() {}
        });
        let parsed = dynamic_attr(&attrs).unwrap().unwrap();
        assert_eq!(parsed.kind, DynamicKind::Fragment);
        assert_eq!(parsed.allow, vec!["a > 1"]);
    }

    #[test]
    fn absent_dynamic() {
        assert_eq!(dynamic_attr(&[]).unwrap(), None);
    }
}
