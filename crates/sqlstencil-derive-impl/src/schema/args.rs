// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `#[schema(...)]` and `#[repository(...)]` arguments.
//!
//! | Attribute | Argument | Default |
//! |-----------|----------|---------|
//! | `schema` | `dialect = "postgres"` | `postgres` |
//! | `schema` | `delimiters("{{", "}}")` | `{{` / `}}` |
//! | `schema` | `key_policy = "warn" \| "error"` | `warn` |
//! | `schema` | `batch_size = 1000` | `1000` |
//! | `repository` | `entity = User` | required |
//! | `repository` | `dialect = "..."` | schema dialect |
//! | `repository` | `name = "UserStore"` | `{Trait}Impl` |
//! | `repository` | `batch_size = N` | schema batch size |

use darling::{FromAttributes, FromMeta, ast::NestedMeta};
use sqlstencil_core::Dialect;
use syn::{Expr, ExprLit, Lit};

use crate::{entity::KeyPolicy, template::Delimiters};

/// Rows per batch statement when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// A dialect name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DialectArg(pub Dialect);

impl FromMeta for DialectArg {
    fn from_string(value: &str) -> darling::Result<Self> {
        Dialect::from_name(value)
            .map(Self)
            .ok_or_else(|| darling::Error::unknown_value(value))
    }
}

/// How an ambiguous entity key is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyPolicyArg(pub KeyPolicy);

impl FromMeta for KeyPolicyArg {
    fn from_string(value: &str) -> darling::Result<Self> {
        match value {
            "warn" => Ok(Self(KeyPolicy::Warn)),
            "error" => Ok(Self(KeyPolicy::Error)),
            other => Err(darling::Error::unknown_value(other))
        }
    }
}

/// `delimiters("<open>", "<close>")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterArgs(pub Delimiters);

impl FromMeta for DelimiterArgs {
    fn from_list(items: &[NestedMeta]) -> darling::Result<Self> {
        let strings = items
            .iter()
            .map(|item| match item {
                NestedMeta::Lit(Lit::Str(s)) => Ok(s.value()),
                other => Err(darling::Error::unexpected_type("non-string").with_span(other))
            })
            .collect::<darling::Result<Vec<String>>>()?;
        let [open, close] = strings.as_slice() else {
            return Err(darling::Error::custom(
                "expected `delimiters(\"<open>\", \"<close>\")`"
            ));
        };
        for delimiter in [open, close] {
            if delimiter.chars().count() != 2 || delimiter.chars().any(char::is_whitespace) {
                return Err(darling::Error::custom(format!(
                    "delimiter `{delimiter}` must be two non-whitespace characters"
                )));
            }
        }
        Ok(Self(Delimiters {
            open:  open.clone(),
            close: close.clone()
        }))
    }
}

/// Arguments of `#[schema(...)]`.
#[derive(Debug, Default, FromMeta)]
pub struct SchemaArgs {
    /// Default dialect of every repository.
    #[darling(default)]
    pub dialect: DialectArg,

    /// Placeholder delimiters.
    #[darling(default)]
    pub delimiters: Option<DelimiterArgs>,

    /// Severity of `KEY-AMBIGUOUS`.
    #[darling(default)]
    pub key_policy: KeyPolicyArg,

    /// Default rows per batch statement.
    #[darling(default)]
    pub batch_size: Option<usize>
}

impl SchemaArgs {
    /// Configured delimiters, or `{{` / `}}`.
    #[must_use]
    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
            .as_ref()
            .map_or_else(Delimiters::default, |d| d.0.clone())
    }
}

/// Arguments of `#[repository(...)]` on a trait.
#[derive(Debug, FromAttributes)]
#[darling(attributes(repository))]
pub struct RepositoryArgs {
    /// Entity struct of the repository.
    pub entity: EntityRef,

    /// Dialect override.
    #[darling(default)]
    pub dialect: Option<DialectArg>,

    /// Generated struct name.
    #[darling(default)]
    pub name: Option<syn::Ident>,

    /// Batch size override.
    #[darling(default)]
    pub batch_size: Option<usize>
}

/// `entity = User` or `entity = "User"`.
#[derive(Debug, Clone)]
pub struct EntityRef(pub syn::Ident);

impl FromMeta for EntityRef {
    fn from_expr(expr: &Expr) -> darling::Result<Self> {
        match expr {
            Expr::Path(path) => path
                .path
                .segments
                .last()
                .map(|segment| Self(segment.ident.clone()))
                .ok_or_else(|| darling::Error::custom("expected an entity name").with_span(expr)),
            Expr::Lit(ExprLit {
                lit: Lit::Str(s), ..
            }) => s.parse().map(Self).map_err(darling::Error::from),
            _ => Err(darling::Error::unexpected_expr_type(expr))
        }
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;

    fn schema(tokens: proc_macro2::TokenStream) -> darling::Result<SchemaArgs> {
        let items = NestedMeta::parse_meta_list(tokens)?;
        SchemaArgs::from_list(&items)
    }

    #[test]
    fn defaults() {
        let args = schema(proc_macro2::TokenStream::new()).unwrap();
        assert_eq!(args.dialect.0, Dialect::Postgres);
        assert_eq!(args.key_policy.0, KeyPolicy::Warn);
        assert_eq!(args.delimiters(), Delimiters::default());
        assert!(args.batch_size.is_none());
    }

    #[test]
    fn every_argument() {
        let args = schema(quote::quote!(
            dialect = "sqlserver",
            delimiters("<%", "%>"),
            key_policy = "error",
            batch_size = 200
        ))
        .unwrap();
        assert_eq!(args.dialect.0, Dialect::SqlServer);
        assert_eq!(args.key_policy.0, KeyPolicy::Error);
        assert_eq!(args.delimiters().open, "<%");
        assert_eq!(args.delimiters().close, "%>");
        assert_eq!(args.batch_size, Some(200));
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        assert!(schema(quote::quote!(dialect = "mongo")).is_err());
    }

    #[test]
    fn delimiters_must_be_two_characters() {
        assert!(schema(quote::quote!(delimiters("{", "}"))).is_err());
        assert!(schema(quote::quote!(delimiters("{{"))).is_err());
    }

    #[test]
    fn repository_entity_forms() {
        let bare: syn::ItemTrait = parse_quote! {
            #[repository(entity = User, name = "UserStore", batch_size = 10)]
            trait Repo {}
        };
        let args = RepositoryArgs::from_attributes(&bare.attrs).unwrap();
        assert_eq!(args.entity.0, "User");
        assert_eq!(args.name.unwrap(), "UserStore");
        assert_eq!(args.batch_size, Some(10));

        let quoted: syn::ItemTrait = parse_quote! {
            #[repository(entity = "User", dialect = "mysql")]
            trait Repo {}
        };
        let args = RepositoryArgs::from_attributes(&quoted.attrs).unwrap();
        assert_eq!(args.entity.0, "User");
        assert_eq!(args.dialect, Some(DialectArg(Dialect::MySql)));
    }

    #[test]
    fn repository_needs_entity() {
        let missing: syn::ItemTrait = parse_quote! {
            #[repository(name = "X")]
            trait Repo {}
        };
        assert!(RepositoryArgs::from_attributes(&missing.attrs).is_err());
    }
}
