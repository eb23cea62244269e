// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Tests for module compilation.
//!
//! | Category | Coverage |
//! |----------|----------|
//! | Output | entity items, repository struct, stripped helper attributes |
//! | Configuration | repository name and dialect overrides, bad arguments |
//! | Findings | `ENTITY-UNKNOWN`, `SQL-MISSING`, template errors, per-method isolation |

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{ItemMod, parse_quote};

use super::{args::SchemaArgs, compile, expand};

fn compact(tokens: &TokenStream) -> String {
    tokens.to_string().split_whitespace().collect()
}

fn compiled(mut module: ItemMod) -> String {
    compile(&SchemaArgs::default(), &mut module).unwrap();
    compact(&module.to_token_stream())
}

fn module(methods: TokenStream) -> ItemMod {
    parse_quote! {
        mod db {
            #[entity(table = "users")]
            pub struct User {
                #[key]
                #[generated]
                pub id: i64,
                #[column(name = "display_name")]
                pub name: String
            }

            #[repository(entity = User)]
            pub trait UserRepo {
                #methods
            }
        }
    }
}

#[test]
fn generates_entity_and_repository_items() {
    let out = compiled(module(quote! {
        #[sql("SELECT {{columns}} FROM {{table}} WHERE {{by_key}}")]
        fn find(&self, id: i64) -> Result<Option<User>, sqlstencil::Error>;
    }));
    assert!(out.contains("impl::sqlstencil::EntityforUser"));
    assert!(out.contains("pubstructUserRepoImpl<C:::sqlstencil::Session>"));
    assert!(out.contains("impl<C>UserRepoforUserRepoImpl<C>whereC:::sqlstencil::Connection{"));
    assert!(out.contains("\\\"display_name\\\""));
}

#[test]
fn helper_attributes_are_removed() {
    let out = compiled(module(quote! {
        #[sql("SELECT {{columns}} FROM {{table}}")]
        #[include_deleted]
        fn all(&self) -> Result<Vec<User>, sqlstencil::Error>;
    }));
    assert!(!out.contains("#[entity"));
    assert!(!out.contains("#[key]"));
    assert!(!out.contains("#[generated]"));
    assert!(!out.contains("#[column"));
    assert!(!out.contains("#[repository"));
    assert!(!out.contains("#[sql"));
    assert!(!out.contains("#[include_deleted]"));
}

#[test]
fn repository_name_and_dialect_can_be_overridden() {
    let mut module: ItemMod = parse_quote! {
        mod db {
            #[entity(table = "users")]
            pub struct User {
                #[key]
                pub id: i64
            }

            #[repository(entity = User, name = "UserStore", dialect = "sqlserver")]
            pub trait UserRepo {
                #[sql("SELECT {{columns}} FROM {{table}}")]
                async fn all(&self) -> Result<Vec<User>, sqlstencil::Error>;
            }
        }
    };
    compile(&SchemaArgs::default(), &mut module).unwrap();
    let out = compact(&module.to_token_stream());
    assert!(out.contains("pubstructUserStore<"));
    assert!(out.contains("whereC:::sqlstencil::AsyncConnection{"));
    assert!(out.contains("SELECT[Id]FROM[users]"));
}

#[test]
fn unknown_entity_is_reported() {
    let mut module: ItemMod = parse_quote! {
        mod db {
            #[repository(entity = Missing)]
            pub trait Repo {
                #[sql("SELECT 1")]
                fn one(&self) -> Result<i64, sqlstencil::Error>;
            }
        }
    };
    compile(&SchemaArgs::default(), &mut module).unwrap();
    let out = compact(&module.to_token_stream());
    assert!(out.contains("[ENTITY-UNKNOWN]"));
    assert!(!out.contains("structRepoImpl"));
}

#[test]
fn failing_method_leaves_the_others_generated() {
    let out = compiled(module(quote! {
        fn missing(&self) -> Result<(), sqlstencil::Error>;

        #[sql("SELECT {{columns FROM users")]
        fn broken(&self) -> Result<Vec<User>, sqlstencil::Error>;

        #[sql("SELECT {{columns}} FROM {{table}}")]
        fn all(&self) -> Result<Vec<User>, sqlstencil::Error>;
    }));
    assert!(out.contains("[SQL-MISSING]"));
    assert!(out.contains("[TPL-"));
    let generated = out.find("impl<C>UserRepoforUserRepoImpl<C>").expect("trait impl");
    let tail = &out[generated..];
    assert!(tail.contains("fnall(&self)"));
    assert!(tail.contains("::sqlstencil::Command::execute_reader"));
    assert!(tail.contains("::core::unimplemented!()"));
}

#[test]
fn default_bodies_are_kept() {
    let out = compiled(module(quote! {
        #[sql("SELECT {{columns}} FROM {{table}}")]
        fn all(&self) -> Result<Vec<User>, sqlstencil::Error>;

        fn first_name(&self) -> String {
            String::new()
        }
    }));
    let generated = out.find("impl<C>UserRepoforUserRepoImpl<C>").expect("trait impl");
    assert!(!out[generated..].contains("first_name"));
    assert!(!out.contains("[SQL-MISSING]"));
}

#[test]
fn module_without_body_is_rejected() {
    let mut module: ItemMod = parse_quote!(
        mod db;
    );
    assert!(compile(&SchemaArgs::default(), &mut module).is_err());
}

#[test]
fn bad_arguments_keep_the_module() {
    let out = compact(&expand(
        quote!(dialect = "mongo"),
        quote!(
            mod db {}
        )
    ));
    assert!(out.contains("moddb{}"));
    assert!(out.contains("compile_error!"));
}
