// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Tests for code emission.
//!
//! Generated tokens are compared with whitespace removed.
//!
//! | Category | Coverage |
//! |----------|----------|
//! | Statements | const text vs `StatementBuilder`, dynamic rules |
//! | Flavors | sync and async driver paths, cancellation |
//! | Reads | literal ordinals, resolved ordinals, pages |
//! | Writes | affected rows, `UpdateOutcome`, batch chunks |
//! | Items | `Entity` impl, repository bounds, findings |

use proc_macro2::{Span, TokenStream};
use sqlstencil_core::Dialect;
use syn::{ItemStruct, TraitItemFn, parse_quote};

use super::{Emitter, entity, findings, repository::Repository};
use crate::{
    diagnostics::{Anchor, Diagnostics},
    entity::{EntityDescriptor, KeyPolicy, extract},
    method::{self, MethodSpec},
    resolve::{Context, resolve},
    rewrite::rewrite,
    template::{self, Delimiters}
};

fn user() -> ItemStruct {
    parse_quote! {
        #[entity(table = "users")]
        pub struct User {
            #[key]
            #[generated]
            pub id: i64,
            pub name: String,
            pub email: Option<String>
        }
    }
}

fn compact(tokens: &TokenStream) -> String {
    tokens.to_string().split_whitespace().collect()
}

fn descriptor(dialect: Dialect) -> EntityDescriptor {
    let sink = Diagnostics::new();
    extract(&user(), dialect, KeyPolicy::Warn, &sink).unwrap()
}

fn emit_with(method: TraitItemFn, dialect: Dialect, hooks: bool) -> String {
    let item = user();
    let sink = Diagnostics::new();
    let entity = extract(&item, dialect, KeyPolicy::Warn, &sink).unwrap();
    let spec = MethodSpec::parse(&method, &item.ident, &sink).unwrap();
    let source = spec.template.as_ref().unwrap().value();
    let nodes = template::parse(&source, &Delimiters::default()).unwrap();
    let cx = Context {
        entity:     &entity,
        method:     &spec,
        batch_size: 1000
    };
    let mut plan = resolve(&nodes, &cx, &sink);
    rewrite(&mut plan, &cx, &sink);
    assert!(!sink.has_errors(), "{:?}", sink.snapshot());

    let mut stripped = method.clone();
    method::strip_attributes(&mut stripped);
    let emitter = Emitter {
        method: &spec,
        plan: &plan,
        entity: &entity,
        repository: "UserRepoImpl",
        hooks
    };
    compact(&emitter.method(&stripped.sig))
}

fn emit(method: TraitItemFn) -> String {
    emit_with(method, Dialect::Postgres, false)
}

#[test]
fn static_statement_is_a_constant() {
    let out = emit(parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}} WHERE {{by_key}}")]
        fn find(&self, id: i64) -> Result<Option<User>, Error>;
    });
    assert!(out.contains("constSQL:&str="));
    assert!(out.contains("::sqlstencil::Command::set_text(&mut__command,SQL);"));
    assert!(out.contains("::sqlstencil::ToValue::to_value(&(id))"));
    assert!(!out.contains("StatementBuilder"));
}

#[test]
fn runtime_segments_use_the_builder() {
    let out = emit(parse_quote! {
        #[sql("SELECT * FROM {{table}} WHERE {{where --param filter}}")]
        fn search(&self, filter: Predicate<User>) -> Result<Vec<User>, Error>;
    });
    assert!(out.contains("::sqlstencil::StatementBuilder::with_capacity(::sqlstencil::Dialect::Postgres,"));
    assert!(out.contains("__builder.push_predicate(\"filter\",&filter,&["));
    assert!(out.contains("__sql.bind(&mut__command);"));
    assert!(!out.contains("constSQL"));
}

#[test]
fn sync_methods_name_sync_traits_only() {
    let out = emit(parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}}")]
        fn all(&self) -> Result<Vec<User>, Error>;
    });
    assert!(out.contains("::sqlstencil::Connection::create_command(&self.connection)?"));
    assert!(out.contains("::sqlstencil::Command::execute_reader(&mut__command)?"));
    assert!(out.contains("::sqlstencil::RowCursor::advance(&mut__cursor)?"));
    assert!(!out.contains("Async"));
    assert!(!out.contains(".await"));
}

#[test]
fn async_methods_name_async_traits_only() {
    let out = emit(parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}}")]
        async fn all(&self) -> Result<Vec<User>, Error>;
    });
    assert!(out.contains("asyncmove{"));
    assert!(out.contains("::sqlstencil::AsyncConnection::create_command(&self.connection)?"));
    assert!(out.contains("::sqlstencil::AsyncCommand::execute_reader(&mut__command).await?"));
    assert!(out.contains("::sqlstencil::AsyncRowCursor::advance(&mut__cursor).await?"));
    assert!(!out.contains("::sqlstencil::Connection::"));
}

#[test]
fn cancellation_is_checked_before_execution() {
    let out = emit(parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}}")]
        async fn all(&self, cancel: CancellationToken) -> Result<Vec<User>, Error>;
    });
    let check = "ifcancel.is_cancelled(){return::core::result::Result::Err(::sqlstencil::Error::Cancelled);}";
    let position = out.find(check).expect("cancellation check");
    let create = out.find("create_command").expect("command");
    assert!(position < create);
}

#[test]
fn leading_projection_reads_literal_ordinals() {
    let out = emit(parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}}")]
        fn all(&self) -> Result<Vec<User>, Error>;
    });
    assert!(out.contains("id:::sqlstencil::RowAccess::get(&__cursor,0)?"));
    assert!(out.contains("email:::sqlstencil::RowAccess::get(&__cursor,2)?"));
    assert!(!out.contains("resolve_ordinals"));
}

#[test]
fn other_projections_resolve_ordinals_once() {
    let out = emit(parse_quote! {
        #[sql("SELECT * FROM {{table}}")]
        fn all(&self) -> Result<Vec<User>, Error>;
    });
    assert!(out.contains("::core::option::Option<[usize;3]>"));
    assert!(out.contains("::sqlstencil::resolve_ordinals(&__cursor,&[\"id\",\"name\",\"email\"])?"));
    assert!(out.contains("name:::sqlstencil::RowAccess::get(&__cursor,__slots[1])?"));
}

#[test]
fn narrowed_projection_defaults_missing_members() {
    let out = emit(parse_quote! {
        #[sql("SELECT {{columns --only name}} FROM {{table}}")]
        fn names(&self) -> Result<Vec<User>, Error>;
    });
    assert!(out.contains("name:::sqlstencil::RowAccess::get(&__cursor,0)?"));
    assert!(out.contains("id:::core::default::Default::default()"));
}

#[test]
fn page_counts_then_reads() {
    let out = emit(parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}} {{page}}")]
        fn list(&self, page: Pagination) -> Result<Page<User>, Error>;
    });
    let count = out.find("constCOUNT_SQL:&str=").expect("count statement");
    let read = out.find("constSQL:&str=").expect("read statement");
    assert!(count < read);
    assert!(out.contains("::sqlstencil::Page{items:__items,total:__total,pagination:page}"));
    assert!(out.contains("::sqlstencil::page::capacity_for("));
}

#[test]
fn update_returns_affected_rows() {
    let out = emit(parse_quote! {
        #[sql("UPDATE {{table}} SET {{set}} WHERE {{by_key}}")]
        fn save(&self, user: &User) -> Result<i32, Error>;
    });
    assert!(out.contains("::sqlstencil::Command::execute_non_query(&mut__command)?"));
    assert!(out.contains("<i32>::try_from(__rows).unwrap_or(<i32>::MAX)"));
    assert!(out.contains("::sqlstencil::ToValue::to_value(&(user.name))"));
}

#[test]
fn outcome_wraps_affected_rows() {
    let out = emit(parse_quote! {
        #[sql("UPDATE {{table}} SET {{set}} WHERE {{by_key}}")]
        fn save(&self, user: &User) -> Result<UpdateOutcome, Error>;
    });
    assert!(out.contains("::sqlstencil::UpdateOutcome::from_rows(__rows)"));
}

#[test]
fn batch_runs_one_statement_per_chunk() {
    let out = emit(parse_quote! {
        #[sql("INSERT INTO {{table}} ({{columns}}) VALUES {{batch}}")]
        #[batch(size = 2)]
        fn add_all(&self, users: &[User]) -> Result<u64, Error>;
    });
    assert!(out.contains("for__chunkinusers.chunks(2)"));
    assert!(out.contains("for(__row,__item)in__chunk.iter().enumerate()"));
    assert!(out.contains("__builder.push_indexed_param(\"name\",__row,&__item.name);"));
    assert!(out.contains("__builder.push_indexed_param(\"email\",__row,&__item.email);"));
    assert!(out.contains("__rows+=__affected;"));
}

#[test]
fn batch_chunks_respect_the_parameter_limit() {
    let out = emit_with(
        parse_quote! {
            #[sql("INSERT INTO {{table}} ({{columns}}) VALUES {{batch}}")]
            fn add_all(&self, users: &[User]) -> Result<u64, Error>;
        },
        Dialect::SqlServer,
        false
    );
    assert!(out.contains("users.chunks(1000)"));

    let narrow = emit_with(
        parse_quote! {
            #[sql("INSERT INTO {{table}} ({{columns}}) VALUES {{batch}}")]
            #[batch(size = 5000)]
            fn add_all(&self, users: &[User]) -> Result<u64, Error>;
        },
        Dialect::SqlServer,
        false
    );
    assert!(narrow.contains("users.chunks(1050)"));
}

#[test]
fn dynamic_sql_is_checked_at_run_time() {
    let out = emit(parse_quote! {
        #[sql("SELECT * FROM {{table}} ORDER BY {{dynamic --param by}}")]
        fn sorted(&self, #[dynamic_sql(allow("name", "id"))] by: &str) -> Result<Vec<User>, Error>;
    });
    assert!(out.contains("constRULE:::sqlstencil::dynamic::DynamicRule"));
    assert!(out.contains("allow:&[\"name\",\"id\"]"));
    assert!(out.contains("::sqlstencil::dynamic::check(&RULE,"));
    assert!(!out.contains("dynamic_sql"));
}

#[test]
fn hooks_wrap_execution_only_when_enabled() {
    let method: TraitItemFn = parse_quote! {
        #[sql("DELETE FROM {{table}} WHERE {{by_key}}")]
        fn remove(&self, id: i64) -> Result<u64, Error>;
    };
    let plain = emit_with(method.clone(), Dialect::Postgres, false);
    assert!(!plain.contains("hooks"));

    let hooked = emit_with(method, Dialect::Postgres, true);
    assert!(hooked.contains("::sqlstencil::hooks::ExecutionContext{repository:\"UserRepoImpl\",method:\"remove\","));
    assert!(hooked.contains("__hooks.before_execute(&__context);"));
    assert!(hooked.contains("__hooks.after_execute(&__context,::core::option::Option::Some(*__value))"));
    assert!(hooked.contains("__hooks.on_failure(&__context,__error)"));
}

#[test]
fn result_is_converted_into_the_declared_error() {
    let out = emit(parse_quote! {
        #[sql("DELETE FROM {{table}} WHERE {{by_key}}")]
        fn remove(&self, id: i64) -> Result<(), MyError>;
    });
    assert!(out.contains("fnremove(&self,id:i64)->Result<(),MyError>"));
    assert!(out.contains("__result.map_err(::core::convert::From::from)"));
}

#[test]
fn entity_items_count_mapped_members() {
    let item: ItemStruct = parse_quote! {
        #[entity(table = "users")]
        pub struct User {
            #[key]
            pub id: i64,
            #[column(skip)]
            pub cache: String,
            pub name: String
        }
    };
    let sink = Diagnostics::new();
    let descriptor = extract(&item, Dialect::Postgres, KeyPolicy::Warn, &sink).unwrap();
    let out = compact(&entity::generate(&descriptor, &item.vis));
    assert!(out.contains("impl::sqlstencil::EntityforUser"));
    assert!(out.contains("constTYPE_NAME:&'staticstr=\"User\";"));
    assert!(out.contains("pubconstID:::sqlstencil::Column<User,i64>=::sqlstencil::Column::new(0usize,\"id\");"));
    assert!(out.contains("pubconstNAME:::sqlstencil::Column<User,String>=::sqlstencil::Column::new(1usize,\"name\");"));
    assert!(!out.contains("CACHE"));
}

#[test]
fn repository_bounds_follow_generated_flavors() {
    let vis: syn::Visibility = parse_quote!(pub);
    let trait_ident: syn::Ident = parse_quote!(UserRepo);
    let ident: syn::Ident = parse_quote!(UserRepoImpl);
    let generate = |needs_sync, needs_async, hooks| {
        compact(
            &Repository {
                vis: &vis,
                trait_ident: &trait_ident,
                ident: &ident,
                methods: Vec::new(),
                needs_sync,
                needs_async,
                hooks
            }
            .generate()
        )
    };
    assert!(generate(true, false, false).contains("C:::sqlstencil::Connection{"));
    assert!(generate(false, true, false).contains("C:::sqlstencil::AsyncConnection{"));
    assert!(
        generate(true, true, false)
            .contains("C:::sqlstencil::Connection+::sqlstencil::AsyncConnection{")
    );
    assert!(generate(false, false, false).contains("C:::sqlstencil::Session{"));
    assert!(!generate(true, false, false).contains("with_hooks"));
    assert!(generate(true, false, true).contains("pubfnwith_hooks("));
    assert!(generate(true, false, false).contains("pubfnset_transaction(&mutself,"));
}

#[test]
fn findings_render_by_severity() {
    let sink = Diagnostics::new();
    sink.error("PH-UNKNOWN", Anchor::Repository, "unknown placeholder");
    sink.warning("DYN-UNUSED", Anchor::Repository, "unused");
    sink.info("COND-STATIC", Anchor::Repository, "folded");
    let entity = descriptor(Dialect::Postgres);
    let rendered = findings::render(
        &sink.into_vec(),
        &findings::Spans {
            method: None,
            entity: Some(&entity),
            item:   Span::call_site()
        }
    );
    assert!(rendered.has_errors());
    assert_eq!(rendered.errors.len(), 1);
    assert_eq!(rendered.warnings.len(), 1);
    assert!(compact(&rendered.errors[0]).contains("[PH-UNKNOWN]unknownplaceholder"));
    assert!(compact(&rendered.warnings[0]).contains("#[deprecated(note=\"[DYN-UNUSED]unused\")]"));
}

#[test]
fn failed_method_keeps_the_signature() {
    let function: TraitItemFn = parse_quote! {
        fn find(&self, id: i64) -> Result<Option<User>, Error>;
    };
    let error = syn::Error::new(Span::call_site(), "boom").to_compile_error();
    let out = compact(&findings::failed_method(&function.sig, &[error]));
    assert!(out.contains("fnfind(&self,id:i64)->Result<Option<User>,Error>{"));
    assert!(out.contains("compile_error!"));
    assert!(out.contains("::core::unimplemented!()"));
}
