// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rust_2018_idioms
)]
#![deny(unsafe_code)]

//! # Quick Navigation
//!
//! - **Attribute Macro**: [`schema`](macro@schema), the only entry point
//! - **Runtime**: the `sqlstencil-core` crate, re-exported by `sqlstencil`
//!
//! # Attribute Quick Reference
//!
//! ## Module-Level `#[schema(...)]`
//!
//! ```rust,ignore
//! #[sqlstencil::schema(
//!     dialect = "postgres",     // postgres | mysql | sqlite | sqlserver | oracle
//!     delimiters("{{", "}}"),   // two-character placeholder delimiters
//!     key_policy = "warn",      // warn | error for ambiguous keys
//!     batch_size = 1000         // rows per batch statement
//! )]
//! mod db { /* ... */ }
//! ```
//!
//! ## Entity `#[entity(...)]` and Fields
//!
//! ```rust,ignore
//! #[entity(
//!     table = "users",
//!     schema = "app",
//!     soft_delete(flag = "is_deleted", deleted_at = "deleted_at"),
//!     audit,
//!     version = "row_version"
//! )]
//! pub struct User {
//!     #[key]
//!     #[generated]
//!     pub id: i64,
//!
//!     #[column(name = "display_name")]
//!     pub name: String,
//!
//!     #[column(skip)]
//!     pub cached_score: u32,
//!
//!     #[version]
//!     pub row_version: i64,
//! }
//! ```
//!
//! ## Repository `#[repository(...)]` and Methods
//!
//! ```rust,ignore
//! #[repository(entity = User, name = "UserStore", dialect = "sqlite", batch_size = 500)]
//! pub trait UserRepo {
//!     #[sql("SELECT {{columns}} FROM {{table}} WHERE {{where}}")]
//!     #[filter(|u| u.name.starts_with(prefix))]
//!     fn by_prefix(&self, prefix: &str) -> Result<Vec<User>, sqlstencil::Error>;
//!
//!     #[sql("INSERT INTO {{table}} ({{columns}}) VALUES ({{values}})")]
//!     #[returning_key]
//!     async fn insert(&self, user: &User) -> Result<i64, sqlstencil::Error>;
//!
//!     #[sql("SELECT {{columns}} FROM {{table}} ORDER BY {{dynamic --param by}}")]
//!     fn sorted(&self, #[dynamic_sql(allow("name", "id"))] by: &str) -> Result<Vec<User>, sqlstencil::Error>;
//! }
//! ```
//!
//! | Method attribute | Effect |
//! |------------------|--------|
//! | `#[sql("...")]` | Statement template; required unless the method has a default body |
//! | `#[filter(\|e\| expr)]` | Source of `{{where}}` |
//! | `#[include_deleted]` | No soft-delete predicate |
//! | `#[hard_delete]` | `DELETE` stays a `DELETE` on soft-delete entities |
//! | `#[returning_key]` | `INSERT` returns the generated key |
//! | `#[batch(size = N)]` | Rows per statement for `{{batch}}` |

mod diagnostics;
mod emit;
mod entity;
mod method;
mod plan;
mod resolve;
mod rewrite;
mod schema;
mod template;
mod utils;

use proc_macro::TokenStream;

/// Compile the SQL templates of an inline module at build time.
///
/// # Overview
///
/// Every `#[entity]` struct in the module gets an `Entity` impl and one
/// typed `Column` constant per mapped member. Every `#[repository]` trait
/// gets a `{Trait}Impl<C>` struct implementing it over any driver `C`.
///
/// Templates are parsed, resolved against the entity, rewritten for
/// soft-delete, audit, concurrency, key return and paging, and lowered to
/// plain driver calls. Nothing is parsed at run time.
///
/// # Findings
///
/// Problems are reported at the token responsible, prefixed with a stable
/// code such as `[PH-UNKNOWN]`. An error only replaces the affected
/// method's body with `compile_error!`; the rest of the trait is still
/// generated. Warnings surface as deprecation notes.
///
/// # Generated Repository
///
/// ```rust,ignore
/// let mut repo = UserRepoImpl::new(connection)
///     .with_command_timeout(Duration::from_secs(5));
/// repo.set_transaction(Some(transaction));
/// let users = repo.by_prefix("An")?;
/// ```
#[proc_macro_attribute]
pub fn schema(args: TokenStream, input: TokenStream) -> TokenStream {
    schema::expand(args.into(), input.into()).into()
}
