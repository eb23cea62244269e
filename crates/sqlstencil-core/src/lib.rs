// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime support for sqlstencil generated repositories.
//!
//! This crate holds everything the generated code calls into, plus the
//! dialect table the compiler consults while resolving templates. It can
//! also be used on its own to write a driver.
//!
//! # Overview
//!
//! - [`Dialect`] / [`dialect::DialectSpec`]: per-database rendering rules
//! - [`Connection`], [`Command`], [`RowCursor`]: sync driver traits
//! - [`AsyncConnection`], [`AsyncCommand`], [`AsyncRowCursor`]: async
//!   driver traits
//! - [`Value`], [`ToValue`], [`FromValue`]: parameter and cell values
//! - [`StatementBuilder`]: runtime statement assembly
//! - [`Predicate`], [`Sort`], [`Column`]: runtime filters over entities
//! - [`dynamic`]: fail-closed checks for dynamic SQL fragments
//! - [`UpdateOutcome`], [`Page`], [`Rows`]: method results
//! - [`Error`]: runtime error type
//!
//! # Features
//!
//! | Feature | Adds |
//! |---------|------|
//! | `hooks` | [`hooks::ExecutionHooks`] and [`hooks::TracingHooks`] |
//! | `mock` | [`mock::MockConnection`], an in-memory scripted driver |
//! | `postgres` | `postgres::PgDriver` over `sqlx::PgPool` |
//! | `serde` | `Serialize`/`Deserialize` for values and pages |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod dialect;
mod driver;
pub mod dynamic;
mod entity;
mod error;
pub mod like;
mod outcome;
pub mod page;
mod predicate;
pub mod prelude;
mod rows;
mod sort;
mod statement;
mod value;

#[cfg(feature = "hooks")]
#[cfg_attr(docsrs, doc(cfg(feature = "hooks")))]
pub mod hooks;

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;

#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres;

/// Re-export async_trait for driver implementations.
pub use async_trait::async_trait;
pub use dialect::Dialect;
pub use driver::{
    AsyncCommand, AsyncConnection, AsyncRowCursor, Command, Connection, RowAccess, RowCursor,
    Session, decode_scalar
};
pub use entity::{Column, Entity};
pub use error::{Error, RejectReason};
pub use like::LikeKind;
pub use outcome::UpdateOutcome;
pub use page::{Page, Pagination};
pub use predicate::Predicate;
pub use rows::{Rows, resolve_ordinals};
pub use sort::{Sort, SortDirection};
pub use statement::{Parameter, Statement, StatementBuilder};
/// Cancellation token accepted by generated methods.
pub use tokio_util::sync::CancellationToken;
pub use value::{DecodeError, FromValue, ToValue, Value};
