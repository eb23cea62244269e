// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! # sqlstencil
//!
//! One crate, all features. Re-exports:
//! - [`schema`] attribute macro from `sqlstencil-derive-impl`
//! - every runtime item from `sqlstencil-core` ([`Dialect`], driver traits,
//!   [`Predicate`], [`Page`], [`UpdateOutcome`], [`Error`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! #[sqlstencil::schema(dialect = "postgres")]
//! mod db {
//!     #[entity(table = "users")]
//!     pub struct User {
//!         #[key]
//!         #[generated]
//!         pub id: i64,
//!         pub name: String,
//!     }
//!
//!     #[repository(entity = User)]
//!     pub trait UserRepo {
//!         #[sql("SELECT {{columns}} FROM {{table}} WHERE {{by_key}}")]
//!         fn find(&self, id: i64) -> Result<Option<User>, sqlstencil::Error>;
//!     }
//! }
//!
//! use db::{UserRepo, UserRepoImpl};
//!
//! let repo = UserRepoImpl::new(connection);
//! let user = repo.find(7)?;
//! ```

pub use sqlstencil_core::*;
pub use sqlstencil_derive_impl::schema;
