// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity-level attribute parsing with darling.
//!
//! # Supported Attributes
//!
//! | Attribute | Required | Default | Description |
//! |-----------|----------|---------|-------------|
//! | `table` | No | struct name through the dialect case rule | Table name |
//! | `schema` | No | none | Schema qualifier |
//! | `soft_delete` | No | off | Bare, or `soft_delete(flag, deleted_at, deleted_by)` |
//! | `audit` | No | off | Bare, or `audit(created_at, created_by, updated_at, updated_by)` |
//! | `version` | No | none | Concurrency token member |
//!
//! The bare forms use conventional member names: `is_deleted`, `deleted_at`,
//! `deleted_by`, `created_at`, `created_by`, `updated_at`, `updated_by`.
//! Conventional names that the struct lacks are skipped; explicit names must
//! exist.

use darling::{FromAttributes, FromMeta, util::Override};

/// Explicit soft-delete member names.
#[derive(Debug, Clone, Default, FromMeta)]
pub struct SoftDeleteArgs {
    /// Boolean flag member.
    pub flag: Option<String>,

    /// Deletion timestamp member.
    pub deleted_at: Option<String>,

    /// Deleting actor member.
    pub deleted_by: Option<String>
}

/// Explicit audit member names.
#[derive(Debug, Clone, Default, FromMeta)]
pub struct AuditArgs {
    /// Creation timestamp member.
    pub created_at: Option<String>,

    /// Creating actor member.
    pub created_by: Option<String>,

    /// Last update timestamp member.
    pub updated_at: Option<String>,

    /// Last updating actor member.
    pub updated_by: Option<String>
}

/// Attributes parsed from `#[entity(...)]`.
///
/// ```rust,ignore
/// #[entity(
///     table = "users",
///     schema = "app",
///     soft_delete(flag = "is_deleted", deleted_at = "deleted_at"),
///     audit,
///     version = "row_version"
/// )]
/// ```
#[derive(Debug, Default, FromAttributes)]
#[darling(attributes(entity))]
pub struct EntityAttrs {
    /// Table name.
    #[darling(default)]
    pub table: Option<String>,

    /// Schema qualifier.
    #[darling(default)]
    pub schema: Option<String>,

    /// Soft-delete configuration.
    #[darling(default)]
    pub soft_delete: Option<Override<SoftDeleteArgs>>,

    /// Audit configuration.
    #[darling(default)]
    pub audit: Option<Override<AuditArgs>>,

    /// Concurrency token member.
    #[darling(default)]
    pub version: Option<String>
}

/// Attributes parsed from a field's `#[column(...)]`.
#[derive(Debug, Default, FromMeta)]
pub struct ColumnArgs {
    /// Column name override.
    #[darling(default)]
    pub name: Option<String>,

    /// Exclude the member from mapping.
    #[darling(default)]
    pub skip: darling::util::Flag
}

/// Attributes parsed from a field's `#[version(...)]`.
#[derive(Debug, Default, FromMeta)]
pub struct VersionArgs {
    /// Token is a timestamp instead of a counter.
    #[darling(default)]
    pub timestamp: darling::util::Flag
}
