// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Field-level attribute parsing.
//!
//! | Attribute | Effect |
//! |-----------|--------|
//! | `#[key]` | Explicit key member |
//! | `#[generated]` | Value assigned by the database on insert |
//! | `#[column(name = "...")]` | Column name override |
//! | `#[column(skip)]` | Member is not mapped |
//! | `#[version]` / `#[version(timestamp)]` | Concurrency token |

use darling::FromMeta;
use syn::{Attribute, Field, Ident, Meta, Type, ext::IdentExt};

use super::{
    VersionKind,
    attrs::{ColumnArgs, VersionArgs}
};

/// Field attribute names consumed by the schema macro.
pub const FIELD_ATTRIBUTES: &[&str] = &["key", "generated", "column", "version"];

/// One struct field with its parsed attributes.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field identifier.
    pub ident: Ident,

    /// Declared type.
    pub ty: Type,

    /// `#[key]` present.
    pub key: bool,

    /// `#[generated]` present.
    pub generated: bool,

    /// `#[column(name)]` value.
    pub column: Option<String>,

    /// `#[column(skip)]` present.
    pub skip: bool,

    /// `#[version]` kind.
    pub version: Option<VersionKind>
}

impl FieldDef {
    /// Parse a named struct field.
    ///
    /// # Errors
    ///
    /// Unnamed fields and malformed helper attributes.
    pub fn from_field(field: &Field) -> darling::Result<Self> {
        let ident = field.ident.clone().ok_or_else(|| {
            darling::Error::custom("entity fields must be named").with_span(field)
        })?;
        let mut errors = darling::Error::accumulator();
        let mut def = Self {
            ident,
            ty: field.ty.clone(),
            key: false,
            generated: false,
            column: None,
            skip: false,
            version: None
        };

        for attr in &field.attrs {
            if attr.path().is_ident("key") {
                def.key = true;
            } else if attr.path().is_ident("generated") {
                def.generated = true;
            } else if attr.path().is_ident("column") {
                if let Some(args) = errors.handle(ColumnArgs::from_meta(&attr.meta)) {
                    def.column = args.name;
                    def.skip = args.skip.is_present();
                }
            } else if attr.path().is_ident("version") {
                def.version = errors.handle(parse_version(attr));
            }
        }

        errors.finish_with(def)
    }

    /// Member name without a raw-identifier prefix.
    #[must_use]
    pub fn member(&self) -> String {
        self.ident.unraw().to_string()
    }
}

fn parse_version(attr: &Attribute) -> darling::Result<VersionKind> {
    if matches!(attr.meta, Meta::Path(_)) {
        return Ok(VersionKind::Counter);
    }
    let args = VersionArgs::from_meta(&attr.meta)?;
    Ok(if args.timestamp.is_present() {
        VersionKind::Timestamp
    } else {
        VersionKind::Counter
    })
}

/// Remove helper attributes from a field before it is re-emitted.
pub fn strip_attributes(field: &mut Field) {
    field.attrs.retain(|attr| {
        !FIELD_ATTRIBUTES
            .iter()
            .any(|name| attr.path().is_ident(name))
    });
}
