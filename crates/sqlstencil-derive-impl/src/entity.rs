// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity metadata extraction.
//!
//! Turns an `#[entity]` struct into an [`EntityDescriptor`] for one dialect.
//! Raw attributes are read here and nowhere else; later stages only see the
//! typed descriptor.
//!
//! # Architecture
//!
//! ```text
//! entity.rs (descriptor + extract)
//! ├── attrs.rs   - #[entity(...)] via darling
//! ├── field.rs   - #[key], #[generated], #[column], #[version]
//! └── naming.rs  - dialect case rules (convert_case)
//! ```
//!
//! # Keys
//!
//! Members marked `#[key]` are the key. Without any marker, members named
//! `id` or `<entity>_id` are candidates. More than one key member makes the
//! key ambiguous: `KEY-AMBIGUOUS` is reported and key placeholders fail with
//! `KEY-REQUIRED`.

pub mod attrs;
pub mod field;
pub mod naming;

#[cfg(test)]
mod tests;

use std::{collections::BTreeMap, sync::Arc};

use darling::{FromAttributes, util::Override};
use sqlstencil_core::{Dialect, dialect::DialectSpec};
use syn::{Attribute, Fields, Ident, ItemStruct, Meta, Type};

use self::{
    attrs::{AuditArgs, EntityAttrs, SoftDeleteArgs},
    field::FieldDef
};
use crate::diagnostics::{Anchor, Diagnostics};

/// Severity of an ambiguous key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// Report `KEY-AMBIGUOUS` as a warning.
    #[default]
    Warn,

    /// Report `KEY-AMBIGUOUS` as an error.
    Error
}

/// Concurrency token flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKind {
    /// Integer incremented on every update.
    Counter,

    /// Timestamp refreshed on every update.
    Timestamp
}

/// One struct member.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    /// Member identifier as declared.
    pub ident: Ident,

    /// Member name without raw prefix.
    pub member: String,

    /// Unquoted column name.
    pub column: String,

    /// Declared type.
    pub ty: Type,

    /// Part of the key.
    pub key: bool,

    /// Assigned by the database on insert.
    pub generated: bool,

    /// Not mapped.
    pub excluded: bool
}

/// Outcome of key detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    /// One key member (index into [`EntityDescriptor::columns`]).
    Single(usize),

    /// Several candidates.
    Ambiguous(Vec<String>),

    /// No candidate.
    None
}

/// Soft-delete members (indices into [`EntityDescriptor::columns`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftDeleteConfig {
    /// Boolean flag.
    pub flag: usize,

    /// Deletion timestamp.
    pub deleted_at: Option<usize>,

    /// Deleting actor.
    pub deleted_by: Option<usize>
}

/// Audit members (indices into [`EntityDescriptor::columns`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuditConfig {
    /// Creation timestamp.
    pub created_at: Option<usize>,

    /// Creating actor.
    pub created_by: Option<usize>,

    /// Update timestamp.
    pub updated_at: Option<usize>,

    /// Updating actor.
    pub updated_by: Option<usize>
}

/// Concurrency token member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionConfig {
    /// Index into [`EntityDescriptor::columns`].
    pub member: usize,

    /// Token flavour.
    pub kind: VersionKind
}

/// Immutable description of one entity for one dialect.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// Struct identifier.
    pub ident: Ident,

    /// Target dialect.
    pub dialect: Dialect,

    /// Unquoted table name.
    pub table: String,

    /// Unquoted schema.
    pub schema: Option<String>,

    /// Every struct member in declaration order.
    pub columns: Vec<ColumnDescriptor>,

    /// Key detection result.
    pub key: KeyResolution,

    /// Soft-delete configuration.
    pub soft_delete: Option<SoftDeleteConfig>,

    /// Audit configuration.
    pub audit: Option<AuditConfig>,

    /// Concurrency token.
    pub version: Option<VersionConfig>
}

impl EntityDescriptor {
    /// Struct name.
    #[must_use]
    pub fn name(&self) -> String {
        self.ident.to_string()
    }

    /// Rendering rules of the descriptor's dialect.
    #[must_use]
    pub fn spec(&self) -> &'static DialectSpec {
        self.dialect.spec()
    }

    /// Mapped members with their indices, in declaration order.
    pub fn mapped(&self) -> impl Iterator<Item = (usize, &ColumnDescriptor)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !column.excluded)
    }

    /// Index of a mapped member.
    #[must_use]
    pub fn find(&self, member: &str) -> Option<usize> {
        self.mapped()
            .find(|(_, column)| column.member == member)
            .map(|(index, _)| index)
    }

    /// Mapped member names.
    #[must_use]
    pub fn member_names(&self) -> Vec<&str> {
        self.mapped()
            .map(|(_, column)| column.member.as_str())
            .collect()
    }

    /// Key member index, when unambiguous.
    #[must_use]
    pub fn key_index(&self) -> Option<usize> {
        match self.key {
            KeyResolution::Single(index) => Some(index),
            _ => None
        }
    }

    /// Quoted, schema-qualified table.
    #[must_use]
    pub fn qualified_table(&self) -> String {
        let spec = self.spec();
        match &self.schema {
            Some(schema) => format!("{}.{}", spec.quote_ident(schema), spec.quote_ident(&self.table)),
            None => spec.quote_ident(&self.table)
        }
    }

    /// Quoted column of member `index`, optionally qualified.
    #[must_use]
    pub fn quoted(&self, index: usize, prefix: Option<&str>) -> String {
        let column = self.spec().quote_ident(&self.columns[index].column);
        match prefix {
            Some(prefix) => format!("{prefix}.{column}"),
            None => column
        }
    }

    /// Quoted columns of all mapped members.
    #[must_use]
    pub fn quoted_columns(&self, prefix: Option<&str>) -> Vec<String> {
        self.mapped()
            .map(|(index, _)| self.quoted(index, prefix))
            .collect()
    }

    /// Members whose values a rewrite pass supplies on insert.
    #[must_use]
    pub fn managed_on_insert(&self, index: usize) -> bool {
        let audit = self.audit.unwrap_or_default();
        let soft = self.soft_delete;
        [audit.created_at, audit.created_by, audit.updated_at, audit.updated_by]
            .contains(&Some(index))
            || soft.is_some_and(|s| s.deleted_at == Some(index) || s.deleted_by == Some(index))
    }

    /// Members whose values a rewrite pass supplies on update.
    #[must_use]
    pub fn managed_on_update(&self, index: usize) -> bool {
        self.managed_on_insert(index) || self.version.is_some_and(|v| v.member == index)
    }
}

/// Per-invocation memo of descriptors keyed by `(entity, dialect)`.
#[derive(Debug, Default)]
pub struct EntityCache {
    entries: BTreeMap<(String, Dialect), Arc<EntityDescriptor>>
}

impl EntityCache {
    /// Descriptor for `item` under `dialect`, extracting it on first use.
    ///
    /// # Errors
    ///
    /// See [`extract`].
    pub fn get_or_extract(
        &mut self,
        item: &ItemStruct,
        dialect: Dialect,
        policy: KeyPolicy,
        sink: &Diagnostics
    ) -> darling::Result<Arc<EntityDescriptor>> {
        let key = (item.ident.to_string(), dialect);
        if let Some(found) = self.entries.get(&key) {
            return Ok(Arc::clone(found));
        }
        let descriptor = Arc::new(extract(item, dialect, policy, sink)?);
        self.entries.insert(key, Arc::clone(&descriptor));
        Ok(descriptor)
    }
}

/// Build the descriptor of `item` for `dialect`.
///
/// Configuration problems that leave a usable descriptor (unknown member in
/// `soft_delete(...)`, ambiguous key) are reported to `sink`; the affected
/// configuration is dropped.
///
/// # Errors
///
/// Generic structs, tuple and unit structs, unnamed fields and malformed
/// helper attributes.
pub fn extract(
    item: &ItemStruct,
    dialect: Dialect,
    policy: KeyPolicy,
    sink: &Diagnostics
) -> darling::Result<EntityDescriptor> {
    if !item.generics.params.is_empty() {
        return Err(darling::Error::custom("entities cannot be generic").with_span(&item.generics));
    }
    let Fields::Named(named) = &item.fields else {
        return Err(darling::Error::custom("entities must be structs with named fields")
            .with_span(&item.ident));
    };

    let listed: Vec<Attribute> = item
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("entity") && matches!(attr.meta, Meta::List(_)))
        .cloned()
        .collect();
    let attrs = EntityAttrs::from_attributes(&listed)?;
    let mut errors = darling::Error::accumulator();
    let fields: Vec<FieldDef> = named
        .named
        .iter()
        .filter_map(|field| errors.handle(FieldDef::from_field(field)))
        .collect();
    errors.finish()?;

    let spec = dialect.spec();
    let columns: Vec<ColumnDescriptor> = fields
        .iter()
        .map(|field| {
            let member = field.member();
            ColumnDescriptor {
                ident: field.ident.clone(),
                column: field
                    .column
                    .clone()
                    .unwrap_or_else(|| naming::apply(&member, spec.name_case)),
                member,
                ty: field.ty.clone(),
                key: field.key,
                generated: field.generated,
                excluded: field.skip
            }
        })
        .collect();

    let mut descriptor = EntityDescriptor {
        ident: item.ident.clone(),
        dialect,
        table: attrs
            .table
            .clone()
            .unwrap_or_else(|| naming::apply(&item.ident.to_string(), spec.name_case)),
        schema: attrs.schema.clone(),
        columns,
        key: KeyResolution::None,
        soft_delete: None,
        audit: None,
        version: None
    };

    descriptor.key = detect_key(&descriptor);
    if let KeyResolution::Ambiguous(candidates) = &descriptor.key {
        let message = format!(
            "entity `{}` has several key candidates ({}); mark one with #[key] or write key predicates explicitly",
            descriptor.ident,
            candidates.join(", ")
        );
        match policy {
            KeyPolicy::Warn => sink.warning("KEY-AMBIGUOUS", Anchor::Entity, message),
            KeyPolicy::Error => sink.error("KEY-AMBIGUOUS", Anchor::Entity, message)
        }
    }
    if let KeyResolution::Single(index) = descriptor.key {
        descriptor.columns[index].key = true;
    }

    descriptor.soft_delete = attrs
        .soft_delete
        .as_ref()
        .and_then(|config| soft_delete(&descriptor, config, sink));
    descriptor.audit = attrs
        .audit
        .as_ref()
        .and_then(|config| audit(&descriptor, config, sink));
    descriptor.version = version(&descriptor, &fields, attrs.version.as_deref(), sink);

    Ok(descriptor)
}

fn detect_key(entity: &EntityDescriptor) -> KeyResolution {
    let marked: Vec<usize> = entity
        .mapped()
        .filter(|(_, column)| column.key)
        .map(|(index, _)| index)
        .collect();
    let candidates = if marked.is_empty() {
        let own = format!("{}_id", naming::apply(&entity.name(), sqlstencil_core::dialect::NameCase::Snake));
        entity
            .mapped()
            .filter(|(_, column)| column.member == "id" || column.member == own)
            .map(|(index, _)| index)
            .collect()
    } else {
        marked
    };
    match candidates.as_slice() {
        [] => KeyResolution::None,
        [single] => KeyResolution::Single(*single),
        many => KeyResolution::Ambiguous(
            many.iter()
                .map(|index| entity.columns[*index].member.clone())
                .collect()
        )
    }
}

/// Resolve an optional member reference.
///
/// Explicit names must exist; conventional names are skipped when absent.
fn member_ref(
    entity: &EntityDescriptor,
    explicit: Option<&str>,
    conventional: &str,
    role: &str,
    sink: &Diagnostics
) -> Result<Option<usize>, ()> {
    match explicit {
        Some(name) => match entity.find(name) {
            Some(index) => Ok(Some(index)),
            None => {
                sink.error(
                    "ENTITY-CONFIG",
                    Anchor::Entity,
                    format!("{role} member `{name}` is not a mapped member of `{}`", entity.ident)
                );
                Err(())
            }
        },
        None => Ok(entity.find(conventional))
    }
}

fn soft_delete(
    entity: &EntityDescriptor,
    config: &Override<SoftDeleteArgs>,
    sink: &Diagnostics
) -> Option<SoftDeleteConfig> {
    let args = match config {
        Override::Inherit => SoftDeleteArgs::default(),
        Override::Explicit(args) => args.clone()
    };
    let flag_name = args.flag.as_deref().unwrap_or("is_deleted");
    let Some(flag) = entity.find(flag_name) else {
        sink.error(
            "ENTITY-CONFIG",
            Anchor::Entity,
            format!(
                "soft delete flag `{flag_name}` is not a mapped member of `{}`",
                entity.ident
            )
        );
        return None;
    };
    let deleted_at =
        member_ref(entity, args.deleted_at.as_deref(), "deleted_at", "soft delete timestamp", sink)
            .ok()?;
    let deleted_by =
        member_ref(entity, args.deleted_by.as_deref(), "deleted_by", "soft delete actor", sink)
            .ok()?;
    Some(SoftDeleteConfig {
        flag,
        deleted_at,
        deleted_by
    })
}

fn audit(
    entity: &EntityDescriptor,
    config: &Override<AuditArgs>,
    sink: &Diagnostics
) -> Option<AuditConfig> {
    let args = match config {
        Override::Inherit => AuditArgs::default(),
        Override::Explicit(args) => args.clone()
    };
    let audit = AuditConfig {
        created_at: member_ref(entity, args.created_at.as_deref(), "created_at", "audit", sink)
            .ok()?,
        created_by: member_ref(entity, args.created_by.as_deref(), "created_by", "audit", sink)
            .ok()?,
        updated_at: member_ref(entity, args.updated_at.as_deref(), "updated_at", "audit", sink)
            .ok()?,
        updated_by: member_ref(entity, args.updated_by.as_deref(), "updated_by", "audit", sink)
            .ok()?
    };
    if audit == AuditConfig::default() {
        sink.error(
            "ENTITY-CONFIG",
            Anchor::Entity,
            format!("`audit` is enabled but `{}` has no audit members", entity.ident)
        );
        return None;
    }
    Some(audit)
}

fn version(
    entity: &EntityDescriptor,
    fields: &[FieldDef],
    attribute: Option<&str>,
    sink: &Diagnostics
) -> Option<VersionConfig> {
    let marked: Vec<(usize, VersionKind)> = fields
        .iter()
        .enumerate()
        .filter_map(|(index, field)| field.version.map(|kind| (index, kind)))
        .filter(|(index, _)| !entity.columns[*index].excluded)
        .collect();

    if let Some(name) = attribute {
        let Some(index) = entity.find(name) else {
            sink.error(
                "ENTITY-CONFIG",
                Anchor::Entity,
                format!("version member `{name}` is not a mapped member of `{}`", entity.ident)
            );
            return None;
        };
        let kind = marked
            .iter()
            .find(|(marked, _)| *marked == index)
            .map_or(VersionKind::Counter, |(_, kind)| *kind);
        return Some(VersionConfig {
            member: index,
            kind
        });
    }

    match marked.as_slice() {
        [] => None,
        [(member, kind)] => Some(VersionConfig {
            member: *member,
            kind:   *kind
        }),
        [_, (second, _), ..] => {
            sink.error(
                "ENTITY-CONFIG",
                Anchor::Member(entity.columns[*second].member.clone()),
                "only one member can be the version token"
            );
            None
        }
    }
}

/// Remove `#[entity]` and field helper attributes before re-emission.
pub fn strip_attributes(item: &mut ItemStruct) {
    item.attrs.retain(|attr| !attr.path().is_ident("entity"));
    for field in &mut item.fields {
        field::strip_attributes(field);
    }
}
