// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Tests for entity extraction.
//!
//! | Category | Coverage |
//! |----------|----------|
//! | Naming | case rules per dialect, overrides, schema |
//! | Keys | explicit, conventional, ambiguous, policy |
//! | Behaviors | soft delete, audit, version, `ENTITY-CONFIG` |
//! | Rejections | generics, tuple structs |
//! | Cache | memoization per dialect |

use syn::parse_quote;

use super::*;

fn user() -> ItemStruct {
    parse_quote! {
        #[entity(table = "users", soft_delete)]
        pub struct User {
            #[key]
            #[generated]
            pub id: i64,
            pub display_name: String,
            pub email: Option<String>,
            #[column(skip)]
            pub cache: String,
            pub is_deleted: bool
        }
    }
}

fn extract_ok(item: &ItemStruct, dialect: Dialect) -> (EntityDescriptor, Diagnostics) {
    let sink = Diagnostics::new();
    let descriptor = extract(item, dialect, KeyPolicy::Warn, &sink).unwrap();
    (descriptor, sink)
}

#[test]
fn columns_follow_dialect_case() {
    let (pg, _) = extract_ok(&user(), Dialect::Postgres);
    assert_eq!(pg.columns[1].column, "display_name");
    let (mssql, _) = extract_ok(&user(), Dialect::SqlServer);
    assert_eq!(mssql.columns[1].column, "DisplayName");
    let (oracle, _) = extract_ok(&user(), Dialect::Oracle);
    assert_eq!(oracle.columns[1].column, "DISPLAY_NAME");
}

#[test]
fn column_override_wins() {
    let item: ItemStruct = parse_quote! {
        #[entity(table = "t")]
        struct Row {
            id: i64,
            #[column(name = "label_text")]
            label: String
        }
    };
    let (entity, _) = extract_ok(&item, Dialect::SqlServer);
    assert_eq!(entity.columns[1].column, "label_text");
}

#[test]
fn table_defaults_to_case_rule() {
    let item: ItemStruct = parse_quote! {
        #[entity]
        struct OrderLine { id: i64 }
    };
    let (pg, _) = extract_ok(&item, Dialect::Postgres);
    assert_eq!(pg.table, "order_line");
    let (mssql, _) = extract_ok(&item, Dialect::SqlServer);
    assert_eq!(mssql.table, "OrderLine");
}

#[test]
fn schema_is_quoted_per_segment() {
    let item: ItemStruct = parse_quote! {
        #[entity(table = "users", schema = "app")]
        struct User { id: i64 }
    };
    let (pg, _) = extract_ok(&item, Dialect::Postgres);
    assert_eq!(pg.qualified_table(), "\"app\".\"users\"");
    let (my, _) = extract_ok(&item, Dialect::MySql);
    assert_eq!(my.qualified_table(), "`app`.`users`");
}

#[test]
fn flags_are_recorded() {
    let (entity, _) = extract_ok(&user(), Dialect::Postgres);
    assert!(entity.columns[0].key);
    assert!(entity.columns[0].generated);
    assert!(entity.columns[3].excluded);
    assert_eq!(
        entity.member_names(),
        vec!["id", "display_name", "email", "is_deleted"]
    );
}

#[test]
fn explicit_key() {
    let (entity, sink) = extract_ok(&user(), Dialect::Postgres);
    assert_eq!(entity.key, KeyResolution::Single(0));
    assert!(sink.snapshot().is_empty());
}

#[test]
fn conventional_key() {
    let item: ItemStruct = parse_quote! {
        #[entity]
        struct Order { order_id: i64, total: i64 }
    };
    let (entity, _) = extract_ok(&item, Dialect::Postgres);
    assert_eq!(entity.key, KeyResolution::Single(0));
    assert!(entity.columns[0].key);
}

#[test]
fn ambiguous_key_warns() {
    let item: ItemStruct = parse_quote! {
        #[entity]
        struct Order { id: i64, order_id: i64 }
    };
    let (entity, sink) = extract_ok(&item, Dialect::Postgres);
    assert_eq!(
        entity.key,
        KeyResolution::Ambiguous(vec!["id".into(), "order_id".into()])
    );
    let found = sink.into_vec();
    assert_eq!(found[0].code, "KEY-AMBIGUOUS");
    assert!(!found[0].is_error());
}

#[test]
fn ambiguous_key_errors_under_strict_policy() {
    let item: ItemStruct = parse_quote! {
        #[entity]
        struct Order { #[key] a: i64, #[key] b: i64 }
    };
    let sink = Diagnostics::new();
    let entity = extract(&item, Dialect::Postgres, KeyPolicy::Error, &sink).unwrap();
    assert!(matches!(entity.key, KeyResolution::Ambiguous(_)));
    assert!(sink.has_errors());
}

#[test]
fn no_key() {
    let item: ItemStruct = parse_quote! {
        #[entity]
        struct Log { message: String }
    };
    let (entity, _) = extract_ok(&item, Dialect::Postgres);
    assert_eq!(entity.key, KeyResolution::None);
}

#[test]
fn bare_soft_delete_uses_conventions() {
    let item: ItemStruct = parse_quote! {
        #[entity(soft_delete)]
        struct Doc { id: i64, is_deleted: bool, deleted_at: Option<i64> }
    };
    let (entity, _) = extract_ok(&item, Dialect::Postgres);
    assert_eq!(
        entity.soft_delete,
        Some(SoftDeleteConfig {
            flag:       1,
            deleted_at: Some(2),
            deleted_by: None
        })
    );
}

#[test]
fn explicit_soft_delete_members() {
    let item: ItemStruct = parse_quote! {
        #[entity(soft_delete(flag = "removed", deleted_by = "remover"))]
        struct Doc { id: i64, removed: bool, remover: Option<String> }
    };
    let (entity, _) = extract_ok(&item, Dialect::Postgres);
    let soft = entity.soft_delete.unwrap();
    assert_eq!(soft.flag, 1);
    assert_eq!(soft.deleted_by, Some(2));
}

#[test]
fn missing_soft_delete_flag_is_config_error() {
    let item: ItemStruct = parse_quote! {
        #[entity(soft_delete(flag = "gone"))]
        struct Doc { id: i64 }
    };
    let (entity, sink) = extract_ok(&item, Dialect::Postgres);
    assert!(entity.soft_delete.is_none());
    assert!(sink.has_code("ENTITY-CONFIG"));
}

#[test]
fn audit_members() {
    let item: ItemStruct = parse_quote! {
        #[entity(audit)]
        struct Doc { id: i64, created_at: i64, updated_at: i64, updated_by: String }
    };
    let (entity, _) = extract_ok(&item, Dialect::Postgres);
    let audit = entity.audit.unwrap();
    assert_eq!(audit.created_at, Some(1));
    assert_eq!(audit.created_by, None);
    assert_eq!(audit.updated_by, Some(3));
    assert!(entity.managed_on_insert(1));
    assert!(!entity.managed_on_insert(0));
}

#[test]
fn audit_without_members_is_config_error() {
    let item: ItemStruct = parse_quote! {
        #[entity(audit)]
        struct Doc { id: i64 }
    };
    let (entity, sink) = extract_ok(&item, Dialect::Postgres);
    assert!(entity.audit.is_none());
    assert!(sink.has_code("ENTITY-CONFIG"));
}

#[test]
fn version_from_field() {
    let item: ItemStruct = parse_quote! {
        #[entity]
        struct Doc { id: i64, #[version(timestamp)] stamp: i64 }
    };
    let (entity, _) = extract_ok(&item, Dialect::Postgres);
    assert_eq!(
        entity.version,
        Some(VersionConfig {
            member: 1,
            kind:   VersionKind::Timestamp
        })
    );
    assert!(entity.managed_on_update(1));
    assert!(!entity.managed_on_insert(1));
}

#[test]
fn version_from_entity_attribute() {
    let item: ItemStruct = parse_quote! {
        #[entity(version = "row_version")]
        struct Doc { id: i64, row_version: i32 }
    };
    let (entity, _) = extract_ok(&item, Dialect::Postgres);
    assert_eq!(entity.version.unwrap().kind, VersionKind::Counter);
}

#[test]
fn generic_struct_is_rejected() {
    let item: ItemStruct = parse_quote! {
        #[entity]
        struct Doc<T> { id: T }
    };
    let sink = Diagnostics::new();
    assert!(extract(&item, Dialect::Postgres, KeyPolicy::Warn, &sink).is_err());
}

#[test]
fn tuple_struct_is_rejected() {
    let item: ItemStruct = parse_quote! {
        #[entity]
        struct Doc(i64);
    };
    let sink = Diagnostics::new();
    assert!(extract(&item, Dialect::Postgres, KeyPolicy::Warn, &sink).is_err());
}

#[test]
fn cache_memoizes_per_dialect() {
    let item = user();
    let sink = Diagnostics::new();
    let mut cache = EntityCache::default();
    let a = cache
        .get_or_extract(&item, Dialect::Postgres, KeyPolicy::Warn, &sink)
        .unwrap();
    let b = cache
        .get_or_extract(&item, Dialect::Postgres, KeyPolicy::Warn, &sink)
        .unwrap();
    let c = cache
        .get_or_extract(&item, Dialect::Oracle, KeyPolicy::Warn, &sink)
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn attributes_are_stripped() {
    let mut item = user();
    strip_attributes(&mut item);
    assert!(item.attrs.is_empty());
    assert!(item.fields.iter().all(|field| field.attrs.is_empty()));
}
