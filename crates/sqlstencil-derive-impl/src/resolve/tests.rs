// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Tests for placeholder resolution.
//!
//! | Category | Coverage |
//! |----------|----------|
//! | Member lists | columns/values order, write exclusions, `ORDER-MISMATCH` |
//! | Dialects | identical binding sources, `[...]` only quoted on SQL Server |
//! | Keys | `by_key` sources, `BIND-UNRESOLVED` |
//! | Filters | comparisons, null tests, `LIKE`, `IN`, connectives |
//! | Paging | `page`, negative and duplicate values, `PAGE-REQUIRES-PAGING` |
//! | Dynamic SQL | `DYN-ATTR-REQUIRED` in every dialect, `DYN-UNUSED` |
//! | Conditionals | static and run-time decisions |
//! | Hints | `PH-UNKNOWN`, `MEMBER-UNKNOWN` suggestions |

use pretty_assertions::assert_eq;
use sqlstencil_core::Dialect;
use syn::{ItemStruct, TraitItemFn, parse_quote};

use super::*;
use crate::{
    entity::{KeyPolicy, extract},
    plan::{BindingSource, CondKind, PagingValue, render_static},
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
            pub email: Option<String>,
            #[column(skip)]
            pub cache: String
        }
    }
}

struct Resolved {
    plan: Plan,
    sink: Diagnostics
}

impl Resolved {
    fn sql(&self) -> String {
        render_static(&self.plan.segments, &self.plan.bindings, self.plan.dialect)
            .expect("static statement")
            .text
    }

    fn names(&self) -> Vec<&str> {
        self.plan
            .bindings
            .iter()
            .map(|b| b.name.as_str())
            .collect()
    }

    fn message(&self, code: &str) -> String {
        self.sink
            .snapshot()
            .into_iter()
            .find(|d| d.code == code)
            .map(|d| d.message)
            .unwrap_or_default()
    }
}

fn resolve_in(item: &ItemStruct, method: TraitItemFn, dialect: Dialect) -> Resolved {
    let sink = Diagnostics::new();
    let entity = extract(item, dialect, KeyPolicy::Warn, &sink).unwrap();
    let method = MethodSpec::parse(&method, &item.ident, &sink).unwrap();
    let template = method.template.as_ref().unwrap().value();
    let nodes = template::parse(&template, &Delimiters::default()).unwrap();
    let cx = Context {
        entity:     &entity,
        method:     &method,
        batch_size: 1000
    };
    let plan = resolve(&nodes, &cx, &sink);
    Resolved {
        plan,
        sink
    }
}

fn resolve_pg(method: TraitItemFn) -> Resolved {
    resolve_in(&user(), method, Dialect::Postgres)
}

#[test]
fn insert_columns_and_values_in_every_dialect() {
    let method: TraitItemFn = parse_quote! {
        #[sql("INSERT INTO {{table}} ({{columns}}) VALUES ({{values}})")]
        fn add(&self, user: &User) -> Result<(), Error>;
    };
    let pg = resolve_in(&user(), method.clone(), Dialect::Postgres);
    assert!(!pg.sink.has_errors());
    assert_eq!(
        pg.sql(),
        "INSERT INTO \"users\" (\"name\", \"email\") VALUES ($1, $2)"
    );
    let mssql = resolve_in(&user(), method.clone(), Dialect::SqlServer);
    assert_eq!(
        mssql.sql(),
        "INSERT INTO [users] ([Name], [Email]) VALUES (@name, @email)"
    );
    for dialect in Dialect::ALL {
        let resolved = resolve_in(&user(), method.clone(), dialect);
        assert_eq!(resolved.names(), vec!["name", "email"], "{dialect:?}");
        assert_eq!(resolved.plan.bindings, pg.plan.bindings, "{dialect:?}");
    }
}

#[test]
fn binding_sources_match_in_every_dialect() {
    let method: TraitItemFn = parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}} WHERE {{where}} AND id > @min")]
        #[filter(|u| u.name == "Ann" || u.name.starts_with(prefix))]
        fn find(&self, prefix: &str, min: i64) -> Result<Vec<User>, Error>;
    };
    let pg = resolve_in(&user(), method.clone(), Dialect::Postgres);
    assert!(!pg.sink.has_errors());
    assert!(
        pg.plan
            .bindings
            .iter()
            .any(|b| b.source == BindingSource::Param("min".into()))
    );
    for dialect in Dialect::ALL {
        let resolved = resolve_in(&user(), method.clone(), dialect);
        assert!(!resolved.sink.has_errors(), "{dialect:?}");
        assert_eq!(resolved.plan.bindings, pg.plan.bindings, "{dialect:?}");
    }
}

#[test]
fn array_brackets_hold_references_outside_sql_server() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} WHERE id = ANY(ARRAY[@a, @b])")]
        fn f(&self, a: i64, b: i64) -> Result<Vec<User>, Error>;
    });
    assert!(!resolved.sink.has_errors());
    assert_eq!(resolved.names(), vec!["a", "b"]);
    assert_eq!(
        resolved.sql(),
        "SELECT * FROM \"users\" WHERE id = ANY(ARRAY[$1, $2])"
    );
}

#[test]
fn select_projection_is_recorded() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}} WHERE {{where}}")]
        #[filter(|u| u.name == name && u.email.is_some())]
        fn find(&self, name: &str) -> Result<Vec<User>, Error>;
    });
    assert!(!resolved.sink.has_errors());
    assert_eq!(
        resolved.sql(),
        "SELECT \"id\", \"name\", \"email\" FROM \"users\" WHERE \"name\" = $1 AND \"email\" IS NOT NULL"
    );
    assert_eq!(
        resolved.plan.projection,
        Some(vec!["id".to_string(), "name".to_string(), "email".to_string()])
    );
    assert!(resolved.plan.fixed_order);
}

#[test]
fn projection_after_other_text_is_not_fixed() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT 1 AS n, {{columns}} FROM {{table}}")]
        fn all(&self) -> Result<Vec<User>, Error>;
    });
    assert!(!resolved.plan.fixed_order);
}

#[test]
fn alias_qualifies_filter_columns() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT {{columns --prefix u}} FROM {{table}} u WHERE {{where}}")]
        #[filter(|u| u.id > min)]
        fn newer(&self, min: i64) -> Result<Vec<User>, Error>;
    });
    assert_eq!(resolved.plan.table_alias.as_deref(), Some("u"));
    assert!(resolved.sql().ends_with("WHERE u.\"id\" > $1"));
}

#[test]
fn update_set_skips_key() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("UPDATE {{table}} SET {{set}} WHERE {{by_key}}")]
        fn save(&self, user: &User) -> Result<u64, Error>;
    });
    assert!(!resolved.sink.has_errors());
    assert_eq!(
        resolved.sql(),
        "UPDATE \"users\" SET \"name\" = $1, \"email\" = $2 WHERE \"id\" = $3"
    );
    assert_eq!(
        resolved.plan.bindings[2].source,
        BindingSource::Field {
            param:  "user".into(),
            member: "id".into()
        }
    );
}

#[test]
fn by_key_prefers_same_named_parameter() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("DELETE FROM {{table}} WHERE {{by_key}}")]
        fn remove(&self, id: i64) -> Result<u64, Error>;
    });
    assert_eq!(resolved.sql(), "DELETE FROM \"users\" WHERE \"id\" = $1");
    assert_eq!(resolved.plan.bindings[0].source, BindingSource::Param("id".into()));
}

#[test]
fn set_without_source_is_unresolved() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("UPDATE {{table}} SET {{set}}")]
        fn touch(&self, stamp: i64) -> Result<(), Error>;
    });
    assert!(resolved.sink.has_code("BIND-UNRESOLVED"));
}

#[test]
fn mismatched_value_list_is_reported() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("INSERT INTO {{table}} ({{columns}}) VALUES ({{values --exclude email}})")]
        fn add(&self, user: &User) -> Result<(), Error>;
    });
    assert!(resolved.sink.has_code("ORDER-MISMATCH"));
}

#[test]
fn only_and_exclude_conflict() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT {{columns --only name --exclude email}} FROM {{table}}")]
        fn names(&self) -> Result<Vec<User>, Error>;
    });
    assert!(resolved.sink.has_code("OPT-CONFLICT"));
}

#[test]
fn literal_or_gets_distinct_bindings() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} WHERE {{where}}")]
        #[filter(|u| u.name == "a" || u.name == "b")]
        fn pair(&self) -> Result<Vec<User>, Error>;
    });
    assert_eq!(
        resolved.sql(),
        "SELECT * FROM \"users\" WHERE (\"name\" = $1 OR \"name\" = $2)"
    );
    assert_eq!(resolved.names(), vec!["name", "name_1"]);
}

#[test]
fn literal_lists_are_inlined() {
    let resolved = resolve_in(
        &user(),
        parse_quote! {
            #[sql("SELECT * FROM {{table}} WHERE {{where}}")]
            #[filter(|u| [1, 2, -3].contains(&u.id))]
            fn some(&self) -> Result<Vec<User>, Error>;
        },
        Dialect::MySql
    );
    assert_eq!(resolved.sql(), "SELECT * FROM `users` WHERE `id` IN (1, 2, -3)");
    assert!(resolved.plan.bindings.is_empty());
}

#[test]
fn like_pattern_from_parameter() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} WHERE {{where}}")]
        #[filter(|u| u.name.starts_with(prefix))]
        fn starting(&self, prefix: &str) -> Result<Vec<User>, Error>;
    });
    assert_eq!(
        resolved.sql(),
        "SELECT * FROM \"users\" WHERE \"name\" LIKE $1 ESCAPE '!'"
    );
    assert!(matches!(
        resolved.plan.bindings[0].source,
        BindingSource::Like { .. }
    ));
}

#[test]
fn list_parameter_expands_at_run_time() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} WHERE {{where}}")]
        #[filter(|u| ids.contains(&u.id))]
        fn by_ids(&self, ids: &[i64]) -> Result<Vec<User>, Error>;
    });
    assert!(!resolved.sink.has_errors());
    assert!(resolved.plan.segments.iter().any(|s| matches!(
        s,
        Segment::InList { param, .. } if param == "ids"
    )));
}

#[test]
fn where_without_filter() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} WHERE {{where}}")]
        fn some(&self, filter: Predicate<User>) -> Result<Vec<User>, Error>;
    });
    assert!(resolved.sink.has_code("FILTER-MISSING"));
    assert!(resolved.message("FILTER-MISSING").contains("where --param filter"));
}

#[test]
fn where_from_predicate_parameter() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} WHERE {{where --param filter}}")]
        fn some(&self, filter: Predicate<User>) -> Result<Vec<User>, Error>;
    });
    assert!(!resolved.sink.has_errors());
    assert!(resolved.plan.segments.iter().any(|s| matches!(
        s,
        Segment::Predicate { columns, .. } if columns.len() == 3
    )));
}

#[test]
fn order_by_members() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} {{orderby name:desc id}}")]
        fn sorted(&self) -> Result<Vec<User>, Error>;
    });
    assert_eq!(
        resolved.sql(),
        "SELECT * FROM \"users\" ORDER BY \"name\" DESC, \"id\" ASC"
    );
}

#[test]
fn page_binds_limit_and_offset() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}} {{page}}")]
        fn list(&self, page: Pagination) -> Result<Page<User>, Error>;
    });
    assert!(!resolved.sink.has_errors());
    assert_eq!(resolved.names(), vec!["page_limit", "page_offset"]);
    assert_eq!(resolved.plan.paging.page_param.as_deref(), Some("page"));
}

#[test]
fn page_result_needs_paging() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT {{columns}} FROM {{table}}")]
        fn list(&self) -> Result<Page<User>, Error>;
    });
    assert!(resolved.sink.has_code("PAGE-REQUIRES-PAGING"));
}

#[test]
fn paging_values_are_validated() {
    let negative = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} {{limit -1}}")]
        fn f(&self) -> Result<Vec<User>, Error>;
    });
    assert!(negative.sink.has_code("PAGING-NEGATIVE"));
    let duplicate = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} {{limit 10}} {{limit 5}}")]
        fn f(&self) -> Result<Vec<User>, Error>;
    });
    assert!(duplicate.sink.has_code("PAGING-DUPLICATE"));
    let literal = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} {{limit 10}}")]
        fn f(&self) -> Result<Vec<User>, Error>;
    });
    assert_eq!(literal.plan.paging.limit, Some(PagingValue::Literal(10)));
}

#[test]
fn unmarked_dynamic_parameter_fails_in_every_dialect() {
    let method: TraitItemFn = parse_quote! {
        #[sql("SELECT * FROM {{table}} ORDER BY {{dynamic --param column}}")]
        fn sorted(&self, column: &str) -> Result<Vec<User>, Error>;
    };
    for dialect in Dialect::ALL {
        let resolved = resolve_in(&user(), method.clone(), dialect);
        assert!(resolved.sink.has_code("DYN-ATTR-REQUIRED"), "{dialect:?}");
    }
}

#[test]
fn unused_dynamic_parameter_warns() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}}")]
        fn sorted(&self, #[dynamic_sql] column: &str) -> Result<Vec<User>, Error>;
    });
    assert!(resolved.sink.has_code("DYN-UNUSED"));
    assert!(!resolved.sink.has_errors());
}

#[test]
fn fragment_needs_allow_list() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} {{dynamic --param tail}}")]
        fn f(&self, #[dynamic_sql(fragment)] tail: &str) -> Result<Vec<User>, Error>;
    });
    assert!(resolved.sink.has_code("DYN-ALLOW-REQUIRED"));
}

#[test]
fn optional_condition_is_decided_at_run_time() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} WHERE 1 = 1{{if notnull=email}} AND email = @email{{/if}}")]
        fn f(&self, email: Option<&str>) -> Result<Vec<User>, Error>;
    });
    assert!(!resolved.sink.has_errors());
    assert!(resolved.plan.segments.iter().any(|s| matches!(
        s,
        Segment::Conditional { kind: CondKind::NotNull, .. }
    )));
}

#[test]
fn required_condition_is_decided_statically() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}} WHERE 1 = 1{{if notnull=email}} AND email = @email{{else}} AND 0 = 1{{/if}}")]
        fn f(&self, email: &str) -> Result<Vec<User>, Error>;
    });
    assert_eq!(
        resolved.sql(),
        "SELECT * FROM \"users\" WHERE 1 = 1 AND email = $1"
    );
    assert!(!resolved.sink.has_errors());
    assert!(resolved.message("COND-STATIC").contains("`email`"));
}

#[test]
fn unknown_condition_kind() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT * FROM {{table}}{{if notnul=email}} x{{/if}}")]
        fn f(&self, email: Option<&str>) -> Result<Vec<User>, Error>;
    });
    assert!(resolved.sink.has_code("COND-KIND-UNKNOWN"));
    assert!(resolved.message("COND-KIND-UNKNOWN").contains("`notnull`"));
}

#[test]
fn unknown_placeholder_suggests() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT {{colums}} FROM {{table}}")]
        fn f(&self) -> Result<Vec<User>, Error>;
    });
    assert!(resolved.message("PH-UNKNOWN").contains("`columns`"));
}

#[test]
fn unknown_member_suggests() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("SELECT {{column nmae}} FROM {{table}}")]
        fn f(&self) -> Result<Vec<User>, Error>;
    });
    assert!(resolved.message("MEMBER-UNKNOWN").contains("`name`"));
}

#[test]
fn text_references_bind_members() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("UPDATE {{table}} SET name = @user.name WHERE id = @user.id")]
        fn rename(&self, user: &User) -> Result<u64, Error>;
    });
    assert_eq!(
        resolved.sql(),
        "UPDATE \"users\" SET name = $1 WHERE id = $2"
    );
    assert_eq!(resolved.names(), vec!["name", "id"]);
}

#[test]
fn batch_requires_entity_sequence() {
    let resolved = resolve_pg(parse_quote! {
        #[sql("INSERT INTO {{table}} ({{columns}}) VALUES {{batch}}")]
        fn add_all(&self, count: i64) -> Result<u64, Error>;
    });
    assert!(resolved.sink.has_code("BATCH-PARAM"));

    let ok = resolve_pg(parse_quote! {
        #[sql("INSERT INTO {{table}} ({{columns}}) VALUES {{batch}}")]
        #[batch(size = 50)]
        fn add_all(&self, users: &[User]) -> Result<u64, Error>;
    });
    assert!(!ok.sink.has_errors());
    assert_eq!(ok.plan.batch_size, 50);
    assert!(ok.plan.batch().is_some());
}
