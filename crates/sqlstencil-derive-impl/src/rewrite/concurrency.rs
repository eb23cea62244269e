// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Optimistic concurrency.
//!
//! ```sql
//! UPDATE users SET "name" = $1 WHERE "id" = $2
//! -- becomes
//! UPDATE users SET "name" = $1, "version" = "version" + 1 WHERE ("id" = $2) AND "version" = $3
//! ```
//!
//! The old token comes from the entity parameter, or a parameter named
//! after the token member.

use super::{extend_set, scan};
use crate::{
    diagnostics::{Anchor, Diagnostics},
    entity::VersionKind,
    method::shape::{ReturnShape, TypeShape},
    plan::{BindingSource, Plan, Segment, StatementKind},
    resolve::Context
};

pub(super) fn apply(plan: &mut Plan, cx: &Context<'_>, sink: &Diagnostics) {
    let Some(version) = cx.entity.version else {
        return;
    };
    if plan.kind != StatementKind::Update {
        return;
    }
    let entity = cx.entity;
    let column = entity.quoted(version.member, None);
    let member = entity.columns[version.member].member.clone();

    let source = match cx.method.sole_param(&TypeShape::Entity) {
        Some(param) => BindingSource::Field {
            param:  param.name.clone(),
            member: member.clone()
        },
        None => match cx.method.param(&member).filter(|p| p.shape.is_bindable()) {
            Some(param) => BindingSource::Param(param.name.clone()),
            None => {
                sink.error(
                    "CONCURRENCY-TOKEN-UNBOUND",
                    Anchor::Method,
                    format!(
                        "`{}` is version-checked on `{member}`: add an entity parameter or a parameter named `{member}`",
                        entity.ident
                    )
                );
                return;
            }
        }
    };

    let next = match version.kind {
        VersionKind::Counter => format!("{column} + 1"),
        VersionKind::Timestamp => entity.spec().functions.current_timestamp.to_string()
    };
    if !extend_set(&mut plan.segments, entity, &[(version.member, next)]) {
        return;
    }
    let binding = plan.bind(&member, source);
    scan::conjoin(
        &mut plan.segments,
        vec![Segment::Sql(format!("{column} = ")), Segment::Param(binding)],
        entity.spec()
    );
    plan.version_checked = true;

    match plan.output {
        ReturnShape::Unit => sink.error(
            "CONCURRENCY-OUTCOME",
            Anchor::ReturnType,
            "version-checked updates cannot return `()`: a conflict would go unnoticed; return `UpdateOutcome` or the affected-row count"
        ),
        ReturnShape::Integer(_) => sink.warning(
            "CONCURRENCY-OUTCOME",
            Anchor::ReturnType,
            "a version conflict shows up as zero affected rows; consider returning `UpdateOutcome`"
        ),
        _ => {}
    }
}
