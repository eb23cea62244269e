// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Soft delete.
//!
//! ```sql
//! SELECT … FROM users WHERE name = $1
//! -- becomes
//! SELECT … FROM users WHERE (name = $1) AND "users"."is_deleted" = FALSE
//!
//! DELETE FROM users WHERE "id" = $1
//! -- becomes
//! UPDATE users SET "is_deleted" = TRUE, "deleted_at" = CURRENT_TIMESTAMP WHERE "id" = $1
//! ```

use super::scan;
use crate::{
    diagnostics::{Anchor, Diagnostics},
    entity::SoftDeleteConfig,
    plan::{Plan, Segment, StatementKind},
    resolve::Context
};

pub(super) fn apply(plan: &mut Plan, cx: &Context<'_>, sink: &Diagnostics) {
    let Some(config) = cx.entity.soft_delete else {
        return;
    };
    match plan.kind {
        StatementKind::Select if !cx.method.include_deleted => {
            let prefix = plan
                .table_alias
                .clone()
                .unwrap_or_else(|| cx.entity.qualified_table());
            let flag = cx.entity.quoted(config.flag, Some(&prefix));
            let literal = cx.entity.spec().bool_literal(false);
            scan::conjoin(
                &mut plan.segments,
                vec![Segment::Sql(format!("{flag} = {literal}"))],
                cx.entity.spec()
            );
        }
        StatementKind::Delete if !cx.method.hard_delete => to_update(plan, cx, config, sink),
        _ => {}
    }
}

fn to_update(plan: &mut Plan, cx: &Context<'_>, config: SoftDeleteConfig, sink: &Diagnostics) {
    let entity = cx.entity;
    let spec = entity.spec();
    let scanned = scan::tokens(&plan.segments, spec);
    let Some(delete) = scan::find_word(&scanned, "DELETE", 0) else {
        return;
    };

    let mut assignments = vec![format!(
        "{} = {}",
        entity.quoted(config.flag, None),
        spec.bool_literal(true)
    )];
    if let Some(at) = config.deleted_at {
        assignments.push(format!(
            "{} = {}",
            entity.quoted(at, None),
            spec.functions.current_timestamp
        ));
    }
    if let Some(by) = config.deleted_by {
        match spec.functions.current_actor {
            Some(actor) => assignments.push(format!("{} = {actor}", entity.quoted(by, None))),
            None => sink.warning(
                "AUDIT-ACTOR-UNSUPPORTED",
                Anchor::Member(entity.columns[by].member.clone()),
                format!(
                    "{} has no current-user function; `{}` is not set on delete",
                    spec.name, entity.columns[by].member
                )
            )
        }
    }

    let at = scan::trim_back(
        &plan.segments,
        scan::boundary(&plan.segments, &scanned, delete, &["WHERE", "RETURNING"])
    );
    scan::insert(
        &mut plan.segments,
        at,
        vec![Segment::Sql(format!(" SET {}", assignments.join(", ")))]
    );

    if let Some(from) = scanned.get(delete + 1).filter(|t| t.is_word("FROM")) {
        let stop = scan::skip_ws(&plan.segments, from.end);
        let stop = if stop.segment == from.start.segment { stop } else { from.end };
        scan::replace(&mut plan.segments, from.start, stop, "");
    }
    scan::replace(&mut plan.segments, scanned[delete].start, scanned[delete].end, "UPDATE");
    plan.kind = StatementKind::Update;
    plan.soft_deleted = true;
}
