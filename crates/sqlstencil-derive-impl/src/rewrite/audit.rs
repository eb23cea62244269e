// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Audit stamps.
//!
//! `INSERT` gains the created columns, `UPDATE` the updated assignments.
//! Columns the template already lists are left as written.

use super::{extend_set, scan};
use crate::{
    diagnostics::{Anchor, Diagnostics},
    plan::{Plan, Segment, StatementKind},
    resolve::Context
};

/// Value an audit column receives.
#[derive(Debug, Clone, Copy)]
enum Stamp {
    Now,
    Actor
}

pub(super) fn apply(plan: &mut Plan, cx: &Context<'_>, sink: &Diagnostics) {
    let Some(config) = cx.entity.audit else {
        return;
    };
    match plan.kind {
        StatementKind::Insert => {
            let pairs = stamps(cx, &[(config.created_at, Stamp::Now), (config.created_by, Stamp::Actor)], sink);
            insert(plan, cx, &pairs);
        }
        StatementKind::Update => {
            let pairs = stamps(cx, &[(config.updated_at, Stamp::Now), (config.updated_by, Stamp::Actor)], sink);
            extend_set(&mut plan.segments, cx.entity, &pairs);
        }
        _ => {}
    }
}

fn stamps(cx: &Context<'_>, roles: &[(Option<usize>, Stamp)], sink: &Diagnostics) -> Vec<(usize, String)> {
    let spec = cx.entity.spec();
    roles
        .iter()
        .filter_map(|(index, stamp)| {
            let index = (*index)?;
            match stamp {
                Stamp::Now => Some((index, spec.functions.current_timestamp.to_string())),
                Stamp::Actor => {
                    let actor = spec.functions.current_actor;
                    if actor.is_none() {
                        let member = &cx.entity.columns[index].member;
                        sink.warning(
                            "AUDIT-ACTOR-UNSUPPORTED",
                            Anchor::Member(member.clone()),
                            format!("{} has no current-user function; `{member}` is left to the database", spec.name)
                        );
                    }
                    actor.map(|actor| (index, actor.to_string()))
                }
            }
        })
        .collect()
}

fn insert(plan: &mut Plan, cx: &Context<'_>, pairs: &[(usize, String)]) {
    let scanned = scan::tokens(&plan.segments, cx.entity.spec());
    let Some(values) = scan::find_word(&scanned, "VALUES", 0) else {
        return;
    };
    let Some(open) = scanned[..values]
        .iter()
        .position(|t| t.depth == 0 && t.lexeme == scan::Lexeme::Open)
    else {
        return;
    };
    let Some(close) = scan::matching_close(&scanned, open) else {
        return;
    };
    let listed = scan::listed_columns(&scan::text_between(
        &plan.segments,
        scanned[open].end,
        scanned[close].start
    ));
    let added: Vec<&(usize, String)> = pairs
        .iter()
        .filter(|(index, _)| {
            let column = &cx.entity.columns[*index].column;
            !listed.iter().any(|l| l.eq_ignore_ascii_case(column))
        })
        .collect();
    if added.is_empty() {
        return;
    }
    let columns: String = added
        .iter()
        .map(|(index, _)| format!(", {}", cx.entity.quoted(*index, None)))
        .collect();

    if let Some(Segment::Batch {
        extras, ..
    }) = plan
        .segments
        .iter_mut()
        .find(|s| matches!(s, Segment::Batch { .. }))
    {
        extras.extend(added.iter().map(|(_, expression)| expression.clone()));
    } else {
        let Some(tuple) = scanned
            .iter()
            .enumerate()
            .skip(values + 1)
            .find(|(_, t)| t.depth == 0 && t.lexeme == scan::Lexeme::Open)
            .map(|(index, _)| index)
        else {
            return;
        };
        let Some(tuple_close) = scan::matching_close(&scanned, tuple) else {
            return;
        };
        let expressions: String = added
            .iter()
            .map(|(_, expression)| format!(", {expression}"))
            .collect();
        scan::insert(
            &mut plan.segments,
            scanned[tuple_close].start,
            vec![Segment::Sql(expressions)]
        );
    }
    scan::insert(&mut plan.segments, scanned[close].start, vec![Segment::Sql(columns)]);
}
