// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `#[returning_key]`.

use sqlstencil_core::dialect::KeyReturn;

use super::scan;
use crate::{
    diagnostics::{Anchor, Diagnostics},
    method::shape::ReturnShape,
    plan::{Plan, Segment, StatementKind},
    resolve::Context
};

pub(super) fn apply(plan: &mut Plan, cx: &Context<'_>, sink: &Diagnostics) {
    if !cx.method.returning_key {
        return;
    }
    if plan.kind != StatementKind::Insert || plan.batch().is_some() {
        sink.error(
            "SHAPE-UNSUPPORTED",
            Anchor::Method,
            "#[returning_key] applies to single-row INSERT statements"
        );
        return;
    }
    if !matches!(plan.output, ReturnShape::Integer(_) | ReturnShape::Scalar(_)) {
        sink.error(
            "SHAPE-UNSUPPORTED",
            Anchor::ReturnType,
            "#[returning_key] methods return the key value"
        );
        return;
    }
    let entity = cx.entity;
    let Some(key) = entity.key_index() else {
        sink.error(
            "KEY-REQUIRED",
            Anchor::Method,
            format!("#[returning_key] needs a single key member on `{}`", entity.ident)
        );
        return;
    };
    let column = entity.quoted(key, None);
    let spec = entity.spec();

    match spec.key_return {
        KeyReturn::Returning => {
            let at = scan::trim_back(&plan.segments, scan::end(&plan.segments));
            scan::insert(
                &mut plan.segments,
                at,
                vec![Segment::Sql(format!(" RETURNING {column}"))]
            );
        }
        KeyReturn::OutputInserted => {
            let scanned = scan::tokens(&plan.segments, spec);
            let Some(source) = scanned
                .iter()
                .skip(1)
                .find(|t| t.is_word("VALUES") || t.is_word("SELECT") || t.is_word("DEFAULT"))
            else {
                sink.error(
                    "SHAPE-UNSUPPORTED",
                    Anchor::Method,
                    "#[returning_key] needs a VALUES, SELECT or DEFAULT VALUES source"
                );
                return;
            };
            scan::insert(
                &mut plan.segments,
                source.start,
                vec![Segment::Sql(format!("OUTPUT INSERTED.{column} "))]
            );
        }
        KeyReturn::FollowUp(query) => plan.follow_up = Some(query.to_string()),
        KeyReturn::Unsupported => {
            sink.error(
                "KEY-RETURN-UNSUPPORTED",
                Anchor::Method,
                format!(
                    "{} has no generated-key strategy; select the key in a separate method",
                    spec.name
                )
            );
            return;
        }
    }
    plan.returns_key = true;
}
