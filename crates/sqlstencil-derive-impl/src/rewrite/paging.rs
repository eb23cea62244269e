// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Paging lowering.
//!
//! | Strategy | Limit only | Offset |
//! |----------|------------|--------|
//! | `LimitOffset` | `… LIMIT n` | `… LIMIT n OFFSET m` |
//! | `TopOrOffsetFetch` | `SELECT TOP (n) …` | `… ORDER BY … OFFSET m ROWS FETCH NEXT n ROWS ONLY` |
//! | `RowNum` | `SELECT * FROM (…) q_ WHERE ROWNUM <= n` | `… rn_ > m` over a numbered subquery |
//!
//! `Page<E>` results also get `SELECT COUNT(*) FROM (…) count_q`, built from
//! the statement without its ordering, before paging is applied.

use sqlstencil_core::dialect::{DialectSpec, PagingStrategy};

use super::scan;
use crate::{
    method::shape::ReturnShape,
    plan::{PagingValue, Plan, Segment, extend, push_sql}
};

/// Ordering SQL Server accepts when the statement has none.
const NEUTRAL_ORDER: &str = "ORDER BY (SELECT NULL)";

pub(super) fn apply(plan: &mut Plan, spec: &DialectSpec) {
    if !plan.paging.is_requested() {
        return;
    }
    if plan.output == ReturnShape::Page {
        plan.count = Some(count_query(&plan.segments, spec));
    }
    let limit = plan.paging.limit.as_ref().map(value);
    let offset = plan.paging.offset.as_ref().map(value);

    match spec.paging {
        PagingStrategy::LimitOffset {
            offset_needs_limit
        } => {
            let mut tail = Vec::new();
            match (&limit, offset_needs_limit) {
                (Some(limit), _) => {
                    push_sql(&mut tail, " LIMIT ");
                    tail.push(limit.clone());
                }
                (None, Some(filler)) if offset.is_some() => push_sql(&mut tail, &format!(" {filler}")),
                _ => {}
            }
            if let Some(offset) = offset {
                push_sql(&mut tail, " OFFSET ");
                tail.push(offset);
            }
            extend(&mut plan.segments, tail);
        }
        PagingStrategy::TopOrOffsetFetch => match (limit, offset) {
            (Some(limit), None) => top(plan, limit),
            (limit, Some(offset)) => {
                ensure_order(plan);
                let mut tail = vec![Segment::Sql(" OFFSET ".to_string()), offset];
                push_sql(&mut tail, " ROWS");
                if let Some(limit) = limit {
                    push_sql(&mut tail, " FETCH NEXT ");
                    tail.push(limit);
                    push_sql(&mut tail, " ROWS ONLY");
                }
                extend(&mut plan.segments, tail);
            }
            (None, None) => {}
        },
        PagingStrategy::RowNum => row_number(plan, limit, offset)
    }
}

fn value(paging: &PagingValue) -> Segment {
    match paging {
        PagingValue::Literal(n) => Segment::Sql(n.to_string()),
        PagingValue::Binding(index) => Segment::Param(*index)
    }
}

fn count_query(segments: &[Segment], spec: &DialectSpec) -> Vec<Segment> {
    let mut body: Vec<Segment> = Vec::new();
    extend(
        &mut body,
        segments
            .iter()
            .filter(|s| !matches!(s, Segment::Sort { .. }))
            .cloned()
            .collect()
    );
    let scanned = scan::tokens(&body, spec);
    if let Some(order) = scanned.iter().position(|t| t.is_word("ORDER")) {
        let stop = scan::boundary(&body, &scanned, order + 1, &["FOR"]);
        scan::remove(&mut body, scanned[order].start, stop);
    }
    scan::trim_end(&mut body);

    let mut count = vec![Segment::Sql(format!("SELECT {}(*) FROM (", spec.functions.count))];
    extend(&mut count, body);
    push_sql(&mut count, ") count_q");
    count
}

/// `SELECT TOP (n)` after the leading `SELECT [DISTINCT]`.
fn top(plan: &mut Plan, limit: Segment) {
    let scanned = scan::tokens(&plan.segments, plan.dialect.spec());
    let Some(select) = scan::find_word(&scanned, "SELECT", 0) else {
        return;
    };
    let after = match scanned.get(select + 1) {
        Some(next) if next.is_word("DISTINCT") => next.end,
        _ => scanned[select].end
    };
    let mut clause = vec![Segment::Sql(" TOP (".to_string()), limit];
    push_sql(&mut clause, ")");
    scan::insert(&mut plan.segments, after, clause);
}

/// `OFFSET … FETCH` needs an `ORDER BY`.
fn ensure_order(plan: &mut Plan) {
    let mut sorted = false;
    for segment in &mut plan.segments {
        if let Segment::Sort {
            fallback, ..
        } = segment
        {
            sorted = true;
            if fallback.is_none() {
                *fallback = Some(NEUTRAL_ORDER.to_string());
            }
        }
    }
    let ordered = scan::tokens(&plan.segments, plan.dialect.spec())
        .iter()
        .any(|t| t.is_word("ORDER"));
    if !sorted && !ordered {
        push_sql(&mut plan.segments, &format!(" {NEUTRAL_ORDER}"));
    }
}

fn row_number(plan: &mut Plan, limit: Option<Segment>, offset: Option<Segment>) {
    let body = std::mem::take(&mut plan.segments);
    let mut out = Vec::new();
    match (limit, offset) {
        (Some(limit), None) => {
            push_sql(&mut out, "SELECT * FROM (");
            extend(&mut out, body);
            push_sql(&mut out, ") q_ WHERE ROWNUM <= ");
            out.push(limit);
        }
        (limit, Some(offset)) => {
            push_sql(&mut out, "SELECT * FROM (SELECT q_.*, ROWNUM rn_ FROM (");
            extend(&mut out, body);
            push_sql(&mut out, ") q_");
            if let Some(limit) = limit {
                push_sql(&mut out, " WHERE ROWNUM <= ");
                out.push(offset.clone());
                push_sql(&mut out, " + ");
                out.push(limit);
            }
            push_sql(&mut out, ") WHERE rn_ > ");
            out.push(offset);
        }
        (None, None) => out = body
    }
    plan.segments = out;
}
