// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Behavioral rewrite passes.
//!
//! Runs after resolution and edits the plan's top-level SQL in a fixed
//! order. Each pass is a no-op when the entity lacks its configuration.
//!
//! # Architecture
//!
//! ```text
//! rewrite.rs (pass order, shared SET-list helper)
//! ├── scan.rs         - clause tokens and segment edits
//! ├── soft_delete.rs  - deleted-row predicate, DELETE → UPDATE
//! ├── audit.rs        - created/updated stamps
//! ├── concurrency.rs  - version check and increment
//! ├── keys.rs         - generated key return
//! └── paging.rs       - LIMIT/OFFSET, TOP, OFFSET…FETCH, ROWNUM; COUNT(*) companion
//! ```
//!
//! # Order
//!
//! | Pass | Statements | Skipped when |
//! |------|------------|--------------|
//! | soft delete | `SELECT`, `DELETE` | `#[include_deleted]`, `#[hard_delete]` |
//! | audit | `INSERT`, `UPDATE` | the `DELETE` became a soft delete |
//! | concurrency | `UPDATE` | the `DELETE` became a soft delete |
//! | keys | `INSERT` | no `#[returning_key]` |
//! | paging | any | no `limit`, `offset` or `page` |
//!
//! Passes edit SQL outside runtime segments. A `WHERE` inside an `if`
//! block bounds the `SET` list and is conjoined in each branch.

mod audit;
mod concurrency;
mod keys;
mod paging;
pub mod scan;
mod soft_delete;


use crate::{
    diagnostics::Diagnostics,
    entity::EntityDescriptor,
    plan::{Plan, Segment},
    resolve::Context
};

/// Apply every pass to `plan`.
pub fn rewrite(plan: &mut Plan, cx: &Context<'_>, sink: &Diagnostics) {
    scan::trim_end(&mut plan.segments);
    soft_delete::apply(plan, cx, sink);
    if !plan.soft_deleted {
        audit::apply(plan, cx, sink);
        concurrency::apply(plan, cx, sink);
    }
    keys::apply(plan, cx, sink);
    paging::apply(plan, cx.entity.spec());
}

/// Append `column = expression` pairs to the top-level `SET` list.
///
/// Columns the template already assigns keep the author's value. Returns
/// `false` when the statement has no `SET`.
fn extend_set(segments: &mut Vec<Segment>, entity: &EntityDescriptor, pairs: &[(usize, String)]) -> bool {
    let scanned = scan::tokens(segments, entity.spec());
    let Some(set) = scan::find_word(&scanned, "SET", 0) else {
        return false;
    };
    let stop = scan::trim_back(
        segments,
        scan::boundary(segments, &scanned, set + 1, &["WHERE", "FROM", "RETURNING", "OUTPUT"])
    );
    let assigned = scan::assigned_columns(&scan::text_between(segments, scanned[set].end, stop));
    let added: Vec<String> = pairs
        .iter()
        .filter(|(index, _)| {
            let column = &entity.columns[*index].column;
            !assigned.iter().any(|a| a.eq_ignore_ascii_case(column))
        })
        .map(|(index, expression)| format!(", {} = {expression}", entity.quoted(*index, None)))
        .collect();
    if !added.is_empty() {
        scan::insert(segments, stop, vec![Segment::Sql(added.concat())]);
    }
    true
}
