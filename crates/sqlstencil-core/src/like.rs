// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `LIKE` pattern construction.
//!
//! Every generated `LIKE` carries `ESCAPE '!'`. User text is escaped so that
//! `%`, `_`, `[` and the escape character itself match literally, then the
//! wildcards for the requested match kind are added around it.

/// Escape character used by generated `LIKE` clauses.
pub const ESCAPE: char = '!';

/// Which part of the value must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeKind {
    /// `starts_with`
    Prefix,

    /// `ends_with`
    Suffix,

    /// `contains`
    Contains
}

/// Escape wildcard characters in `value`.
///
/// ```rust
/// use sqlstencil_core::like::escape;
///
/// assert_eq!(escape("50%_off"), "50!%!_off");
/// assert_eq!(escape("a!b[c]"), "a!!b![c]");
/// ```
#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '[' | ESCAPE) {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
    out
}

/// Build the full pattern for `value`.
///
/// ```rust
/// use sqlstencil_core::like::{LikeKind, pattern};
///
/// assert_eq!(pattern("An", LikeKind::Prefix), "An%");
/// assert_eq!(pattern("n_", LikeKind::Suffix), "%n!_");
/// assert_eq!(pattern("x", LikeKind::Contains), "%x%");
/// ```
#[must_use]
pub fn pattern(value: &str, kind: LikeKind) -> String {
    let escaped = escape(value);
    match kind {
        LikeKind::Prefix => format!("{escaped}%"),
        LikeKind::Suffix => format!("%{escaped}"),
        LikeKind::Contains => format!("%{escaped}%")
    }
}
