// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Run-time checks for dynamic SQL fragments.
//!
//! A `{{dynamic --param p}}` placeholder splices caller text into the
//! statement, so the generated method validates the value first and fails
//! closed:
//!
//! | Rule | Accepted values |
//! |------|-----------------|
//! | `#[dynamic_sql]` | plain identifiers, optionally dotted (`name`, `u.name`, `app.users.name`) |
//! | `#[dynamic_sql(allow("a", "b"))]` | exactly the listed values |
//! | `#[dynamic_sql(fragment)]` | exactly the listed values; an allow-list is mandatory |
//!
//! Rejections log the parameter name at `warn` level; the value itself is
//! never logged and never part of the error.

use crate::{Error, error::RejectReason};

/// Longest accepted identifier, in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Kind of text a dynamic parameter may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// A plain, optionally dotted identifier.
    Identifier,

    /// Arbitrary SQL restricted to an allow-list.
    Fragment
}

/// Validation rule attached to one dynamic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicRule {
    /// Method parameter name.
    pub parameter: &'static str,

    /// Accepted shape.
    pub kind: FragmentKind,

    /// Exact values accepted; empty means "any well-formed identifier".
    pub allow: &'static [&'static str]
}

/// Validate `value` against `rule`.
///
/// # Errors
///
/// [`Error::DynamicSqlRejected`] when the value fails the rule.
///
/// ```rust
/// use sqlstencil_core::dynamic::{DynamicRule, FragmentKind, check};
///
/// let rule = DynamicRule {
///     parameter: "sort",
///     kind:      FragmentKind::Identifier,
///     allow:     &[]
/// };
/// assert_eq!(check(&rule, "u.created_at").unwrap(), "u.created_at");
/// assert!(check(&rule, "name; DROP TABLE users").is_err());
/// ```
pub fn check<'v>(rule: &DynamicRule, value: &'v str) -> Result<&'v str, Error> {
    match verdict(rule, value) {
        Ok(()) => Ok(value),
        Err(reason) => {
            tracing::warn!(
                parameter = rule.parameter,
                reason = %reason,
                "dynamic SQL fragment rejected"
            );
            Err(Error::DynamicSqlRejected {
                parameter: rule.parameter,
                reason
            })
        }
    }
}

fn verdict(rule: &DynamicRule, value: &str) -> Result<(), RejectReason> {
    if value.is_empty() {
        return Err(RejectReason::Empty);
    }
    if !rule.allow.is_empty() || rule.kind == FragmentKind::Fragment {
        return if rule.allow.contains(&value) {
            Ok(())
        } else {
            Err(RejectReason::NotAllowed)
        };
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(RejectReason::TooLong);
    }
    if is_identifier_path(value) {
        Ok(())
    } else {
        Err(RejectReason::InvalidShape)
    }
}

fn is_identifier_path(value: &str) -> bool {
    let segments: Vec<&str> = value.split('.').collect();
    segments.len() <= 3 && segments.iter().all(|s| is_identifier(s))
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false
    }
}
