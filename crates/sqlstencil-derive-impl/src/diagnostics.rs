// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Findings collected while compiling templates.
//!
//! Every pipeline stage reports into a [`Diagnostics`] sink instead of
//! returning early, so one compilation reports every problem of a method at
//! once. Findings are anchored to a logical location ([`Anchor`]); the
//! schema orchestrator maps anchors to source spans when it renders them.
//!
//! # Severities
//!
//! | Severity | Effect |
//! |----------|--------|
//! | `Error` | The method body becomes `compile_error!`; other methods are unaffected |
//! | `Warning` | Rendered as a compiler warning at the anchor; emission continues |
//! | `Info` | Recorded only |
//!
//! # Codes
//!
//! | Code | Severity | Raised when |
//! |------|----------|-------------|
//! | `TPL-UNCLOSED` | Error | placeholder opened but never closed |
//! | `TPL-EMPTY` | Error | placeholder with no name |
//! | `TPL-BLOCK` | Error | `else` / `/if` without `if`, unclosed `if`, bad `if` header |
//! | `PH-UNKNOWN` | Error | unknown placeholder name |
//! | `OPT-UNKNOWN` | Error | unknown placeholder option |
//! | `OPT-IGNORED` | Warning | option that has no effect on this placeholder |
//! | `OPT-CONFLICT` | Error | `--exclude` together with `--only` |
//! | `OPT-MISSING` | Error | required argument absent |
//! | `OPT-INVALID` | Error | argument not understood |
//! | `MEMBER-UNKNOWN` | Error | option names a member the entity lacks |
//! | `COLUMNS-EMPTY` | Error | option filters remove every column |
//! | `PARAM-UNKNOWN` | Error | reference to a missing method parameter |
//! | `PARAM-TYPE` | Error | parameter type does not fit its use |
//! | `BIND-UNRESOLVED` | Error | no source for a member value |
//! | `KEY-AMBIGUOUS` | Warning / Error | several key candidates |
//! | `KEY-REQUIRED` | Error | key placeholder without a single key |
//! | `FILTER-MISSING` | Error | `where` without a filter or predicate parameter |
//! | `FILTER-UNSUPPORTED` | Error | filter expression outside the supported subset |
//! | `COND-KIND-UNKNOWN` | Error | unknown `if` test |
//! | `COND-STATIC` | Info | `if` block decided by the parameter's type |
//! | `DYN-ATTR-REQUIRED` | Error | dynamic fragment without `#[dynamic_sql]` |
//! | `DYN-ALLOW-REQUIRED` | Error | `#[dynamic_sql(fragment)]` without allow-list |
//! | `DYN-UNUSED` | Warning | `#[dynamic_sql]` parameter never spliced |
//! | `ORDER-MISMATCH` | Error | column list and value list disagree |
//! | `PAGING-NEGATIVE` | Error | negative literal limit/offset |
//! | `PAGING-DUPLICATE` | Error | limit or offset given twice |
//! | `PAGE-REQUIRES-PAGING` | Error | `Page<E>` result without paging |
//! | `BATCH-PARAM` | Error | batch placeholder misuse |
//! | `SHAPE-UNSUPPORTED` | Error | signature the backend cannot implement |
//! | `SQL-MISSING` | Error | method without template and without default body |
//! | `CONCURRENCY-TOKEN-UNBOUND` | Error | no source for the old version value |
//! | `CONCURRENCY-OUTCOME` | Error / Warning | version-checked update whose result hides conflicts |
//! | `KEY-RETURN-UNSUPPORTED` | Error | dialect cannot return generated keys |
//! | `AUDIT-ACTOR-UNSUPPORTED` | Warning | dialect has no current-actor function |
//! | `ENTITY-UNKNOWN` | Error | repository names an unknown entity |
//! | `ENTITY-CONFIG` | Error | entity configuration names a missing member |

use std::{fmt, sync::Mutex};

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Suppresses emission of the affected method.
    Error,

    /// Reported, emission continues.
    Warning,

    /// Recorded only.
    Info
}

/// Logical source location of a finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Byte range inside the method's template.
    Template {
        /// Byte offset of the construct.
        offset: usize,

        /// Source text of the construct.
        text: String
    },

    /// The method signature.
    Method,

    /// A method parameter.
    Param(String),

    /// The method's `#[filter]` attribute.
    Filter,

    /// The method's return type.
    ReturnType,

    /// The entity struct.
    Entity,

    /// One entity member.
    Member(String),

    /// The repository trait.
    Repository
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,

    /// Stable code, e.g. `PH-UNKNOWN`.
    pub code: &'static str,

    /// Human-readable message.
    pub message: String,

    /// Where the finding applies.
    pub anchor: Anchor
}

impl Diagnostic {
    /// Whether this finding suppresses emission.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Anchor::Template {
            offset,
            text
        } = &self.anchor
        {
            write!(f, " (template offset {offset}: `{text}`)")?;
        }
        Ok(())
    }
}

/// Append-only finding collector.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Mutex<Vec<Diagnostic>>
}

impl Diagnostics {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(diagnostic);
    }

    /// Record an error.
    pub fn error(&self, code: &'static str, anchor: Anchor, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Error,
            code,
            message: message.into(),
            anchor
        });
    }

    /// Record a warning.
    pub fn warning(&self, code: &'static str, anchor: Anchor, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            code,
            message: message.into(),
            anchor
        });
    }

    /// Record an informational note.
    pub fn info(&self, code: &'static str, anchor: Anchor, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Info,
            code,
            message: message.into(),
            anchor
        });
    }

    /// Whether any error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.snapshot().iter().any(Diagnostic::is_error)
    }

    /// Whether a finding with `code` was recorded.
    #[cfg(test)]
    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        self.snapshot().iter().any(|d| d.code == code)
    }

    /// Copy of all findings in report order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Consume the collector.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let sink = Diagnostics::new();
        sink.warning("OPT-IGNORED", Anchor::Method, "first");
        sink.error("PH-UNKNOWN", Anchor::Method, "second");
        let items = sink.into_vec();
        assert_eq!(items[0].code, "OPT-IGNORED");
        assert_eq!(items[1].code, "PH-UNKNOWN");
    }

    #[test]
    fn errors_are_detected() {
        let sink = Diagnostics::new();
        sink.info("NOTE", Anchor::Method, "fine");
        assert!(!sink.has_errors());
        sink.error("X", Anchor::Method, "bad");
        assert!(sink.has_errors());
        assert!(sink.has_code("X"));
    }

    #[test]
    fn template_anchor_is_rendered() {
        let d = Diagnostic {
            severity: Severity::Error,
            code:     "PH-UNKNOWN",
            message:  "unknown placeholder `colums`".into(),
            anchor:   Anchor::Template {
                offset: 7,
                text:   "{{colums}}".into()
            }
        };
        assert_eq!(
            d.to_string(),
            "[PH-UNKNOWN] unknown placeholder `colums` (template offset 7: `{{colums}}`)"
        );
    }

    #[test]
    fn collector_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Diagnostics>();
    }
}
