// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Execution hooks.
//!
//! With the `hooks` feature enabled, generated repositories carry an optional
//! `Arc<dyn ExecutionHooks>` and call it around every command:
//!
//! ```text
//! before_execute ──► execute ──┬──► after_execute(rows)
//!                              └──► on_failure(error)
//! ```
//!
//! Hooks observe; they cannot alter or veto the statement. All methods have
//! default no-op implementations.
//!
//! # Usage
//!
//! ```rust,ignore
//! let repo = UserRepoImpl::new(conn).with_hooks(Arc::new(TracingHooks));
//! ```

use crate::Error;

/// What a hook sees about the command being executed.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// Generated repository type name.
    pub repository: &'static str,

    /// Trait method name.
    pub method: &'static str,

    /// Final statement text.
    pub sql: &'a str,

    /// Number of bound parameters.
    pub parameters: usize
}

/// Observer called around every generated command.
pub trait ExecutionHooks: Send + Sync {
    /// Called after binding, before execution.
    fn before_execute(&self, context: &ExecutionContext<'_>) {
        let _ = context;
    }

    /// Called after successful execution. `rows` is the affected row count
    /// for non-queries and `None` for readers and scalars.
    fn after_execute(&self, context: &ExecutionContext<'_>, rows: Option<u64>) {
        let _ = (context, rows);
    }

    /// Called when execution failed.
    fn on_failure(&self, context: &ExecutionContext<'_>, error: &Error) {
        let _ = (context, error);
    }
}

/// Hooks that emit `tracing` events.
///
/// Statements are recorded at `debug`, failures at `warn`. Parameter values
/// are never recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHooks;

impl ExecutionHooks for TracingHooks {
    fn before_execute(&self, context: &ExecutionContext<'_>) {
        tracing::debug!(
            repository = context.repository,
            method = context.method,
            parameters = context.parameters,
            sql = context.sql,
            "executing statement"
        );
    }

    fn after_execute(&self, context: &ExecutionContext<'_>, rows: Option<u64>) {
        tracing::debug!(
            repository = context.repository,
            method = context.method,
            rows = ?rows,
            "statement completed"
        );
    }

    fn on_failure(&self, context: &ExecutionContext<'_>, error: &Error) {
        tracing::warn!(
            repository = context.repository,
            method = context.method,
            error = %error,
            "statement failed"
        );
    }
}
