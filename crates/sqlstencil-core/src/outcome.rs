// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Result of a version-checked update.

/// Outcome of an UPDATE guarded by a concurrency token.
///
/// A stale token is a designed outcome, not an error: the statement ran and
/// matched no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The row matched and was updated.
    Applied {
        /// Affected row count.
        rows: u64
    },

    /// The version check matched no row.
    Conflicted
}

impl UpdateOutcome {
    /// Classify an affected-row count.
    #[must_use]
    pub const fn from_rows(rows: u64) -> Self {
        if rows == 0 {
            Self::Conflicted
        } else {
            Self::Applied {
                rows
            }
        }
    }

    /// Whether the update lost the race.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflicted)
    }

    /// Affected row count (zero for a conflict).
    #[must_use]
    pub const fn rows(&self) -> u64 {
        match self {
            Self::Applied {
                rows
            } => *rows,
            Self::Conflicted => 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rows_is_conflict() {
        let outcome = UpdateOutcome::from_rows(0);
        assert!(outcome.is_conflict());
        assert_eq!(outcome.rows(), 0);
    }

    #[test]
    fn positive_rows_is_applied() {
        assert_eq!(
            UpdateOutcome::from_rows(1),
            UpdateOutcome::Applied {
                rows: 1
            }
        );
    }
}
