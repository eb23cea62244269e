// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Member and struct names to SQL identifiers.
//!
//! Column and table names depend on the dialect's case rule, which is why
//! entity descriptors are built per dialect.

use convert_case::{Case, Casing};
use sqlstencil_core::dialect::NameCase;

/// Apply `case` to a Rust identifier.
///
/// ```text
/// OrderId   snake → order_id   pascal → OrderId   upper → ORDER_ID
/// order_id  snake → order_id   pascal → OrderId   upper → ORDER_ID
/// ```
#[must_use]
pub fn apply(name: &str, case: NameCase) -> String {
    match case {
        NameCase::Snake => name.to_case(Case::Snake),
        NameCase::Pascal => name.to_case(Case::Pascal),
        NameCase::UpperSnake => name.to_case(Case::Snake).to_ascii_uppercase()
    }
}

/// Name of the generated `Column` constant for a member.
#[must_use]
pub fn column_const(member: &str) -> String {
    member.to_case(Case::Snake).to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake() {
        assert_eq!(apply("OrderId", NameCase::Snake), "order_id");
        assert_eq!(apply("order_id", NameCase::Snake), "order_id");
    }

    #[test]
    fn pascal() {
        assert_eq!(apply("order_id", NameCase::Pascal), "OrderId");
        assert_eq!(apply("User", NameCase::Pascal), "User");
    }

    #[test]
    fn upper_snake() {
        assert_eq!(apply("orderId", NameCase::UpperSnake), "ORDER_ID");
        assert_eq!(apply("is_deleted", NameCase::UpperSnake), "IS_DELETED");
    }

    #[test]
    fn constants() {
        assert_eq!(column_const("is_deleted"), "IS_DELETED");
        assert_eq!(column_const("id"), "ID");
    }
}
