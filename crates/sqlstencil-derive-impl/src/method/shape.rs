// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Parameter and return type classification.
//!
//! | Declared type | [`TypeShape`] |
//! |---------------|---------------|
//! | `E`, `&E` | `Entity` |
//! | `Vec<E>`, `&[E]` | `Entities` |
//! | `Predicate<E>` | `Predicate` |
//! | `Sort<E>` | `Sort` |
//! | `Pagination` | `Pagination` |
//! | `CancellationToken` | `Cancellation` |
//! | `String`, `&str` | `Text` |
//! | `bool` | `Bool` |
//! | `Vec<T>`, `&[T]` | `List` |
//! | `Option<T>` | `Optional(shape of T)` |
//! | anything else | `Scalar` |
//!
//! Return types must be `Result<T, E>`; `T` is classified into
//! [`ReturnShape`].

use syn::{Ident, ReturnType, Type};

use crate::utils::types::{
    first_argument, is_named, is_unit, option_inner, sequence_element, strip_references, type_name
};

/// Structural class of a parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// The repository entity.
    Entity,

    /// A sequence of entities.
    Entities,

    /// `Predicate<E>`.
    Predicate,

    /// `Sort<E>`.
    Sort,

    /// `Pagination`.
    Pagination,

    /// `CancellationToken`.
    Cancellation,

    /// Text.
    Text,

    /// `bool`.
    Bool,

    /// A sequence of values.
    List,

    /// `Option<T>`.
    Optional(Box<TypeShape>),

    /// Any other bindable value.
    Scalar
}

impl TypeShape {
    /// Classify `ty` relative to the repository entity.
    #[must_use]
    pub fn classify(ty: &Type, entity: &Ident) -> Self {
        if let Some(inner) = option_inner(ty) {
            return Self::Optional(Box::new(Self::classify(inner, entity)));
        }
        if let Some(element) = sequence_element(ty) {
            if is_entity(element, entity) {
                return Self::Entities;
            }
            if is_named(element, &["u8"]) {
                return Self::Scalar;
            }
            return Self::List;
        }
        if matches!(strip_references(ty), Type::Path(_)) && is_entity(ty, entity) {
            return Self::Entity;
        }
        match type_name(ty).as_deref() {
            Some("Predicate") => Self::Predicate,
            Some("Sort") => Self::Sort,
            Some("Pagination") => Self::Pagination,
            Some("CancellationToken") => Self::Cancellation,
            Some("String" | "str") => Self::Text,
            Some("bool") => Self::Bool,
            _ => Self::Scalar
        }
    }

    /// Whether the value binds directly as one parameter.
    #[must_use]
    pub fn is_bindable(&self) -> bool {
        match self {
            Self::Text | Self::Bool | Self::Scalar => true,
            Self::Optional(inner) => inner.is_bindable(),
            _ => false
        }
    }

    /// Short description for diagnostics.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Entity => "the entity",
            Self::Entities => "a sequence of entities",
            Self::Predicate => "a predicate",
            Self::Sort => "a sort",
            Self::Pagination => "a pagination request",
            Self::Cancellation => "a cancellation token",
            Self::Text => "text",
            Self::Bool => "a boolean",
            Self::List => "a sequence of values",
            Self::Optional(_) => "an optional value",
            Self::Scalar => "a value"
        }
    }
}

fn is_entity(ty: &Type, entity: &Ident) -> bool {
    type_name(ty).is_some_and(|name| *entity == name)
}

/// Structural class of the `Ok` type of a method's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    /// `()`.
    Unit,

    /// An integer: affected rows for DML, a scalar otherwise.
    Integer(Type),

    /// `Option<E>`.
    Single,

    /// `Vec<E>`.
    List,

    /// `Page<E>`.
    Page,

    /// `Rows`.
    Rows,

    /// `UpdateOutcome`.
    Outcome,

    /// Any other decodable value.
    Scalar(Type)
}

const INTEGERS: &[&str] = &["u64", "usize", "i64", "u32", "i32"];

impl ReturnShape {
    /// Classify a method's return type.
    ///
    /// # Errors
    ///
    /// Returns a message when the type is not `Result<T, E>`.
    pub fn classify(output: &ReturnType, entity: &Ident) -> Result<Self, String> {
        let ReturnType::Type(_, ty) = output else {
            return Err("generated methods must return `Result<T, E>`".to_string());
        };
        if type_name(ty).as_deref() != Some("Result") {
            return Err("generated methods must return `Result<T, E>`".to_string());
        }
        let Some(ok) = first_argument(ty) else {
            return Err("`Result` must name its success type".to_string());
        };
        Ok(Self::classify_ok(ok, entity))
    }

    fn classify_ok(ok: &Type, entity: &Ident) -> Self {
        if is_unit(ok) {
            return Self::Unit;
        }
        if let Some(inner) = option_inner(ok)
            && is_entity(inner, entity)
        {
            return Self::Single;
        }
        if let Some(element) = sequence_element(ok)
            && is_entity(element, entity)
        {
            return Self::List;
        }
        match type_name(ok).as_deref() {
            Some("Page") if first_argument(ok).is_some_and(|arg| is_entity(arg, entity)) => {
                Self::Page
            }
            Some("Rows") => Self::Rows,
            Some("UpdateOutcome") => Self::Outcome,
            Some(name) if INTEGERS.contains(&name) => Self::Integer(ok.clone()),
            _ => Self::Scalar(ok.clone())
        }
    }
}
