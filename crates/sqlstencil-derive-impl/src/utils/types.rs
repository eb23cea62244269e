// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Structural inspection of `syn::Type`.
//!
//! The compiler only ever looks at the *shape* of a type: the last path
//! segment and its first generic argument. Paths are never resolved, so
//! `Option<T>`, `std::option::Option<T>` and `core::option::Option<T>` are
//! treated alike.

use syn::{GenericArgument, PathArguments, PathSegment, Type};

/// Strip `&`, `&mut`, parentheses and invisible groups.
#[must_use]
pub fn strip_references(ty: &Type) -> &Type {
    match ty {
        Type::Reference(reference) => strip_references(&reference.elem),
        Type::Paren(paren) => strip_references(&paren.elem),
        Type::Group(group) => strip_references(&group.elem),
        other => other
    }
}

/// Whether the outermost layer is a reference.
#[must_use]
pub fn is_reference(ty: &Type) -> bool {
    match ty {
        Type::Reference(_) => true,
        Type::Paren(paren) => is_reference(&paren.elem),
        Type::Group(group) => is_reference(&group.elem),
        _ => false
    }
}

/// Last segment of a path type.
#[must_use]
pub fn last_segment(ty: &Type) -> Option<&PathSegment> {
    match strip_references(ty) {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        _ => None
    }
}

/// Identifier of the last path segment, as text.
#[must_use]
pub fn type_name(ty: &Type) -> Option<String> {
    last_segment(ty).map(|segment| segment.ident.to_string())
}

/// First generic type argument of the last segment.
#[must_use]
pub fn first_argument(ty: &Type) -> Option<&Type> {
    let segment = last_segment(ty)?;
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    arguments.args.iter().find_map(|argument| match argument {
        GenericArgument::Type(inner) => Some(inner),
        _ => None
    })
}

/// Inner type of `Option<T>`.
#[must_use]
pub fn option_inner(ty: &Type) -> Option<&Type> {
    match type_name(ty).as_deref() {
        Some("Option") => first_argument(ty),
        _ => None
    }
}

/// Element type of `Vec<T>`, `[T]` or `&[T]`.
#[must_use]
pub fn sequence_element(ty: &Type) -> Option<&Type> {
    match strip_references(ty) {
        Type::Slice(slice) => Some(&slice.elem),
        Type::Array(array) => Some(&array.elem),
        other => match type_name(other).as_deref() {
            Some("Vec") => first_argument(other),
            _ => None
        }
    }
}

/// Whether the type is `()`.
#[must_use]
pub fn is_unit(ty: &Type) -> bool {
    matches!(strip_references(ty), Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// Whether the type names one of `names` in its last segment.
#[must_use]
pub fn is_named(ty: &Type, names: &[&str]) -> bool {
    type_name(ty).is_some_and(|name| names.contains(&name.as_str()))
}
