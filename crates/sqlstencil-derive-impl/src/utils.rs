// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Shared helpers for the compiler stages.
//!
//! # Submodules
//!
//! - [`types`]: structural inspection of `syn::Type`

pub mod types;
