// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generated code compiles against the facade crate.

#[test]
fn compile_pass() {
    let t = trybuild::TestCases::new();
    t.pass("tests/cases/pass/*.rs");
}
