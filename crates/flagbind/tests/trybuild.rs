//! Compile-time tests for the `Schema` derive macro.
//!
//! These tests verify that valid derive usage compiles successfully.
//!
//! Run with: cargo nextest run --package flagbind trybuild

#[test]
fn compile_pass() {
    let t = trybuild::TestCases::new();
    t.pass("tests/compile_pass/basic.rs");
    t.pass("tests/compile_pass/attributes.rs");
    t.pass("tests/compile_pass/nested.rs");
    t.pass("tests/compile_pass/generics.rs");
    t.pass("tests/compile_pass/wrappers.rs");
}
