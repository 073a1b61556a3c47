//! Integration Test: Panic-Free Core
//!
//! **Policy**: core production code propagates errors. `unwrap()` and
//! `expect()` belong in tests only. The core stays free of terminal crates.

use std::fs;

use architectural_enforcement::{find_violations, workspace_root};

#[test]
fn test_no_unwrap_in_core() {
    let violations = find_violations("engine/core/src", &[".unwrap()", ".expect("]);

    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        panic!(
            "\nFound {} unwrap/expect call(s) in core production code.\nReturn a Result instead.",
            violations.len()
        );
    }
}

#[test]
fn test_core_has_no_terminal_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("engine/core/Cargo.toml"))
        .unwrap_or_default();
    assert!(!manifest.is_empty(), "core manifest should be readable");

    for forbidden in ["ratatui", "crossterm"] {
        assert!(
            !manifest.contains(forbidden),
            "retrobot-core must not depend on {forbidden}"
        );
    }
}
