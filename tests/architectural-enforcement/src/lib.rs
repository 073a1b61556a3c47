//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The core never sleeps or reads the wall clock; time is simulated
//! - The core never panics on `unwrap()`/`expect()` outside tests
//! - The core has no terminal dependencies
//!
//! The helpers here scan source text. Comments and the trailing
//! `#[cfg(test)]` module of each file are not production code.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .to_path_buf()
}

/// All `.rs` files under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// `(line number, code)` for every production line of `content`
///
/// Line comments are stripped and scanning stops at the first top-level
/// `#[cfg(test)]`.
#[must_use]
pub fn production_lines(content: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.starts_with("#[cfg(test)]") {
            break;
        }
        let code = line.split("//").next().unwrap_or(line);
        if !code.trim().is_empty() {
            out.push((idx + 1, code.to_string()));
        }
    }
    out
}

/// Production lines in `dir` containing any of `patterns`
///
/// Each violation reads `path:line - code`.
#[must_use]
pub fn find_violations(dir: &str, patterns: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for path in rust_files(dir) {
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        for (line_number, code) in production_lines(&content) {
            if patterns.iter().any(|p| code.contains(p)) {
                violations.push(format!(
                    "{}:{} - {}",
                    path.display(),
                    line_number,
                    code.trim()
                ));
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_and_tests_are_skipped() {
        let source = "fn a() {\n    // x.unwrap()\n    let y = 1; // y.unwrap()\n}\n#[cfg(test)]\nmod tests { fn t() { z.unwrap(); } }\n";
        let lines = production_lines(source);

        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|(_, code)| !code.contains("unwrap")));
    }

    #[test]
    fn test_core_sources_are_found() {
        let files = rust_files("engine/core/src");
        assert!(files.iter().any(|p| p.ends_with("shell.rs")));
    }
}
