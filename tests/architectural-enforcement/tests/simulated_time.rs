//! Integration Test: Simulated Time
//!
//! **Policy**: the core runs on its own clock. It MUST NOT sleep and MUST
//! NOT read the wall clock; surfaces pass time in through `advance_to`.
//!
//! **Exceptions**: frame rate limiting in the TUI event loop.

use architectural_enforcement::{find_violations, production_lines, rust_files};

const WALL_CLOCK: &[&str] = &[
    "Instant::now",
    "SystemTime::now",
    "Local::now",
    "Utc::now",
];

const SLEEP: &[&str] = &["::sleep(", ".sleep("];

#[test]
fn test_no_sleep_in_core() {
    let violations = find_violations("engine/core/src", SLEEP);
    report("Sleep calls found in the core", &violations);
}

#[test]
fn test_no_wall_clock_in_core() {
    let violations = find_violations("engine/core/src", WALL_CLOCK);
    report("Wall-clock reads found in the core", &violations);
}

/// The TUI may only sleep to limit frame rate or wait for the next tick
#[test]
fn test_tui_sleeps_only_in_frame_loop() {
    let mut violations = Vec::new();
    for path in rust_files("tui/src") {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let lines = production_lines(&content);
        for (i, (line_number, code)) in lines.iter().enumerate() {
            if !SLEEP.iter().any(|p| code.contains(p)) {
                continue;
            }
            if path.ends_with("tui/src/app.rs") && is_frame_limiting_context(&lines, i) {
                continue;
            }
            violations.push(format!("{}:{} - {}", path.display(), line_number, code.trim()));
        }
    }
    report("Sleep outside the TUI frame loop", &violations);
}

fn is_frame_limiting_context(lines: &[(usize, String)], current: usize) -> bool {
    let range = current.saturating_sub(25)..(current + 3).min(lines.len());
    lines[range].iter().any(|(_, code)| {
        let code = code.to_lowercase();
        code.contains("frame") || code.contains("select!")
    })
}

fn report(title: &str, violations: &[String]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    eprintln!("\n✅ Use the shell clock: advance_to / advance_by and scheduled timers");
    panic!("\nFound {} violation(s).", violations.len());
}
