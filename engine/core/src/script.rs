//! Headless Scripts
//!
//! A line-oriented format for driving a [`crate::Shell`] without a terminal:
//!
//! ```text
//! # comments and blank lines are skipped
//! wait 500
//! say hello there
//! key ArrowUp ArrowUp ArrowDown
//! mood sleepy
//! tool music
//! theme amber
//! quick joke
//! todo add buy milk !
//! todo toggle 1
//! export todo
//! show
//! json {"Music":"TogglePlay"}
//! ```
//!
//! `json` accepts any [`ShellEvent`] in its serialized form, so every event a
//! surface can send is reachable from a script.

use thiserror::Error;

use crate::events::{QuickAction, ShellEvent, TodoCommand};
use crate::tools::Tool;

/// Script parse failures
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The first word is not a command
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand {
        /// 1-based line number
        line: usize,
        /// Offending word
        command: String,
    },

    /// The command is known but its argument is not
    #[error("line {line}: {reason}")]
    BadArgument {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },
}

/// One step of a script
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptStep {
    /// Send an event
    Event(ShellEvent),
    /// Advance the clock
    Wait(u64),
}

/// Parse a whole script
///
/// # Errors
///
/// Stops at the first line that does not parse.
pub fn parse_script(source: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        steps.extend(parse_line(raw, index + 1)?);
    }
    Ok(steps)
}

/// Parse one line; a line may expand to several steps (`key A B C`)
///
/// # Errors
///
/// [`ScriptError`] naming `line`.
pub fn parse_line(raw: &str, line: usize) -> Result<Vec<ScriptStep>, ScriptError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(Vec::new());
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };
    let bad = |reason: String| ScriptError::BadArgument { line, reason };
    let event = |e: ShellEvent| -> Result<Vec<ScriptStep>, ScriptError> {
        Ok(vec![ScriptStep::Event(e)])
    };

    match command {
        "wait" => rest
            .parse()
            .map(|ms| vec![ScriptStep::Wait(ms)])
            .map_err(|_| bad(format!("'{rest}' is not a duration in ms"))),
        "say" => event(ShellEvent::UserMessage {
            content: rest.to_string(),
        }),
        "key" => {
            if rest.is_empty() {
                return Err(bad("key needs at least one key code".into()));
            }
            Ok(rest
                .split_whitespace()
                .map(|code| {
                    ScriptStep::Event(ShellEvent::KeyPressed {
                        code: code.to_string(),
                    })
                })
                .collect())
        }
        "mood" => event(ShellEvent::SetMood {
            mood: rest.to_string(),
        }),
        "theme" => event(ShellEvent::ApplyTheme {
            theme: rest.to_string(),
        }),
        "tool" => {
            let tool: Tool = rest.parse().map_err(|e| bad(format!("{e}")))?;
            event(ShellEvent::SwitchTool { tool })
        }
        "quick" => {
            let action = QuickAction::ALL
                .into_iter()
                .find(|a| a.label().eq_ignore_ascii_case(rest))
                .ok_or_else(|| bad(format!("unknown quick action '{rest}'")))?;
            event(ShellEvent::QuickAction { action })
        }
        "todo" => parse_todo(rest, line).map(|cmd| vec![ScriptStep::Event(ShellEvent::Todo(cmd))]),
        "export" => {
            let tool: Tool = rest.parse().map_err(|e| bad(format!("{e}")))?;
            let export = ShellEvent::export(tool)
                .ok_or_else(|| bad(format!("{tool} has nothing to export")))?;
            event(export)
        }
        "focus" => event(ShellEvent::InputFocus {
            focused: rest != "off",
        }),
        "show" => event(ShellEvent::Show),
        "hide" => event(ShellEvent::Hide),
        "minimize" => event(ShellEvent::ToggleMinimize),
        "quit" => event(ShellEvent::Quit),
        "json" => serde_json::from_str(rest)
            .map(|e| vec![ScriptStep::Event(e)])
            .map_err(|e| bad(format!("bad event JSON: {e}"))),
        other => Err(ScriptError::UnknownCommand {
            line,
            command: other.to_string(),
        }),
    }
}

fn parse_todo(rest: &str, line: usize) -> Result<TodoCommand, ScriptError> {
    let bad = |reason: String| ScriptError::BadArgument { line, reason };
    let (verb, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    let id = || {
        arg.trim()
            .parse::<u32>()
            .map_err(|_| bad(format!("'{arg}' is not a task id")))
    };

    match verb {
        "add" => Ok(TodoCommand::Add {
            text: arg.to_string(),
        }),
        "smart" => Ok(TodoCommand::AddSmart {
            text: arg.to_string(),
        }),
        "toggle" => Ok(TodoCommand::Toggle { id: id()? }),
        "remove" => Ok(TodoCommand::Remove { id: id()? }),
        "clear" => Ok(TodoCommand::ClearCompleted),
        other => Err(bad(format!("unknown todo action '{other}'"))),
    }
}
