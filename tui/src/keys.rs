//! Key Bindings
//!
//! Turns crossterm key events into shell events. Every key press is also
//! reported to the shell as a browser-style key code (`ArrowUp`, `KeyB`) so
//! easter-egg sequences work; the shell ignores those codes while the input
//! line has focus.
//!
//! | Key | Action |
//! |-----|--------|
//! | `Tab` | focus / leave the input line |
//! | `Enter` | submit the input line to the current tab |
//! | `F1`-`F4` | chat, calendar, todo, music |
//! | `F5`-`F8` | help, time, joke, mood quick actions |
//! | `F9` / `F10` | minimize / power off and on |
//! | `1`-`9` | toggle a task or play a track |
//! | `Space`, `Ctrl+N`, `Ctrl+P` | play/pause, next, previous |
//! | `+` / `-` | volume |
//! | `<` / `>` | previous / next month |
//! | `Ctrl+E` / `Ctrl+O` | export / import the current tab's data file |
//! | `Esc`, `Ctrl+C` | quit |

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use retrobot_core::{
    CalendarCommand, MusicCommand, QuickAction, ShellEvent, TodoCommand, Tool,
};

/// Volume change per `+`/`-` press
pub const VOLUME_STEP: i16 = 10;

/// What a key press asks the app to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Leave the app
    Quit,
    /// Move focus into or out of the input line
    ToggleFocus,
    /// Submit the input line
    Submit,
    /// Type a character
    Edit(char),
    /// Delete the last character
    Backspace,
    /// Send this event as is
    Shell(ShellEvent),
    /// Act on the nth item of the current tab (1-based)
    Pick(usize),
    /// Nudge the volume
    Volume(i16),
    /// Power the window off or on
    ToggleVisible,
    /// Ask for the current tab's data
    Export,
    /// Load the current tab's data file
    Import,
    /// Nothing bound
    None,
}

/// Browser-style code for `code`, as the sequence matcher expects
#[must_use]
pub fn key_code(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) if c.is_ascii_alphabetic() => format!("Key{}", c.to_ascii_uppercase()),
        KeyCode::Char(c) if c.is_ascii_digit() => format!("Digit{c}"),
        _ => return None,
    };
    Some(name)
}

/// Map a key press given whether the input line has focus
#[must_use]
pub fn map_key(key: KeyEvent, typing: bool) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Tab => return KeyAction::ToggleFocus,
        KeyCode::F(n) => return function_key(n),
        _ => {}
    }

    if typing {
        return match key.code {
            KeyCode::Enter => KeyAction::Submit,
            KeyCode::Backspace => KeyAction::Backspace,
            KeyCode::Char(c) if !ctrl => KeyAction::Edit(c),
            _ => KeyAction::None,
        };
    }

    match key.code {
        KeyCode::Char('n') if ctrl => KeyAction::Shell(ShellEvent::Music(MusicCommand::Next)),
        KeyCode::Char('p') if ctrl => KeyAction::Shell(ShellEvent::Music(MusicCommand::Prev)),
        KeyCode::Char('s') if ctrl => KeyAction::Shell(ShellEvent::Music(MusicCommand::Shuffle)),
        KeyCode::Char('r') if ctrl => {
            KeyAction::Shell(ShellEvent::Music(MusicCommand::Recommend))
        }
        KeyCode::Char('x') if ctrl => {
            KeyAction::Shell(ShellEvent::Todo(TodoCommand::ClearCompleted))
        }
        KeyCode::Char('e') if ctrl => KeyAction::Export,
        KeyCode::Char('o') if ctrl => KeyAction::Import,
        KeyCode::Char(' ') => KeyAction::Shell(ShellEvent::Music(MusicCommand::TogglePlay)),
        KeyCode::Char('+' | '=') => KeyAction::Volume(VOLUME_STEP),
        KeyCode::Char('-') => KeyAction::Volume(-VOLUME_STEP),
        KeyCode::Char('<') => KeyAction::Shell(ShellEvent::Calendar(CalendarCommand::PrevMonth)),
        KeyCode::Char('>') => KeyAction::Shell(ShellEvent::Calendar(CalendarCommand::NextMonth)),
        KeyCode::Char(c @ '1'..='9') => KeyAction::Pick(c as usize - '0' as usize),
        _ => KeyAction::None,
    }
}

fn function_key(n: u8) -> KeyAction {
    let tool = |tool| KeyAction::Shell(ShellEvent::SwitchTool { tool });
    let quick = |action| KeyAction::Shell(ShellEvent::QuickAction { action });
    match n {
        1 => tool(Tool::Chat),
        2 => tool(Tool::Calendar),
        3 => tool(Tool::Todo),
        4 => tool(Tool::Music),
        5 => quick(QuickAction::Help),
        6 => quick(QuickAction::Time),
        7 => quick(QuickAction::Joke),
        8 => quick(QuickAction::Mood),
        9 => KeyAction::Shell(ShellEvent::ToggleMinimize),
        10 => KeyAction::ToggleVisible,
        _ => KeyAction::None,
    }
}

/// The event a submitted input line becomes on `tool`'s tab
///
/// Returns `None` for a blank line.
#[must_use]
pub fn submit_event(tool: Tool, text: &str) -> Option<ShellEvent> {
    if text.trim().is_empty() {
        return None;
    }
    let text = text.to_string();
    Some(match tool {
        Tool::Chat | Tool::Music => ShellEvent::UserMessage { content: text },
        Tool::Todo => ShellEvent::Todo(TodoCommand::AddSmart { text }),
        Tool::Calendar => ShellEvent::Calendar(CalendarCommand::QuickAdd { text }),
    })
}
