//! Shell Events
//!
//! Everything a surface can tell the shell. Surfaces report what the user
//! did; they never decide what it means. The shell answers with
//! [`crate::messages::ShellMessage`]s.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tools::Tool;

/// Events from a surface to the shell
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShellEvent {
    // ============================================
    // Conversation
    // ============================================
    /// The user submitted a chat line
    UserMessage {
        /// What they typed
        content: String,
    },

    /// A quick-action button was pressed
    QuickAction {
        /// Which one
        action: QuickAction,
    },

    // ============================================
    // Keyboard
    // ============================================
    /// A key went down outside of any text box handling
    ///
    /// `code` is a physical key code such as `ArrowUp` or `KeyB`.
    KeyPressed {
        /// Key code
        code: String,
    },

    /// The text input gained or lost focus
    InputFocus {
        /// Whether the user is typing into the input
        focused: bool,
    },

    // ============================================
    // Window
    // ============================================
    /// Show the window
    Show,

    /// Power the window off
    Hide,

    /// Toggle the minimized state
    ToggleMinimize,

    /// The host window gained focus
    WindowFocused,

    /// The host window lost focus
    WindowBlurred,

    // ============================================
    // Commands
    // ============================================
    /// A tool tab was clicked
    SwitchTool {
        /// Target tool
        tool: Tool,
    },

    /// Set the mood by name
    SetMood {
        /// Mood name (validated by the shell)
        mood: String,
    },

    /// Apply a theme by name
    ApplyTheme {
        /// Theme name (validated by the shell)
        theme: String,
    },

    /// Todo panel action
    Todo(TodoCommand),

    /// Calendar panel action
    Calendar(CalendarCommand),

    /// Music panel action
    Music(MusicCommand),

    /// The surface is closing
    Quit,
}

impl ShellEvent {
    /// Export command for a tool tab; chat has nothing to export
    #[must_use]
    pub fn export(tool: Tool) -> Option<Self> {
        match tool {
            Tool::Todo => Some(Self::Todo(TodoCommand::Export)),
            Tool::Calendar => Some(Self::Calendar(CalendarCommand::Export)),
            Tool::Music => Some(Self::Music(MusicCommand::Export)),
            Tool::Chat => None,
        }
    }

    /// Import command for a tool tab
    #[must_use]
    pub fn import(tool: Tool, data: String) -> Option<Self> {
        match tool {
            Tool::Todo => Some(Self::Todo(TodoCommand::Import { data })),
            Tool::Calendar => Some(Self::Calendar(CalendarCommand::Import { data })),
            Tool::Music => Some(Self::Music(MusicCommand::Import { data })),
            Tool::Chat => None,
        }
    }
}

/// Quick-action buttons under the dialogue box
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickAction {
    /// What can you do?
    Help,
    /// What time is it?
    Time,
    /// Tell a joke
    Joke,
    /// How are you feeling?
    Mood,
}

impl QuickAction {
    /// Every button, in display order
    pub const ALL: [QuickAction; 4] = [Self::Help, Self::Time, Self::Joke, Self::Mood];

    /// Button caption
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Help => "Help",
            Self::Time => "Time",
            Self::Joke => "Joke",
            Self::Mood => "Mood",
        }
    }
}

/// Todo panel actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoCommand {
    /// Add a task, `!`/`!!!`/"urgent" marking priority
    Add {
        /// Task text
        text: String,
    },
    /// Add a task from a free sentence, priority read from keywords
    AddSmart {
        /// Sentence
        text: String,
    },
    /// Check or uncheck a task
    Toggle {
        /// Task id
        id: u32,
    },
    /// Delete a task
    Remove {
        /// Task id
        id: u32,
    },
    /// Delete every completed task
    ClearCompleted,
    /// Ask for the list as JSON
    Export,
    /// Merge tasks from an earlier export
    Import {
        /// Export JSON
        data: String,
    },
}

/// Calendar panel actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarCommand {
    /// Click a day
    Select {
        /// Day
        date: NaiveDate,
    },
    /// Add an event to the selected day (or today)
    Add {
        /// Event text
        text: String,
    },
    /// Add from a phrase like "tomorrow dentist"
    QuickAdd {
        /// Phrase
        text: String,
    },
    /// Delete one event
    Remove {
        /// Day
        date: NaiveDate,
        /// Position within the day
        index: usize,
    },
    /// Show the previous month
    PrevMonth,
    /// Show the next month
    NextMonth,
    /// Ask for every event as JSON
    Export,
    /// Merge events from an earlier export
    Import {
        /// Export JSON
        data: String,
    },
}

/// Music panel actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicCommand {
    /// Pick a track
    Select {
        /// Track id
        id: String,
    },
    /// Play or pause
    TogglePlay,
    /// Skip forward
    Next,
    /// Skip back
    Prev,
    /// Move the volume slider
    SetVolume {
        /// 0..=100
        volume: u8,
    },
    /// Shuffle the playlist
    Shuffle,
    /// Add a custom track
    AddTrack {
        /// Title
        title: String,
        /// Artist
        artist: String,
    },
    /// Remove a track
    RemoveTrack {
        /// Track id
        id: String,
    },
    /// Ask for a track that suits the mood
    Recommend,
    /// Ask for the playlist as JSON
    Export,
    /// Append tracks from an earlier export
    Import {
        /// Export JSON
        data: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = ShellEvent::KeyPressed {
            code: "ArrowUp".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"KeyPressed":{"code":"ArrowUp"}}"#);

        let back: ShellEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_export_and_import_per_tab() {
        assert_eq!(
            ShellEvent::export(Tool::Music),
            Some(ShellEvent::Music(MusicCommand::Export))
        );
        assert_eq!(ShellEvent::export(Tool::Chat), None);
        assert_eq!(
            ShellEvent::import(Tool::Todo, "{}".into()),
            Some(ShellEvent::Todo(TodoCommand::Import { data: "{}".into() }))
        );

        let json = serde_json::to_string(&ShellEvent::Calendar(CalendarCommand::Export)).unwrap();
        assert_eq!(json, r#"{"Calendar":"Export"}"#);
    }

    #[test]
    fn test_tool_command_from_json() {
        let event: ShellEvent =
            serde_json::from_str(r#"{"Calendar":{"Select":{"date":"2024-12-25"}}}"#).unwrap();
        assert_eq!(
            event,
            ShellEvent::Calendar(CalendarCommand::Select {
                date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()
            })
        );
    }
}
