//! Tool Panels
//!
//! RetroBot's window has four tabs: chat plus three small tools. The tools
//! are plain state machines. They never speak or animate themselves; they
//! return outcomes and the shell turns those into lines, sounds and
//! celebrations.
//!
//! - [`todo`]: prioritised task list with milestones
//! - [`calendar`]: events by date with natural-language quick add
//! - [`music`]: simulated player over a small retro playlist
//!
//! Each tool exports its data as pretty JSON stamped with [`EXPORT_VERSION`]
//! and merges imports in the same shape. Imports are all or nothing.

pub mod calendar;
pub mod music;
pub mod todo;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use calendar::Calendar;
pub use music::{MusicPlayer, Track};
pub use todo::{Priority, TodoItem, TodoList};

/// Errors shared by the tools
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    /// Blank input where text was required
    #[error("Input is empty")]
    EmptyInput,

    /// Referenced item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Play pressed with nothing selected
    #[error("No track selected")]
    NoTrackSelected,

    /// Tab name is not a tool
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Import data is not JSON or has the wrong shape
    #[error("Invalid import data: {0}")]
    InvalidImport(String),

    /// Export could not be serialized
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

/// Format version written into every export
pub const EXPORT_VERSION: &str = "1.0";

fn invalid_import(e: impl fmt::Display) -> ToolError {
    ToolError::InvalidImport(e.to_string())
}

fn export_failed(e: impl fmt::Display) -> ToolError {
    ToolError::ExportFailed(e.to_string())
}

/// Window tabs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Free conversation
    #[default]
    Chat,
    /// Calendar
    Calendar,
    /// Todo list
    Todo,
    /// Music player
    Music,
}

impl Tool {
    /// Tabs in display order
    pub const ALL: [Tool; 4] = [Self::Chat, Self::Calendar, Self::Todo, Self::Music];

    /// Lowercase name
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Calendar => "calendar",
            Self::Todo => "todo",
            Self::Music => "music",
        }
    }

    /// Tab icon
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Chat => "💬",
            Self::Calendar => "📅",
            Self::Todo => "✅",
            Self::Music => "🎵",
        }
    }

    /// What RetroBot says when the tab opens
    #[must_use]
    pub fn greeting(self) -> &'static str {
        match self {
            Self::Chat => "Let's chat! Type anything you want to talk about! 💬",
            Self::Calendar => "Calendar ready! Click dates to add events! 📅",
            Self::Todo => "Todo list loaded! What needs to get done? ✅",
            Self::Music => "Music player active! Let's get this party started! 🎵",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tool {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.label() == wanted)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}
