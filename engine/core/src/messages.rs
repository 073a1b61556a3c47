//! Shell Messages
//!
//! Everything the shell tells a surface. Surfaces render these and keep no
//! logic of their own: what to say, when a notification goes away, which
//! theme is showing, all of it arrives here.
//!
//! Each message is stamped with the simulated time it was produced, so a
//! surface (or a test) can replay the exact timeline.

use serde::{Deserialize, Serialize};

use crate::animation::{IdleMicro, SpecialEffect};
use crate::mood::{Mood, MoodEffect};
use crate::theme::Theme;
use crate::tools::Tool;

/// Notification handle, unique per shell
pub type NotificationId = u64;

/// Messages from the shell to a surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShellMessage {
    // ============================================
    // Speech and notifications
    // ============================================
    /// RetroBot says something
    Speak {
        /// The line
        text: String,
        /// Mood at the moment it was said
        mood: Mood,
    },

    /// A transient banner
    Notify {
        /// Handle used by the matching expiry
        id: NotificationId,
        /// Banner text
        text: String,
        /// How long it stays up
        lifetime_ms: u64,
    },

    /// A banner's time is up
    NotificationExpired {
        /// Handle from [`ShellMessage::Notify`]
        id: NotificationId,
    },

    // ============================================
    // Character state
    // ============================================
    /// Mood or level changed
    Mood {
        /// Current mood
        mood: Mood,
        /// Current level, 0..=100
        level: u8,
    },

    /// A mood transition finished; play its secondary effects
    MoodEffects {
        /// Mood the effects belong to
        mood: Mood,
        /// Effects, in play order
        effects: Vec<MoodEffect>,
    },

    /// The idle loop fidgeted
    Idle {
        /// Which fidget
        micro: IdleMicro,
    },

    /// An animation put its tag on or took it off
    Animation {
        /// Animation name
        name: String,
        /// Whether it started or finished
        phase: AnimationPhase,
    },

    /// A whole-window easter-egg effect
    Effect {
        /// Which effect
        effect: SpecialEffect,
        /// How long it plays
        duration_ms: u64,
    },

    // ============================================
    // Window
    // ============================================
    /// The visible tab changed
    ToolSwitched {
        /// New tab
        tool: Tool,
    },

    /// The window colours changed
    ThemeApplied {
        /// Theme now showing
        theme: Theme,
        /// `true` for temporary easter-egg and holiday themes
        preview: bool,
    },

    /// A theme became available
    ThemeUnlocked {
        /// Newly unlocked theme
        theme: Theme,
    },

    /// Visibility or minimized state changed
    Window {
        /// Window on screen
        visible: bool,
        /// Window collapsed to its titlebar
        minimized: bool,
    },

    // ============================================
    // Tool data
    // ============================================
    /// A tool's data, answering an export command
    Exported {
        /// Tool the data belongs to
        tool: Tool,
        /// Pretty JSON, accepted back by the matching import command
        data: String,
    },

    // ============================================
    // System
    // ============================================
    /// A command was rejected
    Error {
        /// What went wrong
        message: String,
    },

    /// The surface should close
    Quit,
}

/// Animation lifecycle point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationPhase {
    /// Tag applied
    Started,
    /// Tag removed
    Finished,
}

/// A message with the simulated time it was produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampedMessage {
    /// Shell time in milliseconds
    pub at_ms: u64,
    /// The message
    pub message: ShellMessage,
}

impl StampedMessage {
    /// Spoken text, if this is speech
    #[must_use]
    pub fn speech(&self) -> Option<&str> {
        match &self.message {
            ShellMessage::Speak { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Banner text, if this is a notification
    #[must_use]
    pub fn notification(&self) -> Option<&str> {
        match &self.message {
            ShellMessage::Notify { text, .. } => Some(text),
            _ => None,
        }
    }
}
