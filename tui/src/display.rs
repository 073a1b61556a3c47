//! Display State
//!
//! What the terminal currently shows, derived from [`StampedMessage`]s.
//!
//! # Design Philosophy
//!
//! The TUI is a thin client: it renders what the shell tells it to. Display
//! state is the bridge between shell messages and rendering. It never decides
//! anything; a notification disappears when the shell says it expired, an
//! effect stops when its announced duration has passed.

use std::collections::{BTreeSet, VecDeque};

use retrobot_core::animation::{IdleMicro, SpecialEffect};
use retrobot_core::messages::{AnimationPhase, NotificationId};
use retrobot_core::mood::MoodEffect;
use retrobot_core::{Mood, ShellMessage, StampedMessage, Theme, Tool};

/// Lines of conversation kept for scrollback
pub const MAX_LINES: usize = 200;

/// A rendered conversation line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayLine {
    /// Who said it
    pub role: DisplayRole,
    /// What was said
    pub text: String,
}

/// Display role for lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRole {
    /// Typed by the user
    User,
    /// Said by RetroBot
    Bot,
    /// Rejected command
    Error,
}

impl DisplayRole {
    /// Prefix shown before the text
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::User => "You: ",
            Self::Bot => "RetroBot: ",
            Self::Error => "! ",
        }
    }
}

/// Something on screen until a shell-time deadline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timed<T> {
    /// What is showing
    pub value: T,
    /// Shell time it goes away
    pub until_ms: u64,
}

/// Everything the renderer needs
#[derive(Clone, Debug)]
pub struct DisplayState {
    /// Conversation, oldest first
    pub lines: VecDeque<DisplayLine>,
    /// Banners in arrival order
    pub notifications: Vec<(NotificationId, String)>,
    /// Current mood
    pub mood: Mood,
    /// Mood level, 0..=100
    pub level: u8,
    /// Theme showing
    pub theme: Theme,
    /// Whether the theme is a temporary preview
    pub preview: bool,
    /// Visible tab
    pub tool: Tool,
    /// Window on screen
    pub visible: bool,
    /// Window collapsed to its titlebar
    pub minimized: bool,
    /// Animations whose tags are applied
    pub active: BTreeSet<String>,
    /// Current idle fidget
    pub idle: Option<Timed<IdleMicro>>,
    /// Current whole-window effect
    pub effect: Option<Timed<SpecialEffect>>,
    /// Secondary mood effects playing
    pub mood_effects: Vec<Timed<MoodEffect>>,
    /// Latest shell time seen
    pub now_ms: u64,
    /// The shell asked the surface to close
    pub quit: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            lines: VecDeque::new(),
            notifications: Vec::new(),
            mood: Mood::Happy,
            level: 50,
            theme: Theme::Default,
            preview: false,
            tool: Tool::Chat,
            visible: false,
            minimized: false,
            active: BTreeSet::new(),
            idle: None,
            effect: None,
            mood_effects: Vec::new(),
            now_ms: 0,
            quit: false,
        }
    }
}

impl DisplayState {
    /// Create empty display state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a line the user typed
    pub fn push_user(&mut self, text: &str) {
        self.push_line(DisplayRole::User, text.to_string());
    }

    /// Record a line from the app itself
    pub fn push_note(&mut self, text: impl Into<String>) {
        self.push_line(DisplayRole::Bot, text.into());
    }

    /// Record an error from the app itself
    pub fn push_error(&mut self, text: impl Into<String>) {
        self.push_line(DisplayRole::Error, text.into());
    }

    /// Apply one message from the shell
    pub fn apply(&mut self, msg: &StampedMessage) {
        let at = msg.at_ms;
        self.now_ms = self.now_ms.max(at);

        match &msg.message {
            ShellMessage::Speak { text, mood } => {
                self.mood = *mood;
                self.push_line(DisplayRole::Bot, text.clone());
            }
            ShellMessage::Notify { id, text, .. } => {
                self.notifications.push((*id, text.clone()));
            }
            ShellMessage::NotificationExpired { id } => {
                self.notifications.retain(|(n, _)| n != id);
            }
            ShellMessage::Mood { mood, level } => {
                self.mood = *mood;
                self.level = *level;
            }
            ShellMessage::MoodEffects { effects, .. } => {
                self.mood_effects = effects
                    .iter()
                    .map(|e| Timed {
                        value: *e,
                        until_ms: at + e.duration_ms(),
                    })
                    .collect();
            }
            ShellMessage::Idle { micro } => {
                self.idle = Some(Timed {
                    value: *micro,
                    until_ms: at + micro.duration_ms(),
                });
            }
            ShellMessage::Animation { name, phase } => match phase {
                AnimationPhase::Started => {
                    self.active.insert(name.clone());
                }
                AnimationPhase::Finished => {
                    self.active.remove(name);
                }
            },
            ShellMessage::Effect {
                effect,
                duration_ms,
            } => {
                self.effect = Some(Timed {
                    value: *effect,
                    until_ms: at + duration_ms,
                });
            }
            ShellMessage::ToolSwitched { tool } => self.tool = *tool,
            ShellMessage::ThemeApplied { theme, preview } => {
                self.theme = *theme;
                self.preview = *preview;
            }
            ShellMessage::ThemeUnlocked { .. } | ShellMessage::Exported { .. } => {}
            ShellMessage::Window { visible, minimized } => {
                self.visible = *visible;
                self.minimized = *minimized;
            }
            ShellMessage::Error { message } => {
                self.push_line(DisplayRole::Error, message.clone());
            }
            ShellMessage::Quit => self.quit = true,
        }
    }

    /// Drop timed visuals whose deadline has passed
    pub fn expire(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        if self.idle.is_some_and(|t| t.until_ms <= now_ms) {
            self.idle = None;
        }
        if self.effect.is_some_and(|t| t.until_ms <= now_ms) {
            self.effect = None;
        }
        self.mood_effects.retain(|t| t.until_ms > now_ms);
    }

    /// Is `name` currently animating?
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Current whole-window effect, if any
    #[must_use]
    pub fn effect(&self) -> Option<SpecialEffect> {
        self.effect.map(|t| t.value)
    }

    /// Whether `effect` is among the playing mood effects
    #[must_use]
    pub fn has_mood_effect(&self, effect: MoodEffect) -> bool {
        self.mood_effects.iter().any(|t| t.value == effect)
    }

    fn push_line(&mut self, role: DisplayRole, text: String) {
        self.lines.push_back(DisplayLine { role, text });
        while self.lines.len() > MAX_LINES {
            self.lines.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(at_ms: u64, message: ShellMessage) -> StampedMessage {
        StampedMessage { at_ms, message }
    }

    #[test]
    fn test_speech_lands_in_conversation() {
        let mut display = DisplayState::new();
        display.push_user("hello");
        display.apply(&at(
            300,
            ShellMessage::Speak {
                text: "Hi there!".into(),
                mood: Mood::Happy,
            },
        ));

        let lines: Vec<_> = display.lines.iter().map(|l| (l.role, l.text.as_str())).collect();
        assert_eq!(
            lines,
            vec![(DisplayRole::User, "hello"), (DisplayRole::Bot, "Hi there!")]
        );
    }

    #[test]
    fn test_notification_waits_for_expiry_message() {
        let mut display = DisplayState::new();
        display.apply(&at(
            0,
            ShellMessage::Notify {
                id: 3,
                text: "Task added".into(),
                lifetime_ms: 2_000,
            },
        ));
        display.expire(5_000);
        assert_eq!(display.notifications.len(), 1);

        display.apply(&at(2_000, ShellMessage::NotificationExpired { id: 3 }));
        assert!(display.notifications.is_empty());
    }

    #[test]
    fn test_effects_expire_on_shell_time() {
        let mut display = DisplayState::new();
        display.apply(&at(
            1_000,
            ShellMessage::Effect {
                effect: SpecialEffect::Matrix,
                duration_ms: 2_000,
            },
        ));
        display.apply(&at(
            1_000,
            ShellMessage::Idle {
                micro: IdleMicro::Blink,
            },
        ));

        display.expire(1_299);
        assert_eq!(display.effect(), Some(SpecialEffect::Matrix));
        assert!(display.idle.is_some());

        display.expire(1_300);
        assert!(display.idle.is_none());
        display.expire(3_000);
        assert_eq!(display.effect(), None);
    }

    #[test]
    fn test_animation_phases_track_active_set() {
        let mut display = DisplayState::new();
        let started = ShellMessage::Animation {
            name: "speak".into(),
            phase: AnimationPhase::Started,
        };
        display.apply(&at(0, started));
        assert!(display.is_active("speak"));

        display.apply(&at(
            500,
            ShellMessage::Animation {
                name: "speak".into(),
                phase: AnimationPhase::Finished,
            },
        ));
        assert!(!display.is_active("speak"));
    }

    #[test]
    fn test_scrollback_is_bounded() {
        let mut display = DisplayState::new();
        for i in 0..(MAX_LINES + 10) {
            display.push_user(&format!("line {i}"));
        }
        assert_eq!(display.lines.len(), MAX_LINES);
        assert_eq!(display.lines[0].text, "line 10");
    }

    #[test]
    fn test_window_and_theme_follow_shell() {
        let mut display = DisplayState::new();
        display.apply(&at(
            500,
            ShellMessage::Window {
                visible: true,
                minimized: false,
            },
        ));
        display.apply(&at(
            500,
            ShellMessage::ThemeApplied {
                theme: Theme::Christmas,
                preview: true,
            },
        ));
        display.apply(&at(900, ShellMessage::Quit));

        assert!(display.visible);
        assert_eq!(display.theme, Theme::Christmas);
        assert!(display.preview);
        assert!(display.quit);
        assert_eq!(display.now_ms, 900);
    }
}
