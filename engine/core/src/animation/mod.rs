//! Animation System - Named, Timed Effect Tags
//!
//! An animation here is not a frame sequence: it is a named effect tag that
//! sits on a handful of visual targets for a fixed duration. Surfaces decide
//! what a tag looks like (a CSS class, a ratatui style, a blinking sprite).
//! The core only decides *when* tags go on and come off.
//!
//! # Design Philosophy
//!
//! - **Declared, not inferred**: whether an animation blocks others is a
//!   property of its [`AnimationSpec`], never an external name list
//! - **Typed completions**: finishing an animation emits a [`Completion`]
//!   on the engine's event channel instead of calling back into the shell
//! - **Simulated time**: durations run on the [`crate::clock::Scheduler`]
//!
//! # Architecture
//!
//! ```text
//! Shell ──trigger("mood-change", Mood)──► AnimationEngine
//!                                             │  add_tag / remove_tag
//!                                             ├──────────────────────► TargetResolver (EffectBoard)
//!                                             │  EngineEvent
//!                                             └──────────────────────► mpsc channel ──► Shell
//! ```

mod effects;
mod engine;

pub use effects::{EffectBoard, TargetResolver, VisibilityFlag};
pub use engine::{ActiveAnimation, AnimationEngine, EngineEvent, QueuedRequest, TriggerOutcome};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mood::Mood;

// ============================================================================
// Well-known names
// ============================================================================

/// Names of the built-in animations
pub mod names {
    /// Sprite mouth movement while a line is delivered
    pub const SPEAK: &str = "speak";
    /// Transition between moods (blocking)
    pub const MOOD_CHANGE: &str = "mood-change";
    /// Button feedback
    pub const BUTTON_PRESS: &str = "button-press";
    /// Notification bounce
    pub const NOTIFICATION: &str = "notification";
    /// Tool panel swap (blocking)
    pub const TOOL_SWITCH: &str = "tool-switch";
    /// Ambient idle fidget, exempt from queueing
    pub const IDLE: &str = "idle";
    /// Task or event celebration (blocking)
    pub const CELEBRATION: &str = "celebration";
    /// Window shake on errors
    pub const ERROR: &str = "error";
    /// Theme cross-fade
    pub const THEME_TRANSITION: &str = "theme-transition";
    /// Window power-on flicker
    pub const POWER_ON: &str = "power-on";
    /// Window power-off collapse
    pub const POWER_OFF: &str = "power-off";
}

/// Opaque visual targets understood by the built-in surfaces
pub mod targets {
    /// The character sprite
    pub const SPRITE: &str = "sprite";
    /// The frame around the sprite glyphs
    pub const SPRITE_FRAME: &str = "sprite-frame";
    /// The mood level bar
    pub const MOOD_BAR: &str = "mood-bar";
    /// The focused button
    pub const BUTTON: &str = "button";
    /// The focused tool tab
    pub const TAB: &str = "tab";
    /// The notification banner
    pub const NOTIFICATION: &str = "notification";
    /// The active tool panel
    pub const TOOL_PANEL: &str = "tool-panel";
    /// The whole window
    pub const WINDOW: &str = "window";

    /// Every target a full RetroBot window exposes
    pub const ALL: [&str; 8] = [
        SPRITE,
        SPRITE_FRAME,
        MOOD_BAR,
        BUTTON,
        TAB,
        NOTIFICATION,
        TOOL_PANEL,
        WINDOW,
    ];
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by the animation engine
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnimationError {
    /// Trigger on a name that was never registered
    #[error("Unknown animation: {0}")]
    UnknownAnimation(String),

    /// A second registration under an existing name
    #[error("Animation already registered: {0}")]
    DuplicateName(String),

    /// Spec rejected at registration
    #[error("Invalid animation spec '{name}': {reason}")]
    InvalidSpec {
        /// Offending animation name
        name: String,
        /// What was wrong
        reason: String,
    },
}

// ============================================================================
// Spec types
// ============================================================================

/// How an animation interacts with the blocking queue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationClass {
    /// Mutually exclusive: at most one runs, the rest wait in FIFO order
    Blocking,
    /// Runs alongside others, but waits while a blocking animation runs
    #[default]
    Normal,
    /// Never queued, even while a blocking animation runs
    Ambient,
}

impl AnimationClass {
    /// Whether this class holds the engine busy
    #[must_use]
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Blocking)
    }
}

/// Event emitted when an animation with a completion hook finishes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    /// Run the mood-specific secondary effects for the payload's mood
    MoodEffects,
    /// The window finished powering down
    PowerDown,
}

/// Data carried from `trigger` to the completion event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// No data
    #[default]
    None,
    /// A mood (mood-change)
    Mood(Mood),
    /// Free text
    Text(String),
}

impl From<Mood> for Payload {
    fn from(mood: Mood) -> Self {
        Self::Mood(mood)
    }
}

/// Immutable description of a named animation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSpec {
    /// Unique name
    pub name: String,
    /// How long the effect tag stays on, in milliseconds
    pub duration_ms: u64,
    /// Targets the tag is applied to, in order
    pub targets: Vec<String>,
    /// The effect tag itself
    pub effect_tag: String,
    /// Queueing behaviour
    pub class: AnimationClass,
    /// Optional completion hook
    pub completion: Option<Completion>,
}

impl AnimationSpec {
    /// Create a normal, untargeted animation
    pub fn new(name: impl Into<String>, duration_ms: u64, effect_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration_ms,
            targets: Vec::new(),
            effect_tag: effect_tag.into(),
            class: AnimationClass::Normal,
            completion: None,
        }
    }

    /// Add a visual target
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Mark as blocking
    #[must_use]
    pub fn blocking(mut self) -> Self {
        self.class = AnimationClass::Blocking;
        self
    }

    /// Mark as ambient (exempt from queueing)
    #[must_use]
    pub fn ambient(mut self) -> Self {
        self.class = AnimationClass::Ambient;
        self
    }

    /// Attach a completion hook
    #[must_use]
    pub fn on_complete(mut self, completion: Completion) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Check the definition can be registered
    ///
    /// # Errors
    ///
    /// Returns [`AnimationError::InvalidSpec`] for an empty name, empty tag or
    /// zero duration.
    pub fn validate(&self) -> Result<(), AnimationError> {
        let reason = if self.name.trim().is_empty() {
            "name is empty"
        } else if self.duration_ms == 0 {
            "duration must be positive"
        } else if self.effect_tag.trim().is_empty() {
            "effect tag is empty"
        } else {
            return Ok(());
        };

        Err(AnimationError::InvalidSpec {
            name: self.name.clone(),
            reason: reason.to_string(),
        })
    }
}

/// The built-in animation table
#[must_use]
pub fn default_specs() -> Vec<AnimationSpec> {
    use targets::{BUTTON, MOOD_BAR, NOTIFICATION, SPRITE, SPRITE_FRAME, TAB, TOOL_PANEL, WINDOW};

    vec![
        AnimationSpec::new(names::SPEAK, 500, "speaking").with_target(SPRITE),
        AnimationSpec::new(names::MOOD_CHANGE, 1000, "mood-transitioning")
            .with_target(SPRITE)
            .with_target(MOOD_BAR)
            .blocking()
            .on_complete(Completion::MoodEffects),
        AnimationSpec::new(names::BUTTON_PRESS, 200, "pressed")
            .with_target(BUTTON)
            .with_target(TAB),
        AnimationSpec::new(names::NOTIFICATION, 2000, "bouncing").with_target(NOTIFICATION),
        AnimationSpec::new(names::TOOL_SWITCH, 300, "switching")
            .with_target(TOOL_PANEL)
            .blocking(),
        AnimationSpec::new(names::IDLE, 3000, "idle-animation")
            .with_target(SPRITE_FRAME)
            .ambient(),
        AnimationSpec::new(names::CELEBRATION, 2000, "celebrating")
            .with_target(WINDOW)
            .blocking(),
        AnimationSpec::new(names::ERROR, 500, "error-shake").with_target(WINDOW),
        AnimationSpec::new(names::THEME_TRANSITION, 1000, "theme-transitioning").with_target(WINDOW),
        AnimationSpec::new(names::POWER_ON, 1000, "powering-on").with_target(WINDOW),
        AnimationSpec::new(names::POWER_OFF, 500, "powering-off")
            .with_target(WINDOW)
            .on_complete(Completion::PowerDown),
    ]
}

// ============================================================================
// Idle micro-animations and special effects
// ============================================================================

/// Small fidgets performed by the idle loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdleMicro {
    /// Eyes close briefly
    Blink,
    /// Eyes dart left then right
    LookAround,
    /// Sprite stretches upward
    Stretch,
    /// Mouth opens wide (only rendered when sleepy)
    Yawn,
    /// Quick hop
    Bounce,
}

impl IdleMicro {
    /// All idle fidgets, in pick order
    pub const ALL: [IdleMicro; 5] = [
        Self::Blink,
        Self::LookAround,
        Self::Stretch,
        Self::Yawn,
        Self::Bounce,
    ];

    /// How long the fidget lasts on screen
    #[must_use]
    pub fn duration_ms(self) -> u64 {
        match self {
            Self::Blink => 300,
            Self::LookAround => 1500,
            Self::Stretch | Self::Yawn => 1000,
            Self::Bounce => 500,
        }
    }

    /// Short label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Blink => "blink",
            Self::LookAround => "look-around",
            Self::Stretch => "stretch",
            Self::Yawn => "yawn",
            Self::Bounce => "bounce",
        }
    }
}

impl fmt::Display for IdleMicro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole-window effects used by easter eggs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialEffect {
    /// Cycling hue across the window
    Rainbow,
    /// Jittering, colour-split window
    Glitch,
    /// Falling green glyphs
    Matrix,
    /// Rising flame particles
    Fire,
    /// Sprite sways side to side
    Dance,
}

impl SpecialEffect {
    /// How long the effect plays
    #[must_use]
    pub fn duration_ms(self) -> u64 {
        match self {
            Self::Rainbow => 3000,
            Self::Glitch | Self::Matrix => 2000,
            Self::Fire => 1500,
            Self::Dance => 5000,
        }
    }

    /// Number of particles the effect spawns (0 for whole-window effects)
    #[must_use]
    pub fn particles(self) -> u8 {
        match self {
            Self::Matrix => 20,
            Self::Fire => 10,
            _ => 0,
        }
    }

    /// Short label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Rainbow => "rainbow",
            Self::Glitch => "glitch",
            Self::Matrix => "matrix",
            Self::Fire => "fire",
            Self::Dance => "dance",
        }
    }
}

impl fmt::Display for SpecialEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
