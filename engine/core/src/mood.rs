//! Mood State Machine
//!
//! RetroBot is always exactly one of three moods and carries a mood level in
//! `[0, 100]`. Explicit changes set the mood directly; level adjustments move
//! the number and may drag the mood along:
//!
//! ```text
//!   level:  0 ──────── 30 ──────── 50 ──────── 70 ──────── 100
//!           │ annoyed  │  sleepy   │ (no auto) │   happy    │
//! ```
//!
//! The 50-70 band never changes the mood automatically. Whatever mood the
//! bot had on entering the band is kept.
//!
//! Every mood change plays the blocking `mood-change` animation with the new
//! mood as payload. When it finishes, the shell runs that mood's secondary
//! effects ([`mood_effects`]).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::animation::{names, AnimationEngine, AnimationError};
use crate::storage::{self, Storage};

/// Storage key for the persisted mood
pub const MOOD_KEY: &str = "retrobot-mood";

/// Level above which the bot cheers up
pub const HAPPY_ABOVE: u8 = 70;
/// Level below which the bot gets grumpy
pub const ANNOYED_BELOW: u8 = 30;
/// Level below which the bot gets drowsy
pub const SLEEPY_BELOW: u8 = 50;

/// Errors from mood operations
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MoodError {
    /// Mood name outside the fixed set
    #[error("Invalid mood: {0} (expected happy, annoyed or sleepy)")]
    InvalidMood(String),

    /// The mood-change animation could not be played
    #[error(transparent)]
    Animation(#[from] AnimationError),
}

/// RetroBot's moods
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Upbeat, exclamation-heavy
    #[default]
    Happy,
    /// Grumbling, reluctant
    Annoyed,
    /// Yawning, slow
    Sleepy,
}

impl Mood {
    /// All moods
    pub const ALL: [Mood; 3] = [Self::Happy, Self::Annoyed, Self::Sleepy];

    /// Lowercase name
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Annoyed => "annoyed",
            Self::Sleepy => "sleepy",
        }
    }

    /// Capitalised name for the mood indicator
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Annoyed => "Annoyed",
            Self::Sleepy => "Sleepy",
        }
    }

    /// Emoji for the mood
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Happy => "😊",
            Self::Annoyed => "😤",
            Self::Sleepy => "😴",
        }
    }

    /// Width of the mood bar right after an explicit change, in percent
    #[must_use]
    pub fn bar_hint(self) -> u8 {
        match self {
            Self::Happy => 80,
            Self::Annoyed => 40,
            Self::Sleepy => 60,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mood {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "annoyed" => Ok(Self::Annoyed),
            "sleepy" => Ok(Self::Sleepy),
            _ => Err(MoodError::InvalidMood(s.to_string())),
        }
    }
}

/// Mood and level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodState {
    /// Current mood
    pub mood: Mood,
    /// Level in `[0, 100]`
    pub level: u8,
}

impl Default for MoodState {
    fn default() -> Self {
        Self {
            mood: Mood::Happy,
            level: 80,
        }
    }
}

impl MoodState {
    /// State after adding `delta` to the level, clamped, with the threshold
    /// mood applied
    #[must_use]
    pub fn adjusted(self, delta: i32) -> Self {
        let level = (i32::from(self.level) + delta).clamp(0, 100);
        let level = u8::try_from(level).unwrap_or(100);
        Self {
            mood: mood_for_level(level).unwrap_or(self.mood),
            level,
        }
    }

    /// Word describing the level
    #[must_use]
    pub fn level_text(&self) -> &'static str {
        if self.level > 70 {
            "great"
        } else if self.level > 40 {
            "okay"
        } else {
            "not so great"
        }
    }
}

/// Mood a level calls for, if any
///
/// `None` inside the 50-70 dead zone.
#[must_use]
pub fn mood_for_level(level: u8) -> Option<Mood> {
    if level > HAPPY_ABOVE {
        Some(Mood::Happy)
    } else if level < ANNOYED_BELOW {
        Some(Mood::Annoyed)
    } else if level < SLEEPY_BELOW {
        Some(Mood::Sleepy)
    } else {
        None
    }
}

/// Secondary effects played once a mood transition finishes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoodEffect {
    /// Floating particles
    Particles {
        /// Particle glyph
        glyph: char,
        /// How many
        count: u8,
    },
    /// Sprite hops
    Bounce,
    /// Mood bar pulses
    Glow,
    /// Window shakes
    Shake,
    /// Sprite tints red
    Tint,
    /// Window dims in and out
    Fade,
    /// Sprite sways slowly
    Sway,
}

impl MoodEffect {
    /// How long the effect stays on screen
    #[must_use]
    pub fn duration_ms(self) -> u64 {
        match self {
            Self::Particles { count, .. } => 2000 + u64::from(count.saturating_sub(1)) * 200,
            Self::Bounce | Self::Tint => 1000,
            Self::Glow => 1500,
            Self::Shake => 500,
            Self::Fade | Self::Sway => 2000,
        }
    }
}

/// The secondary effects for a mood
#[must_use]
pub fn mood_effects(mood: Mood) -> Vec<MoodEffect> {
    match mood {
        Mood::Happy => vec![
            MoodEffect::Particles {
                glyph: '✨',
                count: 5,
            },
            MoodEffect::Bounce,
            MoodEffect::Glow,
        ],
        Mood::Annoyed => vec![MoodEffect::Shake, MoodEffect::Tint],
        Mood::Sleepy => vec![MoodEffect::Fade, MoodEffect::Sway],
    }
}

/// Owner of the mood state
///
/// Persists every change through the injected [`Storage`].
pub struct MoodMachine {
    state: MoodState,
    storage: Arc<dyn Storage>,
}

impl fmt::Debug for MoodMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoodMachine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl MoodMachine {
    /// Start from the default state (happy, 80)
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            state: MoodState::default(),
            storage,
        }
    }

    /// Restore the persisted state, falling back to defaults
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let mut state: MoodState = storage::load_or_default(storage.as_ref(), MOOD_KEY);
        state.level = state.level.min(100);
        debug!(mood = %state.mood, level = state.level, "Mood restored");
        Self { state, storage }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> MoodState {
        self.state
    }

    /// Current mood
    #[must_use]
    pub fn mood(&self) -> Mood {
        self.state.mood
    }

    /// Current level
    #[must_use]
    pub fn level(&self) -> u8 {
        self.state.level
    }

    /// Set the mood, play the transition and persist
    ///
    /// # Errors
    ///
    /// Fails only if the engine has no `mood-change` animation. The mood is
    /// still set and saved in that case.
    pub fn change_mood(&mut self, mood: Mood, engine: &mut AnimationEngine) -> Result<(), MoodError> {
        if self.state.mood != mood {
            info!(from = %self.state.mood, to = %mood, "Mood changed");
        }
        self.state.mood = mood;
        self.save();
        engine.trigger(names::MOOD_CHANGE, mood)?;
        Ok(())
    }

    /// Parse a mood name and change to it
    ///
    /// # Errors
    ///
    /// [`MoodError::InvalidMood`] for names outside the fixed set; nothing
    /// changes in that case.
    pub fn change_mood_named(
        &mut self,
        name: &str,
        engine: &mut AnimationEngine,
    ) -> Result<Mood, MoodError> {
        let mood: Mood = name.parse()?;
        self.change_mood(mood, engine)?;
        Ok(mood)
    }

    /// Add `delta` to the level, clamped to `[0, 100]`
    ///
    /// If the new level calls for a mood, that change always runs (even
    /// when it is the current mood). Returns the mood that was applied.
    ///
    /// # Errors
    ///
    /// Propagates [`MoodMachine::change_mood`] failures.
    pub fn adjust_level(
        &mut self,
        delta: i32,
        engine: &mut AnimationEngine,
    ) -> Result<Option<Mood>, MoodError> {
        self.state.level = self.state.adjusted(delta).level;
        debug!(delta, level = self.state.level, "Mood level adjusted");

        match mood_for_level(self.state.level) {
            Some(mood) => {
                self.change_mood(mood, engine)?;
                Ok(Some(mood))
            }
            None => {
                self.save();
                Ok(None)
            }
        }
    }

    /// Overwrite the level without side effects (restoring saved profiles)
    pub fn set_level(&mut self, level: u8) {
        self.state.level = level.min(100);
    }

    fn save(&self) {
        storage::save_as(self.storage.as_ref(), MOOD_KEY, &self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{EffectBoard, VisibilityFlag};
    use crate::storage::MemoryStorage;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    fn rig() -> (MoodMachine, AnimationEngine, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine =
            AnimationEngine::new(Box::new(EffectBoard::window()), VisibilityFlag::new(true), tx);
        engine.register_defaults().unwrap();
        (MoodMachine::new(storage.clone()), engine, storage)
    }

    #[test]
    fn test_parse_mood() {
        assert_eq!("Happy".parse::<Mood>(), Ok(Mood::Happy));
        assert_eq!(" sleepy ".parse::<Mood>(), Ok(Mood::Sleepy));
        assert_eq!(
            "furious".parse::<Mood>(),
            Err(MoodError::InvalidMood("furious".into()))
        );
    }

    #[test]
    fn test_change_mood_triggers_animation_and_persists() {
        let (mut machine, mut engine, storage) = rig();
        machine.change_mood(Mood::Sleepy, &mut engine).unwrap();

        assert_eq!(machine.mood(), Mood::Sleepy);
        let active = engine.active(names::MOOD_CHANGE).unwrap();
        assert_eq!(active.payload(), &crate::animation::Payload::Mood(Mood::Sleepy));

        let saved = storage.load(MOOD_KEY).unwrap();
        assert_eq!(saved["mood"], "sleepy");
    }

    #[test]
    fn test_invalid_name_changes_nothing() {
        let (mut machine, mut engine, _) = rig();
        let err = machine.change_mood_named("grumpy", &mut engine).unwrap_err();
        assert!(matches!(err, MoodError::InvalidMood(_)));
        assert_eq!(machine.mood(), Mood::Happy);
        assert!(!engine.is_running(names::MOOD_CHANGE));
    }

    #[test]
    fn test_clamp_round_trip_ends_annoyed() {
        let (mut machine, mut engine, _) = rig();
        assert_eq!(machine.adjust_level(1000, &mut engine), Ok(Some(Mood::Happy)));
        assert_eq!(machine.level(), 100);
        assert_eq!(machine.adjust_level(-1000, &mut engine), Ok(Some(Mood::Annoyed)));
        assert_eq!(machine.state(), MoodState { mood: Mood::Annoyed, level: 0 });
    }

    #[test]
    fn test_dead_zone_keeps_mood() {
        let (mut machine, mut engine, _) = rig();
        machine.set_level(60);
        assert_eq!(machine.mood(), Mood::Happy);

        assert_eq!(machine.adjust_level(-5, &mut engine), Ok(None));
        assert_eq!(machine.level(), 55);
        assert_eq!(machine.mood(), Mood::Happy);
        assert!(!engine.is_running(names::MOOD_CHANGE));
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(mood_for_level(71), Some(Mood::Happy));
        assert_eq!(mood_for_level(70), None);
        assert_eq!(mood_for_level(50), None);
        assert_eq!(mood_for_level(49), Some(Mood::Sleepy));
        assert_eq!(mood_for_level(30), Some(Mood::Sleepy));
        assert_eq!(mood_for_level(29), Some(Mood::Annoyed));
    }

    #[test]
    fn test_same_mood_still_replays_transition() {
        let (mut machine, mut engine, _) = rig();
        assert_eq!(machine.adjust_level(5, &mut engine), Ok(Some(Mood::Happy)));
        assert!(engine.is_running(names::MOOD_CHANGE));
    }

    #[test]
    fn test_load_falls_back_on_corrupt_data() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(MOOD_KEY, &serde_json::json!({"mood": "ecstatic", "level": 12}));
        let machine = MoodMachine::load(storage);
        assert_eq!(machine.state(), MoodState::default());
    }

    #[test]
    fn test_adjusted_is_pure() {
        let state = MoodState { mood: Mood::Annoyed, level: 60 };
        assert_eq!(state.adjusted(5), MoodState { mood: Mood::Annoyed, level: 65 });
        assert_eq!(state.adjusted(-15), MoodState { mood: Mood::Sleepy, level: 45 });
        assert_eq!(state.adjusted(200), MoodState { mood: Mood::Happy, level: 100 });
    }

    #[test]
    fn test_effects_per_mood() {
        assert_eq!(mood_effects(Mood::Annoyed), vec![MoodEffect::Shake, MoodEffect::Tint]);
        assert!(matches!(
            mood_effects(Mood::Happy)[0],
            MoodEffect::Particles { glyph: '✨', count: 5 }
        ));
    }
}
