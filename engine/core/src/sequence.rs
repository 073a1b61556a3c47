//! Key Sequence Matcher
//!
//! Watches a stream of key codes (`ArrowUp`, `KeyB`, ...) for easter-egg
//! sequences. Every registered sequence tracks its own progress; a single
//! token can advance one sequence while resetting another.
//!
//! # Matching rules
//!
//! - A token equal to the next expected token advances progress. Reaching
//!   the full length reports a match and resets to empty.
//! - Any other token resets progress to empty. The token is not replayed
//!   against the start of the sequence.
//! - After a dispatched match, a global cooldown (5 s by default) suppresses
//!   dispatch of further matches. Tracking carries on as normal during the
//!   cooldown; only the dispatch flag is cleared.
//!
//! The matcher knows nothing about text-entry focus. Surfaces filter out
//! keys typed into text fields before feeding it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Default cooldown between dispatched matches
pub const DEFAULT_COOLDOWN_MS: u64 = 5_000;

/// Progress at which a sequence starts reporting "almost complete"
const NEAR_COMPLETE_AFTER: usize = 3;

/// Errors from sequence registration
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    /// A sequence with this id exists
    #[error("Sequence already registered: {0}")]
    DuplicateId(String),

    /// Sequences need at least one token
    #[error("Sequence '{0}' has no tokens")]
    EmptySequence(String),
}

/// The built-in easter eggs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EasterEgg {
    /// ↑ ↑ ↓ ↓ ← → ← → B A
    Konami,
    /// M A T R I X
    Matrix,
    /// R E T R O
    Retro,
    /// ← → ← →
    Dance,
    /// G L I T C H
    Glitch,
}

impl EasterEgg {
    /// All built-in eggs, in registration order
    pub const ALL: [EasterEgg; 5] = [
        Self::Konami,
        Self::Matrix,
        Self::Retro,
        Self::Dance,
        Self::Glitch,
    ];

    /// Sequence id
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Konami => "konami",
            Self::Matrix => "matrix",
            Self::Retro => "retro",
            Self::Dance => "dance",
            Self::Glitch => "glitch",
        }
    }

    /// Look up an egg by sequence id
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|egg| egg.id() == id)
    }

    /// Key codes that trigger the egg
    #[must_use]
    pub fn tokens(self) -> &'static [&'static str] {
        match self {
            Self::Konami => &[
                "ArrowUp",
                "ArrowUp",
                "ArrowDown",
                "ArrowDown",
                "ArrowLeft",
                "ArrowRight",
                "ArrowLeft",
                "ArrowRight",
                "KeyB",
                "KeyA",
            ],
            Self::Matrix => &["KeyM", "KeyA", "KeyT", "KeyR", "KeyI", "KeyX"],
            Self::Retro => &["KeyR", "KeyE", "KeyT", "KeyR", "KeyO"],
            Self::Dance => &["ArrowLeft", "ArrowRight", "ArrowLeft", "ArrowRight"],
            Self::Glitch => &["KeyG", "KeyL", "KeyI", "KeyT", "KeyC", "KeyH"],
        }
    }
}

impl fmt::Display for EasterEgg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Progress through one target sequence
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceTracker {
    id: String,
    target: Vec<String>,
    progress: Vec<String>,
}

impl SequenceTracker {
    /// Sequence id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Tokens matched so far
    #[must_use]
    pub fn progress(&self) -> &[String] {
        &self.progress
    }

    /// Full target
    #[must_use]
    pub fn target(&self) -> &[String] {
        &self.target
    }

    /// Advance with `token`; returns `true` on a full match
    fn advance(&mut self, token: &str) -> bool {
        if self.target.get(self.progress.len()).is_some_and(|t| t == token) {
            self.progress.push(token.to_string());
            if self.progress.len() == self.target.len() {
                self.progress.clear();
                return true;
            }
        } else {
            self.progress.clear();
        }
        false
    }

    fn is_near_complete(&self) -> bool {
        let done = self.progress.len();
        done > NEAR_COMPLETE_AFTER && done + 1 == self.target.len()
    }
}

/// One completed sequence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMatch {
    /// Sequence id
    pub id: String,
    /// `false` when the cooldown suppressed the effect
    pub dispatched: bool,
}

/// Everything one token caused
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedReport {
    /// Sequences completed by this token, in registration order
    pub matches: Vec<SequenceMatch>,
    /// Sequences now one token from completion
    pub near_complete: Vec<String>,
}

impl FeedReport {
    /// Ids whose effects should run
    pub fn dispatched(&self) -> impl Iterator<Item = &str> {
        self.matches
            .iter()
            .filter(|m| m.dispatched)
            .map(|m| m.id.as_str())
    }
}

/// Global cooldown after a dispatched match
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EasterEggCooldown {
    until_ms: Option<u64>,
}

impl EasterEggCooldown {
    /// Whether dispatch is suppressed at `now_ms`
    #[must_use]
    pub fn is_active(&self, now_ms: u64) -> bool {
        self.until_ms.is_some_and(|until| now_ms < until)
    }

    /// End of the current window, if any
    #[must_use]
    pub fn until_ms(&self) -> Option<u64> {
        self.until_ms
    }
}

/// Matcher over all registered sequences
#[derive(Clone, Debug)]
pub struct SequenceMatcher {
    trackers: Vec<SequenceTracker>,
    cooldown: EasterEggCooldown,
    cooldown_ms: u64,
}

impl Default for SequenceMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}

impl SequenceMatcher {
    /// Empty matcher with the given cooldown
    #[must_use]
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            trackers: Vec::new(),
            cooldown: EasterEggCooldown::default(),
            cooldown_ms,
        }
    }

    /// Matcher preloaded with every [`EasterEgg`]
    #[must_use]
    pub fn with_easter_eggs(cooldown_ms: u64) -> Self {
        let mut matcher = Self::new(cooldown_ms);
        for egg in EasterEgg::ALL {
            matcher.trackers.push(SequenceTracker {
                id: egg.id().to_string(),
                target: egg.tokens().iter().map(ToString::to_string).collect(),
                progress: Vec::new(),
            });
        }
        matcher
    }

    /// Register a sequence
    ///
    /// # Errors
    ///
    /// [`SequenceError::DuplicateId`] or [`SequenceError::EmptySequence`].
    pub fn register_sequence<I, S>(&mut self, id: &str, tokens: I) -> Result<(), SequenceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.trackers.iter().any(|t| t.id == id) {
            return Err(SequenceError::DuplicateId(id.to_string()));
        }
        let target: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if target.is_empty() {
            return Err(SequenceError::EmptySequence(id.to_string()));
        }

        debug!(id, len = target.len(), "Registered key sequence");
        self.trackers.push(SequenceTracker {
            id: id.to_string(),
            target,
            progress: Vec::new(),
        });
        Ok(())
    }

    /// Feed one key code at simulated time `now_ms`
    pub fn feed(&mut self, token: &str, now_ms: u64) -> FeedReport {
        let mut report = FeedReport::default();

        for tracker in &mut self.trackers {
            if tracker.advance(token) {
                let dispatched = !self.cooldown.is_active(now_ms);
                if dispatched {
                    self.cooldown.until_ms = Some(now_ms.saturating_add(self.cooldown_ms));
                    info!(id = %tracker.id, "Key sequence matched");
                } else {
                    debug!(id = %tracker.id, "Key sequence matched during cooldown");
                }
                report.matches.push(SequenceMatch {
                    id: tracker.id.clone(),
                    dispatched,
                });
            } else if tracker.is_near_complete() {
                report.near_complete.push(tracker.id.clone());
            }
        }

        report
    }

    /// Clear every sequence's progress
    pub fn reset_all(&mut self) {
        for tracker in &mut self.trackers {
            tracker.progress.clear();
        }
    }

    /// Tracker for `id`
    #[must_use]
    pub fn tracker(&self, id: &str) -> Option<&SequenceTracker> {
        self.trackers.iter().find(|t| t.id == id)
    }

    /// Cooldown state
    #[must_use]
    pub fn cooldown(&self) -> EasterEggCooldown {
        self.cooldown
    }
}
