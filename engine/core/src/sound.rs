//! Sound effect collaborator
//!
//! Fire-and-forget: the core asks for a sound and moves on. Players swallow
//! their own failures.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Sounds RetroBot makes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoundKind {
    /// Soft falling tone when a line starts
    Speak,
    /// Short UI beep
    Beep,
    /// Rising power-on sweep
    PowerOn,
    /// Falling power-off sweep
    PowerOff,
    /// One note of the easter-egg chime
    Chime {
        /// Note frequency in Hz
        hz: u16,
        /// Note length in milliseconds
        ms: u16,
    },
}

impl SoundKind {
    /// The three rising notes of the easter-egg chime, with start offsets
    pub const CHIME: [(u64, SoundKind); 3] = [
        (0, SoundKind::Chime { hz: 800, ms: 100 }),
        (150, SoundKind::Chime { hz: 1000, ms: 100 }),
        (300, SoundKind::Chime { hz: 1200, ms: 200 }),
    ];
}

impl fmt::Display for SoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speak => write!(f, "speak"),
            Self::Beep => write!(f, "beep"),
            Self::PowerOn => write!(f, "power-on"),
            Self::PowerOff => write!(f, "power-off"),
            Self::Chime { hz, ms } => write!(f, "chime {hz}Hz/{ms}ms"),
        }
    }
}

/// Plays sound effects
pub trait SoundPlayer: Send {
    /// Play `kind`; never fails
    fn play(&mut self, kind: SoundKind);
}

/// Silent player
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl SoundPlayer for Silent {
    fn play(&mut self, _kind: SoundKind) {}
}

/// Player that records what it was asked to play
///
/// Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct SoundLog {
    played: Arc<Mutex<Vec<SoundKind>>>,
}

impl SoundLog {
    /// Empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything played so far
    #[must_use]
    pub fn played(&self) -> Vec<SoundKind> {
        self.played.lock().clone()
    }

    /// How many times `kind` was played
    #[must_use]
    pub fn count(&self, kind: SoundKind) -> usize {
        self.played.lock().iter().filter(|k| **k == kind).count()
    }
}

impl SoundPlayer for SoundLog {
    fn play(&mut self, kind: SoundKind) {
        self.played.lock().push(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_shared() {
        let log = SoundLog::new();
        let mut player = log.clone();
        player.play(SoundKind::Beep);
        player.play(SoundKind::Beep);
        player.play(SoundKind::PowerOn);
        assert_eq!(log.count(SoundKind::Beep), 2);
        assert_eq!(log.played().len(), 3);
    }

    #[test]
    fn test_chime_rises() {
        let freqs: Vec<u16> = SoundKind::CHIME
            .iter()
            .filter_map(|(_, k)| match k {
                SoundKind::Chime { hz, .. } => Some(*hz),
                _ => None,
            })
            .collect();
        assert_eq!(freqs, vec![800, 1000, 1200]);
    }
}
