//! Terminal bell sound player
//!
//! The core asks for beeps and chimes from inside `Shell`; the terminal is
//! owned by the render loop. [`Bell`] just counts requests and the app rings
//! the bell once per frame when any are pending.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use retrobot_core::{SoundKind, SoundPlayer};

/// Counts sound requests for the render loop
///
/// Clones share the same counter.
#[derive(Clone, Debug, Default)]
pub struct Bell {
    pending: Arc<AtomicUsize>,
    muted: bool,
}

impl Bell {
    /// Create a bell
    #[must_use]
    pub fn new(muted: bool) -> Self {
        Self {
            pending: Arc::new(AtomicUsize::new(0)),
            muted,
        }
    }

    /// Take the pending count, resetting it
    pub fn take(&self) -> usize {
        self.pending.swap(0, Ordering::Relaxed)
    }
}

impl SoundPlayer for Bell {
    fn play(&mut self, kind: SoundKind) {
        tracing::trace!(sound = %kind, muted = self.muted, "Sound requested");
        if !self.muted {
            self.pending.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_pending() {
        let bell = Bell::new(false);
        let mut player = bell.clone();
        player.play(SoundKind::Beep);
        player.play(SoundKind::PowerOn);

        assert_eq!(bell.take(), 2);
        assert_eq!(bell.take(), 0);
    }

    #[test]
    fn test_muted_bell_stays_quiet() {
        let bell = Bell::new(true);
        let mut player = bell.clone();
        player.play(SoundKind::Beep);
        assert_eq!(bell.take(), 0);
    }
}
