//! Visual target collaborators
//!
//! The engine never touches pixels. It asks a [`TargetResolver`] to put effect
//! tags on named targets and take them off again. [`EffectBoard`] is the
//! in-memory resolver shared between the core and a rendering surface.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Applies and removes effect tags on visual targets
///
/// Unknown targets are not an error: implementations ignore them. Adding a
/// tag that is already present is a no-op.
pub trait TargetResolver: Send {
    /// Put `tag` on every element matching `target`
    fn add_tag(&mut self, target: &str, tag: &str);

    /// Take `tag` off every element matching `target`
    fn remove_tag(&mut self, target: &str, tag: &str);
}

/// Shared map of target -> active effect tags
///
/// Cloning is cheap; all clones see the same board. Only targets passed to
/// [`EffectBoard::new`] exist, anything else resolves to nothing.
#[derive(Clone, Debug, Default)]
pub struct EffectBoard {
    inner: Arc<Mutex<BTreeMap<String, BTreeSet<String>>>>,
}

impl EffectBoard {
    /// Create a board exposing the given targets
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let map = targets
            .into_iter()
            .map(|t| (t.into(), BTreeSet::new()))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(map)),
        }
    }

    /// Board with every target of the RetroBot window
    #[must_use]
    pub fn window() -> Self {
        Self::new(super::targets::ALL)
    }

    /// Whether `target` currently carries `tag`
    #[must_use]
    pub fn has_tag(&self, target: &str, tag: &str) -> bool {
        self.inner
            .lock()
            .get(target)
            .is_some_and(|tags| tags.contains(tag))
    }

    /// Tags currently on `target`, sorted
    #[must_use]
    pub fn tags(&self, target: &str) -> Vec<String> {
        self.inner
            .lock()
            .get(target)
            .map(|tags| tags.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy of the whole board
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.inner.lock().clone()
    }

    /// Whether no target carries any tag
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.inner.lock().values().all(BTreeSet::is_empty)
    }
}

impl TargetResolver for EffectBoard {
    fn add_tag(&mut self, target: &str, tag: &str) {
        if let Some(tags) = self.inner.lock().get_mut(target) {
            tags.insert(tag.to_string());
        }
    }

    fn remove_tag(&mut self, target: &str, tag: &str) {
        if let Some(tags) = self.inner.lock().get_mut(target) {
            tags.remove(tag);
        }
    }
}

/// Shell visibility, readable by the idle loop
#[derive(Clone, Debug, Default)]
pub struct VisibilityFlag(Arc<AtomicBool>);

impl VisibilityFlag {
    /// Create a flag with an initial value
    #[must_use]
    pub fn new(visible: bool) -> Self {
        Self(Arc::new(AtomicBool::new(visible)))
    }

    /// Whether the shell is on screen
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Update visibility
    pub fn set(&self, visible: bool) {
        self.0.store(visible, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_target_is_ignored() {
        let mut board = EffectBoard::new(["sprite"]);
        board.add_tag(".missing", "speaking");
        assert!(board.tags(".missing").is_empty());
        assert!(board.is_clear());
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut board = EffectBoard::new(["sprite"]);
        board.add_tag("sprite", "speaking");
        board.add_tag("sprite", "speaking");
        assert_eq!(board.tags("sprite"), vec!["speaking".to_string()]);

        board.remove_tag("sprite", "speaking");
        assert!(!board.has_tag("sprite", "speaking"));
    }

    #[test]
    fn test_clones_share_state() {
        let mut writer = EffectBoard::window();
        let reader = writer.clone();
        writer.add_tag("window", "celebrating");
        assert!(reader.has_tag("window", "celebrating"));
    }

    #[test]
    fn test_visibility_flag_shared() {
        let flag = VisibilityFlag::new(false);
        let other = flag.clone();
        other.set(true);
        assert!(flag.is_visible());
    }
}
