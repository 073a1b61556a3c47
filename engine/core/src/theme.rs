//! Window themes and the persisted profile
//!
//! Three themes are open from the start. The rest are earned: long-time users
//! unlock purple and red, todo milestones unlock purple, and the Konami code
//! unlocks everything retro. Holiday themes are never unlocked; they only
//! appear as previews on their day.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key for the profile
pub const PROFILE_KEY: &str = "retrobot-data";

/// Interactions needed to unlock [`Theme::Purple`]
pub const PURPLE_AFTER: u32 = 10;
/// Interactions needed to unlock [`Theme::Red`]
pub const RED_AFTER: u32 = 25;

/// Theme errors
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ThemeError {
    /// Name is not a theme
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    /// Theme exists but has not been unlocked
    #[error("Theme locked: {0}")]
    Locked(Theme),
}

/// Window colour schemes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Green phosphor
    #[default]
    Default,
    /// Amber monochrome
    Amber,
    /// Blue terminal
    Blue,
    /// Purple haze
    Purple,
    /// Red alert
    Red,
    /// Rainbow (Konami reward)
    Rainbow,
    /// Commodore 64
    C64,
    /// Apple II
    Apple2,
    /// Atari
    Atari,
    /// Christmas preview
    Christmas,
    /// Halloween preview
    Halloween,
}

impl Theme {
    /// Themes open to every new user
    pub const STARTER: [Theme; 3] = [Self::Default, Self::Amber, Self::Blue];

    /// Themes the Konami code unlocks
    pub const KONAMI_REWARDS: [Theme; 6] = [
        Self::Purple,
        Self::Red,
        Self::Rainbow,
        Self::C64,
        Self::Apple2,
        Self::Atari,
    ];

    /// Themes cycled by the retro easter egg
    pub const RETRO_CYCLE: [Theme; 3] = [Self::C64, Self::Apple2, Self::Atari];

    /// Themes flashed by the glitch easter egg
    pub const GLITCH_POOL: [Theme; 5] = [
        Self::Default,
        Self::Amber,
        Self::Blue,
        Self::Purple,
        Self::Red,
    ];

    /// Lowercase name
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Amber => "amber",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Red => "red",
            Self::Rainbow => "rainbow",
            Self::C64 => "c64",
            Self::Apple2 => "apple2",
            Self::Atari => "atari",
            Self::Christmas => "christmas",
            Self::Halloween => "halloween",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Theme {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        [
            Self::Default,
            Self::Amber,
            Self::Blue,
            Self::Purple,
            Self::Red,
            Self::Rainbow,
            Self::C64,
            Self::Apple2,
            Self::Atari,
            Self::Christmas,
            Self::Halloween,
        ]
        .into_iter()
        .find(|t| t.label() == wanted)
        .ok_or_else(|| ThemeError::UnknownTheme(s.to_string()))
    }
}

/// What RetroBot remembers about the user between sessions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Applied theme
    pub current_theme: Theme,
    /// Themes available to apply, in unlock order
    pub unlocked_themes: Vec<Theme>,
    /// Messages the user has sent, ever
    pub interaction_count: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            current_theme: Theme::Default,
            unlocked_themes: Theme::STARTER.to_vec(),
            interaction_count: 0,
        }
    }
}

impl Profile {
    /// Whether `theme` may be applied
    #[must_use]
    pub fn is_unlocked(&self, theme: Theme) -> bool {
        self.unlocked_themes.contains(&theme)
    }

    /// Unlock `theme`; returns `true` if it was newly unlocked
    pub fn unlock(&mut self, theme: Theme) -> bool {
        if self.is_unlocked(theme) {
            return false;
        }
        self.unlocked_themes.push(theme);
        true
    }

    /// Make `theme` current
    ///
    /// # Errors
    ///
    /// [`ThemeError::Locked`] if it has not been unlocked.
    pub fn apply(&mut self, theme: Theme) -> Result<(), ThemeError> {
        if !self.is_unlocked(theme) {
            return Err(ThemeError::Locked(theme));
        }
        self.current_theme = theme;
        Ok(())
    }

    /// Themes the interaction count has earned but not yet unlocked
    #[must_use]
    pub fn earned_by_interactions(&self) -> Vec<Theme> {
        let mut earned = Vec::new();
        if self.interaction_count >= PURPLE_AFTER && !self.is_unlocked(Theme::Purple) {
            earned.push(Theme::Purple);
        }
        if self.interaction_count >= RED_AFTER && !self.is_unlocked(Theme::Red) {
            earned.push(Theme::Red);
        }
        earned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_starter_profile() {
        let profile = Profile::default();
        assert!(profile.is_unlocked(Theme::Amber));
        assert!(!profile.is_unlocked(Theme::Rainbow));
        assert_eq!(profile.current_theme, Theme::Default);
    }

    #[test]
    fn test_locked_theme_refused() {
        let mut profile = Profile::default();
        assert_eq!(profile.apply(Theme::C64), Err(ThemeError::Locked(Theme::C64)));
        assert!(profile.unlock(Theme::C64));
        assert!(!profile.unlock(Theme::C64));
        assert_eq!(profile.apply(Theme::C64), Ok(()));
        assert_eq!(profile.current_theme, Theme::C64);
    }

    #[test]
    fn test_interaction_unlocks() {
        let mut profile = Profile {
            interaction_count: 26,
            ..Profile::default()
        };
        assert_eq!(profile.earned_by_interactions(), vec![Theme::Purple, Theme::Red]);
        profile.unlock(Theme::Purple);
        assert_eq!(profile.earned_by_interactions(), vec![Theme::Red]);
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!("Apple2".parse::<Theme>(), Ok(Theme::Apple2));
        assert_eq!(
            "neon".parse::<Theme>(),
            Err(ThemeError::UnknownTheme("neon".into()))
        );
    }

    #[test]
    fn test_profile_json_shape() {
        let json = serde_json::to_value(Profile::default()).unwrap();
        assert_eq!(json["currentTheme"], "default");
        assert_eq!(json["unlockedThemes"][2], "blue");
        assert_eq!(json["interactionCount"], 0);
    }
}
