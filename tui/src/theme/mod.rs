//! Theme and Colors
//!
//! Terminal palettes for RetroBot's themes. The core decides which theme is
//! showing; this module only knows what each one looks like.

use ratatui::style::Color;
use retrobot_core::Theme;

// ============================================================================
// Phosphor Palettes
// ============================================================================

/// Green phosphor text
pub const GREEN_FG: Color = Color::Rgb(51, 255, 102);

/// Green phosphor dim
pub const GREEN_DIM: Color = Color::Rgb(20, 110, 45);

/// Amber monochrome text
pub const AMBER_FG: Color = Color::Rgb(255, 176, 0);

/// Amber dim
pub const AMBER_DIM: Color = Color::Rgb(120, 80, 0);

/// Blue terminal text
pub const BLUE_FG: Color = Color::Rgb(120, 180, 255);

/// Blue terminal background
pub const BLUE_BG: Color = Color::Rgb(0, 20, 60);

/// Purple haze text
pub const PURPLE_FG: Color = Color::Rgb(200, 140, 255);

/// Red alert text
pub const RED_FG: Color = Color::Rgb(255, 80, 80);

// ============================================================================
// Retro Machines
// ============================================================================

/// Commodore 64 light blue on dark blue
pub const C64_FG: Color = Color::Rgb(134, 122, 222);

/// Commodore 64 background
pub const C64_BG: Color = Color::Rgb(72, 58, 170);

/// Apple II green
pub const APPLE2_FG: Color = Color::Rgb(20, 245, 60);

/// Atari orange
pub const ATARI_FG: Color = Color::Rgb(228, 120, 40);

// ============================================================================
// Holidays
// ============================================================================

/// Christmas red
pub const CHRISTMAS_FG: Color = Color::Rgb(220, 40, 40);

/// Christmas green
pub const CHRISTMAS_ACCENT: Color = Color::Rgb(30, 160, 60);

/// Halloween orange
pub const HALLOWEEN_FG: Color = Color::Rgb(255, 120, 0);

/// Halloween purple
pub const HALLOWEEN_ACCENT: Color = Color::Rgb(130, 50, 170);

// ============================================================================
// UI Colors
// ============================================================================

/// Window background for most themes
pub const SCREEN_BG: Color = Color::Rgb(8, 12, 8);

/// Speech bubble text from the user
pub const USER_TEXT: Color = Color::Rgb(200, 200, 200);

/// Error banner
pub const ERROR_TEXT: Color = Color::Rgb(255, 100, 100);

/// Colours for one theme
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Main text and sprite colour
    pub fg: Color,
    /// Window background
    pub bg: Color,
    /// Borders, highlights and the mood bar
    pub accent: Color,
    /// Secondary text
    pub dim: Color,
}

/// Palette for `theme`
///
/// Rainbow has no fixed colours; [`rainbow_at`] cycles it.
#[must_use]
pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Default => Palette {
            fg: GREEN_FG,
            bg: SCREEN_BG,
            accent: GREEN_FG,
            dim: GREEN_DIM,
        },
        Theme::Amber => Palette {
            fg: AMBER_FG,
            bg: SCREEN_BG,
            accent: AMBER_FG,
            dim: AMBER_DIM,
        },
        Theme::Blue => Palette {
            fg: BLUE_FG,
            bg: BLUE_BG,
            accent: Color::White,
            dim: Color::Rgb(60, 90, 140),
        },
        Theme::Purple => Palette {
            fg: PURPLE_FG,
            bg: Color::Rgb(20, 5, 30),
            accent: Color::Rgb(255, 120, 220),
            dim: Color::Rgb(100, 70, 130),
        },
        Theme::Red => Palette {
            fg: RED_FG,
            bg: Color::Rgb(25, 0, 0),
            accent: Color::Rgb(255, 200, 0),
            dim: Color::Rgb(130, 40, 40),
        },
        Theme::Rainbow => rainbow_at(0),
        Theme::C64 => Palette {
            fg: C64_FG,
            bg: C64_BG,
            accent: Color::White,
            dim: Color::Rgb(100, 90, 190),
        },
        Theme::Apple2 => Palette {
            fg: APPLE2_FG,
            bg: Color::Black,
            accent: APPLE2_FG,
            dim: Color::Rgb(10, 110, 30),
        },
        Theme::Atari => Palette {
            fg: ATARI_FG,
            bg: Color::Rgb(30, 15, 0),
            accent: Color::Rgb(255, 220, 120),
            dim: Color::Rgb(120, 60, 20),
        },
        Theme::Christmas => Palette {
            fg: CHRISTMAS_FG,
            bg: Color::Rgb(5, 20, 5),
            accent: CHRISTMAS_ACCENT,
            dim: Color::Rgb(120, 120, 120),
        },
        Theme::Halloween => Palette {
            fg: HALLOWEEN_FG,
            bg: Color::Black,
            accent: HALLOWEEN_ACCENT,
            dim: Color::Rgb(110, 60, 20),
        },
    }
}

/// Rainbow palette `ms` into its cycle (one lap every three seconds)
#[must_use]
pub fn rainbow_at(ms: u64) -> Palette {
    let hue = (ms % 3_000) as f32 / 3_000.0 * 360.0;
    Palette {
        fg: hue_to_rgb(hue),
        bg: SCREEN_BG,
        accent: hue_to_rgb((hue + 120.0) % 360.0),
        dim: Color::Rgb(90, 90, 90),
    }
}

/// Fully saturated colour at `hue` degrees
#[must_use]
pub fn hue_to_rgb(hue: f32) -> Color {
    let sector = (hue / 60.0).floor() as u8 % 6;
    let f = hue / 60.0 - (hue / 60.0).floor();
    let rise = (255.0 * f) as u8;
    let fall = 255 - rise;
    let (r, g, b) = match sector {
        0 => (255, rise, 0),
        1 => (fall, 255, 0),
        2 => (0, 255, rise),
        3 => (0, fall, 255),
        4 => (rise, 0, 255),
        _ => (255, 0, fall),
    };
    Color::Rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_theme_has_readable_contrast() {
        for theme in [
            Theme::Default,
            Theme::Amber,
            Theme::Blue,
            Theme::Purple,
            Theme::Red,
            Theme::C64,
            Theme::Apple2,
            Theme::Atari,
            Theme::Christmas,
            Theme::Halloween,
        ] {
            let p = palette(theme);
            assert_ne!(p.fg, p.bg, "{theme:?}");
        }
    }

    #[test]
    fn test_hue_wheel_corners() {
        assert_eq!(hue_to_rgb(0.0), Color::Rgb(255, 0, 0));
        assert_eq!(hue_to_rgb(120.0), Color::Rgb(0, 255, 0));
        assert_eq!(hue_to_rgb(240.0), Color::Rgb(0, 0, 255));
    }

    #[test]
    fn test_rainbow_cycles() {
        assert_eq!(rainbow_at(0), rainbow_at(3_000));
        assert_ne!(rainbow_at(0).fg, rainbow_at(1_000).fg);
    }
}
