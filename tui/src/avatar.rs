//! Avatar Sprites
//!
//! RetroBot's face in block characters. One base sprite per mood, with the
//! idle fidgets and the speaking mouth patched over it.

use retrobot_core::animation::IdleMicro;
use retrobot_core::Mood;

/// Sprite width in cells
pub const WIDTH: u16 = 11;

/// Sprite height in cells
pub const HEIGHT: u16 = 7;

const HAPPY: [&str; 7] = [
    "    _|_    ",
    " ┌───────┐ ",
    " │ ◉   ◉ │ ",
    " │   ▾   │ ",
    " │ ╰───╯ │ ",
    " └┬─────┬┘ ",
    "  ┘     └  ",
];

const ANNOYED: [&str; 7] = [
    "    _|_    ",
    " ┌───────┐ ",
    " │ ▬   ▬ │ ",
    " │ ◣   ◢ │ ",
    " │ ╭───╮ │ ",
    " └┬─────┬┘ ",
    "  ┘     └  ",
];

const SLEEPY: [&str; 7] = [
    "    _|_  z ",
    " ┌───────┐ ",
    " │ ─   ─ │ ",
    " │       │ ",
    " │  ───  │ ",
    " └┬─────┬┘ ",
    "  ┘     └  ",
];

/// What the sprite is doing this frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pose {
    /// Idle fidget, if one is playing
    pub idle: Option<IdleMicro>,
    /// Mouth open for speech
    pub speaking: bool,
    /// Frame counter for alternating poses
    pub tick: u64,
}

/// Sprite rows for `mood` in `pose`
#[must_use]
pub fn sprite(mood: Mood, pose: Pose) -> Vec<String> {
    let base = match mood {
        Mood::Happy => HAPPY,
        Mood::Annoyed => ANNOYED,
        Mood::Sleepy => SLEEPY,
    };
    let mut rows: Vec<String> = base.iter().map(|r| (*r).to_string()).collect();

    match pose.idle {
        Some(IdleMicro::Blink) => rows[2] = " │ ─   ─ │ ".to_string(),
        Some(IdleMicro::LookAround) => {
            rows[2] = if pose.tick % 2 == 0 {
                " │◉   ◉  │ ".to_string()
            } else {
                " │  ◉   ◉│ ".to_string()
            };
        }
        Some(IdleMicro::Yawn) => rows[4] = " │  ( )  │ ".to_string(),
        Some(IdleMicro::Stretch) => rows[0] = "   \\_|_/   ".to_string(),
        Some(IdleMicro::Bounce) | None => {}
    }

    if pose.speaking && pose.tick % 2 == 0 {
        rows[4] = " │  ▭▭▭  │ ".to_string();
    }
    rows
}

/// Vertical lift for the current pose
#[must_use]
pub fn lift(pose: Pose) -> u16 {
    match pose.idle {
        Some(IdleMicro::Bounce) if pose.tick % 2 == 0 => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use unicode_width::UnicodeWidthStr;

    #[test]
    fn test_sprites_are_rectangular() {
        for mood in Mood::ALL {
            for idle in [None, Some(IdleMicro::LookAround), Some(IdleMicro::Yawn)] {
                let rows = sprite(
                    mood,
                    Pose {
                        idle,
                        speaking: true,
                        tick: 0,
                    },
                );
                assert_eq!(rows.len(), HEIGHT as usize);
                for row in rows {
                    assert_eq!(row.width(), WIDTH as usize, "{mood:?} {row:?}");
                }
            }
        }
    }

    #[test]
    fn test_blink_closes_eyes() {
        let rows = sprite(
            Mood::Happy,
            Pose {
                idle: Some(IdleMicro::Blink),
                ..Pose::default()
            },
        );
        assert!(!rows[2].contains('◉'));
    }

    #[test]
    fn test_bounce_lifts_on_even_ticks() {
        let pose = Pose {
            idle: Some(IdleMicro::Bounce),
            ..Pose::default()
        };
        assert_eq!(lift(pose), 1);
        assert_eq!(lift(Pose { tick: 1, ..pose }), 0);
    }
}
