//! RetroBot Core - Headless Brain of the 8-bit Desktop Assistant
//!
//! This crate holds everything RetroBot does, with no idea how it is drawn.
//! A terminal UI, a scripted headless runner and the test suite all drive the
//! same [`Shell`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Surfaces                              │
//! │   ┌──────────────┐   ┌──────────────────┐   ┌─────────────┐  │
//! │   │ TUI          │   │ retrobot-headless │   │ Tests       │  │
//! │   │ (ratatui)    │   │ (script runner)   │   │             │  │
//! │   └──────┬───────┘   └─────────┬────────┘   └──────┬──────┘  │
//! │          └─────────────────────┼───────────────────┘         │
//! │                      ShellEvent (up)                          │
//! │                  StampedMessage (down)                        │
//! └────────────────────────────────┼─────────────────────────────┘
//!                                  │
//! ┌────────────────────────────────┼─────────────────────────────┐
//! │                            Shell                              │
//! │  ┌───────────┐ ┌──────────┐ ┌──────────┐ ┌─────────────────┐ │
//! │  │ Animation │ │  Mood    │ │ Dialogue │ │ Sequence matcher│ │
//! │  │ engine    │ │ machine  │ │ selector │ │ (easter eggs)   │ │
//! │  └───────────┘ └──────────┘ └──────────┘ └─────────────────┘ │
//! │  ┌───────────┐ ┌──────────┐ ┌──────────┐ ┌─────────────────┐ │
//! │  │ Calendar  │ │  Todo    │ │  Music   │ │ Themes/profile  │ │
//! │  └───────────┘ └──────────┘ └──────────┘ └─────────────────┘ │
//! │             Storage · SoundPlayer · TargetResolver            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Shell`]: owns every component and the simulated clock
//! - [`ShellEvent`]: what a surface reports
//! - [`ShellMessage`]: what a surface renders
//! - [`AnimationEngine`]: named, timed effect tags with blocking and queueing
//! - [`MoodMachine`]: happy / annoyed / sleepy plus a 0..=100 level
//! - [`SequenceMatcher`]: key-sequence easter eggs with a global cooldown
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use retrobot_core::{
//!     Collaborators, EffectBoard, MemoryStorage, RetroBotConfig, Shell, ShellEvent, Silent,
//! };
//! use tokio::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let mut shell = Shell::new(
//!     RetroBotConfig::default(),
//!     Collaborators {
//!         storage: Arc::new(MemoryStorage::new()),
//!         sound: Box::new(Silent),
//!         targets: Box::new(EffectBoard::window()),
//!     },
//!     tx,
//! )?;
//!
//! shell.start();
//! shell.advance_to(500);
//! shell.handle_event(ShellEvent::UserMessage { content: "hi!".into() });
//! shell.advance_by(300);
//!
//! while let Ok(msg) = rx.try_recv() {
//!     // render msg
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`animation`]: animation registry, engine and effect targets
//! - [`clock`]: simulated timer queue
//! - [`config`]: TOML + environment configuration
//! - [`dialogue`]: topic/sentiment detection and reply tables
//! - [`events`]: events from surfaces to the shell
//! - [`messages`]: messages from the shell to surfaces
//! - [`mood`]: mood state machine
//! - [`script`]: line-oriented scripts for the headless driver
//! - [`sequence`]: key-sequence matching
//! - [`shell`]: the orchestration core
//! - [`sound`]: sound effect sink
//! - [`storage`]: key/value persistence
//! - [`theme`]: themes, unlocks and the saved profile
//! - [`tools`]: calendar, todo and music
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod clock;
pub mod config;
pub mod dialogue;
pub mod events;
pub mod messages;
pub mod mood;
pub mod script;
pub mod sequence;
pub mod shell;
pub mod sound;
pub mod storage;
pub mod theme;
pub mod tools;

// Re-export main types for convenience
pub use animation::{
    AnimationEngine, AnimationError, AnimationSpec, EffectBoard, EngineEvent, TargetResolver,
    VisibilityFlag,
};
pub use config::{load_config, load_config_from_path, ConfigError, ConfigOverrides, RetroBotConfig};
pub use dialogue::{DialogueSelector, Reply};
pub use events::{CalendarCommand, MusicCommand, QuickAction, ShellEvent, TodoCommand};
pub use messages::{ShellMessage, StampedMessage};
pub use mood::{Mood, MoodMachine, MoodState};
pub use sequence::{EasterEgg, SequenceMatcher};
pub use shell::{Collaborators, InputFocus, Shell};
pub use sound::{Silent, SoundKind, SoundLog, SoundPlayer};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use theme::{Profile, Theme};
pub use tools::Tool;
