//! RetroBot TUI - Terminal surface for the 8-bit desktop assistant
//!
//! A full-screen terminal window around [`retrobot_core::Shell`]. All
//! behaviour lives in the core; this crate turns keys into events and
//! messages into pixels.
//!
//! # Architecture
//!
//! - **App**: event loop, shell clock and frame rendering
//! - **Display**: state folded from shell messages
//! - **Keys**: key bindings and browser-style key codes
//! - **Avatar**: block-character sprites per mood
//! - **Theme**: palettes for every theme
//! - **Bell**: the terminal bell as a sound player

pub mod app;
pub mod avatar;
pub mod bell;
pub mod display;
pub mod keys;
pub mod theme;

pub use app::App;
