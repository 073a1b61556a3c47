//! Shell - The Orchestration Core
//!
//! The Shell is RetroBot's brain. It owns every component and wires them
//! together:
//! - Animation engine and mood state machine
//! - Dialogue selection and the delayed reply
//! - Easter-egg sequence matching and theme previews
//! - Calendar, todo and music tools
//! - Window lifecycle (power on/off, minimize, auto-hide)
//!
//! # Design Philosophy
//!
//! The Shell is surface-agnostic. A TUI, a headless script runner and the
//! test suite all talk to it the same way:
//! - `ShellEvent`: what the user did, sent TO the shell
//! - `ShellMessage`: what to show, sent FROM the shell
//!
//! Nothing in here reads the wall clock or sleeps. Time is simulated: the
//! surface calls [`Shell::advance_to`] and every due timer (animation
//! cleanups, idle ticks, delayed replies, theme restores) fires in order.
//! Two runs with the same seed and the same inputs produce the same
//! message stream.

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::animation::{
    names, AnimationEngine, Completion, EngineEvent, IdleMicro, Payload, SpecialEffect,
    TargetResolver, VisibilityFlag,
};
use crate::clock::{Scheduler, TimerId};
use crate::config::RetroBotConfig;
use crate::dialogue::{
    DialogueAction, DialogueContext, DialogueSelector, HistoryEntry, USERNAME_KEY, WELCOME,
};
use crate::events::{CalendarCommand, MusicCommand, QuickAction, ShellEvent, TodoCommand};
use crate::messages::{AnimationPhase, NotificationId, ShellMessage, StampedMessage};
use crate::mood::{Mood, MoodMachine, MoodState};
use crate::sequence::{EasterEgg, SequenceMatcher};
use crate::sound::{SoundKind, SoundPlayer};
use crate::storage::{load_as, load_or_default, save_as, Storage};
use crate::theme::{Profile, Theme, ThemeError, PROFILE_KEY};
use crate::tools::calendar::{self, Calendar, EventMap, EVENTS_KEY};
use crate::tools::music::{self, MusicPlayer, MusicSettings, PlayState, SETTINGS_KEY};
use crate::tools::todo::{self, TodoList, ToggleOutcome, TODOS_KEY};
use crate::tools::{Tool, ToolError};

// ============================================================================
// Lines
// ============================================================================

const HELP_LINE: &str =
    "I can help with calendars 📅, todos ✅, music 🎵, and casual chat! What do you need?";
const FOCUS_LINE: &str = "Welcome back! Miss me? 😊";
const SLEEPY_LINE: &str = "Getting sleepy... I'll be here if you need me! 😴";
const NAP_LINE: &str = "Taking a quick nap... 😴";
const AWAKE_LINE: &str = "Back in action! 🚀";
const LOCKED_LINE: &str = "Theme locked! Complete more interactions to unlock! 🔒";
const GLITCH_RESTORED_LINE: &str = "System restored! That was... intense! 😅";

/// Glitch flashes before the theme is restored
const GLITCH_FLASHES: u8 = 10;
/// Gap between glitch flashes
const GLITCH_FLASH_MS: u64 = 200;
/// Gap between retro theme steps
const RETRO_STEP_MS: u64 = 1_000;
/// How long the matrix preview stays up
const MATRIX_PREVIEW_MS: u64 = 10_000;

// ============================================================================
// Collaborators
// ============================================================================

/// Host services the shell depends on
pub struct Collaborators {
    /// Where state is persisted
    pub storage: Arc<dyn Storage>,
    /// Where sounds go
    pub sound: Box<dyn SoundPlayer>,
    /// Where animation tags go
    pub targets: Box<dyn TargetResolver>,
}

/// Whether keystrokes currently belong to the text input
///
/// Keys typed into the input never reach the easter-egg matcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFocus {
    typing: bool,
}

impl InputFocus {
    /// Record a focus change
    pub fn set(&mut self, typing: bool) {
        self.typing = typing;
    }

    /// The user is typing into the input
    #[must_use]
    pub fn is_typing(self) -> bool {
        self.typing
    }

    /// Keys should be fed to the sequence matcher
    #[must_use]
    pub fn admits_sequence_keys(self) -> bool {
        !self.typing
    }
}

/// Shell-level timers, merged with the engine's on one timeline
#[derive(Clone, Debug, PartialEq, Eq)]
enum ShellTimer {
    /// Window appears after startup
    Startup,
    /// Deliver a chat reply
    Deliver(String),
    /// Inactivity reached
    AutoHide,
    /// Sleepy long enough to minimize
    AutoMinimize,
    /// Remove a notification
    ExpireNotification(NotificationId),
    /// Play one chime note
    Chime(SoundKind),
    /// End a theme preview
    RestoreTheme,
    /// Next theme of the retro cycle
    RetroStep(usize),
    /// One glitch flash; the count goes up to `GLITCH_FLASHES`
    GlitchFlash(u8),
    /// The playing track ran out
    TrackEnded,
}

// ============================================================================
// Shell
// ============================================================================

/// The orchestration core
pub struct Shell {
    config: RetroBotConfig,
    storage: Arc<dyn Storage>,
    sound: Box<dyn SoundPlayer>,

    engine: AnimationEngine,
    engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    visibility: VisibilityFlag,
    timers: Scheduler<ShellTimer>,

    mood: MoodMachine,
    dialogue: DialogueSelector,
    sequences: SequenceMatcher,
    profile: Profile,
    displayed_theme: Theme,

    tool: Tool,
    todo: TodoList,
    calendar: Calendar,
    music: MusicPlayer,

    input: InputFocus,
    minimized: bool,
    started_at: NaiveDateTime,
    next_notification: NotificationId,
    auto_hide: Option<TimerId>,
    track_timer: Option<TimerId>,
    rng: StdRng,

    tx: mpsc::UnboundedSender<StampedMessage>,
    quit: bool,
}

impl Shell {
    /// Build a shell and restore saved state
    ///
    /// The window starts hidden; [`Shell::start`] brings it up. Local time
    /// starts at the Unix epoch unless [`Shell::with_start_time`] says
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Fails if the built-in animations cannot be registered.
    pub fn new(
        config: RetroBotConfig,
        collaborators: Collaborators,
        tx: mpsc::UnboundedSender<StampedMessage>,
    ) -> Result<Self, crate::animation::AnimationError> {
        let Collaborators {
            storage,
            sound,
            targets,
        } = collaborators;

        let mut master = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let engine_rng = StdRng::seed_from_u64(master.gen());
        let dialogue_rng = StdRng::seed_from_u64(master.gen());

        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let visibility = VisibilityFlag::new(false);
        let mut engine = AnimationEngine::new(targets, visibility.clone(), engine_tx)
            .with_rng(engine_rng)
            .with_idle_range(config.idle_range());
        engine.register_defaults()?;

        let started_at = NaiveDateTime::default();
        let profile: Profile = load_or_default(storage.as_ref(), PROFILE_KEY);
        let events: EventMap = load_or_default(storage.as_ref(), EVENTS_KEY);
        let settings: MusicSettings = load_or_default(storage.as_ref(), SETTINGS_KEY);
        let user_name: Option<String> = load_as(storage.as_ref(), USERNAME_KEY);

        Ok(Self {
            sequences: SequenceMatcher::with_easter_eggs(config.easter_egg_cooldown_ms),
            mood: MoodMachine::load(Arc::clone(&storage)),
            dialogue: DialogueSelector::new(dialogue_rng).with_user_name(user_name),
            displayed_theme: profile.current_theme,
            profile,
            tool: Tool::Chat,
            todo: load_or_default(storage.as_ref(), TODOS_KEY),
            calendar: Calendar::with_events(events, started_at.date()),
            music: MusicPlayer::from_settings(settings),
            input: InputFocus::default(),
            minimized: false,
            started_at,
            next_notification: 0,
            auto_hide: None,
            track_timer: None,
            rng: master,
            timers: Scheduler::new(),
            engine,
            engine_rx,
            visibility,
            config,
            storage,
            sound,
            tx,
            quit: false,
        })
    }

    /// Set the local time that simulated time zero corresponds to
    #[must_use]
    pub fn with_start_time(mut self, start: NaiveDateTime) -> Self {
        self.started_at = start;
        self.calendar = Calendar::with_events(self.calendar.events().clone(), start.date());
        self
    }

    /// Boot sequence: restore the theme and mood, then schedule the window
    pub fn start(&mut self) {
        info!(seed = ?self.config.seed, "RetroBot starting");

        for theme in self.profile.earned_by_interactions() {
            self.unlock_theme(theme);
        }
        self.send(ShellMessage::ThemeApplied {
            theme: self.displayed_theme,
            preview: false,
        });

        let mood = self.mood.mood();
        self.change_mood(mood);
        self.timers
            .schedule(self.config.show_delay_ms, ShellTimer::Startup);
        self.engine.start_idle_loop();
        self.pump_engine_events();
    }

    // ========================================================================
    // Event dispatch
    // ========================================================================

    /// Handle one event from a surface
    pub fn handle_event(&mut self, event: ShellEvent) {
        if self.quit {
            debug!(?event, "Shell stopped, ignoring event");
            return;
        }

        let interaction = !matches!(
            event,
            ShellEvent::WindowFocused
                | ShellEvent::WindowBlurred
                | ShellEvent::Hide
                | ShellEvent::Quit
                | ShellEvent::InputFocus { .. }
        );

        match event {
            ShellEvent::UserMessage { content } => self.handle_user_message(&content),
            ShellEvent::QuickAction { action } => self.handle_quick_action(action),
            ShellEvent::KeyPressed { code } => self.handle_key(&code),
            ShellEvent::InputFocus { focused } => self.input.set(focused),
            ShellEvent::Show => self.show(),
            ShellEvent::Hide => self.hide(),
            ShellEvent::ToggleMinimize => self.toggle_minimize(),
            ShellEvent::WindowFocused => {
                if self.is_visible() {
                    self.speak(FOCUS_LINE, Some(Mood::Happy));
                }
            }
            ShellEvent::WindowBlurred => {
                if self.is_visible() {
                    self.change_mood(Mood::Sleepy);
                }
            }
            ShellEvent::SwitchTool { tool } => self.switch_tool(tool),
            ShellEvent::SetMood { mood } => match mood.parse::<Mood>() {
                Ok(mood) => self.change_mood(mood),
                Err(e) => self.send_error(e.to_string()),
            },
            ShellEvent::ApplyTheme { theme } => match theme.parse::<Theme>() {
                Ok(theme) => self.apply_theme(theme),
                Err(e) => self.send_error(e.to_string()),
            },
            ShellEvent::Todo(command) => self.handle_todo(command),
            ShellEvent::Calendar(command) => self.handle_calendar(command),
            ShellEvent::Music(command) => self.handle_music(command),
            ShellEvent::Quit => self.shutdown(),
        }

        if interaction && !self.quit {
            self.reset_auto_hide();
        }
        self.pump_engine_events();
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Fire everything due up to `ms`, engine and shell timers interleaved
    ///
    /// When an engine timer and a shell timer share a due time, the engine
    /// goes first.
    pub fn advance_to(&mut self, ms: u64) {
        loop {
            let engine_due = self.engine.next_due().filter(|&due| due <= ms);
            let shell_due = self.timers.next_due().filter(|&due| due <= ms);

            match (engine_due, shell_due) {
                (None, None) => break,
                (Some(e), Some(s)) if s < e => self.fire_shell_timer(ms),
                (Some(_), _) => {
                    self.engine.fire_next(ms);
                    self.timers.advance_to(self.engine.now_ms());
                }
                (None, Some(_)) => self.fire_shell_timer(ms),
            }
            self.pump_engine_events();
        }

        self.engine.advance_to(ms);
        self.timers.advance_to(ms);
        self.pump_engine_events();
    }

    /// Advance by `ms` from the current time
    pub fn advance_by(&mut self, ms: u64) {
        self.advance_to(self.now_ms().saturating_add(ms));
    }

    /// Earliest pending timer of either kind
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        match (self.engine.next_due(), self.timers.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn fire_shell_timer(&mut self, until_ms: u64) {
        let Some((id, timer)) = self.timers.pop_due(until_ms) else {
            return;
        };
        self.engine.sync_clock(self.timers.now_ms());
        debug!(timer = %id, ?timer, "Shell timer fired");

        match timer {
            ShellTimer::Startup => {
                self.show();
                self.speak(WELCOME, None);
                self.check_special_dates();
            }
            ShellTimer::Deliver(text) => self.speak(&text, None),
            ShellTimer::AutoHide => {
                self.auto_hide = None;
                if self.is_visible() {
                    self.speak(SLEEPY_LINE, Some(Mood::Sleepy));
                    self.timers
                        .schedule(self.config.auto_minimize_ms, ShellTimer::AutoMinimize);
                }
            }
            ShellTimer::AutoMinimize => {
                if self.is_visible() && !self.minimized && self.mood.mood() == Mood::Sleepy {
                    self.minimized = true;
                    self.send_window();
                }
            }
            ShellTimer::ExpireNotification(id) => {
                self.send(ShellMessage::NotificationExpired { id });
            }
            ShellTimer::Chime(kind) => self.sound.play(kind),
            ShellTimer::RestoreTheme => self.restore_theme(),
            ShellTimer::RetroStep(step) => match Theme::RETRO_CYCLE.get(step) {
                Some(&theme) => {
                    self.preview_theme(theme);
                    self.timers
                        .schedule(RETRO_STEP_MS, ShellTimer::RetroStep(step + 1));
                }
                None => self.restore_theme(),
            },
            ShellTimer::GlitchFlash(count) => {
                if count >= GLITCH_FLASHES {
                    self.restore_theme();
                    self.speak(GLITCH_RESTORED_LINE, Some(Mood::Happy));
                } else {
                    let theme = Theme::GLITCH_POOL
                        .choose(&mut self.rng)
                        .copied()
                        .unwrap_or(Theme::Default);
                    self.preview_theme(theme);
                    self.timers
                        .schedule(GLITCH_FLASH_MS, ShellTimer::GlitchFlash(count + 1));
                }
            }
            ShellTimer::TrackEnded => {
                self.track_timer = None;
                self.on_track_ended();
            }
        }
    }

    fn pump_engine_events(&mut self) {
        while let Ok(event) = self.engine_rx.try_recv() {
            match event {
                EngineEvent::Started { name, .. } => self.send(ShellMessage::Animation {
                    name,
                    phase: AnimationPhase::Started,
                }),
                EngineEvent::Completed {
                    name,
                    completion,
                    payload,
                    ..
                } => {
                    self.send(ShellMessage::Animation {
                        name,
                        phase: AnimationPhase::Finished,
                    });
                    match (completion, payload) {
                        (Some(Completion::MoodEffects), Payload::Mood(mood)) => {
                            self.send(ShellMessage::MoodEffects {
                                mood,
                                effects: crate::mood::mood_effects(mood),
                            });
                        }
                        (Some(Completion::PowerDown), _) => self.send_window(),
                        _ => {}
                    }
                }
                EngineEvent::Idle { micro, .. } => {
                    if micro == IdleMicro::Yawn && self.mood.mood() != Mood::Sleepy {
                        continue;
                    }
                    self.send(ShellMessage::Idle { micro });
                }
            }
        }
    }

    // ========================================================================
    // Conversation
    // ========================================================================

    fn handle_user_message(&mut self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }

        self.profile.interaction_count += 1;
        for theme in self.profile.earned_by_interactions() {
            self.unlock_theme(theme);
        }

        let ctx = DialogueContext {
            mood: self.mood.state(),
            now: self.local_now(),
        };
        let reply = self.dialogue.respond(content, &ctx);
        debug!(topic = ?reply.topic, sentiment = ?reply.sentiment, "Reply selected");

        for action in reply.actions {
            match action {
                DialogueAction::SwitchTool(tool) => self.switch_tool(tool),
                DialogueAction::AdjustLevel(delta) => self.adjust_level(delta),
                DialogueAction::ChangeMood(mood) => self.change_mood(mood),
                DialogueAction::RememberName(name) => {
                    save_as(self.storage.as_ref(), USERNAME_KEY, &name);
                }
            }
        }

        self.trigger(names::BUTTON_PRESS);
        let lower = content.to_lowercase();
        let delta = if lower.contains("help") {
            10
        } else if lower.contains("stupid") || lower.contains("bad") {
            -20
        } else {
            5
        };
        self.adjust_level(delta);

        self.timers
            .schedule(self.config.reply_delay_ms, ShellTimer::Deliver(reply.text));
        self.save_profile();
    }

    fn handle_quick_action(&mut self, action: QuickAction) {
        self.trigger(names::BUTTON_PRESS);
        match action {
            QuickAction::Help => self.speak(HELP_LINE, Some(Mood::Happy)),
            QuickAction::Time => {
                let time = self.local_now().format("%-I:%M:%S %p");
                self.speak(
                    &format!("Current time: {time}. Time flies in the digital realm! ⏰"),
                    None,
                );
            }
            QuickAction::Joke => {
                let joke = self.dialogue.programmer_joke();
                self.speak(&joke, Some(Mood::Happy));
            }
            QuickAction::Mood => {
                let state = self.mood.state();
                self.speak(
                    &format!(
                        "I'm feeling {} right now! Mood level: {}%. How are you doing? 🎭",
                        state.mood.label(),
                        state.level
                    ),
                    None,
                );
            }
        }
    }

    fn switch_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        info!(from = %self.tool, to = %tool, "Switching tool");
        self.tool = tool;
        self.trigger(names::TOOL_SWITCH);
        self.send(ShellMessage::ToolSwitched { tool });
        self.speak(tool.greeting(), None);
        self.sound.play(SoundKind::Beep);
        self.adjust_level(5);
    }

    // ========================================================================
    // Window
    // ========================================================================

    fn show(&mut self) {
        info!("Powering on");
        self.visibility.set(true);
        self.send_window();
        self.trigger(names::POWER_ON);
        self.sound.play(SoundKind::PowerOn);
        self.reset_auto_hide();
    }

    fn hide(&mut self) {
        info!("Powering off");
        self.visibility.set(false);
        self.trigger(names::POWER_OFF);
        self.sound.play(SoundKind::PowerOff);
        if let Some(id) = self.auto_hide.take() {
            self.timers.cancel(id);
        }
    }

    fn toggle_minimize(&mut self) {
        self.minimized = !self.minimized;
        if self.minimized {
            self.speak(NAP_LINE, Some(Mood::Sleepy));
        } else {
            self.speak(AWAKE_LINE, Some(Mood::Happy));
        }
        self.send_window();
    }

    fn reset_auto_hide(&mut self) {
        if let Some(id) = self.auto_hide.take() {
            self.timers.cancel(id);
        }
        if self.is_visible() {
            self.auto_hide = Some(
                self.timers
                    .schedule(self.config.auto_hide_ms, ShellTimer::AutoHide),
            );
        }
    }

    fn send_window(&mut self) {
        self.send(ShellMessage::Window {
            visible: self.is_visible(),
            minimized: self.minimized,
        });
    }

    fn shutdown(&mut self) {
        info!("RetroBot shutting down");
        let stopped = self.engine.stop_all();
        debug!(stopped, "Animations stopped for shutdown");
        self.pump_engine_events();
        self.save_profile();
        self.send(ShellMessage::Quit);
        self.quit = true;
    }

    // ========================================================================
    // Themes
    // ========================================================================

    fn apply_theme(&mut self, theme: Theme) {
        match self.profile.apply(theme) {
            Ok(()) => {
                info!(%theme, "Theme applied");
                self.displayed_theme = theme;
                self.send(ShellMessage::ThemeApplied {
                    theme,
                    preview: false,
                });
                self.trigger(names::THEME_TRANSITION);
                self.speak(
                    &format!("Theme changed to {theme}! Looking good! ✨"),
                    None,
                );
                self.save_profile();
            }
            Err(ThemeError::Locked(_)) => self.speak(LOCKED_LINE, Some(Mood::Annoyed)),
            Err(e) => self.send_error(e.to_string()),
        }
    }

    fn preview_theme(&mut self, theme: Theme) {
        self.displayed_theme = theme;
        self.send(ShellMessage::ThemeApplied {
            theme,
            preview: true,
        });
        self.trigger(names::THEME_TRANSITION);
    }

    fn restore_theme(&mut self) {
        self.displayed_theme = self.profile.current_theme;
        self.send(ShellMessage::ThemeApplied {
            theme: self.displayed_theme,
            preview: false,
        });
    }

    fn unlock_theme(&mut self, theme: Theme) {
        if self.profile.unlock(theme) {
            info!(%theme, "Theme unlocked");
            self.notify(&format!("🎉 New theme unlocked: {theme}!"));
            self.send(ShellMessage::ThemeUnlocked { theme });
            self.save_profile();
        }
    }

    fn check_special_dates(&mut self) {
        let today = self.local_now().date();
        match (today.month(), today.day()) {
            (12, 25) => {
                self.preview_theme(Theme::Christmas);
                self.speak("🎄 Merry Christmas! Ho ho ho! 🎅", Some(Mood::Happy));
            }
            (10, 31) => {
                self.preview_theme(Theme::Halloween);
                self.speak("👻 Happy Halloween! Boo-tiful day! 🎃", Some(Mood::Happy));
            }
            (1, 1) => {
                self.speak("🎊 Happy New Year! New year, new code! 🎆", Some(Mood::Happy));
                self.play_effect(SpecialEffect::Fire);
            }
            _ => {}
        }
    }

    // ========================================================================
    // Easter eggs
    // ========================================================================

    fn handle_key(&mut self, code: &str) {
        if !self.input.admits_sequence_keys() {
            return;
        }

        let report = self.sequences.feed(code, self.now_ms());
        for id in &report.near_complete {
            self.notify(&format!(
                "🎮 {} sequence almost complete...",
                id.to_uppercase()
            ));
        }
        let dispatched: Vec<String> = report.dispatched().map(str::to_string).collect();
        for id in dispatched {
            match EasterEgg::from_id(&id) {
                Some(egg) => self.trigger_easter_egg(egg),
                None => debug!(id = %id, "Custom sequence matched"),
            }
        }
    }

    fn trigger_easter_egg(&mut self, egg: EasterEgg) {
        info!(egg = egg.id(), "Easter egg activated");
        for (offset, note) in SoundKind::CHIME {
            if offset == 0 {
                self.sound.play(note);
            } else {
                self.timers.schedule(offset, ShellTimer::Chime(note));
            }
        }

        match egg {
            EasterEgg::Konami => {
                self.unlock_theme(Theme::Rainbow);
                self.apply_theme(Theme::Rainbow);
                self.speak(
                    "🎮 KONAMI CODE ACTIVATED! 🌈 Rainbow theme unlocked!",
                    Some(Mood::Happy),
                );
                for theme in Theme::KONAMI_REWARDS {
                    self.unlock_theme(theme);
                }
                self.play_effect(SpecialEffect::Rainbow);
                self.notify("🏆 ACHIEVEMENT: Konami Master!");
            }
            EasterEgg::Matrix => {
                self.speak(
                    "Welcome to the Matrix... I mean, RetroBot! 🕶️",
                    Some(Mood::Happy),
                );
                self.play_effect(SpecialEffect::Matrix);
                self.preview_theme(Theme::Default);
                self.timers
                    .schedule(MATRIX_PREVIEW_MS, ShellTimer::RestoreTheme);
                self.notify("🕶️ Matrix Mode Activated!");
            }
            EasterEgg::Retro => {
                self.speak(
                    "RETRO POWER ACTIVATED! Going full 8-bit! 🕹️",
                    Some(Mood::Happy),
                );
                self.preview_theme(Theme::RETRO_CYCLE[0]);
                self.timers.schedule(RETRO_STEP_MS, ShellTimer::RetroStep(1));
                self.notify("🕹️ Retro Master Achievement Unlocked!");
            }
            EasterEgg::Dance => {
                self.speak("Time to dance! Let's get groovy! 💃🕺", Some(Mood::Happy));
                self.play_effect(SpecialEffect::Dance);
                self.switch_tool(Tool::Music);
                self.notify("💃 Dance Mode Activated!");
            }
            EasterEgg::Glitch => {
                self.speak(
                    "01000111 01101100 01101001 01110100 01100011 01101000! ERROR ERROR! 🤖",
                    Some(Mood::Annoyed),
                );
                self.play_effect(SpecialEffect::Glitch);
                self.timers
                    .schedule(GLITCH_FLASH_MS, ShellTimer::GlitchFlash(0));
                self.notify("⚡ GLITCH MODE ACTIVATED!");
            }
        }
    }

    fn play_effect(&mut self, effect: SpecialEffect) {
        self.send(ShellMessage::Effect {
            effect,
            duration_ms: effect.duration_ms(),
        });
    }

    // ========================================================================
    // Tools
    // ========================================================================

    fn handle_todo(&mut self, command: TodoCommand) {
        let now = self.local_now();
        self.todo.roll_day(now.date());

        match command {
            TodoCommand::Add { text } => match self.todo.add(&text, now) {
                Ok(item) => {
                    let line = todo::added_line(item);
                    self.speak(&line, Some(Mood::Happy));
                    self.sound.play(SoundKind::Beep);
                }
                Err(ToolError::EmptyInput) => {
                    self.speak(todo::EMPTY_LINE, Some(Mood::Annoyed));
                    return;
                }
                Err(e) => {
                    self.send_error(e.to_string());
                    return;
                }
            },
            TodoCommand::AddSmart { text } => {
                let (clean, priority) = todo::parse_smart(&text);
                if clean.trim().is_empty() {
                    self.speak(todo::EMPTY_LINE, Some(Mood::Annoyed));
                    return;
                }
                let line = todo::added_line(self.todo.add_quick(clean, priority, now));
                self.speak(&line, Some(Mood::Happy));
                self.sound.play(SoundKind::Beep);
            }
            TodoCommand::Toggle { id } => match self.todo.toggle(id, now) {
                Ok(outcome) => {
                    self.on_todo_toggled(&outcome);
                    self.sound.play(SoundKind::Beep);
                }
                Err(e) => {
                    self.send_error(e.to_string());
                    return;
                }
            },
            TodoCommand::Remove { id } => match self.todo.remove(id) {
                Ok(item) => {
                    self.speak(&todo::removed_line(&item), None);
                    self.sound.play(SoundKind::Beep);
                }
                Err(e) => {
                    self.send_error(e.to_string());
                    return;
                }
            },
            TodoCommand::ClearCompleted => {
                let count = self.todo.clear_completed();
                let mood = (count > 0).then_some(Mood::Happy);
                self.speak(&todo::cleared_line(count), mood);
            }
            TodoCommand::Export => {
                let data = self.todo.export(now);
                self.send_export(Tool::Todo, data);
                return;
            }
            TodoCommand::Import { data } => match self.todo.import(&data, now) {
                Ok(count) => {
                    info!(count, "Imported todos");
                    self.speak(&todo::imported_line(count), Some(Mood::Happy));
                }
                Err(e) => {
                    warn!(error = %e, "Todo import rejected");
                    self.speak(todo::IMPORT_FAILED_LINE, Some(Mood::Annoyed));
                    return;
                }
            },
        }

        save_as(self.storage.as_ref(), TODOS_KEY, &self.todo);
        if let Some(bonus) = self.todo.mood_bonus() {
            self.adjust_level(bonus);
        }
    }

    fn on_todo_toggled(&mut self, outcome: &ToggleOutcome) {
        match outcome {
            ToggleOutcome::Completed {
                milestone, streak, ..
            } => {
                self.speak(&outcome.line(), Some(Mood::Happy));
                self.trigger(names::CELEBRATION);
                if let Some(milestone) = milestone {
                    self.notify(&format!("🎉 {milestone}"));
                    self.unlock_theme(Theme::Purple);
                }
                if *streak {
                    self.notify(todo::STREAK_LINE);
                }
            }
            ToggleOutcome::Reopened { .. } => self.speak(&outcome.line(), None),
        }
    }

    fn handle_calendar(&mut self, command: CalendarCommand) {
        let today = self.local_now().date();

        match command {
            CalendarCommand::Select { date } => {
                let line = self.calendar.select(date);
                self.speak(&line, None);
                self.sound.play(SoundKind::Beep);
            }
            CalendarCommand::Add { text } => match self.calendar.add(&text, today) {
                Ok(date) => {
                    self.speak(&calendar::added_line(text.trim(), date), Some(Mood::Happy));
                    self.sound.play(SoundKind::Beep);
                    self.trigger(names::CELEBRATION);
                    self.save_calendar();
                }
                Err(ToolError::EmptyInput) => {
                    self.speak(calendar::EMPTY_LINE, Some(Mood::Annoyed));
                }
                Err(e) => self.send_error(e.to_string()),
            },
            CalendarCommand::QuickAdd { text } => match self.calendar.quick_add(&text, today) {
                Some((date, event)) => {
                    self.speak(&calendar::quick_added_line(&event, date), Some(Mood::Happy));
                    self.save_calendar();
                }
                None => self.send_error(format!("Couldn't find an event in '{text}'")),
            },
            CalendarCommand::Remove { date, index } => {
                match self.calendar.remove(date, index) {
                    Ok(event) => {
                        self.speak(&calendar::removed_line(&event), None);
                        self.save_calendar();
                    }
                    Err(e) => self.send_error(e.to_string()),
                }
            }
            CalendarCommand::PrevMonth => {
                self.calendar.prev_month();
                self.speak(calendar::PREV_MONTH_LINE, None);
                self.sound.play(SoundKind::Beep);
            }
            CalendarCommand::NextMonth => {
                self.calendar.next_month();
                self.speak(calendar::NEXT_MONTH_LINE, None);
                self.sound.play(SoundKind::Beep);
            }
            CalendarCommand::Export => {
                let data = self.calendar.export(self.local_now());
                self.send_export(Tool::Calendar, data);
            }
            CalendarCommand::Import { data } => match self.calendar.import(&data) {
                Ok(count) => {
                    info!(count, "Imported calendar events");
                    self.speak(calendar::IMPORTED_LINE, Some(Mood::Happy));
                    self.save_calendar();
                }
                Err(e) => {
                    warn!(error = %e, "Calendar import rejected");
                    self.speak(calendar::IMPORT_FAILED_LINE, Some(Mood::Annoyed));
                }
            },
        }
    }

    fn handle_music(&mut self, command: MusicCommand) {
        match command {
            MusicCommand::Select { id } => match self.music.select(&id) {
                Ok(track) => {
                    let line = music::selected_line(track);
                    self.speak(&line, Some(Mood::Happy));
                    self.sound.play(SoundKind::Beep);
                }
                Err(e) => self.send_error(e.to_string()),
            },
            MusicCommand::TogglePlay => match self.music.toggle_play() {
                Ok(PlayState::Playing) => {
                    if let Some(line) = self.music.current_track().map(music::playing_line) {
                        self.speak(&line, Some(Mood::Happy));
                    }
                    self.sound.play(SoundKind::Beep);
                    self.restart_track_timer();
                }
                Ok(PlayState::Paused) => {
                    self.speak(music::PAUSED_LINE, None);
                    self.cancel_track_timer();
                }
                Err(ToolError::NoTrackSelected) => {
                    self.speak(music::NO_TRACK_LINE, Some(Mood::Annoyed));
                }
                Err(e) => self.send_error(e.to_string()),
            },
            MusicCommand::Next => {
                if let Some(line) = self.music.next().map(music::next_line) {
                    self.speak(&line, None);
                    self.sound.play(SoundKind::Beep);
                    self.restart_track_if_playing();
                }
            }
            MusicCommand::Prev => {
                if let Some(line) = self.music.prev().map(music::prev_line) {
                    self.speak(&line, None);
                    self.sound.play(SoundKind::Beep);
                    self.restart_track_if_playing();
                }
            }
            MusicCommand::SetVolume { volume } => {
                self.music.set_volume(volume);
                if self.rng.gen_bool(0.2) {
                    let line = music::volume_line(&self.music);
                    self.speak(&line, None);
                }
            }
            MusicCommand::Shuffle => {
                self.music.shuffle(&mut self.rng);
                self.speak(music::SHUFFLED_LINE, Some(Mood::Happy));
            }
            MusicCommand::AddTrack { title, artist } => {
                let suffix = self.now_ms();
                let line = music::added_line(self.music.add_track(&title, &artist, suffix));
                self.speak(&line, Some(Mood::Happy));
            }
            MusicCommand::RemoveTrack { id } => match self.music.remove_track(&id) {
                Ok(track) => {
                    self.speak(&music::removed_line(&track), None);
                    if !self.music.is_playing() {
                        self.cancel_track_timer();
                    }
                }
                Err(e) => self.send_error(e.to_string()),
            },
            MusicCommand::Recommend => {
                let mood = self.mood.mood();
                let title = self.music.recommend(mood, &mut self.rng);
                self.speak(&music::recommend_line(mood, title), None);
            }
            MusicCommand::Export => {
                let data = self.music.export(self.local_now());
                self.send_export(Tool::Music, data);
                return;
            }
            MusicCommand::Import { data } => match self.music.import(&data) {
                Ok(count) => {
                    info!(count, "Imported tracks");
                    self.speak(&music::imported_line(count), Some(Mood::Happy));
                }
                Err(e) => {
                    warn!(error = %e, "Playlist import rejected");
                    self.speak(music::IMPORT_FAILED_LINE, Some(Mood::Annoyed));
                    return;
                }
            },
        }

        save_as(self.storage.as_ref(), SETTINGS_KEY, &self.music.settings());
    }

    fn on_track_ended(&mut self) {
        if !self.music.is_playing() {
            return;
        }
        if let Some(line) = self.music.current_track().map(music::finished_line) {
            self.speak(&line, None);
        }
        if let Some(line) = self.music.next().map(music::next_line) {
            self.speak(&line, None);
        }
        self.restart_track_if_playing();
        save_as(self.storage.as_ref(), SETTINGS_KEY, &self.music.settings());
    }

    fn restart_track_if_playing(&mut self) {
        if self.music.is_playing() {
            self.restart_track_timer();
        } else {
            self.cancel_track_timer();
        }
    }

    fn restart_track_timer(&mut self) {
        self.cancel_track_timer();
        self.track_timer = Some(
            self.timers
                .schedule(self.config.track_ms, ShellTimer::TrackEnded),
        );
    }

    fn cancel_track_timer(&mut self) {
        if let Some(id) = self.track_timer.take() {
            self.timers.cancel(id);
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn speak(&mut self, text: &str, mood: Option<Mood>) {
        if let Some(mood) = mood {
            self.change_mood(mood);
        }
        self.send(ShellMessage::Speak {
            text: text.to_string(),
            mood: self.mood.mood(),
        });
        self.sound.play(SoundKind::Speak);
        self.trigger(names::SPEAK);
    }

    fn notify(&mut self, text: &str) {
        self.next_notification += 1;
        let id = self.next_notification;
        self.send(ShellMessage::Notify {
            id,
            text: text.to_string(),
            lifetime_ms: self.config.notification_ms,
        });
        self.trigger(names::NOTIFICATION);
        self.timers.schedule(
            self.config.notification_ms,
            ShellTimer::ExpireNotification(id),
        );
    }

    fn trigger(&mut self, name: &str) {
        if let Err(e) = self.engine.trigger(name, Payload::None) {
            warn!(name, error = %e, "Animation trigger failed");
        }
        self.pump_engine_events();
    }

    fn change_mood(&mut self, mood: Mood) {
        if let Err(e) = self.mood.change_mood(mood, &mut self.engine) {
            warn!(error = %e, "Mood transition failed");
        }
        self.send_mood();
        self.pump_engine_events();
    }

    fn adjust_level(&mut self, delta: i32) {
        if let Err(e) = self.mood.adjust_level(delta, &mut self.engine) {
            warn!(error = %e, "Mood transition failed");
        }
        self.send_mood();
        self.pump_engine_events();
    }

    fn send_mood(&mut self) {
        let state = self.mood.state();
        self.send(ShellMessage::Mood {
            mood: state.mood,
            level: state.level,
        });
    }

    fn send_error(&mut self, message: String) {
        warn!(%message, "Command rejected");
        self.trigger(names::ERROR);
        self.send(ShellMessage::Error { message });
    }

    fn save_profile(&self) {
        save_as(self.storage.as_ref(), PROFILE_KEY, &self.profile);
    }

    fn send_export(&mut self, tool: Tool, data: Result<String, ToolError>) {
        match data {
            Ok(data) => self.send(ShellMessage::Exported { tool, data }),
            Err(e) => self.send_error(e.to_string()),
        }
    }

    fn save_calendar(&self) {
        save_as(self.storage.as_ref(), EVENTS_KEY, self.calendar.events());
    }

    fn send(&self, message: ShellMessage) {
        let stamped = StampedMessage {
            at_ms: self.now_ms(),
            message,
        };
        if self.tx.send(stamped).is_err() {
            debug!("Surface dropped the message channel");
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Current simulated time
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Local wall time that simulated `now_ms` maps to
    #[must_use]
    pub fn local_now(&self) -> NaiveDateTime {
        chrono::Duration::from_std(std::time::Duration::from_millis(self.now_ms()))
            .ok()
            .and_then(|offset| self.started_at.checked_add_signed(offset))
            .unwrap_or(self.started_at)
    }

    /// Mood and level
    #[must_use]
    pub fn mood_state(&self) -> MoodState {
        self.mood.state()
    }

    /// Saved theme and unlock progress
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Theme on screen right now (may be a preview)
    #[must_use]
    pub fn displayed_theme(&self) -> Theme {
        self.displayed_theme
    }

    /// Visible tool tab
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Todo list
    #[must_use]
    pub fn todo(&self) -> &TodoList {
        &self.todo
    }

    /// Calendar
    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Music player
    #[must_use]
    pub fn music(&self) -> &MusicPlayer {
        &self.music
    }

    /// Window on screen
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }

    /// Window collapsed
    #[must_use]
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Text input focus
    #[must_use]
    pub fn input_focus(&self) -> InputFocus {
        self.input
    }

    /// Conversation so far
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        self.dialogue.history()
    }

    /// Name the user introduced themselves with
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.dialogue.user_name()
    }

    /// Animation engine (read-only)
    #[must_use]
    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    /// Easter-egg matcher (read-only)
    #[must_use]
    pub fn sequences(&self) -> &SequenceMatcher {
        &self.sequences
    }

    /// Resolved configuration
    #[must_use]
    pub fn config(&self) -> &RetroBotConfig {
        &self.config
    }

    /// Quit was handled
    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.quit
    }
}
