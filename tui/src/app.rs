//! Application State and Main Loop
//!
//! Owns the [`Shell`] and drives it from the terminal: key presses become
//! [`ShellEvent`]s, real elapsed time becomes shell time, and every
//! [`StampedMessage`] is folded into [`DisplayState`] before the next frame.
//!
//! Two sources feed the renderer. Messages say *what* to show (speech,
//! notifications, mood, theme). The [`EffectBoard`] says which animation tags
//! are applied right now (`speaking`, `error-shake`, `powering-on`).

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDateTime};
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::{Stream, StreamExt};
use rand::Rng;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{DefaultTerminal, Frame, Terminal};
use tokio::sync::mpsc;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use retrobot_core::animation::{targets, SpecialEffect};
use retrobot_core::mood::MoodEffect;
use retrobot_core::{
    CalendarCommand, Collaborators, EffectBoard, MusicCommand, RetroBotConfig, Shell, ShellEvent,
    ShellMessage, StampedMessage, Storage, Theme, TodoCommand, Tool,
};

use crate::avatar::{self, Pose};
use crate::bell::Bell;
use crate::display::{DisplayRole, DisplayState};
use crate::keys::{key_code, map_key, submit_event, KeyAction};
use crate::theme::{self, Palette};

/// Width of the avatar column
const SIDE_WIDTH: u16 = 24;

/// Height of the input box, borders included
const INPUT_HEIGHT: u16 = 3;

/// Glyphs for the matrix rain
const MATRIX_GLYPHS: &[char] = &['0', '1', '$', '#', '%', '&', '*', '+', '=', '?'];

/// Main application state
pub struct App {
    /// The headless core
    shell: Shell,
    /// Messages from the shell
    rx: mpsc::UnboundedReceiver<StampedMessage>,
    /// What is on screen
    display: DisplayState,
    /// Animation tags, shared with the shell
    board: EffectBoard,
    /// Pending sound requests, shared with the shell
    bell: Bell,
    /// Text being typed
    input_buffer: String,
    /// Where tab exports are written and imports read
    transfer_dir: PathBuf,
    /// Shell time zero
    started: Instant,
    /// Frames rendered, drives alternating poses
    tick: u64,
    /// Keep looping?
    running: bool,
}

impl App {
    /// Create the app and its shell
    ///
    /// `start` is the local time at shell time zero.
    ///
    /// # Errors
    ///
    /// Fails if the shell rejects its animation table.
    pub fn new(
        config: RetroBotConfig,
        storage: Arc<dyn Storage>,
        start: NaiveDateTime,
        muted: bool,
    ) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let board = EffectBoard::window();
        let bell = Bell::new(muted);

        let shell = Shell::new(
            config,
            Collaborators {
                storage,
                sound: Box::new(bell.clone()),
                targets: Box::new(board.clone()),
            },
            tx,
        )?
        .with_start_time(start);

        Ok(Self {
            shell,
            rx,
            display: DisplayState::new(),
            board,
            bell,
            input_buffer: String::new(),
            transfer_dir: std::env::temp_dir().join("retrobot"),
            started: Instant::now(),
            tick: 0,
            running: true,
        })
    }

    /// Read and write tab data files in `dir`
    #[must_use]
    pub fn with_transfer_dir(mut self, dir: PathBuf) -> Self {
        self.transfer_dir = dir;
        self
    }

    /// Data file for `tool`'s export and import
    #[must_use]
    pub fn transfer_path(&self, tool: Tool) -> PathBuf {
        self.transfer_dir.join(format!("retrobot-{tool}.json"))
    }

    /// Power on and greet
    pub fn start(&mut self) {
        self.started = Instant::now();
        self.shell.start();
        self.process_shell_messages();
    }

    /// Run the main loop on the real terminal
    ///
    /// # Errors
    ///
    /// Terminal I/O failures.
    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        self.run_with(terminal, EventStream::new(), std::io::stdout())
            .await
    }

    /// Run the main loop over any backend and event source
    ///
    /// The loop ends on quit or when `event_stream` runs dry. Bell rings are
    /// written to `bell_out`.
    ///
    /// # Errors
    ///
    /// Terminal I/O failures.
    pub async fn run_with<B, S, W>(
        &mut self,
        terminal: &mut Terminal<B>,
        mut event_stream: S,
        mut bell_out: W,
    ) -> anyhow::Result<()>
    where
        B: Backend,
        S: Stream<Item = std::io::Result<Event>> + Unpin,
        W: Write,
    {
        // ~10 FPS is plenty for 8-bit animation
        let frame_duration = Duration::from_millis(100);

        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        // Only handle Press events (not Release or Repeat)
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key);
                        }
                        Some(Ok(Event::FocusGained)) => {
                            self.shell.handle_event(ShellEvent::WindowFocused);
                        }
                        Some(Ok(Event::FocusLost)) => {
                            self.shell.handle_event(ShellEvent::WindowBlurred);
                        }
                        Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                        None => self.running = false,
                        _ => {}
                    }
                }

                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            self.sync_clock();
            self.process_shell_messages();

            self.tick = self.tick.wrapping_add(1);
            terminal.draw(|frame| self.draw(frame))?;

            if self.bell.take() > 0 {
                bell_out.write_all(b"\x07")?;
                bell_out.flush()?;
            }

            if self.display.quit || self.shell.is_quit() {
                self.running = false;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Advance the shell to real elapsed time
    fn sync_clock(&mut self) {
        let elapsed = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.advance_to(elapsed);
    }

    /// Advance the shell to `ms` and apply what it produced
    pub fn advance_to(&mut self, ms: u64) {
        self.shell.advance_to(ms);
        self.process_shell_messages();
    }

    /// Fold every pending shell message into the display
    fn process_shell_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            if tracing::enabled!(tracing::Level::TRACE) {
                tracing::trace!(
                    message = %serde_json::to_string(&msg).unwrap_or_default(),
                    "Shell message"
                );
            }
            self.display.apply(&msg);
            if let ShellMessage::Exported { tool, data } = &msg.message {
                self.save_export(*tool, data);
            }
        }
        self.display.expire(self.shell.now_ms());
    }

    fn save_export(&mut self, tool: Tool, data: &str) {
        let path = self.transfer_path(tool);
        let written = std::fs::create_dir_all(&self.transfer_dir)
            .and_then(|()| std::fs::write(&path, data));
        match written {
            Ok(()) => {
                tracing::info!(%tool, path = %path.display(), "Export saved");
                self.display
                    .push_note(format!("Saved {tool} data to {}", path.display()));
            }
            Err(e) => {
                tracing::warn!(%tool, error = %e, "Export not saved");
                self.display
                    .push_error(format!("Couldn't write {}: {e}", path.display()));
            }
        }
    }

    fn import_current_tab(&mut self) {
        let tool = self.shell.tool();
        if tool == Tool::Chat {
            return;
        }
        let path = self.transfer_path(tool);
        match std::fs::read_to_string(&path) {
            Ok(data) => {
                if let Some(event) = ShellEvent::import(tool, data) {
                    self.shell.handle_event(event);
                }
            }
            Err(e) => {
                tracing::warn!(%tool, error = %e, "Import file unreadable");
                self.display
                    .push_error(format!("Couldn't read {}: {e}", path.display()));
            }
        }
    }

    /// Handle one key press
    pub fn handle_key(&mut self, key: KeyEvent) {
        if let Some(code) = key_code(key.code) {
            self.shell.handle_event(ShellEvent::KeyPressed { code });
        }

        let typing = self.shell.input_focus().is_typing();
        match map_key(key, typing) {
            KeyAction::Quit => {
                self.shell.handle_event(ShellEvent::Quit);
                self.running = false;
            }
            KeyAction::ToggleFocus => {
                self.shell
                    .handle_event(ShellEvent::InputFocus { focused: !typing });
            }
            KeyAction::Submit => {
                let text = std::mem::take(&mut self.input_buffer);
                if let Some(event) = submit_event(self.shell.tool(), &text) {
                    if matches!(event, ShellEvent::UserMessage { .. }) {
                        self.display.push_user(text.trim());
                    }
                    self.shell.handle_event(event);
                }
            }
            KeyAction::Edit(c) => self.input_buffer.push(c),
            KeyAction::Backspace => {
                self.input_buffer.pop();
            }
            KeyAction::Shell(event) => self.shell.handle_event(event),
            KeyAction::Pick(n) => {
                if let Some(event) = self.pick(n) {
                    self.shell.handle_event(event);
                }
            }
            KeyAction::Volume(delta) => {
                let volume = (i16::from(self.shell.music().volume()) + delta).clamp(0, 100);
                self.shell.handle_event(ShellEvent::Music(MusicCommand::SetVolume {
                    volume: u8::try_from(volume).unwrap_or(100),
                }));
            }
            KeyAction::ToggleVisible => {
                let event = if self.shell.is_visible() {
                    ShellEvent::Hide
                } else {
                    ShellEvent::Show
                };
                self.shell.handle_event(event);
            }
            KeyAction::Export => {
                if let Some(event) = ShellEvent::export(self.shell.tool()) {
                    self.shell.handle_event(event);
                }
            }
            KeyAction::Import => self.import_current_tab(),
            KeyAction::None => {}
        }

        self.process_shell_messages();
    }

    /// The event for the nth item of the current tab
    fn pick(&self, n: usize) -> Option<ShellEvent> {
        let index = n.checked_sub(1)?;
        match self.shell.tool() {
            Tool::Todo => {
                let id = self.shell.todo().sorted().get(index)?.id;
                Some(ShellEvent::Todo(TodoCommand::Toggle { id }))
            }
            Tool::Music => {
                let id = self.shell.music().playlist().get(index)?.id.clone();
                Some(ShellEvent::Music(MusicCommand::Select { id }))
            }
            Tool::Calendar => {
                let date = self
                    .shell
                    .calendar()
                    .view_month()
                    .with_day(u32::try_from(n).ok()?)?;
                Some(ShellEvent::Calendar(CalendarCommand::Select { date }))
            }
            Tool::Chat => None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current display state
    #[must_use]
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// The shell behind the screen
    #[must_use]
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Text in the input line
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input_buffer
    }

    /// Still looping?
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// RetroBot's last words, printed after the terminal is restored
    #[must_use]
    pub fn goodbye(&self) -> Option<&str> {
        self.display
            .lines
            .iter()
            .rev()
            .find(|l| l.role == DisplayRole::Bot)
            .map(|l| l.text.as_str())
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Draw one frame
    pub fn draw(&self, frame: &mut Frame) {
        let palette = self.palette();
        let area = frame.area();
        frame.render_widget(
            Block::default().style(Style::default().fg(palette.fg).bg(palette.bg)),
            area,
        );

        if !self.display.visible {
            self.draw_powered_off(frame, area, palette);
            return;
        }

        let [title, body, input] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(INPUT_HEIGHT),
        ])
        .areas(area);

        self.draw_title(frame, title, palette);

        if self.display.minimized {
            frame.render_widget(
                Paragraph::new("  minimized · F9 to restore").style(Style::default().fg(palette.dim)),
                body,
            );
            return;
        }

        let body = self.jitter(body);
        let body = self.power_transition(body);
        let [side, panel] =
            Layout::horizontal([Constraint::Length(SIDE_WIDTH), Constraint::Min(20)]).areas(body);

        self.draw_avatar(frame, side, palette);
        self.draw_panel(frame, panel, palette);
        self.draw_input(frame, input, palette);
        self.draw_notifications(frame, panel, palette);
        self.draw_effects(frame, body, palette);
    }

    fn palette(&self) -> Palette {
        let now = self.shell.now_ms();
        let mut palette = if self.display.theme == Theme::Rainbow
            || self.display.effect() == Some(SpecialEffect::Rainbow)
        {
            theme::rainbow_at(now)
        } else {
            theme::palette(self.display.theme)
        };
        if self.display.has_mood_effect(MoodEffect::Fade) && self.tick % 4 < 2 {
            palette.fg = palette.dim;
        }
        palette
    }

    /// Shift the body a cell sideways while the window is shaking
    fn jitter(&self, area: Rect) -> Rect {
        let shaking = self.board.has_tag(targets::WINDOW, "error-shake")
            || self.display.has_mood_effect(MoodEffect::Shake)
            || self.display.effect() == Some(SpecialEffect::Glitch);
        if shaking && self.tick % 2 == 1 && area.width > 1 {
            Rect {
                x: area.x + 1,
                width: area.width - 1,
                ..area
            }
        } else {
            area
        }
    }

    /// Grow the body open while powering on, collapse it while powering off
    fn power_transition(&self, area: Rect) -> Rect {
        let rows = if self.board.has_tag(targets::WINDOW, "powering-off") {
            1
        } else if self.board.has_tag(targets::WINDOW, "powering-on") {
            u16::try_from(self.tick % u64::from(area.height.max(1)))
                .unwrap_or(area.height)
                .max(1)
        } else {
            return area;
        };
        let height = rows.min(area.height);
        Rect {
            y: area.y + (area.height - height) / 2,
            height,
            ..area
        }
    }

    fn draw_powered_off(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let text = "[ RetroBot is powered off · F10 to power on · Esc to quit ]";
        let line = area.intersection(Rect {
            y: area.y + area.height / 2,
            height: 1,
            ..area
        });
        frame.render_widget(
            Paragraph::new(text)
                .centered()
                .style(Style::default().fg(palette.dim)),
            line,
        );
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let pressed = self.board.has_tag(targets::TAB, "pressed");
        let mut spans = vec![Span::styled(
            " ▣ RetroBot ",
            Style::default()
                .fg(palette.bg)
                .bg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )];

        for (i, tool) in Tool::ALL.into_iter().enumerate() {
            let label = format!(" F{} {} {} ", i + 1, tool.icon(), tool.label());
            let mut style = Style::default().fg(palette.dim);
            if tool == self.display.tool {
                style = Style::default().fg(palette.fg).add_modifier(Modifier::REVERSED);
                if pressed {
                    style = style.add_modifier(Modifier::BOLD);
                }
            }
            spans.push(Span::styled(label, style));
        }

        let preview = if self.display.preview { " (preview)" } else { "" };
        spans.push(Span::styled(
            format!("  {}{}  {} ", self.display.theme.label(), preview, self.display.mood.icon()),
            Style::default().fg(palette.dim),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_avatar(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let block = Block::bordered()
            .title(" RetroBot ")
            .border_style(Style::default().fg(palette.accent));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width < avatar::WIDTH || inner.height < avatar::HEIGHT + 2 {
            return;
        }

        let pose = Pose {
            idle: self.display.idle.map(|t| t.value),
            speaking: self.board.has_tag(targets::SPRITE, "speaking"),
            tick: self.tick,
        };
        let sway: i32 = match self.display.effect() {
            Some(SpecialEffect::Dance) if self.tick % 4 < 2 => -1,
            Some(SpecialEffect::Dance) => 1,
            _ if self.display.has_mood_effect(MoodEffect::Sway) && self.tick % 8 < 4 => 1,
            _ => 0,
        };
        let sprite_style = if self.display.has_mood_effect(MoodEffect::Tint) {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(palette.fg)
        };

        let left = i32::from(inner.x + (inner.width - avatar::WIDTH) / 2) + sway;
        let x = u16::try_from(left.max(i32::from(inner.x))).unwrap_or(inner.x);
        let top = inner.y + 1 - avatar::lift(pose).min(1);
        let buf = frame.buffer_mut();
        for (row, line) in avatar::sprite(self.display.mood, pose).iter().enumerate() {
            let y = top + u16::try_from(row).unwrap_or(0);
            buf.set_string(x, y, line, sprite_style);
        }

        // Mood line and bar under the sprite
        let mood_y = inner.y + avatar::HEIGHT + 1;
        let mood_text = format!("{} {}", self.display.mood.icon(), self.display.mood.title());
        buf.set_string(inner.x + 1, mood_y, mood_text, Style::default().fg(palette.fg));

        if mood_y + 1 < inner.y + inner.height {
            let width = inner.width.saturating_sub(7);
            let mut style = Style::default().fg(palette.accent);
            if self.display.has_mood_effect(MoodEffect::Glow)
                || self.board.has_tag(targets::MOOD_BAR, "mood-transitioning")
            {
                style = style.add_modifier(Modifier::BOLD);
            }
            let bar = format!("{} {:>3}", level_bar(self.display.level, width), self.display.level);
            buf.set_string(inner.x + 1, mood_y + 1, bar, style);
        }

        for effect in &self.display.mood_effects {
            if let MoodEffect::Particles { glyph, count } = effect.value {
                for i in 0..u64::from(count) {
                    let px = inner.x + u16::try_from((i * 7 + self.tick) % u64::from(inner.width)).unwrap_or(0);
                    let py = inner.y + u16::try_from((i * 3 + self.tick / 2) % 3).unwrap_or(0);
                    buf.set_string(px, py, glyph.to_string(), Style::default().fg(palette.accent));
                }
            }
        }
    }

    fn draw_panel(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let mut border = Style::default().fg(palette.dim);
        if self.board.has_tag(targets::TOOL_PANEL, "switching") {
            border = border.add_modifier(Modifier::REVERSED);
        }
        let title = format!(" {} {} ", self.display.tool.icon(), self.display.tool.label());
        let block = Block::bordered().title(title).border_style(border);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = match self.display.tool {
            Tool::Chat => self.chat_lines(inner, palette),
            Tool::Todo => self.todo_lines(palette),
            Tool::Calendar => self.calendar_lines(palette),
            Tool::Music => self.music_lines(palette),
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn chat_lines(&self, area: Rect, palette: Palette) -> Vec<Line<'static>> {
        let width = usize::from(area.width.max(10));
        let mut all: Vec<Line<'static>> = Vec::new();
        for line in &self.display.lines {
            let style = match line.role {
                DisplayRole::User => Style::default().fg(theme::USER_TEXT),
                DisplayRole::Bot => Style::default().fg(palette.fg),
                DisplayRole::Error => Style::default().fg(theme::ERROR_TEXT),
            };
            let content = format!("{}{}", line.role.prefix(), line.text);
            for wrapped in textwrap::wrap(&content, width) {
                all.push(Line::styled(wrapped.into_owned(), style));
            }
        }
        let skip = all.len().saturating_sub(usize::from(area.height));
        all.into_iter().skip(skip).collect()
    }

    fn todo_lines(&self, palette: Palette) -> Vec<Line<'static>> {
        let todo = self.shell.todo();
        let mut lines: Vec<Line<'static>> = todo
            .sorted()
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let check = if item.completed { "x" } else { " " };
                let style = if item.completed {
                    Style::default()
                        .fg(palette.dim)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(palette.fg)
                };
                Line::styled(
                    format!("{}. [{check}] {} {}", i + 1, item.priority.icon(), item.text),
                    style,
                )
            })
            .collect();
        lines.push(Line::default());
        lines.push(Line::styled(todo.stats_text(), Style::default().fg(palette.accent)));
        lines
    }

    fn calendar_lines(&self, palette: Palette) -> Vec<Line<'static>> {
        let calendar = self.shell.calendar();
        let today = self.shell.local_now().date();
        let month = calendar.view_month().month();
        let selected = calendar.selected();

        let mut lines = vec![
            Line::styled(
                format!("  < {} >", calendar.month_title()),
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
            Line::styled(" Su Mo Tu We Th Fr Sa", Style::default().fg(palette.dim)),
        ];

        for week in calendar.grid().chunks(7) {
            let spans: Vec<Span<'static>> = week
                .iter()
                .map(|&date| {
                    let mut style = if date.month() == month {
                        Style::default().fg(palette.fg)
                    } else {
                        Style::default().fg(palette.dim)
                    };
                    if calendar.has_events_on(date) {
                        style = style.fg(palette.accent);
                    }
                    if date == today {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    if Some(date) == selected {
                        style = style.add_modifier(Modifier::UNDERLINED);
                    }
                    Span::styled(format!(" {:>2}", date.day()), style)
                })
                .collect();
            lines.push(Line::from(spans));
        }

        let day = selected.unwrap_or(today);
        lines.push(Line::default());
        lines.push(Line::styled(
            retrobot_core::tools::calendar::display_date(day),
            Style::default().fg(palette.accent),
        ));
        let events = calendar.events_on(day);
        if events.is_empty() {
            lines.push(Line::styled("  nothing planned", Style::default().fg(palette.dim)));
        }
        for event in events {
            lines.push(Line::styled(format!("  • {event}"), Style::default().fg(palette.fg)));
        }
        lines
    }

    fn music_lines(&self, palette: Palette) -> Vec<Line<'static>> {
        let music = self.shell.music();
        let now_playing = match music.current_track() {
            Some(track) => format!("{} · {} ({})", track.title, track.artist, track.duration),
            None => "no track selected".to_string(),
        };
        let state = if music.is_playing() { "▶ playing" } else { "⏸ paused" };

        let mut lines = vec![
            Line::styled(now_playing, Style::default().fg(palette.fg).add_modifier(Modifier::BOLD)),
            Line::styled(
                format!("{state}   {} {:>3}", music.volume_icon(), music.volume()),
                Style::default().fg(palette.accent),
            ),
            Line::default(),
        ];

        let current = music.current_track().map(|t| t.id.as_str());
        for (i, track) in music.playlist().iter().enumerate() {
            let marker = if Some(track.id.as_str()) == current { "♪" } else { " " };
            lines.push(Line::styled(
                format!("{marker} {}. {} - {}", i + 1, track.title, track.artist),
                Style::default().fg(palette.fg),
            ));
        }
        lines
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let typing = self.shell.input_focus().is_typing();
        let title = if typing {
            " Enter to send · Tab to leave "
        } else {
            " Tab to type · F5 help "
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(if typing { palette.accent } else { palette.dim }));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let room = usize::from(inner.width.saturating_sub(3));
        let cursor = if typing && self.tick % 10 < 5 { "_" } else { "" };
        let text = format!("> {}{cursor}", visible_tail(&self.input_buffer, room));
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(palette.fg)),
            inner,
        );
    }

    fn draw_notifications(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let bouncing = self.board.has_tag(targets::NOTIFICATION, "bouncing") && self.tick % 4 < 2;
        let buf = frame.buffer_mut();
        for (row, (_, text)) in self.display.notifications.iter().rev().take(3).enumerate() {
            let label = format!(" {text} ");
            let width = u16::try_from(label.width()).unwrap_or(area.width);
            let x = area.right().saturating_sub(width + 1).max(area.x);
            let y = area.y + 1 + u16::try_from(row).unwrap_or(0) + u16::from(bouncing);
            if y < area.bottom() {
                buf.set_string(
                    x,
                    y,
                    label,
                    Style::default().fg(palette.bg).bg(palette.accent),
                );
            }
        }
    }

    fn draw_effects(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let effect = self.display.effect();
        let celebrating = self.board.has_tag(targets::WINDOW, "celebrating");
        if (effect.is_none() && !celebrating) || area.width == 0 || area.height < 2 {
            return;
        }

        let mut rng = rand::thread_rng();
        let buf = frame.buffer_mut();
        match effect {
            Some(SpecialEffect::Matrix) => {
                for x in (area.x..area.right()).step_by(2) {
                    if rng.gen_bool(0.3) {
                        let y = rng.gen_range(area.y..area.bottom());
                        let glyph = MATRIX_GLYPHS[rng.gen_range(0..MATRIX_GLYPHS.len())];
                        buf.set_string(x, y, glyph.to_string(), Style::default().fg(theme::GREEN_FG));
                    }
                }
            }
            Some(SpecialEffect::Fire) => {
                let base = area.bottom() - 2;
                for x in area.x..area.right() {
                    if rng.gen_bool(0.25) {
                        let y = base + rng.gen_range(0..2u16);
                        let (glyph, color) = if rng.gen_bool(0.5) {
                            ('^', Color::Rgb(255, 80, 0))
                        } else {
                            ('*', Color::Rgb(255, 200, 0))
                        };
                        buf.set_string(x, y, glyph.to_string(), Style::default().fg(color));
                    }
                }
            }
            Some(SpecialEffect::Glitch) => {
                let y = rng.gen_range(area.y..area.bottom());
                for x in area.x..area.right() {
                    if rng.gen_bool(0.5) {
                        buf[(x, y)].set_style(Style::default().fg(palette.bg).bg(palette.fg));
                    }
                }
            }
            _ => {}
        }

        if celebrating {
            for _ in 0..8 {
                let x = rng.gen_range(area.x..area.right());
                let y = rng.gen_range(area.y..area.bottom());
                buf.set_string(x, y, "✦", Style::default().fg(palette.accent));
            }
        }
    }
}

/// `[████░░░░]`-style bar for a 0..=100 level
fn level_bar(level: u8, width: u16) -> String {
    let width = usize::from(width);
    let filled = usize::from(level.min(100)) * width / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// The end of `text` that fits in `width` columns
fn visible_tail(text: &str, width: usize) -> &str {
    let mut used = 0;
    let mut start = text.len();
    for (i, c) in text.char_indices().rev() {
        used += c.width().unwrap_or(0);
        if used > width {
            break;
        }
        start = i;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crossterm::event::{KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use retrobot_core::MemoryStorage;

    fn app() -> App {
        let config = RetroBotConfig::default().with_seed(5);
        let start = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        let mut app = App::new(config, Arc::new(MemoryStorage::new()), start, true).unwrap();
        app.start();
        app.advance_to(2_000);
        app
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_line(app: &mut App, text: &str) {
        press(app, KeyCode::Tab);
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
        press(app, KeyCode::Enter);
        press(app, KeyCode::Tab);
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_startup_shows_window() {
        let mut app = app();
        assert!(app.display().visible);
        assert!(screen(&app).contains("RetroBot"));
    }

    #[test]
    fn test_chat_round_trip() {
        let mut app = app();
        type_line(&mut app, "hello robot");
        app.advance_to(3_000);

        let lines = &app.display().lines;
        assert!(lines
            .iter()
            .any(|l| l.role == DisplayRole::User && l.text == "hello robot"));
        assert_eq!(lines.back().map(|l| l.role), Some(DisplayRole::Bot));
        assert_eq!(app.input(), "");
    }

    #[test]
    fn test_todo_tab_adds_and_toggles() {
        let mut app = app();
        press(&mut app, KeyCode::F(3));
        app.advance_to(2_500);
        assert_eq!(app.display().tool, Tool::Todo);

        type_line(&mut app, "water plants");
        assert_eq!(app.shell().todo().items().len(), 1);
        assert_eq!(app.shell().todo().items()[0].text, "Water plants");

        press(&mut app, KeyCode::Char('1'));
        assert!(app.shell().todo().items()[0].completed);
        assert!(screen(&app).contains("Water plants"));
    }

    #[test]
    fn test_letters_do_not_type_without_focus() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.input(), "");
    }

    #[test]
    fn test_power_off_and_on() {
        let mut app = app();
        press(&mut app, KeyCode::F(10));
        app.advance_to(3_000);
        assert!(!app.display().visible);
        assert!(screen(&app).contains("powered off"));

        press(&mut app, KeyCode::F(10));
        app.advance_to(4_000);
        assert!(app.display().visible);
    }

    #[test]
    fn test_escape_quits() {
        let mut app = app();
        press(&mut app, KeyCode::Esc);
        assert!(!app.is_running());
        assert!(app.shell().is_quit());
    }

    #[test]
    fn test_visible_tail_respects_width() {
        assert_eq!(visible_tail("hello world", 5), "world");
        assert_eq!(visible_tail("hi", 5), "hi");
        assert_eq!(level_bar(50, 10), "█████░░░░░");
    }
}
