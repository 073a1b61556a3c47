//! Todo list
//!
//! Tasks carry a priority parsed from the text the user typed (`!!!` or
//! "urgent" is high, a single `!` is medium). Completing tasks feeds the
//! mood machine and unlocks milestones.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{export_failed, invalid_import, ToolError, EXPORT_VERSION};

/// Storage key for the list
pub const TODOS_KEY: &str = "retrobot-todos";

/// Completions in one day that earn the streak notification
pub const DAILY_STREAK: u32 = 5;

const URGENT_WORDS: [&str; 5] = ["urgent", "asap", "important", "critical", "emergency"];
const MEDIUM_WORDS: [&str; 3] = ["soon", "priority", "focus"];

/// Milestones by total completed count
const MILESTONES: [(usize, &str); 5] = [
    (1, "First task complete! You're on fire! 🔥"),
    (5, "5 tasks done! Productivity champion! 🏆"),
    (10, "10 tasks complete! You're unstoppable! 🚀"),
    (25, "25 tasks crushed! Master of productivity! 👑"),
    (50, "50 tasks conquered! Legendary status! ⭐"),
];

/// Task priority; sorts high first
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Needs doing now
    High,
    /// Needs doing soon
    Medium,
    /// Whenever
    #[default]
    Normal,
}

impl Priority {
    /// Marker shown next to the task
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::High => "🔥",
            Self::Medium => "⚡",
            Self::Normal => "",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::High => " (HIGH PRIORITY!)",
            Self::Medium => " (Medium priority)",
            Self::Normal => "",
        }
    }
}

/// One task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Unique, never reused
    pub id: u32,
    /// Task text with priority markers stripped
    pub text: String,
    /// Done?
    pub completed: bool,
    /// Priority
    pub priority: Priority,
    /// When it was added
    pub created_at: NaiveDateTime,
    /// When it was last checked off
    pub completed_at: Option<NaiveDateTime>,
}

/// Counts for the stats line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TodoStats {
    /// All tasks
    pub total: usize,
    /// Checked off
    pub completed: usize,
    /// Still open
    pub pending: usize,
}

/// Result of [`TodoList::toggle`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Task checked off
    Completed {
        /// Task text
        text: String,
        /// Milestone reached by this completion
        milestone: Option<&'static str>,
        /// Daily streak threshold reached or exceeded
        streak: bool,
    },
    /// Task unchecked
    Reopened {
        /// Task text
        text: String,
    },
}

impl ToggleOutcome {
    /// What RetroBot says about it
    #[must_use]
    pub fn line(&self) -> String {
        match self {
            Self::Completed { text, .. } => format!("Great job! \"{text}\" is done! 🎉"),
            Self::Reopened { text } => {
                format!("Unchecked \"{text}\". No worries, we all change our minds! 🔄")
            }
        }
    }
}

/// Export file layout
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TodoExport<'a> {
    version: &'static str,
    export_date: NaiveDateTime,
    todos: &'a [TodoItem],
    stats: TodoStats,
}

/// What an import must contain; ids are reassigned on import
#[derive(Deserialize)]
struct TodoImport {
    todos: Vec<ImportedTodo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedTodo {
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    created_at: Option<NaiveDateTime>,
    #[serde(default)]
    completed_at: Option<NaiveDateTime>,
}

/// The task list, persisted as one blob
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoList {
    todos: Vec<TodoItem>,
    id_counter: u32,
    completed_today: u32,
    last_active: Option<NaiveDate>,
}

impl Default for TodoList {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            id_counter: 1,
            completed_today: 0,
            last_active: None,
        }
    }
}

impl TodoList {
    /// Empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks in insertion order
    #[must_use]
    pub fn items(&self) -> &[TodoItem] {
        &self.todos
    }

    /// Look up a task
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&TodoItem> {
        self.todos.iter().find(|t| t.id == id)
    }

    /// Tasks completed since the start of the current day
    #[must_use]
    pub fn completed_today(&self) -> u32 {
        self.completed_today
    }

    /// Reset the daily counter when `today` differs from the last active day
    pub fn roll_day(&mut self, today: NaiveDate) {
        if self.last_active != Some(today) {
            self.completed_today = 0;
            self.last_active = Some(today);
        }
    }

    /// Add a task typed by the user, parsing priority markers
    ///
    /// # Errors
    ///
    /// [`ToolError::EmptyInput`] if the text is blank.
    pub fn add(&mut self, text: &str, now: NaiveDateTime) -> Result<&TodoItem, ToolError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ToolError::EmptyInput);
        }
        let (clean, priority) = parse_priority(text);
        Ok(self.add_quick(clean, priority, now))
    }

    /// Add a task verbatim
    pub fn add_quick(
        &mut self,
        text: impl Into<String>,
        priority: Priority,
        now: NaiveDateTime,
    ) -> &TodoItem {
        let id = self.id_counter;
        self.id_counter += 1;
        self.todos.push(TodoItem {
            id,
            text: text.into(),
            completed: false,
            priority,
            created_at: now,
            completed_at: None,
        });
        let last = self.todos.len() - 1;
        &self.todos[last]
    }

    /// Flip a task between done and not done
    ///
    /// # Errors
    ///
    /// [`ToolError::NotFound`] for an unknown id.
    pub fn toggle(&mut self, id: u32, now: NaiveDateTime) -> Result<ToggleOutcome, ToolError> {
        self.roll_day(now.date());
        let todo = self
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ToolError::NotFound(format!("task {id}")))?;

        todo.completed = !todo.completed;
        if !todo.completed {
            todo.completed_at = None;
            let text = todo.text.clone();
            self.completed_today = self.completed_today.saturating_sub(1);
            return Ok(ToggleOutcome::Reopened { text });
        }

        todo.completed_at = Some(now);
        let text = todo.text.clone();
        self.completed_today += 1;
        let done = self.stats().completed;
        Ok(ToggleOutcome::Completed {
            text,
            milestone: milestone_for(done),
            streak: self.completed_today >= DAILY_STREAK,
        })
    }

    /// Delete a task, returning it
    ///
    /// # Errors
    ///
    /// [`ToolError::NotFound`] for an unknown id.
    pub fn remove(&mut self, id: u32) -> Result<TodoItem, ToolError> {
        let index = self
            .todos
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ToolError::NotFound(format!("task {id}")))?;
        Ok(self.todos.remove(index))
    }

    /// Drop every completed task, returning how many went
    pub fn clear_completed(&mut self) -> usize {
        let before = self.todos.len();
        self.todos.retain(|t| !t.completed);
        before - self.todos.len()
    }

    /// Display order: open tasks first, then by priority, then oldest first
    #[must_use]
    pub fn sorted(&self) -> Vec<&TodoItem> {
        let mut sorted: Vec<&TodoItem> = self.todos.iter().collect();
        sorted.sort_by(|a, b| {
            a.completed
                .cmp(&b.completed)
                .then(a.priority.cmp(&b.priority))
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        sorted
    }

    /// Open tasks
    pub fn pending(&self) -> impl Iterator<Item = &TodoItem> {
        self.todos.iter().filter(|t| !t.completed)
    }

    /// Open high-priority tasks
    pub fn high_priority(&self) -> impl Iterator<Item = &TodoItem> {
        self.pending().filter(|t| t.priority == Priority::High)
    }

    /// Every task as pretty JSON, with counts and the export time
    ///
    /// # Errors
    ///
    /// [`ToolError::ExportFailed`] if serialization fails.
    pub fn export(&self, now: NaiveDateTime) -> Result<String, ToolError> {
        serde_json::to_string_pretty(&TodoExport {
            version: EXPORT_VERSION,
            export_date: now,
            todos: &self.todos,
            stats: self.stats(),
        })
        .map_err(export_failed)
    }

    /// Append the tasks from an export, giving each a fresh id
    ///
    /// Returns how many were added. Tasks without a creation time are
    /// stamped `now`.
    ///
    /// # Errors
    ///
    /// [`ToolError::InvalidImport`] if `data` is not JSON, has no `todos`
    /// array, or holds a task with blank text. Nothing is added then.
    pub fn import(&mut self, data: &str, now: NaiveDateTime) -> Result<usize, ToolError> {
        let import: TodoImport = serde_json::from_str(data).map_err(invalid_import)?;
        if import.todos.iter().any(|t| t.text.trim().is_empty()) {
            return Err(ToolError::InvalidImport("task with empty text".into()));
        }

        let count = import.todos.len();
        for todo in import.todos {
            let id = self.id_counter;
            self.id_counter += 1;
            self.todos.push(TodoItem {
                id,
                text: todo.text.trim().to_string(),
                completed: todo.completed,
                priority: todo.priority,
                created_at: todo.created_at.unwrap_or(now),
                completed_at: todo.completed_at.filter(|_| todo.completed),
            });
        }
        Ok(count)
    }

    /// Current counts
    #[must_use]
    pub fn stats(&self) -> TodoStats {
        let total = self.todos.len();
        let completed = self.todos.iter().filter(|t| t.completed).count();
        TodoStats {
            total,
            completed,
            pending: total - completed,
        }
    }

    /// Stats line shown under the list
    #[must_use]
    pub fn stats_text(&self) -> String {
        let stats = self.stats();
        if stats.total == 0 {
            "Ready for your first task! 🚀".to_string()
        } else if stats.pending == 0 {
            format!("All {} tasks complete! You're amazing! 🌟", stats.total)
        } else {
            format!(
                "{}/{} complete ({} pending)",
                stats.completed, stats.total, stats.pending
            )
        }
    }

    /// Mood level adjustment earned by the completion rate
    #[must_use]
    pub fn mood_bonus(&self) -> Option<i32> {
        let stats = self.stats();
        if stats.total == 0 {
            return None;
        }
        if stats.pending == 0 {
            return Some(15);
        }
        // completed / total > 0.7 without floats
        (stats.completed * 10 > stats.total * 7).then_some(5)
    }
}

/// Strip priority markers from typed text
///
/// `!!!` or "urgent" anywhere makes it high, any other `!` medium.
#[must_use]
pub fn parse_priority(text: &str) -> (String, Priority) {
    let lower = text.to_lowercase();
    if text.contains("!!!") || lower.contains("urgent") {
        let without_bangs: String = text.chars().filter(|c| *c != '!').collect();
        let clean = remove_first_ci(&without_bangs, "urgent");
        (clean.trim().to_string(), Priority::High)
    } else if text.contains('!') {
        let clean: String = text.chars().filter(|c| *c != '!').collect();
        (clean.trim().to_string(), Priority::Medium)
    } else {
        (text.to_string(), Priority::Normal)
    }
}

/// Priority from keywords anywhere in a sentence, keywords removed
///
/// Used when a task arrives through chat rather than the todo input.
#[must_use]
pub fn parse_smart(text: &str) -> (String, Priority) {
    let lower = text.to_lowercase();
    let priority = if URGENT_WORDS.iter().any(|w| lower.contains(w)) {
        Priority::High
    } else if MEDIUM_WORDS.iter().any(|w| lower.contains(w)) {
        Priority::Medium
    } else {
        Priority::Normal
    };

    let kept: Vec<String> = lower
        .split_whitespace()
        .filter(|word| {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
            !URGENT_WORDS.contains(&bare) && !MEDIUM_WORDS.contains(&bare)
        })
        .map(|word| word.replace('!', ""))
        .filter(|word| !word.is_empty())
        .collect();

    let joined = kept.join(" ");
    let mut chars = joined.chars();
    let clean = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    (clean, priority)
}

/// Speech when a task is added
#[must_use]
pub fn added_line(item: &TodoItem) -> String {
    format!(
        "Task added: \"{}\"{}! Let's get it done! 💪",
        item.text,
        item.priority.suffix()
    )
}

/// Speech when a task is deleted
#[must_use]
pub fn removed_line(item: &TodoItem) -> String {
    format!("Deleted \"{}\". Gone but not forgotten! 🗑️", item.text)
}

/// Speech after clearing completed tasks
#[must_use]
pub fn cleared_line(count: usize) -> String {
    if count > 0 {
        format!("Cleared {count} completed tasks! Fresh start! ✨")
    } else {
        "No completed tasks to clear! Keep working! 💪".to_string()
    }
}

/// Speech after a successful import
#[must_use]
pub fn imported_line(count: usize) -> String {
    format!("Imported {count} todos! Your list just got supercharged! 📋⚡")
}

/// Speech for a rejected import
pub const IMPORT_FAILED_LINE: &str = "Import failed! That doesn't look like valid todo data! 😵";

/// Speech for an empty add
pub const EMPTY_LINE: &str = "Can't add an empty task! Give me something to work with! 🤔";

/// Notification for the daily streak
pub const STREAK_LINE: &str = "🔥 5 tasks in one day! You're on fire!";

fn milestone_for(completed: usize) -> Option<&'static str> {
    MILESTONES
        .iter()
        .find(|(count, _)| *count == completed)
        .map(|(_, message)| *message)
}

fn remove_first_ci(haystack: &str, needle: &str) -> String {
    match find_ci(haystack, needle) {
        Some((start, end)) => {
            let mut out = String::with_capacity(haystack.len());
            out.push_str(&haystack[..start]);
            out.push_str(&haystack[end..]);
            out
        }
        None => haystack.to_string(),
    }
}

/// Byte range of the first case-insensitive match of a lowercase `needle`,
/// measured on `haystack` itself
fn find_ci(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    haystack.char_indices().find_map(|(start, _)| {
        let mut rest = haystack[start..].char_indices();
        let mut end = start;
        for wanted in needle.chars() {
            let (offset, c) = rest.next()?;
            let mut lower = c.to_lowercase();
            if lower.next() != Some(wanted) || lower.next().is_some() {
                return None;
            }
            end = start + offset + c.len_utf8();
        }
        Some((start, end))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_priority_markers() {
        assert_eq!(parse_priority("ship it!!!"), ("ship it".into(), Priority::High));
        assert_eq!(
            parse_priority("URGENT call mom"),
            ("call mom".into(), Priority::High)
        );
        assert_eq!(parse_priority("buy milk!"), ("buy milk".into(), Priority::Medium));
        assert_eq!(parse_priority("read book"), ("read book".into(), Priority::Normal));
    }

    #[test]
    fn test_add_rejects_blank() {
        let mut list = TodoList::new();
        assert_eq!(list.add("   ", at(1, 9)).unwrap_err(), ToolError::EmptyInput);
        assert!(list.items().is_empty());
    }

    #[test]
    fn test_ids_never_reused() {
        let mut list = TodoList::new();
        let first = list.add("a", at(1, 9)).unwrap().id;
        list.remove(first).unwrap();
        let second = list.add("b", at(1, 9)).unwrap().id;
        assert_eq!((first, second), (1, 2));
    }

    #[test]
    fn test_sorted_open_then_priority_then_age() {
        let mut list = TodoList::new();
        list.add("old normal", at(1, 8)).unwrap();
        list.add("medium!", at(1, 9)).unwrap();
        list.add("high!!!", at(1, 10)).unwrap();
        let done = list.add("done", at(1, 7)).unwrap().id;
        list.toggle(done, at(1, 11)).unwrap();

        let order: Vec<&str> = list.sorted().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(order, vec!["high", "medium", "old normal", "done"]);
    }

    #[test]
    fn test_first_completion_is_a_milestone() {
        let mut list = TodoList::new();
        let id = list.add("write tests", at(1, 9)).unwrap().id;
        let outcome = list.toggle(id, at(1, 10)).unwrap();
        assert_eq!(
            outcome,
            ToggleOutcome::Completed {
                text: "write tests".into(),
                milestone: Some("First task complete! You're on fire! 🔥"),
                streak: false,
            }
        );
        assert_eq!(list.get(id).unwrap().completed_at, Some(at(1, 10)));

        let reopened = list.toggle(id, at(1, 11)).unwrap();
        assert_eq!(reopened, ToggleOutcome::Reopened { text: "write tests".into() });
        assert_eq!(list.completed_today(), 0);
    }

    #[test]
    fn test_daily_streak_and_day_roll() {
        let mut list = TodoList::new();
        let ids: Vec<u32> = (0..5).map(|i| list.add(&format!("t{i}"), at(1, 9)).unwrap().id).collect();
        let mut last = None;
        for id in &ids {
            last = Some(list.toggle(*id, at(1, 12)).unwrap());
        }
        assert!(matches!(last, Some(ToggleOutcome::Completed { streak: true, milestone: Some(_), .. })));

        list.roll_day(at(2, 0).date());
        assert_eq!(list.completed_today(), 0);
    }

    #[test]
    fn test_stats_and_mood_bonus() {
        let mut list = TodoList::new();
        assert_eq!(list.stats_text(), "Ready for your first task! 🚀");
        assert_eq!(list.mood_bonus(), None);

        let a = list.add("a", at(1, 9)).unwrap().id;
        let b = list.add("b", at(1, 9)).unwrap().id;
        list.toggle(a, at(1, 9)).unwrap();
        assert_eq!(list.stats_text(), "1/2 complete (1 pending)");
        assert_eq!(list.mood_bonus(), None);

        list.toggle(b, at(1, 9)).unwrap();
        assert_eq!(list.stats_text(), "All 2 tasks complete! You're amazing! 🌟");
        assert_eq!(list.mood_bonus(), Some(15));
        assert_eq!(list.clear_completed(), 2);
    }

    #[test]
    fn test_smart_parse() {
        assert_eq!(
            parse_smart("urgent fix the build!"),
            ("Fix the build".into(), Priority::High)
        );
        assert_eq!(
            parse_smart("Review PR soon"),
            ("Review pr".into(), Priority::Medium)
        );
    }

    #[test]
    fn test_priority_markers_with_non_ascii_text() {
        assert_eq!(
            parse_priority("\u{23A}\u{23A}urgent \u{212A}"),
            ("\u{23A}\u{23A} \u{212A}".into(), Priority::High)
        );
        assert_eq!(
            parse_priority("URGENT café run"),
            ("café run".into(), Priority::High)
        );
        assert_eq!(
            parse_priority("Ärger klären!!!"),
            ("Ärger klären".into(), Priority::High)
        );
    }

    #[test]
    fn test_export_then_import_into_another_list() {
        let mut list = TodoList::new();
        list.add("ship it !!!", at(1, 9)).unwrap();
        list.add("water plants", at(1, 10)).unwrap();
        list.toggle(2, at(1, 11)).unwrap();

        let data = list.export(at(2, 8)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["exportDate"], "2024-03-02T08:00:00");
        assert_eq!(json["stats"]["completed"], 1);
        assert_eq!(json["todos"][0]["priority"], "high");

        let mut other = TodoList::new();
        other.add("existing", at(3, 9)).unwrap();
        assert_eq!(other.import(&data, at(3, 10)), Ok(2));

        let texts: Vec<(u32, &str, bool)> = other
            .items()
            .iter()
            .map(|t| (t.id, t.text.as_str(), t.completed))
            .collect();
        assert_eq!(
            texts,
            vec![(1, "existing", false), (2, "ship it", false), (3, "water plants", true)]
        );
        assert_eq!(other.items()[2].completed_at, Some(at(1, 11)));
        assert_eq!(other.add("next", at(3, 11)).unwrap().id, 4);
    }

    #[test]
    fn test_import_fills_missing_fields() {
        let mut list = TodoList::new();
        let data = r#"{"todos":[{"text":"  call mom "}]}"#;
        assert_eq!(list.import(data, at(4, 12)), Ok(1));

        let item = &list.items()[0];
        assert_eq!(item.text, "call mom");
        assert_eq!(item.priority, Priority::Normal);
        assert_eq!(item.created_at, at(4, 12));
        assert!(!item.completed);
    }

    #[test]
    fn test_malformed_import_rejected() {
        let mut list = TodoList::new();
        list.add("keep me", at(1, 9)).unwrap();

        for bad in [
            "not json",
            r#"{"events":{}}"#,
            r#"{"todos":"nope"}"#,
            r#"{"todos":[{"completed":true}]}"#,
            r#"{"todos":[{"text":"ok"},{"text":"   "}]}"#,
            r#"{"todos":[{"text":"x","priority":"whenever"}]}"#,
        ] {
            assert!(
                matches!(list.import(bad, at(1, 10)), Err(ToolError::InvalidImport(_))),
                "accepted {bad}"
            );
        }
        assert_eq!(list.items().len(), 1);
    }

    #[test]
    fn test_unknown_id() {
        let mut list = TodoList::new();
        assert!(matches!(list.toggle(9, at(1, 9)), Err(ToolError::NotFound(_))));
        assert!(matches!(list.remove(9), Err(ToolError::NotFound(_))));
    }

    #[test]
    fn test_persisted_shape() {
        let mut list = TodoList::new();
        list.add("a!", at(1, 9)).unwrap();
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["idCounter"], 2);
        assert_eq!(json["todos"][0]["priority"], "medium");
        let back: TodoList = serde_json::from_value(json).unwrap();
        assert_eq!(back, list);
    }
}
