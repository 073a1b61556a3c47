//! Calendar
//!
//! Events are free text keyed by day. The view shows one month as a six-week
//! grid starting on Sunday; a selected day receives new events, today when
//! nothing is selected.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{export_failed, invalid_import, ToolError, EXPORT_VERSION};

/// Storage key for the event map
pub const EVENTS_KEY: &str = "retrobot-calendar-events";

/// Cells in the month grid
pub const GRID_CELLS: usize = 42;

/// Speech for an empty add
pub const EMPTY_LINE: &str = "Type an event first! I can't schedule nothing! 😅";
/// Speech for moving back a month
pub const PREV_MONTH_LINE: &str = "Going back in time! Well, just one month... ⏰";
/// Speech for moving forward a month
pub const NEXT_MONTH_LINE: &str = "Fast forward to the future! Next month loading... 🚀";

/// Events by day
pub type EventMap = BTreeMap<NaiveDate, Vec<String>>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarExport<'a> {
    version: &'static str,
    export_date: NaiveDateTime,
    events: &'a EventMap,
}

#[derive(Deserialize)]
struct CalendarImport {
    events: EventMap,
}

/// Calendar state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Calendar {
    events: EventMap,
    /// First day of the displayed month
    view_month: NaiveDate,
    selected: Option<NaiveDate>,
}

impl Calendar {
    /// Empty calendar showing the month of `today`
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self::with_events(EventMap::new(), today)
    }

    /// Calendar over previously saved events
    #[must_use]
    pub fn with_events(events: EventMap, today: NaiveDate) -> Self {
        Self {
            events,
            view_month: first_of_month(today),
            selected: None,
        }
    }

    /// Every event
    #[must_use]
    pub fn events(&self) -> &EventMap {
        &self.events
    }

    /// Events on one day
    #[must_use]
    pub fn events_on(&self, date: NaiveDate) -> &[String] {
        self.events.get(&date).map_or(&[], Vec::as_slice)
    }

    /// Selected day, if any
    #[must_use]
    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    /// First day of the displayed month
    #[must_use]
    pub fn view_month(&self) -> NaiveDate {
        self.view_month
    }

    /// Heading such as "March 2024"
    #[must_use]
    pub fn month_title(&self) -> String {
        self.view_month.format("%B %Y").to_string()
    }

    /// The 42 days of the grid, Sunday of the first week onward
    #[must_use]
    pub fn grid(&self) -> Vec<NaiveDate> {
        let lead = u64::from(self.view_month.weekday().num_days_from_sunday());
        let start = self.view_month - Days::new(lead);
        start.iter_days().take(GRID_CELLS).collect()
    }

    /// Select a day and describe it
    pub fn select(&mut self, date: NaiveDate) -> String {
        self.selected = Some(date);
        let events = self.events_on(date);
        if events.is_empty() {
            format!(
                "Selected {}. No events scheduled! Perfect day to plan something! ✨",
                display_date(date)
            )
        } else {
            format!("Selected {}. Events: {}! 📅", display_date(date), events.join(", "))
        }
    }

    /// Add an event to the selected day, or today
    ///
    /// Returns the day it landed on.
    ///
    /// # Errors
    ///
    /// [`ToolError::EmptyInput`] if the text is blank.
    pub fn add(&mut self, text: &str, today: NaiveDate) -> Result<NaiveDate, ToolError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ToolError::EmptyInput);
        }
        let date = *self.selected.get_or_insert(today);
        self.events.entry(date).or_default().push(text.to_string());
        Ok(date)
    }

    /// Remove the `index`th event on `date`, returning its text
    ///
    /// # Errors
    ///
    /// [`ToolError::NotFound`] if there is no such event.
    pub fn remove(&mut self, date: NaiveDate, index: usize) -> Result<String, ToolError> {
        let missing = || ToolError::NotFound(format!("event {index} on {date}"));
        let day = self.events.get_mut(&date).ok_or_else(missing)?;
        if index >= day.len() {
            return Err(missing());
        }
        let removed = day.remove(index);
        if day.is_empty() {
            self.events.remove(&date);
        }
        Ok(removed)
    }

    /// Show the previous month
    pub fn prev_month(&mut self) {
        if let Some(month) = self.view_month.checked_sub_months(Months::new(1)) {
            self.view_month = month;
        }
    }

    /// Show the next month
    pub fn next_month(&mut self) {
        if let Some(month) = self.view_month.checked_add_months(Months::new(1)) {
            self.view_month = month;
        }
    }

    /// Whether anything is on today
    #[must_use]
    pub fn has_events_on(&self, date: NaiveDate) -> bool {
        !self.events_on(date).is_empty()
    }

    /// Days with events from `today` through `today + days`, inclusive
    ///
    /// A window past the last representable date runs to the end of time.
    #[must_use]
    pub fn upcoming(&self, today: NaiveDate, days: u64) -> Vec<(NaiveDate, &[String])> {
        let end = today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
        self.events
            .range(today..=end)
            .filter(|(_, events)| !events.is_empty())
            .map(|(date, events)| (*date, events.as_slice()))
            .collect()
    }

    /// Every event as pretty JSON, keyed by ISO date
    ///
    /// # Errors
    ///
    /// [`ToolError::ExportFailed`] if serialization fails.
    pub fn export(&self, now: NaiveDateTime) -> Result<String, ToolError> {
        serde_json::to_string_pretty(&CalendarExport {
            version: EXPORT_VERSION,
            export_date: now,
            events: &self.events,
        })
        .map_err(export_failed)
    }

    /// Merge an export into this calendar, appending to existing days
    ///
    /// Returns how many events were added.
    ///
    /// # Errors
    ///
    /// [`ToolError::InvalidImport`] if `data` is not JSON, has no `events`
    /// map of ISO dates to lists of text, or holds a blank event. Nothing
    /// is merged then.
    pub fn import(&mut self, data: &str) -> Result<usize, ToolError> {
        let import: CalendarImport = serde_json::from_str(data).map_err(invalid_import)?;
        if import.events.values().flatten().any(|e| e.trim().is_empty()) {
            return Err(ToolError::InvalidImport("event with empty text".into()));
        }

        let mut count = 0;
        for (date, events) in import.events {
            if events.is_empty() {
                continue;
            }
            count += events.len();
            self.events
                .entry(date)
                .or_default()
                .extend(events.into_iter().map(|e| e.trim().to_string()));
        }
        Ok(count)
    }

    /// Add from a sentence like "tomorrow dentist" or "12/25 party"
    ///
    /// Returns the day and event text, or `None` if no date phrase matched.
    /// Month/day dates already past this year roll into the next.
    pub fn quick_add(&mut self, text: &str, today: NaiveDate) -> Option<(NaiveDate, String)> {
        let (date, event) = parse_quick(text, today)?;
        self.events.entry(date).or_default().push(event.clone());
        Some((date, event))
    }
}

/// Speech after a successful import
pub const IMPORTED_LINE: &str =
    "Calendar imported successfully! Your schedule is now super powered! 📅⚡";

/// Speech for a rejected import
pub const IMPORT_FAILED_LINE: &str =
    "Import failed! That doesn't look like valid calendar data! 😵";

/// Speech after adding an event
#[must_use]
pub fn added_line(text: &str, date: NaiveDate) -> String {
    format!(
        "Event \"{}\" added to {}! Your schedule is looking great! 📅✨",
        text.trim(),
        display_date(date)
    )
}

/// Speech after a quick add
#[must_use]
pub fn quick_added_line(text: &str, date: NaiveDate) -> String {
    format!("Smart scheduling! Added \"{text}\" to {}! 🧠✨", display_date(date))
}

/// Speech after removing an event
#[must_use]
pub fn removed_line(text: &str) -> String {
    format!("Event \"{text}\" removed! Calendar updated! 🗑️")
}

/// Month/day/year as users expect to read it
#[must_use]
pub fn display_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn parse_quick(text: &str, today: NaiveDate) -> Option<(NaiveDate, String)> {
    // ASCII lowercasing keeps byte offsets valid for slicing `text`.
    let lower = text.to_ascii_lowercase();
    let relative = [("today ", 0), ("tomorrow ", 1), ("next week ", 7)];
    for (phrase, offset) in relative {
        if let Some(start) = lower.find(phrase) {
            let event = text[start + phrase.len()..].trim();
            if !event.is_empty() {
                return Some((today + Days::new(offset), event.to_string()));
            }
        }
    }

    let mut words = text.split_whitespace();
    while let Some(word) = words.next() {
        let Some((month, day)) = word.split_once('/') else {
            continue;
        };
        let (Ok(month), Ok(day)) = (month.parse::<u32>(), day.parse::<u32>()) else {
            continue;
        };
        if month.to_string().len() > 2 || day.to_string().len() > 2 {
            continue;
        }
        let event = words.collect::<Vec<_>>().join(" ");
        if event.is_empty() {
            return None;
        }
        let mut date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
        if date < today {
            date = NaiveDate::from_ymd_opt(today.year() + 1, month, day)?;
        }
        return Some((date, event));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_defaults_to_today() {
        let today = day(2024, 3, 14);
        let mut cal = Calendar::new(today);
        assert_eq!(cal.add("  ", today), Err(ToolError::EmptyInput));
        assert_eq!(cal.add("Pi day", today), Ok(today));
        assert_eq!(cal.selected(), Some(today));
        assert_eq!(cal.events_on(today), ["Pi day".to_string()]);
    }

    #[test]
    fn test_select_describes_day() {
        let today = day(2024, 3, 14);
        let mut cal = Calendar::new(today);
        assert_eq!(
            cal.select(today),
            "Selected 3/14/2024. No events scheduled! Perfect day to plan something! ✨"
        );
        cal.add("Pi day", today).unwrap();
        cal.add("Pie", today).unwrap();
        assert_eq!(cal.select(today), "Selected 3/14/2024. Events: Pi day, Pie! 📅");
    }

    #[test]
    fn test_remove_drops_empty_day() {
        let today = day(2024, 3, 14);
        let mut cal = Calendar::new(today);
        cal.add("one", today).unwrap();
        assert!(matches!(cal.remove(today, 3), Err(ToolError::NotFound(_))));
        assert_eq!(cal.remove(today, 0), Ok("one".to_string()));
        assert!(cal.events().is_empty());
    }

    #[test]
    fn test_month_navigation_and_grid() {
        let mut cal = Calendar::new(day(2024, 1, 31));
        cal.prev_month();
        assert_eq!(cal.month_title(), "December 2023");
        cal.next_month();
        cal.next_month();
        assert_eq!(cal.view_month(), day(2024, 2, 1));

        let grid = cal.grid();
        assert_eq!(grid.len(), GRID_CELLS);
        // Feb 1 2024 is a Thursday
        assert_eq!(grid[0], day(2024, 1, 28));
        assert_eq!(grid[4], day(2024, 2, 1));
    }

    #[test]
    fn test_quick_add_phrases() {
        let today = day(2024, 3, 14);
        let mut cal = Calendar::new(today);
        assert_eq!(
            cal.quick_add("Tomorrow dentist at 3", today),
            Some((day(2024, 3, 15), "dentist at 3".into()))
        );
        assert_eq!(
            cal.quick_add("next week standup", today),
            Some((day(2024, 3, 21), "standup".into()))
        );
        assert_eq!(
            cal.quick_add("12/25 party", today),
            Some((day(2024, 12, 25), "party".into()))
        );
        assert_eq!(
            cal.quick_add("1/2 recover", today),
            Some((day(2025, 1, 2), "recover".into()))
        );
        assert_eq!(cal.quick_add("13/40 nonsense", today), None);
        assert_eq!(cal.quick_add("someday maybe", today), None);
    }

    #[test]
    fn test_upcoming_window() {
        let today = day(2024, 3, 14);
        let mut cal = Calendar::new(today);
        cal.quick_add("today a", today);
        cal.quick_add("next week b", today);
        cal.quick_add("4/30 c", today);
        let upcoming: Vec<NaiveDate> = cal.upcoming(today, 7).into_iter().map(|(d, _)| d).collect();
        assert_eq!(upcoming, vec![today, day(2024, 3, 21)]);
    }

    #[test]
    fn test_upcoming_window_past_end_of_calendar() {
        let today = day(2024, 3, 14);
        let mut cal = Calendar::new(today);
        cal.quick_add("4/30 c", today);
        cal.quick_add("1/2 later", today);

        let all: Vec<NaiveDate> = cal
            .upcoming(today, u64::MAX)
            .into_iter()
            .map(|(d, _)| d)
            .collect();
        assert_eq!(all, vec![day(2024, 4, 30), day(2025, 1, 2)]);
    }

    #[test]
    fn test_export_merges_into_existing_days() {
        let today = day(2024, 3, 14);
        let mut cal = Calendar::new(today);
        cal.add("Pi day", today).unwrap();
        cal.quick_add("tomorrow dentist", today);

        let data = cal
            .export(today.and_hms_opt(18, 30, 0).unwrap())
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["exportDate"], "2024-03-14T18:30:00");
        assert_eq!(json["events"]["2024-03-15"][0], "dentist");

        let mut other = Calendar::new(today);
        other.add("Pie", today).unwrap();
        assert_eq!(other.import(&data), Ok(2));
        assert_eq!(
            other.events_on(today),
            ["Pie".to_string(), "Pi day".to_string()]
        );
        assert_eq!(other.events_on(day(2024, 3, 15)), ["dentist".to_string()]);
    }

    #[test]
    fn test_malformed_import_rejected() {
        let today = day(2024, 3, 14);
        let mut cal = Calendar::new(today);
        cal.add("keep", today).unwrap();

        for bad in [
            "{",
            r#"{"todos":[]}"#,
            r#"{"events":["2024-03-14"]}"#,
            r#"{"events":{"March 14":["x"]}}"#,
            r#"{"events":{"2024-03-14":"x"}}"#,
            r#"{"events":{"2024-03-14":["ok"],"2024-03-15":[" "]}}"#,
        ] {
            assert!(
                matches!(cal.import(bad), Err(ToolError::InvalidImport(_))),
                "accepted {bad}"
            );
        }
        assert_eq!(cal.events().len(), 1);
        assert_eq!(cal.import(r#"{"events":{"2024-04-01":[]}}"#), Ok(0));
        assert_eq!(cal.events().len(), 1);
    }

    #[test]
    fn test_events_serialize_by_iso_date() {
        let today = day(2024, 3, 14);
        let mut cal = Calendar::new(today);
        cal.add("Pi day", today).unwrap();
        let json = serde_json::to_value(cal.events()).unwrap();
        assert_eq!(json["2024-03-14"][0], "Pi day");
        let back: EventMap = serde_json::from_value(json).unwrap();
        assert_eq!(&back, cal.events());
    }
}
