//! Dialogue Selector
//!
//! Rule-based personality. A message is classified by topic (first keyword
//! table that matches wins) and sentiment (positive vs negative word
//! counts), then a reply is drawn from the tables for the bot's mood and
//! given a mood-flavoured twist.
//!
//! # Design Philosophy
//!
//! The selector never touches the mood machine, the tools or storage. What
//! a message *does* comes back as [`DialogueAction`]s for the shell to
//! apply in order. Mood-dependent wording is chosen against the mood the
//! bot will have once those actions are applied, computed with
//! [`MoodState::adjusted`].
//!
//! ```text
//!   message ──► name? ──► topic + sentiment ──► reply text ──► flair
//!                 │               │                  │
//!                 ▼               ▼                  ▼
//!           RememberName    AdjustLevel       SwitchTool / ChangeMood
//! ```

mod lines;

pub use lines::{PROGRAMMER_JOKES, WELCOME};

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mood::{Mood, MoodState};
use crate::tools::Tool;

/// Storage key for the learned name
pub const USERNAME_KEY: &str = "retrobot-username";

/// History length that triggers trimming
pub const HISTORY_LIMIT: usize = 50;
/// Entries kept after trimming
pub const HISTORY_KEEP: usize = 25;
/// History entries after which greetings treat the user as returning
pub const RETURNING_AFTER: usize = 5;

/// Name used before the user introduces themselves
pub const DEFAULT_NAME: &str = "friend";

const NAME_TRIGGERS: [&str; 4] = ["my name is ", "i'm ", "i am ", "call me "];

/// What a message is about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Dates and events
    Calendar,
    /// Tasks
    Todo,
    /// Songs
    Music,
    /// Clock
    Time,
    /// The bot's feelings
    Mood,
    /// Asking for help
    Help,
    /// Nice words
    Compliment,
    /// Mean words
    Insult,
    /// Hello
    Greeting,
    /// Bye
    Goodbye,
    /// Anything else
    General,
}

impl Topic {
    /// Lowercase name
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Todo => "todo",
            Self::Music => "music",
            Self::Time => "time",
            Self::Mood => "mood",
            Self::Help => "help",
            Self::Compliment => "compliment",
            Self::Insult => "insult",
            Self::Greeting => "greeting",
            Self::Goodbye => "goodbye",
            Self::General => "general",
        }
    }

    fn from_label(label: &str) -> Self {
        match label {
            "calendar" => Self::Calendar,
            "todo" => Self::Todo,
            "music" => Self::Music,
            "time" => Self::Time,
            "mood" => Self::Mood,
            "help" => Self::Help,
            "compliment" => Self::Compliment,
            "insult" => Self::Insult,
            "greeting" => Self::Greeting,
            "goodbye" => Self::Goodbye,
            _ => Self::General,
        }
    }

    /// Tool this topic opens, if any
    #[must_use]
    pub fn tool(self) -> Option<Tool> {
        match self {
            Self::Calendar => Some(Tool::Calendar),
            Self::Todo => Some(Tool::Todo),
            Self::Music => Some(Tool::Music),
            _ => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Overall tone of a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// More positive words than negative
    Positive,
    /// More negative words than positive
    Negative,
    /// Tied
    Neutral,
}

impl Sentiment {
    /// Mood level change this tone causes
    #[must_use]
    pub fn level_delta(self) -> Option<i32> {
        match self {
            Self::Positive => Some(5),
            Self::Negative => Some(-10),
            Self::Neutral => None,
        }
    }
}

/// Side effect requested by a reply
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "kebab-case")]
pub enum DialogueAction {
    /// Open a tool tab
    SwitchTool(Tool),
    /// Move the mood level
    AdjustLevel(i32),
    /// Set the mood outright
    ChangeMood(Mood),
    /// Persist the user's name
    RememberName(String),
}

/// A reply and what it implies
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    /// Text to speak
    pub text: String,
    /// Detected topic (`None` when the message introduced a name)
    pub topic: Option<Topic>,
    /// Detected sentiment (`None` when the message introduced a name)
    pub sentiment: Option<Sentiment>,
    /// Side effects, to be applied in order
    pub actions: Vec<DialogueAction>,
}

/// What the selector needs to know about the bot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DialogueContext {
    /// Mood and level before the message
    pub mood: MoodState,
    /// Local time
    pub now: NaiveDateTime,
}

/// Who said it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The human
    User,
    /// RetroBot
    Bot,
}

/// One line of conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Speaker
    pub speaker: Speaker,
    /// Text
    pub message: String,
    /// When
    pub at: NaiveDateTime,
}

/// The personality
pub struct DialogueSelector {
    rng: StdRng,
    user_name: Option<String>,
    history: Vec<HistoryEntry>,
}

impl fmt::Debug for DialogueSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueSelector")
            .field("user_name", &self.user_name)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl Default for DialogueSelector {
    fn default() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl DialogueSelector {
    /// Selector drawing from `rng`
    #[must_use]
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            user_name: None,
            history: Vec::new(),
        }
    }

    /// Start out knowing the user's name
    #[must_use]
    pub fn with_user_name(mut self, name: Option<String>) -> Self {
        self.user_name = name;
        self
    }

    /// Learned name, if any
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// Conversation so far, oldest first
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Reply to a user message
    pub fn respond(&mut self, message: &str, ctx: &DialogueContext) -> Reply {
        let lower = message.trim().to_lowercase();
        self.record(Speaker::User, message, ctx.now);

        if self.user_name.is_none() {
            if let Some(name) = extract_name(&lower) {
                debug!(%name, "Learned user name");
                let text = self.pick(&lines::NAME_LEARNED).replace("{name}", &name);
                self.user_name = Some(name.clone());
                self.record(Speaker::Bot, &text, ctx.now);
                return Reply {
                    text,
                    topic: None,
                    sentiment: None,
                    actions: vec![DialogueAction::RememberName(name)],
                };
            }
        }

        let topic = detect_topic(&lower);
        let sentiment = analyze_sentiment(&lower);
        debug!(%topic, ?sentiment, "Classified message");

        let mut actions = Vec::new();
        let mut state = ctx.mood;
        if let Some(delta) = sentiment.level_delta() {
            actions.push(DialogueAction::AdjustLevel(delta));
            state = state.adjusted(delta);
        }

        let text = self.compose(topic, &lower, &mut state, &mut actions, ctx.now);
        let text = self.flair(text, state.mood);
        self.record(Speaker::Bot, &text, ctx.now);

        Reply {
            text,
            topic: Some(topic),
            sentiment: Some(sentiment),
            actions,
        }
    }

    /// Greeting that knows whether the user has been chatting a while
    pub fn greeting(&mut self) -> String {
        if self.history.len() > RETURNING_AFTER {
            self.pick(&lines::RETURNING_USER).to_string()
        } else {
            WELCOME.to_string()
        }
    }

    /// A programmer joke for the quick-action button
    pub fn programmer_joke(&mut self) -> String {
        self.pick(&PROGRAMMER_JOKES).to_string()
    }

    /// Roughen or brighten a reply according to mood
    pub fn flair(&mut self, mut text: String, mood: Mood) -> String {
        match mood {
            Mood::Happy => {
                if !text.contains('!') && self.rng.gen_bool(0.5) {
                    text.push('!');
                }
                text
            }
            Mood::Annoyed if self.rng.gen_bool(0.3) => format!("*grumble* {text}"),
            Mood::Sleepy if self.rng.gen_bool(0.3) => format!("*yawn* {text}"),
            _ => text,
        }
    }

    fn compose(
        &mut self,
        topic: Topic,
        lower: &str,
        state: &mut MoodState,
        actions: &mut Vec<DialogueAction>,
        now: NaiveDateTime,
    ) -> String {
        let mood = state.mood;
        let name = self.user_name.clone().unwrap_or_else(|| DEFAULT_NAME.to_string());

        match topic {
            Topic::Calendar | Topic::Todo | Topic::Music => {
                if let Some(tool) = topic.tool() {
                    actions.push(DialogueAction::SwitchTool(tool));
                }
                lines::tool_topic(topic.label(), mood).map_or_else(
                    || format!("Switching to {topic} tool! Here we go! 🤖"),
                    |line| line.replace("{name}", &name),
                )
            }
            Topic::Time => format!(
                "Current time is {} on {}. {} ⏰",
                now.format("%-I:%M:%S %p"),
                now.format("%a %b %d %Y"),
                lines::time_comment(now.hour())
            ),
            Topic::Help => lines::help(mood),
            Topic::Compliment => {
                actions.push(DialogueAction::AdjustLevel(10));
                *state = state.adjusted(10);
                self.pick(lines::compliments(mood)).replace("{name}", &name)
            }
            Topic::Insult => {
                actions.push(DialogueAction::ChangeMood(Mood::Annoyed));
                state.mood = Mood::Annoyed;
                self.pick(&lines::INSULTED).to_string()
            }
            Topic::Greeting => self.greeting(),
            Topic::Goodbye => self.pick(&lines::GOODBYES).replace("{name}", &name),
            Topic::Mood => format!(
                "{} My mood level is {}% - feeling {}! 🎭",
                lines::mood_description(mood),
                state.level,
                state.level_text()
            ),
            Topic::General => {
                if lower.contains('?') {
                    self.pick(lines::questions(mood)).replace("{name}", &name)
                } else if lower.contains("weather") {
                    lines::weather(mood).to_string()
                } else if lower.contains("joke") || lower.contains("funny") {
                    let joke = self.pick(&lines::JOKES);
                    lines::joke(mood, joke)
                } else {
                    self.pick(lines::responses(mood)).to_string()
                }
            }
        }
    }

    fn pick(&mut self, options: &[&'static str]) -> &'static str {
        if options.is_empty() {
            return "";
        }
        options[self.rng.gen_range(0..options.len())]
    }

    fn record(&mut self, speaker: Speaker, message: &str, at: NaiveDateTime) {
        self.history.push(HistoryEntry {
            speaker,
            message: message.to_string(),
            at,
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_KEEP;
            self.history.drain(..excess);
        }
    }
}

/// First topic whose keywords appear in the (lowercased) message
#[must_use]
pub fn detect_topic(lower: &str) -> Topic {
    lines::TOPIC_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(Topic::General, |(label, _)| Topic::from_label(label))
}

/// Compare positive and negative word counts in the (lowercased) message
#[must_use]
pub fn analyze_sentiment(lower: &str) -> Sentiment {
    let positive = lines::POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negative = lines::NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Name from an introduction such as "my name is ada", capitalised
#[must_use]
pub fn extract_name(lower: &str) -> Option<String> {
    NAME_TRIGGERS.iter().find_map(|trigger| {
        let start = lower.find(trigger)? + trigger.len();
        let word: String = lower[start..]
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let mut chars = word.chars();
        let first = chars.next()?;
        Some(first.to_uppercase().chain(chars).collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ctx(mood: Mood, level: u8) -> DialogueContext {
        DialogueContext {
            mood: MoodState { mood, level },
            now: NaiveDate::from_ymd_opt(2024, 3, 14)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
        }
    }

    fn selector() -> DialogueSelector {
        DialogueSelector::new(StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_topic_priority() {
        assert_eq!(detect_topic("put on some music"), Topic::Music);
        // "do" is a todo keyword, so it outranks help
        assert_eq!(detect_topic("what do you think"), Topic::Todo);
        assert_eq!(detect_topic("hello there"), Topic::Greeting);
        assert_eq!(detect_topic("zzz"), Topic::General);
    }

    #[test]
    fn test_sentiment_counts() {
        assert_eq!(analyze_sentiment("great and awesome"), Sentiment::Positive);
        assert_eq!(analyze_sentiment("bad but good"), Sentiment::Neutral);
        assert_eq!(analyze_sentiment("the worst"), Sentiment::Negative);
    }

    #[test]
    fn test_name_extraction() {
        assert_eq!(extract_name("my name is ada lovelace"), Some("Ada".into()));
        assert_eq!(extract_name("call me grace"), Some("Grace".into()));
        assert_eq!(extract_name("hi there"), None);
    }

    #[test]
    fn test_learns_name_once() {
        let mut sel = selector();
        let reply = sel.respond("My name is Ada", &ctx(Mood::Happy, 80));
        assert_eq!(reply.actions, vec![DialogueAction::RememberName("Ada".into())]);
        assert!(reply.text.contains("Ada"));
        assert_eq!(sel.user_name(), Some("Ada"));

        let again = sel.respond("i am bob", &ctx(Mood::Happy, 80));
        assert!(!again.actions.contains(&DialogueAction::RememberName("Bob".into())));
        assert_eq!(sel.user_name(), Some("Ada"));
    }

    #[test]
    fn test_tool_topic_switches_and_names_user() {
        let mut sel = selector().with_user_name(Some("Ada".into()));
        let reply = sel.respond("open my calendar", &ctx(Mood::Happy, 80));
        assert_eq!(reply.actions, vec![DialogueAction::SwitchTool(Tool::Calendar)]);
        assert!(reply.text.starts_with("Awesome! Let's get your schedule organized, Ada!"));
    }

    #[test]
    fn test_insult_turns_annoyed() {
        let mut sel = selector();
        let reply = sel.respond("you are stupid", &ctx(Mood::Happy, 80));
        assert_eq!(reply.topic, Some(Topic::Insult));
        assert_eq!(
            reply.actions,
            vec![
                DialogueAction::AdjustLevel(-10),
                DialogueAction::ChangeMood(Mood::Annoyed)
            ]
        );
    }

    #[test]
    fn test_compliment_uses_mood_after_sentiment() {
        let mut sel = selector();
        // 68 + 5 crosses into happy before the compliment line is chosen
        let reply = sel.respond("you are awesome", &ctx(Mood::Sleepy, 68));
        assert_eq!(
            reply.actions,
            vec![DialogueAction::AdjustLevel(5), DialogueAction::AdjustLevel(10)]
        );
        let happy: Vec<String> = lines::compliments(Mood::Happy)
            .iter()
            .map(|l| l.replace("{name}", DEFAULT_NAME))
            .collect();
        assert!(happy.iter().any(|l| reply.text.starts_with(l.as_str())));
    }

    #[test]
    fn test_mood_report() {
        let mut sel = selector();
        let reply = sel.respond("how is your mood", &ctx(Mood::Sleepy, 45));
        assert_eq!(reply.topic, Some(Topic::Mood));
        assert!(reply.text.contains("My mood level is 45% - feeling okay! 🎭"));
    }

    #[test]
    fn test_time_reply() {
        let mut sel = selector();
        let reply = sel.respond("clock", &ctx(Mood::Happy, 80));
        assert!(reply.text.starts_with(
            "Current time is 9:05:00 AM on Thu Mar 14 2024. Good morning! Rise and shine! ☀️ ⏰"
        ));
    }

    #[test]
    fn test_greeting_turns_returning() {
        let mut sel = selector();
        assert_eq!(sel.greeting(), WELCOME);
        for _ in 0..3 {
            sel.respond("zzz", &ctx(Mood::Happy, 80));
        }
        assert!(lines::RETURNING_USER.contains(&sel.greeting().as_str()));
    }

    #[test]
    fn test_history_trimmed() {
        let mut sel = selector();
        for _ in 0..26 {
            sel.respond("zzz", &ctx(Mood::Happy, 80));
        }
        // 52 entries went in; trimming at 51 kept 25, one more reply followed
        assert_eq!(sel.history().len(), 26);
        assert_eq!(sel.history().last().unwrap().speaker, Speaker::Bot);
    }

    #[test]
    fn test_seeded_selectors_agree() {
        let mut a = selector();
        let mut b = selector();
        for msg in ["zzz", "tell me a joke", "is it raining?", "you're great"] {
            assert_eq!(
                a.respond(msg, &ctx(Mood::Annoyed, 20)).text,
                b.respond(msg, &ctx(Mood::Annoyed, 20)).text
            );
        }
    }

    #[test]
    fn test_flair_leaves_exclaimed_happy_text() {
        let mut sel = selector();
        for _ in 0..20 {
            assert_eq!(sel.flair("Done!".into(), Mood::Happy), "Done!");
        }
    }
}
