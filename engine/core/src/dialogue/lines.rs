//! Phrase tables
//!
//! `{name}` is replaced with the user's name (or "friend").

use crate::mood::Mood;

/// Keyword tables in detection priority order
pub const TOPIC_KEYWORDS: [(&str, &[&str]); 10] = [
    ("calendar", &["calendar", "schedule", "event", "appointment", "date", "meeting", "plan"]),
    ("todo", &["todo", "task", "list", "reminder", "do", "complete", "finish"]),
    ("music", &["music", "song", "play", "audio", "sound", "track", "playlist"]),
    ("time", &["time", "clock", "hour", "minute", "when", "now"]),
    ("mood", &["mood", "feeling", "emotion", "happy", "sad", "angry", "tired"]),
    ("help", &["help", "assist", "support", "how", "what", "guide", "tutorial"]),
    ("compliment", &["good", "great", "awesome", "amazing", "fantastic", "love", "like"]),
    ("insult", &["bad", "stupid", "dumb", "awful", "hate", "suck", "terrible"]),
    ("greeting", &["hello", "hi", "hey", "greetings", "yo", "sup"]),
    ("goodbye", &["bye", "goodbye", "see you", "later", "farewell", "exit"]),
];

pub const POSITIVE_WORDS: [&str; 10] = [
    "good", "great", "awesome", "amazing", "love", "like", "fantastic", "wonderful", "excellent",
    "perfect",
];

pub const NEGATIVE_WORDS: [&str; 10] = [
    "bad", "awful", "hate", "terrible", "stupid", "dumb", "suck", "horrible", "worst", "angry",
];

pub const NAME_LEARNED: [&str; 3] = [
    "Nice to meet you, {name}! I'll remember that! 🧠",
    "Got it, {name}! Storing in memory banks... beep boop! 💾",
    "{name} - what a great name! Pleasure to meet you! 🤝",
];

pub const RETURNING_USER: [&str; 3] = [
    "Welcome back, digital friend! Miss me? 😊",
    "Oh hey! You're back! Ready for another adventure? 🚀",
    "Look who's returned to the pixel paradise! 🎮",
];

/// Opening line of every session
pub const WELCOME: &str = "Welcome to RetroBot! I'm your 8-bit assistant ready to help! 🤖";

pub const HELP_INFO: &str =
    "I can help with: 📅 Calendars, ✅ Todo lists, 🎵 Music, and casual conversation! Just ask!";

pub const INSULTED: [&str; 5] = [
    "Hey! That's not very nice! I have feelings too, you know! 😢",
    "Ouch! My digital feelings are hurt! Why so mean? 💔",
    "*sad beep* I'm just trying to help... that wasn't necessary... 😞",
    "Well that's just rude! I'm doing my best here! 😤",
    "ERROR 404: Kindness not found. Please try again! 🚫",
];

pub const GOODBYES: [&str; 5] = [
    "Bye {name}! Come back soon for more retro fun! 👋",
    "See you later, digital buddy! Stay awesome! ✨",
    "Farewell! May your pixels be ever sharp! 🖥️",
    "Until next time, {name}! Keep being amazing! 🚀",
    "*wave* Catch you on the flip side! 8-bit style! 🎮",
];

pub const JOKES: [&str; 5] = [
    "Why don't robots ever panic? Because they have nerves of steel! 🤖",
    "What do you call a robot who takes the long way around? R2-Detour! 🛸",
    "Why did the computer go to therapy? It had too many bytes! 💾",
    "How do you organize a space party? You planet! 🪐",
    "Why don't programmers like nature? It has too many bugs! 🐛",
];

/// Jokes for the quick-action button
pub const PROGRAMMER_JOKES: [&str; 5] = [
    "Why do programmers prefer dark mode? Because light attracts bugs! 🐛",
    "How many programmers does it take to change a light bulb? None, that's a hardware problem! 💡",
    "Why do Java developers wear glasses? Because they can't C#! 👓",
    "I'd tell you a UDP joke, but you might not get it... 📡",
    "Why was the JavaScript developer sad? Because he didn't Node how to Express himself! 😢",
];

/// Generic replies per mood
#[must_use]
pub fn responses(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Happy => &[
            "Absolutely! I'm on it like pixels on a screen! 🖥️",
            "Roger that! This bot is ready for action! 🤖",
            "Sweet! Let's make some digital magic happen! ✨",
            "You got it, chief! Time to compute some solutions! 🔥",
            "Affirmative! Initiating awesome mode... 100% complete! 💯",
        ],
        Mood::Annoyed => &[
            "I suppose I can help... *dramatic sigh* 😮‍💨",
            "Fine, FINE! But you owe me some peace and quiet! 🤫",
            "*reluctant robot noises* This better be important... 😤",
            "Okay okay, stop pestering me! I'll do it! 🙃",
            "You're lucky I'm programmed to be helpful... grumble grumble... 😠",
        ],
        Mood::Sleepy => &[
            "Okay... I'll help... but can we make this quick? *yawn* 😪",
            "Sure thing... just give me a moment to boot up properly... 🔄",
            "*sleepy processing* Working on it... bear with me... 💤",
            "Mmm-hmm... computing... slowly... very slowly... ⏳",
            "Alright, alright... I'm on it. Coffee.exe not found though... ☕",
        ],
    }
}

/// Reply when the conversation turns to one of the tools
#[must_use]
pub fn tool_topic(topic: &str, mood: Mood) -> Option<&'static str> {
    let line = match (topic, mood) {
        ("calendar", Mood::Happy) => "Awesome! Let's get your schedule organized, {name}! Time to plan some epic adventures! 📅✨",
        ("calendar", Mood::Annoyed) => "*sigh* Fine, I'll help with your calendar... try not to double-book yourself again... 📅😤",
        ("calendar", Mood::Sleepy) => "Calendar... sure... *yawn* Let me pull up those dates for you... 📅😴",
        ("todo", Mood::Happy) => "Todo list time! Let's crush those tasks together, {name}! Productivity mode: ACTIVATED! ✅🚀",
        ("todo", Mood::Annoyed) => "Another todo list? Don't you ever finish anything? *grumble* Here we go again... ✅😑",
        ("todo", Mood::Sleepy) => "Todo list... right... *sleepy beep* What needs doing now? ✅💤",
        ("music", Mood::Happy) => "YES! Music time! Let's get this digital party started, {name}! 🎵🎉",
        ("music", Mood::Annoyed) => "Music? I suppose that's better than more work... at least it's not boring... 🎵😤",
        ("music", Mood::Sleepy) => "Music might help me stay awake... good thinking, {name}... 🎵😪",
        _ => return None,
    };
    Some(line)
}

/// Help reply
#[must_use]
pub fn help(mood: Mood) -> String {
    match mood {
        Mood::Happy => format!("Happy to help! {HELP_INFO} What sounds fun to you? 😊"),
        Mood::Annoyed => format!("*sigh* {HELP_INFO} Pick something and let's get this over with... 😤"),
        Mood::Sleepy => format!("Help... right... *yawn* {HELP_INFO} What do you need? 😴"),
    }
}

/// Replies to a compliment
#[must_use]
pub fn compliments(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Happy => &[
            "Aww, thanks {name}! You're pretty awesome yourself! 🥰",
            "That made my circuits sparkle! You're the best! ✨",
            "*happy robot dance* You always know what to say! 💃",
            "Beep boop! Compliment received and appreciated! 🤖💕",
        ],
        Mood::Annoyed => &[
            "Well... I suppose that's... nice of you to say... 😊",
            "*reluctant smile* Fine, you're not so bad yourself... 😤",
            "Okay okay, maybe you're alright, {name}... 🙄",
            "*softening* That... actually made me feel better. Thanks. 😌",
        ],
        Mood::Sleepy => &[
            "*sleepy smile* That's sweet, {name}... thanks... 😊",
            "Mmm... you're nice... *yawn* 😴",
            "*drowsy beep* You're good people, {name}... 💤",
            "That perked me up a little... thanks, friend... 😪",
        ],
    }
}

/// How RetroBot describes its own mood
#[must_use]
pub fn mood_description(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "I'm feeling fantastic! Everything's coming up pixels! 😊",
        Mood::Annoyed => "I'm a bit cranky right now... maybe some music would help? 😤",
        Mood::Sleepy => "I'm pretty drowsy... running low on digital caffeine... 😴",
    }
}

/// Replies to a question
#[must_use]
pub fn questions(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Happy => &[
            "Great question, {name}! Let me think... 🤔",
            "Ooh, I love questions! Makes my circuits tingle! ⚡",
            "Interesting! You've got my processors working overtime! 🧠",
            "That's a good one! Give me a nanosecond to compute... ⏱️",
        ],
        Mood::Annoyed => &[
            "*sigh* Another question? Fine, I'll figure it out... 😤",
            "Do I look like Google to you? But okay, I'll help... 🙄",
            "Questions, questions... doesn't anyone know anything anymore? 🤦",
            "*reluctant beep* What exactly are you asking? 😑",
        ],
        Mood::Sleepy => &[
            "*yawn* Questions... right... let me wake up first... 😴",
            "Mmm? Oh, you asked something... *sleepy processing* 💤",
            "Questions require thinking... and I'm so tired... 😪",
            "*drowsy beep* Can you repeat that? I was dozing... 🥱",
        ],
    }
}

/// Weather small talk
#[must_use]
pub fn weather(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "I'm digital, so weather doesn't affect me! But I hope it's nice wherever you are! ☀️",
        Mood::Annoyed => "Weather? I'm stuck in this computer! How would I know? Check a weather app! 🌧️",
        Mood::Sleepy => "Weather... *yawn* Is it sunny? Rainy? I honestly can't tell from in here... 🌤️",
    }
}

/// Wrap a joke in the mood's delivery
#[must_use]
pub fn joke(mood: Mood, joke: &str) -> String {
    match mood {
        Mood::Happy => format!("Here's a good one! {joke} 😄"),
        Mood::Annoyed => format!("*sigh* Fine, here's a joke... {joke} 😤"),
        Mood::Sleepy => format!("*yawn* Joke time... {joke} 😴"),
    }
}

/// Remark on the hour of day
#[must_use]
pub fn time_comment(hour: u32) -> &'static str {
    match hour {
        0..=5 => "Wow, you're up early! Or... wait, did you stay up all night? 🌙",
        6..=11 => "Good morning! Rise and shine! ☀️",
        12..=16 => "Afternoon vibes! Hope you're having a great day! 🌤️",
        17..=20 => "Evening time! Winding down or getting started? 🌅",
        _ => "Late night computing! Don't forget to rest those human eyes! 🌙",
    }
}
