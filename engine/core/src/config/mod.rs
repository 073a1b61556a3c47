//! Configuration
//!
//! Every timing RetroBot uses is tunable. Values are resolved from several
//! sources with a fixed priority:
//!
//! 1. CLI arguments (highest priority, applied by the binary via [`ConfigOverrides`])
//! 2. Environment variables (`RETROBOT_*`)
//! 3. TOML configuration file
//! 4. Default values (lowest priority)
//!
//! # Configuration File Location
//!
//! Follows XDG Base Directory Specification:
//! - `$XDG_CONFIG_HOME/retrobot/retrobot.toml`
//! - Falls back to `~/.config/retrobot/retrobot.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! [timing]
//! idle_min_ms = 5000
//! idle_max_ms = 10000
//! easter_egg_cooldown_ms = 5000
//! auto_hide_ms = 30000
//! reply_delay_ms = 300
//!
//! [storage]
//! dir = "/home/me/.local/share/retrobot"
//!
//! [personality]
//! seed = 42
//! ```

use std::ops::Range;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// Path to the config file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values do not make sense together
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Where the resolved configuration last took a value from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Command-line argument
    Cli,
    /// Environment variable
    Env,
    /// TOML configuration file
    File,
    /// Built-in default
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Timings, all in milliseconds
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingToml {
    /// Shortest pause between idle fidgets
    pub idle_min_ms: Option<u64>,

    /// Longest pause between idle fidgets (exclusive)
    pub idle_max_ms: Option<u64>,

    /// Quiet period after an easter egg fires
    pub easter_egg_cooldown_ms: Option<u64>,

    /// Inactivity before RetroBot gets sleepy
    pub auto_hide_ms: Option<u64>,

    /// Sleepy time before the window minimizes itself
    pub auto_minimize_ms: Option<u64>,

    /// Pause before a chat reply
    pub reply_delay_ms: Option<u64>,

    /// Pause between startup and the window appearing
    pub show_delay_ms: Option<u64>,

    /// How long notifications stay up
    pub notification_ms: Option<u64>,

    /// Length of a simulated music track
    pub track_ms: Option<u64>,
}

/// Persistence settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageToml {
    /// Directory for saved state
    pub dir: Option<PathBuf>,
}

/// Personality settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityToml {
    /// Fixed RNG seed for reproducible replies and fidgets
    pub seed: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetroBotToml {
    /// Timing section
    pub timing: TimingToml,

    /// Storage section
    pub storage: StorageToml,

    /// Personality section
    pub personality: PersonalityToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved RetroBot configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetroBotConfig {
    /// Shortest pause between idle fidgets
    pub idle_min_ms: u64,

    /// Longest pause between idle fidgets (exclusive)
    pub idle_max_ms: u64,

    /// Quiet period after an easter egg fires
    pub easter_egg_cooldown_ms: u64,

    /// Inactivity before RetroBot gets sleepy
    pub auto_hide_ms: u64,

    /// Sleepy time before the window minimizes itself
    pub auto_minimize_ms: u64,

    /// Pause before a chat reply
    pub reply_delay_ms: u64,

    /// Pause between startup and the window appearing
    pub show_delay_ms: u64,

    /// How long notifications stay up
    pub notification_ms: u64,

    /// Length of a simulated music track
    pub track_ms: u64,

    /// Directory for saved state (`None` means the platform data dir)
    pub storage_dir: Option<PathBuf>,

    /// Fixed RNG seed
    pub seed: Option<u64>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for RetroBotConfig {
    fn default() -> Self {
        Self {
            idle_min_ms: 5_000,
            idle_max_ms: 10_000,
            easter_egg_cooldown_ms: 5_000,
            auto_hide_ms: 30_000,
            auto_minimize_ms: 3_000,
            reply_delay_ms: 300,
            show_delay_ms: 500,
            notification_ms: 2_000,
            track_ms: 10_000,
            storage_dir: None,
            seed: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl RetroBotConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the RNG seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Window the idle loop draws its delays from
    #[must_use]
    pub fn idle_range(&self) -> Range<u64> {
        self.idle_min_ms..self.idle_max_ms
    }

    /// Check values that only make sense together
    ///
    /// # Errors
    ///
    /// [`ConfigError::ValidationError`] if the idle window is empty or the
    /// cooldown is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_min_ms >= self.idle_max_ms {
            return Err(ConfigError::ValidationError(format!(
                "idle_min_ms ({}) must be below idle_max_ms ({})",
                self.idle_min_ms, self.idle_max_ms
            )));
        }
        if self.easter_egg_cooldown_ms == 0 {
            return Err(ConfigError::ValidationError(
                "easter_egg_cooldown_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/retrobot/retrobot.toml` or
/// `~/.config/retrobot/retrobot.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("retrobot").join("retrobot.toml"))
}

/// Load configuration from the default file, the environment and defaults
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or the
/// resolved values fail validation. A missing file is not an error.
pub fn load_config() -> Result<RetroBotConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the resolved
/// values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<RetroBotConfig, ConfigError> {
    let mut config = RetroBotConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: RetroBotToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;
    Ok(config)
}

fn apply_toml_config(config: &mut RetroBotConfig, toml: &RetroBotToml) {
    let timing = &toml.timing;
    let slots = [
        (timing.idle_min_ms, &mut config.idle_min_ms),
        (timing.idle_max_ms, &mut config.idle_max_ms),
        (timing.easter_egg_cooldown_ms, &mut config.easter_egg_cooldown_ms),
        (timing.auto_hide_ms, &mut config.auto_hide_ms),
        (timing.auto_minimize_ms, &mut config.auto_minimize_ms),
        (timing.reply_delay_ms, &mut config.reply_delay_ms),
        (timing.show_delay_ms, &mut config.show_delay_ms),
        (timing.notification_ms, &mut config.notification_ms),
        (timing.track_ms, &mut config.track_ms),
    ];
    for (value, slot) in slots {
        if let Some(ms) = value {
            *slot = ms;
        }
    }

    if toml.storage.dir.is_some() {
        config.storage_dir.clone_from(&toml.storage.dir);
    }
    if toml.personality.seed.is_some() {
        config.seed = toml.personality.seed;
    }
}

/// Timing variables read by [`load_config`], in field order
const ENV_TIMINGS: [&str; 9] = [
    "RETROBOT_IDLE_MIN_MS",
    "RETROBOT_IDLE_MAX_MS",
    "RETROBOT_EASTER_EGG_COOLDOWN_MS",
    "RETROBOT_AUTO_HIDE_MS",
    "RETROBOT_AUTO_MINIMIZE_MS",
    "RETROBOT_REPLY_DELAY_MS",
    "RETROBOT_SHOW_DELAY_MS",
    "RETROBOT_NOTIFICATION_MS",
    "RETROBOT_TRACK_MS",
];

fn apply_env_config(config: &mut RetroBotConfig) {
    let slots = [
        &mut config.idle_min_ms,
        &mut config.idle_max_ms,
        &mut config.easter_egg_cooldown_ms,
        &mut config.auto_hide_ms,
        &mut config.auto_minimize_ms,
        &mut config.reply_delay_ms,
        &mut config.show_delay_ms,
        &mut config.notification_ms,
        &mut config.track_ms,
    ];
    let mut from_env = false;
    for (var, slot) in ENV_TIMINGS.into_iter().zip(slots) {
        if let Ok(value) = std::env::var(var) {
            match value.parse::<u64>() {
                Ok(ms) => {
                    *slot = ms;
                    from_env = true;
                }
                Err(_) => tracing::warn!(var, %value, "Ignoring non-numeric environment value"),
            }
        }
    }

    if let Ok(dir) = std::env::var("RETROBOT_STORAGE_DIR") {
        config.storage_dir = Some(PathBuf::from(dir));
        from_env = true;
    }
    if let Ok(seed) = std::env::var("RETROBOT_SEED") {
        if let Ok(seed) = seed.parse::<u64>() {
            config.seed = Some(seed);
            from_env = true;
        }
    }

    if from_env {
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Storage directory override
    pub storage_dir: Option<PathBuf>,

    /// RNG seed override
    pub seed: Option<u64>,

    /// Auto-hide override (milliseconds)
    pub auto_hide_ms: Option<u64>,

    /// Track length override (milliseconds)
    pub track_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set storage directory override
    #[must_use]
    pub fn with_storage_dir(mut self, dir: PathBuf) -> Self {
        self.storage_dir = Some(dir);
        self
    }

    /// Set seed override
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set auto-hide override
    #[must_use]
    pub fn with_auto_hide_ms(mut self, ms: u64) -> Self {
        self.auto_hide_ms = Some(ms);
        self
    }

    /// Set track length override
    #[must_use]
    pub fn with_track_ms(mut self, ms: u64) -> Self {
        self.track_ms = Some(ms);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut RetroBotConfig) {
        if self.storage_dir.is_some()
            || self.seed.is_some()
            || self.auto_hide_ms.is_some()
            || self.track_ms.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref dir) = self.storage_dir {
            config.storage_dir = Some(dir.clone());
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(ms) = self.auto_hide_ms {
            config.auto_hide_ms = ms;
        }
        if let Some(ms) = self.track_ms {
            config.track_ms = ms;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Serializes tests that touch the process environment
    static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

    /// Holds [`ENV_LOCK`] and a clean `RETROBOT_*` environment for one test.
    /// Variables set through the guard are removed again on drop.
    struct EnvGuard {
        _lock: parking_lot::MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let lock = ENV_LOCK.lock();
            clear_config_env_vars();
            Self { _lock: lock }
        }

        fn set(&self, var: &str, value: &str) {
            std::env::set_var(var, value);
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            clear_config_env_vars();
        }
    }

    /// Remove every variable [`load_config`] reads.
    fn clear_config_env_vars() {
        for var in ENV_TIMINGS {
            std::env::remove_var(var);
        }
        std::env::remove_var("RETROBOT_STORAGE_DIR");
        std::env::remove_var("RETROBOT_SEED");
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = RetroBotConfig::default();

        assert_eq!(config.idle_range(), 5_000..10_000);
        assert_eq!(config.easter_egg_cooldown_ms, 5_000);
        assert_eq!(config.auto_hide_ms, 30_000);
        assert_eq!(config.auto_minimize_ms, 3_000);
        assert_eq!(config.reply_delay_ms, 300);
        assert_eq!(config.show_delay_ms, 500);
        assert_eq!(config.notification_ms, 2_000);
        assert_eq!(config.track_ms, 10_000);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.ends_with("retrobot/retrobot.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let _env = EnvGuard::new();
        let file = write_toml(
            r#"
[timing]
idle_min_ms = 1000
idle_max_ms = 2000
reply_delay_ms = 50
track_ms = 4000

[storage]
dir = "/tmp/retrobot-state"

[personality]
seed = 42
"#,
        );

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.idle_min_ms, 1000);
        assert_eq!(config.idle_max_ms, 2000);
        assert_eq!(config.reply_delay_ms, 50);
        assert_eq!(config.track_ms, 4000);
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/retrobot-state")));
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
        assert_eq!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_parse_partial_toml() {
        let _env = EnvGuard::new();
        let file = write_toml("[timing]\nshow_delay_ms = 900\n");
        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.show_delay_ms, 900);
        assert!(config.notification_ms > 0);
    }

    #[test]
    fn test_missing_file_graceful() {
        let _env = EnvGuard::new();

        let path = PathBuf::from("/nonexistent/path/retrobot.toml");
        let config = load_config_from_path(Some(path)).unwrap();

        assert!(config.config_file_path.is_none());
        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config, RetroBotConfig::default());
    }

    #[test]
    fn test_malformed_toml_error() {
        let _env = EnvGuard::new();
        let file = write_toml("[timing\nidle_min_ms = \"soon\"\n");
        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_inverted_idle_window_rejected() {
        let _env = EnvGuard::new();
        let file = write_toml("[timing]\nidle_min_ms = 9000\nidle_max_ms = 9000\n");
        let result = load_config_from_path(Some(file.path().to_path_buf()));
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("idle_min_ms"));
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        let config = RetroBotConfig {
            easter_egg_cooldown_ms: 0,
            ..RetroBotConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    // =========================================================================
    // Priority Ordering Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let env = EnvGuard::new();
        let file = write_toml("[timing]\nauto_hide_ms = 12000\nreply_delay_ms = 80\n");

        env.set("RETROBOT_AUTO_HIDE_MS", "6000");
        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.auto_hide_ms, 6000);
        assert_eq!(config.reply_delay_ms, 80);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_env_storage_dir_and_seed() {
        let env = EnvGuard::new();
        env.set("RETROBOT_STORAGE_DIR", "/var/lib/retrobot");
        env.set("RETROBOT_SEED", "31337");

        let config = load_config_from_path(None).unwrap();

        assert_eq!(config.storage_dir, Some(PathBuf::from("/var/lib/retrobot")));
        assert_eq!(config.seed, Some(31337));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_non_numeric_env_value_ignored() {
        let env = EnvGuard::new();
        env.set("RETROBOT_TRACK_MS", "forever");

        let config = load_config_from_path(None).unwrap();

        assert_eq!(config.track_ms, 10_000);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_with_seed_keeps_other_defaults() {
        let config = RetroBotConfig::default().with_seed(7);

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.track_ms, RetroBotConfig::default().track_ms);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = RetroBotConfig::default();
        config.seed = Some(1);
        config.set_source(ConfigSource::Env);

        ConfigOverrides::new().with_seed(99).apply(&mut config);

        assert_eq!(config.seed, Some(99));
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_config_overrides_apply() {
        let mut config = RetroBotConfig::default();
        ConfigOverrides::new()
            .with_storage_dir(PathBuf::from("/srv/bot"))
            .with_auto_hide_ms(1_000)
            .with_track_ms(2_500)
            .apply(&mut config);

        assert_eq!(config.storage_dir, Some(PathBuf::from("/srv/bot")));
        assert_eq!(config.auto_hide_ms, 1_000);
        assert_eq!(config.track_ms, 2_500);
    }

    #[test]
    fn test_config_overrides_empty_no_change() {
        let mut config = RetroBotConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config, RetroBotConfig::default());
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::Cli), "CLI");
        assert_eq!(format!("{}", ConfigSource::Env), "environment");
        assert_eq!(format!("{}", ConfigSource::File), "config file");
        assert_eq!(format!("{}", ConfigSource::Default), "default");
    }

    #[test]
    fn test_config_error_display() {
        let read_err = ConfigError::ReadError {
            path: PathBuf::from("/test/path"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = read_err.to_string();
        assert!(msg.contains("/test/path"));
        assert!(msg.contains("Failed to read"));
    }
}
