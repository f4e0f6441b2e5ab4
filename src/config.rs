use crate::classifier::Label;
use crate::defaults;
use crate::error::{RepTrackError, Result};
use crate::session::SessionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub pose: PoseConfig,
    pub debounce: DebounceConfig,
    pub session: SessionConfig,
    pub models: ModelsConfig,
}

/// Landmark filtering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoseConfig {
    pub min_confidence: f32,
}

/// Debounce window sizes, in frames
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebounceConfig {
    pub exercise_window: usize,
    pub stage_window: usize,
}

/// Repetition counting rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub rep_stage: String,
    pub reset_stage_on_exercise_change: bool,
}

/// Classifier model location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ModelsConfig {
    pub path: Option<PathBuf>,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            min_confidence: defaults::MIN_CONFIDENCE,
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            exercise_window: defaults::EXERCISE_WINDOW,
            stage_window: defaults::STAGE_WINDOW,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rep_stage: defaults::REP_STAGE.to_string(),
            reset_stage_on_exercise_change: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - REPTRACK_MODELS → models.path
    /// - REPTRACK_EXERCISE_WINDOW → debounce.exercise_window
    /// - REPTRACK_STAGE_WINDOW → debounce.stage_window
    /// - REPTRACK_MIN_CONFIDENCE → pose.min_confidence
    ///
    /// Empty values are ignored. Unparsable numbers are ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("REPTRACK_MODELS")
            && !path.is_empty()
        {
            self.models.path = Some(PathBuf::from(path));
        }

        if let Some(window) = env_number("REPTRACK_EXERCISE_WINDOW") {
            self.debounce.exercise_window = window;
        }

        if let Some(window) = env_number("REPTRACK_STAGE_WINDOW") {
            self.debounce.stage_window = window;
        }

        if let Some(confidence) = env_number("REPTRACK_MIN_CONFIDENCE") {
            self.pose.min_confidence = confidence;
        }

        self
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.debounce.exercise_window == 0 {
            return Err(invalid("debounce.exercise_window", "must be at least 1"));
        }
        if self.debounce.stage_window == 0 {
            return Err(invalid("debounce.stage_window", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.pose.min_confidence) {
            return Err(invalid(
                "pose.min_confidence",
                &format!("{} is outside 0..=1", self.pose.min_confidence),
            ));
        }
        if self.session.rep_stage.trim().is_empty() {
            return Err(invalid("session.rep_stage", "must not be empty"));
        }
        Ok(())
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            rep_stage: Label::from(self.session.rep_stage.as_str()),
            reset_stage_on_exercise_change: self.session.reset_stage_on_exercise_change,
        }
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/reptrack/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("reptrack").join("config.toml"))
            .ok_or_else(|| RepTrackError::Other("Could not determine config directory".to_string()))
    }
}

fn invalid(key: &str, message: &str) -> RepTrackError {
    RepTrackError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok().filter(|v| !v.is_empty())?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring {}={:?}: not a number", key, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_reptrack_env() {
        remove_env("REPTRACK_MODELS");
        remove_env("REPTRACK_EXERCISE_WINDOW");
        remove_env("REPTRACK_STAGE_WINDOW");
        remove_env("REPTRACK_MIN_CONFIDENCE");
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.pose.min_confidence, 0.5);
        assert_eq!(config.debounce.exercise_window, 120);
        assert_eq!(config.debounce.stage_window, 5);
        assert_eq!(config.session.rep_stage, "start");
        assert!(!config.session.reset_stage_on_exercise_change);
        assert_eq!(config.models.path, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_config(
            r#"
            [pose]
            min_confidence = 0.7

            [debounce]
            exercise_window = 60
            stage_window = 3

            [session]
            rep_stage = "end"
            reset_stage_on_exercise_change = true

            [models]
            path = "/opt/reptrack/models.json"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.pose.min_confidence, 0.7);
        assert_eq!(config.debounce.exercise_window, 60);
        assert_eq!(config.debounce.stage_window, 3);
        assert_eq!(config.session.rep_stage, "end");
        assert!(config.session.reset_stage_on_exercise_change);
        assert_eq!(
            config.models.path,
            Some(PathBuf::from("/opt/reptrack/models.json"))
        );
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let temp_file = write_config(
            r#"
            [debounce]
            stage_window = 8
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.debounce.stage_window, 8);
        assert_eq!(config.debounce.exercise_window, 120);
        assert_eq!(config.pose, PoseConfig::default());
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_session_policy_from_config() {
        let mut config = Config::default();
        config.session.rep_stage = "top".to_string();
        config.session.reset_stage_on_exercise_change = true;

        let policy = config.session_policy();
        assert_eq!(policy.rep_stage, Label::from("top"));
        assert!(policy.reset_stage_on_exercise_change);
    }

    #[test]
    fn test_env_override_models() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_reptrack_env();

        set_env("REPTRACK_MODELS", "/tmp/models.json");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.models.path, Some(PathBuf::from("/tmp/models.json")));
        assert_eq!(config.debounce, DebounceConfig::default()); // Not overridden

        clear_reptrack_env();
    }

    #[test]
    fn test_env_override_numbers() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_reptrack_env();

        set_env("REPTRACK_EXERCISE_WINDOW", "30");
        set_env("REPTRACK_STAGE_WINDOW", "2");
        set_env("REPTRACK_MIN_CONFIDENCE", "0.25");

        let config = Config::default().with_env_overrides();

        assert_eq!(config.debounce.exercise_window, 30);
        assert_eq!(config.debounce.stage_window, 2);
        assert_eq!(config.pose.min_confidence, 0.25);

        clear_reptrack_env();
    }

    #[test]
    fn test_env_override_bad_number_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_reptrack_env();

        set_env("REPTRACK_STAGE_WINDOW", "five");
        set_env("REPTRACK_EXERCISE_WINDOW", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.debounce, DebounceConfig::default());

        clear_reptrack_env();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.debounce.exercise_window = 0;
        assert!(matches!(
            config.validate(),
            Err(RepTrackError::ConfigInvalidValue { key, .. }) if key == "debounce.exercise_window"
        ));

        let mut config = Config::default();
        config.pose.min_confidence = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.rep_stage = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_file = write_config(
            r#"
            [debounce
            stage_window = "broken
        "#,
        );

        assert!(Config::load(temp_file.path()).is_err());
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let temp_file = write_config("[debounce]\nstage_window = \"five\"\n");
        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path().unwrap();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("reptrack"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_reptrack_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let mut config = Config::default();
        config.models.path = Some(PathBuf::from("models.json"));
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
