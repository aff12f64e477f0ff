//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Contraction history bound and the labor & delivery contact surfaced
//!   with a 5-1-1 alert
//! - 5-1-1 detector bands and window
//! - Kick counter goal and history bound
//! - Live timer refresh cadence
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::contractions::DetectorConfig;
use crate::error::{ConfigError, ValidationError};

/// Contraction history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractionsConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Phone number shown alongside a 5-1-1 alert.
    #[serde(default = "default_alert_phone")]
    pub alert_phone: String,
    #[serde(default = "default_alert_label")]
    pub alert_label: String,
}

/// Kick counter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KicksConfig {
    #[serde(default = "default_kick_goal")]
    pub goal: u32,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

/// Live display configuration for `contraction watch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub contractions: ContractionsConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub kicks: KicksConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

// Default functions
fn default_max_entries() -> usize {
    50
}
fn default_alert_phone() -> String {
    "+19498248200".into()
}
fn default_alert_label() -> String {
    "UCI L&D".into()
}
fn default_kick_goal() -> u32 {
    10
}
fn default_max_sessions() -> usize {
    20
}
fn default_tick_ms() -> u64 {
    250
}

impl Default for ContractionsConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            alert_phone: default_alert_phone(),
            alert_label: default_alert_label(),
        }
    }
}

impl Default for KicksConfig {
    fn default() -> Self {
        Self {
            goal: default_kick_goal(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from the default location, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or holds
    /// values that fail validation.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate().map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check cross-field constraints serde can't express.
    ///
    /// # Errors
    /// Returns the first constraint that does not hold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.contractions.max_entries == 0 {
            return Err(ValidationError::InvalidValue {
                field: "contractions.max_entries".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.kicks.goal == 0 {
            return Err(ValidationError::InvalidValue {
                field: "kicks.goal".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.kicks.max_sessions == 0 {
            return Err(ValidationError::InvalidValue {
                field: "kicks.max_sessions".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.watch.tick_ms == 0 {
            return Err(ValidationError::InvalidValue {
                field: "watch.tick_ms".into(),
                message: "must be at least 1".into(),
            });
        }
        self.detector.validate()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config fails validation. `self` is left untouched
    /// on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contractions::IntervalPolicy;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.contractions.max_entries, 50);
        assert_eq!(parsed.detector.window_size, 6);
        assert_eq!(parsed.kicks.goal, 10);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[detector]\nwindow_size = 13\n").unwrap();
        assert_eq!(parsed.detector.window_size, 13);
        assert_eq!(parsed.detector.duration_max_secs, 90);
        assert_eq!(parsed.kicks.max_sessions, 20);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("contractions.max_entries").as_deref(), Some("50"));
        assert_eq!(cfg.get("detector.interval_policy").as_deref(), Some("skip_newest_gap"));
        assert_eq!(cfg.get("contractions.alert_label").as_deref(), Some("UCI L&D"));
        assert!(cfg.get("detector.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("detector.window_size", "13").unwrap();
        assert_eq!(cfg.detector.window_size, 13);
    }

    #[test]
    fn apply_updates_enum_by_name() {
        let mut cfg = Config::default();
        cfg.apply("detector.interval_policy", "all_gaps").unwrap();
        assert_eq!(cfg.detector.interval_policy, IntervalPolicy::AllGaps);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.apply("detector.nonexistent_key", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("kicks.goal", "lots").is_err());
        assert!(cfg.apply("detector.interval_policy", "every_other").is_err());
        assert_eq!(cfg.detector.interval_policy, IntervalPolicy::SkipNewestGap);
    }

    #[test]
    fn apply_rejects_inverted_band() {
        let mut cfg = Config::default();
        let result = cfg.apply("detector.duration_min_secs", "120");
        assert!(result.is_err());
        assert_eq!(cfg.detector.duration_min_secs, 45);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.contractions.max_entries, 50);
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[kicks]\ngoal = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.apply("contractions.alert_phone", "+15550100").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.contractions.alert_phone, "+15550100");
    }
}
