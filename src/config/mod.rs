//! Persisted CLI configuration.
//!
//! A flat JSON object stored at `~/.exarc` (or `$EXA_CONFIG_PATH`):
//!
//! ```json
//! { "apiKey": "...", "output": "json", "defaultNum": 10 }
//! ```
//!
//! Unknown keys, and known keys holding a value of the wrong type, are kept
//! and written back unchanged. A missing or unreadable file is never an error
//! when loading: defaults are used instead.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::output::OutputFormat;

pub const CONFIG_FILE_NAME: &str = ".exarc";
pub const CONFIG_PATH_ENV: &str = "EXA_CONFIG_PATH";

pub const DEFAULT_OUTPUT: &str = "json";
pub const DEFAULT_NUM: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid output value: {0}. Valid values: text, json, markdown")]
    InvalidOutput(String),
    #[error("defaultNum must be a positive number (got '{0}')")]
    InvalidDefaultNum(String),
    #[error("home directory is not configured (HOME/USERPROFILE)")]
    NoHome,
    #[error("failed to save config to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Keys the CLI understands (`exa config get|set <key>`).
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    #[value(name = "apiKey")]
    ApiKey,
    #[value(name = "output")]
    Output,
    #[value(name = "defaultNum")]
    DefaultNum,
}

impl ConfigKey {
    pub const fn variants() -> &'static [ConfigKey] {
        &[ConfigKey::ApiKey, ConfigKey::Output, ConfigKey::DefaultNum]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::ApiKey => "apiKey",
            ConfigKey::Output => "output",
            ConfigKey::DefaultNum => "defaultNum",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExaConfig {
    #[serde(rename = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(rename = "defaultNum", skip_serializing_if = "Option::is_none")]
    pub default_num: Option<u32>,
    /// Everything else in the file, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExaConfig {
    /// Known keys are lifted out only when they hold the expected type; a
    /// mistyped one (`"defaultNum": "20"`) stays in `extra` and reads as unset.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let text = |v: &Value| v.as_str().map(str::to_string);
        ExaConfig {
            api_key: take_valid(&mut map, ConfigKey::ApiKey, text),
            output: take_valid(&mut map, ConfigKey::Output, text),
            default_num: take_valid(&mut map, ConfigKey::DefaultNum, |v| {
                v.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|n| *n >= 1)
            }),
            extra: map,
        }
    }

    pub fn defaults() -> Self {
        ExaConfig {
            output: Some(DEFAULT_OUTPUT.to_string()),
            default_num: Some(DEFAULT_NUM),
            ..Default::default()
        }
    }

    /// Defaults overridden by whatever `stored` sets.
    pub fn merged(stored: ExaConfig) -> Self {
        let base = Self::defaults();
        ExaConfig {
            api_key: stored.api_key.or(base.api_key),
            output: stored.output.or(base.output),
            default_num: stored.default_num.or(base.default_num),
            extra: stored.extra,
        }
    }

    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::ApiKey => self.api_key.clone(),
            ConfigKey::Output => self.output.clone(),
            ConfigKey::DefaultNum => self.default_num.map(|n| n.to_string()),
        }
    }

    /// Validate and assign a raw CLI value.
    pub fn set(&mut self, key: ConfigKey, raw: &str) -> Result<(), ConfigError> {
        let previous = self.extra.remove(key.as_str());
        let assigned = self.assign(key, raw);
        if let (Err(_), Some(value)) = (&assigned, previous) {
            self.extra.insert(key.as_str().to_string(), value);
        }
        assigned
    }

    fn assign(&mut self, key: ConfigKey, raw: &str) -> Result<(), ConfigError> {
        match key {
            ConfigKey::ApiKey => self.api_key = Some(raw.to_string()),
            ConfigKey::Output => {
                let format = OutputFormat::from_str_ci(raw)
                    .ok_or_else(|| ConfigError::InvalidOutput(raw.to_string()))?;
                self.output = Some(format.as_str().to_string());
            }
            ConfigKey::DefaultNum => {
                let n = raw
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| ConfigError::InvalidDefaultNum(raw.to_string()))?;
                self.default_num = Some(n);
            }
        }
        Ok(())
    }

    /// Stored output format, when it is a recognized one.
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output.as_deref().and_then(OutputFormat::from_str_ci)
    }

    /// All key/value pairs for display: known keys first, then unknown ones.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = ConfigKey::variants()
            .iter()
            .filter_map(|k| self.get(*k).map(|v| (k.as_str().to_string(), v)))
            .collect();
        for (k, v) in &self.extra {
            let shown = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            rows.push((k.clone(), shown));
        }
        rows
    }
}

fn take_valid<T>(
    map: &mut Map<String, Value>,
    key: ConfigKey,
    read: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = map.get(key.as_str()).and_then(read)?;
    map.remove(key.as_str());
    Some(value)
}

/// File-backed config location with load / save helpers.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    /// `$EXA_CONFIG_PATH` if set, else `~/.exarc`.
    pub fn locate() -> Result<Self, ConfigError> {
        if let Some(p) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(Self::new(p));
        }
        Ok(Self::new(home_dir()?.join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Only what the file contains (no defaults). `None` when the file is
    /// absent or cannot be read / parsed; the latter is logged.
    pub fn load_stored(&self) -> Option<ExaConfig> {
        if !self.path.exists() {
            return None;
        }
        let parsed = fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(Value::Object(map)) => Some(ExaConfig::from_map(map)),
            Ok(other) => {
                tracing::warn!(path = %self.path.display(), "Config is not a JSON object, using defaults: {other}");
                None
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to load config, using defaults: {e}");
                None
            }
        }
    }

    /// Defaults merged with the stored values.
    pub fn load(&self) -> ExaConfig {
        match self.load_stored() {
            Some(stored) => ExaConfig::merged(stored),
            None => ExaConfig::defaults(),
        }
    }

    pub fn save(&self, config: &ExaConfig) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Apply `change` to the stored values (defaults are not written) and save.
    pub fn update(
        &self,
        change: impl FnOnce(&mut ExaConfig) -> Result<(), ConfigError>,
    ) -> Result<ExaConfig, ConfigError> {
        let mut config = self.load_stored().unwrap_or_default();
        change(&mut config)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Overwrite the file with the defaults.
    pub fn clear(&self) -> Result<ExaConfig, ConfigError> {
        let config = ExaConfig::defaults();
        self.save(&config)?;
        Ok(config)
    }
}

fn home_dir() -> Result<PathBuf, ConfigError> {
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(|k| env::var_os(k))
        .find(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::NoHome)
}
