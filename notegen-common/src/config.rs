//! Settings loading and resolution
//!
//! Resolution priority, highest first:
//! 1. Explicit override (CLI flag or non-blank web form field)
//! 2. Environment variable
//! 3. Saved settings file (TOML)
//! 4. Compiled default

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::atomic::write_atomic;
use crate::{Error, Result};

/// Compiled default inference endpoint
pub const DEFAULT_API_URL: &str = "http://192.168.50.4:8787/infer";

/// Compiled default pause between the metadata and body calls (seconds)
pub const DEFAULT_DELAY_META_CONTENT: u64 = 30;

/// Compiled default pause between CSV rows (seconds)
pub const DEFAULT_DELAY_BETWEEN_ROWS: u64 = 120;

pub const ENV_API_URL: &str = "API_URL";
pub const ENV_NOTES_DIR: &str = "NOTES_DIR";
/// Pause between the metadata and body calls of one subject
pub const ENV_DELAY_META_CONTENT: &str = "DELAY_BETWEEN_CALLS_SECONDS";
/// Pause between consecutive CSV rows
pub const ENV_DELAY_BETWEEN_ROWS: &str = "PER_REQUEST_DELAY_SECONDS";
/// Overrides the location of the saved settings file
pub const ENV_CONFIG_PATH: &str = "NOTEGEN_CONFIG";

const CONFIG_DIR_NAME: &str = "obsidian-note-gen";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Fully resolved settings for one run or one web request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Inference endpoint receiving `{"prompt": ...}` POSTs
    pub api_url: String,
    /// Directory notes are written into
    pub notes_dir: PathBuf,
    /// Seconds to wait between the metadata call and the body call
    pub delay_meta_content: u64,
    /// Seconds to wait between CSV rows
    pub delay_between_rows: u64,
}

impl Settings {
    pub fn compiled_defaults() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            notes_dir: default_notes_dir(),
            delay_meta_content: DEFAULT_DELAY_META_CONTENT,
            delay_between_rows: DEFAULT_DELAY_BETWEEN_ROWS,
        }
    }

    pub fn meta_to_content(&self) -> Duration {
        Duration::from_secs(self.delay_meta_content)
    }

    pub fn between_rows(&self) -> Duration {
        Duration::from_secs(self.delay_between_rows)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::compiled_defaults()
    }
}

/// A partial set of settings from one source
///
/// Sources are layered with [`SettingsOverrides::or`] and finally applied
/// on top of the compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsOverrides {
    pub api_url: Option<String>,
    pub notes_dir: Option<PathBuf>,
    pub delay_meta_content: Option<u64>,
    pub delay_between_rows: Option<u64>,
}

impl SettingsOverrides {
    /// Read overrides from `API_URL`, `NOTES_DIR`,
    /// `DELAY_BETWEEN_CALLS_SECONDS` and `PER_REQUEST_DELAY_SECONDS`
    ///
    /// Unset and blank variables are ignored; non-numeric delays are an error.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_url: env_value(ENV_API_URL),
            notes_dir: env_value(ENV_NOTES_DIR).map(|dir| expand_home(&dir)),
            delay_meta_content: env_value(ENV_DELAY_META_CONTENT)
                .map(|raw| parse_delay(ENV_DELAY_META_CONTENT, &raw))
                .transpose()?,
            delay_between_rows: env_value(ENV_DELAY_BETWEEN_ROWS)
                .map(|raw| parse_delay(ENV_DELAY_BETWEEN_ROWS, &raw))
                .transpose()?,
        })
    }

    /// Fill fields missing here from a lower-priority source
    pub fn or(self, lower: SettingsOverrides) -> SettingsOverrides {
        SettingsOverrides {
            api_url: self.api_url.or(lower.api_url),
            notes_dir: self.notes_dir.or(lower.notes_dir),
            delay_meta_content: self.delay_meta_content.or(lower.delay_meta_content),
            delay_between_rows: self.delay_between_rows.or(lower.delay_between_rows),
        }
    }

    pub fn apply_to(self, base: Settings) -> Settings {
        Settings {
            api_url: self.api_url.unwrap_or(base.api_url),
            notes_dir: self.notes_dir.unwrap_or(base.notes_dir),
            delay_meta_content: self.delay_meta_content.unwrap_or(base.delay_meta_content),
            delay_between_rows: self.delay_between_rows.unwrap_or(base.delay_between_rows),
        }
    }
}

/// Parse a delay given in whole seconds
pub fn parse_delay(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        Error::Config(format!(
            "{} must be a whole number of seconds, got {:?}",
            name, raw
        ))
    })
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Default notes directory: `~/Notes`
pub fn default_notes_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Notes"))
        .unwrap_or_else(|| PathBuf::from("Notes"))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// The saved settings file
///
/// The web front end writes the last-used settings here so the form comes
/// back pre-filled; the CLI only reads it.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$NOTEGEN_CONFIG`, else `<config_dir>/obsidian-note-gen/config.toml`
    pub fn default_location() -> Self {
        if let Some(path) = env_value(ENV_CONFIG_PATH) {
            return Self::new(expand_home(&path));
        }
        let path = dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved settings; a missing file yields `Ok(None)`
    pub fn load(&self) -> Result<Option<SettingsOverrides>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let saved = toml::from_str::<SettingsOverrides>(&content).map_err(|e| {
            Error::Config(format!("Parse {} failed: {}", self.path.display(), e))
        })?;
        Ok(Some(saved))
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let content = toml::to_string_pretty(settings)
            .map_err(|e| Error::Config(format!("Serialize settings failed: {}", e)))?;
        write_atomic(&self.path, content.as_bytes())?;
        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }

    /// Resolve settings: `explicit` → environment → saved file → defaults
    ///
    /// An unreadable or invalid settings file is logged and skipped, it never
    /// blocks note generation. Invalid environment values are an error.
    pub fn resolve(&self, explicit: SettingsOverrides) -> Result<Settings> {
        let env = SettingsOverrides::from_env()?;
        let saved = match self.load() {
            Ok(saved) => saved.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring settings file {}: {}", self.path.display(), e);
                SettingsOverrides::default()
            }
        };

        Ok(explicit
            .or(env)
            .or(saved)
            .apply_to(Settings::compiled_defaults()))
    }
}
