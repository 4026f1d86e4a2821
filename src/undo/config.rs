// Action log configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default capacity of the event channel
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

/// Tunables of an `UndoableActionLog`
///
/// Stored as RON, every field optional:
/// ```ron
/// (
///     history_limit: Some(200),
///     mergeable_by_default: true,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoLogConfig {
    /// Maximum number of committed transactions kept for undo (None = unbounded)
    pub history_limit: Option<usize>,
    /// Whether transactions opened without explicit options merge consecutive actions
    pub mergeable_by_default: bool,
    /// Capacity used by `UndoableActionLog::event_channel`
    pub event_channel_capacity: usize,
}

impl Default for UndoLogConfig {
    fn default() -> Self {
        Self {
            history_limit: None,
            mergeable_by_default: true,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl UndoLogConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&source)?;
        log::debug!("Loaded undo log config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }
}
