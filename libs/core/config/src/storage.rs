use crate::{env_or_default, ConfigError, FromEnv};
use std::path::PathBuf;

const DEFAULT_DATA_FILE: &str = "todos.json";

/// Location of the JSON file that mirrors the todo store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub data_file: PathBuf,
}

impl StorageConfig {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
        }
    }
}

impl FromEnv for StorageConfig {
    /// TODO_DATA_FILE: defaults to `todos.json` in the working directory
    fn from_env() -> Result<Self, ConfigError> {
        let raw = env_or_default("TODO_DATA_FILE", DEFAULT_DATA_FILE);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::ParseError {
                key: "TODO_DATA_FILE".to_string(),
                details: "path cannot be empty".to_string(),
            });
        }

        Ok(Self::new(trimmed))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}
