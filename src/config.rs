//! Configuration loading and management
//!
//! Handles parsing of the `.bcstart.toml` file in the data directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::storage::CONFIG_FILE;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,

    /// Status workflow configuration
    #[serde(default)]
    pub status: StatusConfig,

    #[serde(default)]
    pub sub_areas: SubAreasConfig,

    /// Uploaded files and task-file mappings
    #[serde(default)]
    pub files: FilesConfig,

    /// AI task generation
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Developer-only operations
    #[serde(default)]
    pub dev: DevConfig,
}

/// Session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// User id to act as when no flag, env var or persisted session is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_user: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Reject status changes outside the guided workflow
    #[serde(default)]
    pub strict_transitions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAreasConfig {
    /// Clear a todo's sub-area when its impact moves to a different area
    #[serde(default = "default_true")]
    pub clear_on_impact_change: bool,

    /// Seed the starter sub-areas when a business is created
    #[serde(default = "default_true")]
    pub seed_on_business_create: bool,
}

impl Default for SubAreasConfig {
    fn default() -> Self {
        Self {
            clear_on_impact_change: true,
            seed_on_business_create: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// A file may be mapped to at most one task
    #[serde(default = "default_true")]
    pub single_task_per_file: bool,

    /// Largest accepted upload
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_max_upload_bytes() -> u64 {
    25 * 1024 * 1024
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            single_task_per_file: true,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Seconds to wait for the generator before giving up
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on tasks accepted from one generation run
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tasks() -> usize {
    40
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_tasks: default_max_tasks(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevConfig {
    /// Enable `reset_test_data` and `reset_all_test_data`
    #[serde(default)]
    pub allow_reset: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a `.bcstart.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a data directory, or return defaults when the
    /// file does not exist. A present but invalid file is an error.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(user) = &self.session.default_user {
            if user.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "session.default_user cannot be empty".to_string(),
                ));
            }
        }
        if self.generation.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "generation.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.generation.max_tasks == 0 {
            return Err(Error::InvalidConfig(
                "generation.max_tasks must be at least 1".to_string(),
            ));
        }
        if self.files.max_upload_bytes == 0 {
            return Err(Error::InvalidConfig(
                "files.max_upload_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive_and_safe() {
        let config = Config::default();
        assert!(!config.status.strict_transitions);
        assert!(!config.dev.allow_reset);
        assert!(config.sub_areas.clear_on_impact_change);
        assert!(config.files.single_task_per_file);
        assert_eq!(config.generation.timeout_secs, 60);
        assert!(config.session.default_user.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[dev]
allow_reset = true

[generation]
timeout_secs = 5
"#,
        )
        .unwrap();
        assert!(config.dev.allow_reset);
        assert_eq!(config.generation.timeout_secs, 5);
        assert_eq!(config.generation.max_tasks, 40);
        assert!(config.sub_areas.seed_on_business_create);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config: Config = toml::from_str("[generation]\ntimeout_secs = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert!(!config.status.strict_transitions);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.status.strict_transitions = true;
        config.session.default_user = Some("user-1".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load_from_dir(dir.path()).unwrap();
        assert!(loaded.status.strict_transitions);
        assert_eq!(loaded.session.default_user.as_deref(), Some("user-1"));
    }
}
