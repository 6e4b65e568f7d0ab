use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::{FileFormat, VersionCodec};
use crate::domain::MergeRules;
use crate::error::{Result, TaggerError};

/// Name of the project-level configuration file
pub const CONFIG_FILE_NAME: &str = ".tagger.toml";

/// Represents the complete configuration for tagger.
///
/// Loaded once before a run starts and passed into the release workflow;
/// nothing mutates it afterwards.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Branch releases are cut from. ex: master
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Remote the branch must be in sync with. ex: upstream
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Format of the version file: php, yaml or json
    #[serde(default = "default_format")]
    pub format: String,

    /// Path of the version file, relative to the repository root. ex: docroot/version.php
    #[serde(default = "default_file")]
    pub file: PathBuf,

    /// Key in the version file holding the version. ex: APP_VERSION
    #[serde(default = "default_key")]
    pub key: String,

    #[serde(default)]
    pub changelog: ChangelogConfig,
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_remote() -> String {
    "upstream".to_string()
}

fn default_format() -> String {
    "php".to_string()
}

fn default_file() -> PathBuf {
    PathBuf::from("version.php")
}

fn default_key() -> String {
    "VERSION".to_string()
}

fn default_merge_marker() -> String {
    "Merge pull request".to_string()
}

fn default_id_marker() -> String {
    "#".to_string()
}

/// How merge commits are recognised when building the changelog.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChangelogConfig {
    /// Prefix that marks a commit message as a merge
    #[serde(default = "default_merge_marker")]
    pub merge_marker: String,

    /// Marker in front of the numeric request id
    #[serde(default = "default_id_marker")]
    pub id_marker: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            merge_marker: default_merge_marker(),
            id_marker: default_id_marker(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            branch: default_branch(),
            remote: default_remote(),
            format: default_format(),
            file: default_file(),
            key: default_key(),
            changelog: ChangelogConfig::default(),
        }
    }
}

impl Config {
    /// Validated version file format
    pub fn file_format(&self) -> Result<FileFormat> {
        self.format.parse()
    }

    /// Codec for the configured version file
    pub fn codec(&self) -> Result<VersionCodec> {
        Ok(VersionCodec::new(self.file_format()?, self.key.clone()))
    }

    /// Merge commit rules for the changelog
    pub fn merge_rules(&self) -> Result<MergeRules> {
        MergeRules::new(&self.changelog.merge_marker, &self.changelog.id_marker)
    }

    /// Check everything a run needs before it starts
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("branch", &self.branch), ("remote", &self.remote)] {
            if value.trim().is_empty() {
                return Err(TaggerError::configuration(format!(
                    "'{}' must not be empty",
                    name
                )));
            }
        }
        if self.file.as_os_str().is_empty() {
            return Err(TaggerError::configuration("'file' must not be empty"));
        }
        if self.file.is_absolute() {
            return Err(TaggerError::configuration(format!(
                "'file' must be relative to the repository root, got '{}'",
                self.file.display()
            )));
        }

        self.codec()?;
        self.merge_rules()?;
        Ok(())
    }

    /// Apply `TAGGER_*` environment variables on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(branch) = env::var("TAGGER_BRANCH") {
            self.branch = branch;
        }
        if let Ok(remote) = env::var("TAGGER_REMOTE") {
            self.remote = remote;
        }
        if let Ok(format) = env::var("TAGGER_FORMAT") {
            self.format = format;
        }
        if let Ok(file) = env::var("TAGGER_FILE") {
            self.file = PathBuf::from(file);
        }
        if let Ok(key) = env::var("TAGGER_KEY") {
            self.key = key;
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `.tagger.toml` in the repository directory
/// 3. `tagger/config.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// `TAGGER_*` environment variables are applied on top in every case.
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
/// * `repo_dir` - Repository directory searched for `.tagger.toml`
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, repo_dir: &Path) -> Result<Config> {
    let mut config = match find_config_file(config_path, repo_dir) {
        Some(path) => parse_config_file(&path)?,
        None => Config::default(),
    };

    config.apply_env_overrides();
    Ok(config)
}

fn find_config_file(config_path: Option<&Path>, repo_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(path.to_path_buf());
    }

    let local = repo_dir.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("tagger").join("config.toml"))
        .filter(|path| path.exists())
}

fn parse_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        TaggerError::configuration(format!("Cannot read '{}': {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|e| {
        TaggerError::configuration(format!("Cannot parse '{}': {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.branch, "master");
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.file_format().unwrap(), FileFormat::Php);
        assert_eq!(config.file, PathBuf::from("version.php"));
        assert_eq!(config.key, "VERSION");
        assert_eq!(config.changelog.merge_marker, "Merge pull request");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("branch = \"main\"\nformat = \"yaml\"\n").unwrap();
        assert_eq!(config.branch, "main");
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.file_format().unwrap(), FileFormat::Yaml);
        assert_eq!(config.changelog, ChangelogConfig::default());
    }

    #[test]
    fn test_unknown_format_fails_validation() {
        let config = Config {
            format: "foo".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TaggerError::Configuration(_)));
    }

    #[test]
    fn test_absolute_file_fails_validation() {
        let config = Config {
            file: PathBuf::from("/etc/version.php"),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_remote_fails_validation() {
        let config = Config {
            remote: " ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
