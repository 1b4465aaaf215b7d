//! Runtime configuration, read from `sentaku.toml` with `SENTAKU_*` overrides.

use crate::error::{ConfigError, TreeError};
use crate::tree::DecisionTree;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const CONFIG_FILE_NAME: &str = "sentaku.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// JSON source of the decision tree.
    pub tree_path: PathBuf,
    /// Compiled tree cache, rebuilt whenever the source content changes.
    pub tree_cache_path: Option<PathBuf>,
    pub store: StoreConfig,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            tree_path: PathBuf::from("data/wizard_tree.json"),
            tree_cache_path: None,
            store: StoreConfig::default(),
            jobs: JobsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WizardConfig {
    /// Loads the configured tree, through the compiled cache when one is set.
    pub fn load_tree(&self) -> Result<DecisionTree, TreeError> {
        match &self.tree_cache_path {
            Some(cache) => DecisionTree::load_cached(&self.tree_path, cache),
            None => DecisionTree::from_json_file(&self.tree_path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    Memory,
    File { dir: PathBuf },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            dir: PathBuf::from(".sentaku/sessions"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Run directories are created below this directory.
    pub root: PathBuf,
    pub pipeline: PathBuf,
    pub nextflow_config: Option<PathBuf>,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".sentaku/jobs"),
            pipeline: PathBuf::from("pipeline/main.nf"),
            nextflow_config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `info` or `sentaku=debug`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from `path`, falling back to defaults when the file does not
    /// exist, then apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<WizardConfig, ConfigError> {
        let mut config = Self::load_from_file(path)?.unwrap_or_default();
        Self::apply_env_overrides(&mut config)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load config from a specific file path.
    /// Returns Ok(None) if the file doesn't exist.
    pub fn load_from_file(path: &Path) -> Result<Option<WizardConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: WizardConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(Some(config))
    }

    /// Environment variables take precedence over config file values.
    pub fn apply_env_overrides(config: &mut WizardConfig) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |key| env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, keyed by the `SENTAKU_*` names.
    pub fn apply_overrides_from<F>(config: &mut WizardConfig, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tree_path) = lookup("SENTAKU_TREE_PATH") {
            config.tree_path = PathBuf::from(tree_path);
        }

        if let Some(cache) = lookup("SENTAKU_TREE_CACHE_PATH") {
            config.tree_cache_path = (!cache.is_empty()).then(|| PathBuf::from(cache));
        }

        if let Some(kind) = lookup("SENTAKU_STORE") {
            config.store = match kind.as_str() {
                "memory" => StoreConfig::Memory,
                "file" => match &config.store {
                    StoreConfig::File { dir } => StoreConfig::File { dir: dir.clone() },
                    StoreConfig::Memory => StoreConfig::default(),
                },
                other => {
                    return Err(ConfigError::Invalid {
                        field: "SENTAKU_STORE".to_string(),
                        message: format!("expected 'memory' or 'file', got '{}'", other),
                    });
                }
            };
        }

        if let Some(dir) = lookup("SENTAKU_STORE_DIR") {
            config.store = StoreConfig::File {
                dir: PathBuf::from(dir),
            };
        }

        if let Some(root) = lookup("SENTAKU_JOBS_ROOT") {
            config.jobs.root = PathBuf::from(root);
        }

        if let Some(pipeline) = lookup("SENTAKU_PIPELINE") {
            config.jobs.pipeline = PathBuf::from(pipeline);
        }

        if let Some(nextflow_config) = lookup("SENTAKU_NEXTFLOW_CONFIG") {
            config.jobs.nextflow_config =
                (!nextflow_config.is_empty()).then(|| PathBuf::from(nextflow_config));
        }

        if let Some(level) = lookup("SENTAKU_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(json) = lookup("SENTAKU_LOG_JSON") {
            config.logging.json = json.parse::<bool>().map_err(|_| ConfigError::Invalid {
                field: "SENTAKU_LOG_JSON".to_string(),
                message: format!("expected 'true' or 'false', got '{}'", json),
            })?;
        }

        Ok(())
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "SENTAKU_TREE_PATH - Override the decision tree source (default: data/wizard_tree.json)",
            "SENTAKU_TREE_CACHE_PATH - Compiled tree cache file (empty disables the cache)",
            "SENTAKU_STORE - Session store kind (memory/file)",
            "SENTAKU_STORE_DIR - Directory of the file session store (implies SENTAKU_STORE=file)",
            "SENTAKU_JOBS_ROOT - Directory run directories are created in",
            "SENTAKU_PIPELINE - Pipeline script launched by run.sh",
            "SENTAKU_NEXTFLOW_CONFIG - Nextflow config passed to run.sh and snapshotted",
            "SENTAKU_LOG_LEVEL - Log filter directive (default: info)",
            "SENTAKU_LOG_JSON - Emit JSON log lines (true/false)",
        ]
    }

    /// Validate configuration values
    pub fn validate(config: &WizardConfig) -> Result<(), ConfigError> {
        if config.tree_path.as_os_str().is_empty() {
            return Err(invalid("tree_path", "path cannot be empty"));
        }

        if let StoreConfig::File { dir } = &config.store {
            if dir.as_os_str().is_empty() {
                return Err(invalid("store.dir", "directory cannot be empty"));
            }
        }

        if config.jobs.root.as_os_str().is_empty() {
            return Err(invalid("jobs.root", "directory cannot be empty"));
        }

        if config.jobs.pipeline.as_os_str().is_empty() {
            return Err(invalid("jobs.pipeline", "path cannot be empty"));
        }

        if let Err(e) = EnvFilter::try_new(&config.logging.level) {
            return Err(invalid("logging.level", &e.to_string()));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}
