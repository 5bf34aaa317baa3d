//! Configuration management for the data directory manager
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file (explicit, project-local or per-user) and environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, ScopeLevel};
use crate::constants::{config as files, env, http, layout};
use crate::errors::{ConfigError, ConfigResult};

/// Unified configuration for TOML serialization
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataDirConfig {
    /// Cache layout and diagnostics settings
    pub datadir: DataDirSettings,
    /// HTTP client settings
    pub client: ClientConfigToml,
}

/// Cache layout and diagnostics settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DataDirSettings {
    /// Name of the global data directory beside the tests
    pub global_subdir: String,
    /// Drop the leading package segment of dotted module names
    pub strip_package_prefix: bool,
    /// Scope used when a command does not name one
    pub default_scope: ScopeLevel,
    /// Report scope matches, downloads and saves at INFO instead of DEBUG
    pub verbose: bool,
    /// Draw progress bars for every transfer
    pub progress: bool,
}

impl Default for DataDirSettings {
    fn default() -> Self {
        Self {
            global_subdir: layout::GLOBAL_SUBDIR.to_string(),
            strip_package_prefix: true,
            default_scope: ScopeLevel::Module,
            verbose: false,
            progress: false,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Request timeout in seconds (absent = no timeout)
    pub request_timeout_secs: Option<u64>,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            connect_timeout: Some(Duration::from_secs(self.connect_timeout_secs)),
            user_agent: self.user_agent.clone(),
            ..ClientConfig::default()
        }
    }
}

impl DataDirConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit, else the first one found)
    /// 3. Environment variables
    pub fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Self::load_from_file(&path)?
            }
            None => match Self::find_config_file() {
                Some(path) => Self::load_from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides looked up through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(env::VERBOSE) {
            self.datadir.verbose = parse_flag(env::VERBOSE, &value)?;
        }
        if let Some(value) = lookup(env::PROGRESS) {
            self.datadir.progress = parse_flag(env::PROGRESS, &value)?;
        }
        if let Some(value) = lookup(env::SUBDIR) {
            debug!("Global subdirectory overridden to {}", value);
            self.datadir.global_subdir = value;
        }
        self.validate()
    }

    /// Reject values that cannot name a directory
    pub fn validate(&self) -> ConfigResult<()> {
        let subdir = &self.datadir.global_subdir;
        let single_component = Path::new(subdir).components().count() == 1;
        if subdir.is_empty() || !single_component || Path::new(subdir).is_absolute() {
            return Err(ConfigError::InvalidValue {
                field: "datadir.global_subdir".to_string(),
                value: subdir.clone(),
                reason: "Must be a single directory name".to_string(),
            });
        }
        Ok(())
    }

    /// Per-user config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::APP_DIR_NAME).join(files::USER_FILE_NAME))
    }

    /// Write the commented default configuration to `path`
    ///
    /// An existing file is left untouched. Returns whether a file was written.
    pub fn write_default(path: &Path) -> ConfigResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, Self::generate_default_config_content()).map_err(|source| {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!("Created default configuration file: {}", path.display());
        Ok(true)
    }

    /// Render this configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let search_paths = [
            Some(PathBuf::from(".").join(files::LOCAL_FILE_NAME)),
            Self::default_config_path(),
        ];

        for path in search_paths.into_iter().flatten() {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Data directory manager configuration

[datadir]
# Directory beside the tests that holds the cache
global_subdir = "{}"

# Drop the leading package segment of dotted module names
# ("tests.io_test" is cached under "io_test")
strip_package_prefix = true

# Scope used when a command does not name one: function, class, module or global
default_scope = "module"

# Report scope matches, downloads and saves at INFO instead of DEBUG
verbose = false

# Draw progress bars for every transfer
progress = false

[client]
# Request timeout in seconds (leave unset to wait indefinitely)
# request_timeout_secs = 600
connect_timeout_secs = {}
user_agent = "{}"
"#,
            layout::GLOBAL_SUBDIR,
            http::CONNECT_TIMEOUT.as_secs(),
            http::USER_AGENT,
        )
    }
}

fn parse_flag(field: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Expected true or false".to_string(),
        }),
    }
}
