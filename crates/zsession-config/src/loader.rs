//! Common configuration loading patterns

use crate::builder::validate;
use crate::{Config, ConfigBuilder, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Environment variable prefix read by the default loaders
pub const ENV_PREFIX: &str = "ZSESSION";

const FILE_NAMES: [&str; 2] = ["zsession.yaml", "zsession.toml"];

/// Loads and saves [`Config`] values
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the first default location that exists, then the environment
    pub fn load_default() -> ConfigResult<Config> {
        Self::load_with_env_prefix(ENV_PREFIX)
    }

    /// Load from a file that must exist, then the environment
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        ConfigBuilder::new()
            .add_defaults()
            .add_required_file(path)
            .add_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Load from several files; later files override earlier ones
    pub fn load_from_files<P: AsRef<Path>>(paths: &[P]) -> ConfigResult<Config> {
        paths
            .iter()
            .fold(ConfigBuilder::new().add_defaults(), |builder, path| {
                builder.add_source_file(path)
            })
            .add_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Load from the default locations with a custom environment prefix
    pub fn load_with_env_prefix<S: Into<String>>(prefix: S) -> ConfigResult<Config> {
        let mut builder = ConfigBuilder::new().add_defaults();
        if let Some(path) = Self::find_default_config() {
            builder = builder.add_source_file(path);
        }
        builder.add_env_prefix(prefix).build()
    }

    /// Write `config` in the format named by the file extension (YAML when unknown)
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        validate(config)?;

        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::to_string_pretty(config).map_err(|e| {
                ConfigError::serialization(format!("Failed to serialize to TOML: {}", e))
            })?,
            Some("json") => serde_json::to_string_pretty(config).map_err(|e| {
                ConfigError::serialization(format!("Failed to serialize to JSON: {}", e))
            })?,
            _ => serde_yaml::to_string(config).map_err(|e| {
                ConfigError::serialization(format!("Failed to serialize to YAML: {}", e))
            })?,
        };

        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write a configuration file holding the defaults
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::save_to_file(&Config::default(), path)
    }

    /// Candidate configuration files, most specific first
    pub fn get_default_config_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = FILE_NAMES.iter().map(PathBuf::from).collect();

        if let Some(config_dir) = dirs::config_dir() {
            let app_dir = config_dir.join("zsession");
            paths.extend(FILE_NAMES.iter().map(|name| app_dir.join(name)));
        }

        #[cfg(unix)]
        paths.extend(FILE_NAMES.iter().map(|name| Path::new("/etc/zsession").join(name)));

        paths
    }

    /// The first default configuration file that exists
    pub fn find_default_config() -> Option<PathBuf> {
        Self::get_default_config_paths()
            .into_iter()
            .find(|path| path.exists())
    }

    /// Check if any default configuration file exists
    pub fn config_exists() -> bool {
        Self::find_default_config().is_some()
    }

    /// Parse and validate a file without the environment layer
    pub fn validate_file<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        ConfigBuilder::new()
            .add_defaults()
            .add_required_file(path)
            .build()
            .map(|_| ())
    }
}
