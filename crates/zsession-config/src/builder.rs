//! Layered configuration loading

use crate::{Config, ConfigError, ConfigResult};
use config::{builder::DefaultState, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Builds a [`Config`] from defaults, files and environment variables
///
/// Sources are applied in the order they were added; later sources win.
#[derive(Debug)]
pub struct ConfigBuilder {
    inner: config::ConfigBuilder<DefaultState>,
    sources: Vec<Source>,
    env_separator: String,
}

#[derive(Debug, Clone)]
enum Source {
    Defaults,
    File {
        path: PathBuf,
        format: FileFormat,
        required: bool,
    },
    Environment {
        prefix: String,
    },
}

impl ConfigBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            inner: config::Config::builder(),
            sources: Vec::new(),
            env_separator: "__".to_string(),
        }
    }

    /// Add the built-in defaults
    pub fn add_defaults(mut self) -> Self {
        self.sources.push(Source::Defaults);
        self
    }

    /// Add a configuration file that is skipped when missing
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = detect_format(&path);
        self.sources.push(Source::File {
            path,
            format,
            required: false,
        });
        self
    }

    /// Add a configuration file that must exist
    pub fn add_required_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = detect_format(&path);
        self.sources.push(Source::File {
            path,
            format,
            required: true,
        });
        self
    }

    /// Add environment variables starting with `prefix`
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.sources.push(Source::Environment {
            prefix: prefix.into(),
        });
        self
    }

    /// Set the separator between nested keys in variable names (default: "__")
    pub fn env_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.env_separator = separator.into();
        self
    }

    /// Merge all sources and validate the result
    pub fn build(mut self) -> ConfigResult<Config> {
        // Missing keys always fall back to the defaults
        let defaults = serde_yaml::to_value(Config::default())
            .map_err(|e| ConfigError::serialization(format!("Failed to serialize defaults: {}", e)))?;
        self.inner = self.inner.add_source(config::Config::try_from(&defaults)?);

        for source in &self.sources {
            match source {
                Source::Defaults => {}
                Source::File {
                    path,
                    format,
                    required,
                } => {
                    if path.exists() {
                        self.inner = self
                            .inner
                            .add_source(File::from(path.clone()).format(*format));
                    } else if *required {
                        return Err(ConfigError::Io {
                            path: path.clone(),
                            source: std::io::Error::new(
                                std::io::ErrorKind::NotFound,
                                "configuration file not found",
                            ),
                        });
                    }
                }
                Source::Environment { prefix } => {
                    self.inner = self.inner.add_source(
                        Environment::with_prefix(prefix).separator(&self.env_separator),
                    );
                }
            }
        }

        let config: Config = self.inner.build()?.try_deserialize()?;
        validate(&config)?;
        Ok(config)
    }

    /// Build, falling back to the defaults on any error
    pub fn build_or_default(self) -> Config {
        self.build().unwrap_or_default()
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the file format from the extension, YAML when unknown
pub(crate) fn detect_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => FileFormat::Toml,
        Some("json") => FileFormat::Json,
        _ => FileFormat::Yaml,
    }
}

/// Check the cross-field rules the types cannot express
pub fn validate(config: &Config) -> ConfigResult<()> {
    if config.codec.read_chunk_size == 0 {
        return Err(ConfigError::validation(
            "codec.read_chunk_size must be greater than 0",
        ));
    }

    if config.bridge.max_concurrent == 0 {
        return Err(ConfigError::validation(
            "bridge.max_concurrent must be at least 1",
        ));
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::validation(format!(
            "logging.level must be one of {}, got '{}'",
            LOG_LEVELS.join(", "),
            config.logging.level
        )));
    }

    if let Some(dictionary) = &config.codec.dictionary {
        if dictionary.as_os_str().is_empty() {
            return Err(ConfigError::validation("codec.dictionary must not be empty"));
        }
    }

    Ok(())
}
