//! Configuration management for zsession
//!
//! Layers built-in defaults, an optional configuration file (YAML, TOML or
//! JSON) and `ZSESSION__*` environment variables into one validated
//! [`Config`].
//!
//! # Examples
//!
//! ```rust
//! use zsession_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("zsession.yaml")
//!     .add_env_prefix("ZSESSION")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Compression level: {}", config.codec.level.get());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use zsession_types::{BridgeMode, CompressionLevel, MagicVariant, WorkerCount};

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for zsession
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Codec defaults
    pub codec: CodecConfig,
    /// Concurrency bridge settings
    pub bridge: BridgeConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Codec defaults applied when a call does not override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Default compression level
    pub level: CompressionLevel,
    /// Worker-thread hint for the codec's internal pool
    pub workers: WorkerCount,
    /// Dictionary file used when none is given explicitly
    pub dictionary: Option<PathBuf>,
    /// Bytes read from the input per streaming step
    pub read_chunk_size: usize,
    /// Magic variant for skippable records written without an explicit one
    pub skippable_variant: MagicVariant,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            level: CompressionLevel::default(),
            workers: WorkerCount::default(),
            dictionary: None,
            read_chunk_size: 128 * 1024, // 128KB
            skippable_variant: MagicVariant::default(),
        }
    }
}

/// Concurrency bridge settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Whether codec calls run inline or on the blocking pool
    pub mode: BridgeMode,
    /// Maximum number of offloaded calls at once
    pub max_concurrent: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            mode: BridgeMode::Inline,
            max_concurrent: 4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable JSON formatting
    pub json_format: bool,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            colored_output: true,
        }
    }
}
