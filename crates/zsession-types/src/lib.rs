//! Core type system and error handling for zsession
//!
//! This crate provides the foundational types shared by the codec crate,
//! the configuration crate and the command-line tool. It includes:
//!
//! - **Error handling**: One error enum covering every codec, framing and bridge failure
//! - **Core types**: Content sizes, end directives, bridge modes and session counters
//! - **Traits**: Chunk-oriented session traits, with async variants behind a feature
//! - **Configuration**: Validated compression levels, worker hints and magic variants
//!
//! # Features
//!
//! - `async`: Enable async trait definitions
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use zsession_types::{CompressionLevel, Error, Result};
//!
//! fn pick_level(requested: i32) -> Result<CompressionLevel> {
//!     CompressionLevel::new(requested).map_err(Error::parameter)
//! }
//!
//! assert!(pick_level(3).is_ok());
//! assert!(pick_level(99).is_err());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{CompressionLevel, MagicVariant, WorkerCount};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use traits::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_stats_creation() {
        let stats = SessionStats::new();
        assert_eq!(stats.bytes_in, 0);
        assert_eq!(stats.bytes_out, 0);
        assert_eq!(stats.ratio(), 1.0);
    }

    #[test]
    fn test_session_stats_merge() {
        let mut first = SessionStats::new();
        first.bytes_in = 1000;
        first.bytes_out = 100;
        first.frames = 1;

        let mut second = SessionStats::new();
        second.bytes_in = 500;
        second.bytes_out = 50;
        second.frames = 1;

        first.merge(&second);
        assert_eq!(first.bytes_in, 1500);
        assert_eq!(first.bytes_out, 150);
        assert_eq!(first.frames, 2);
        assert!((first.ratio() - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_content_size_known() {
        assert_eq!(ContentSize::Known(42).known(), Some(42));
        assert_eq!(ContentSize::Unknown.known(), None);
    }

    #[test]
    fn test_bridge_mode_from_flag() {
        assert_eq!(BridgeMode::from_flag(true), BridgeMode::Offload);
        assert_eq!(BridgeMode::from_flag(false), BridgeMode::Inline);
        assert!(!BridgeMode::default().is_offload());
    }

    #[test]
    fn test_error_severity() {
        let io_error = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "test"));
        assert_eq!(io_error.severity(), ErrorSeverity::Medium);

        let mismatch = Error::dictionary_mismatch(7, 0);
        assert_eq!(mismatch.severity(), ErrorSeverity::Low);
    }
}
