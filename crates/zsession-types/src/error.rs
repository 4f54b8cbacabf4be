//! Error types and handling for zsession
//!
//! Every failure surfaced by the codec layer maps onto one of the variants
//! below. Codec-reported failures carry the codec's own error code and its
//! diagnostic name so callers can tell a corrupted block from a missing
//! dictionary without string matching.

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - the caller may simply try again with other input
    Low,
    /// Medium severity - the current call failed, the session is still usable
    Medium,
    /// High severity - the session or context should be discarded
    High,
    /// Critical severity - native resources could not be obtained at all
    Critical,
}

/// Main error type for zsession operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// A native context or dictionary could not be allocated
    #[error("Initialization error: {message}")]
    Initialization {
        /// Description of the resource that failed to initialize
        message: String,
    },

    /// An argument was rejected before any codec work started
    #[error("Parameter error: {message}")]
    Parameter {
        /// Description of the invalid parameter
        message: String,
    },

    /// The codec reported a failure while compressing
    #[error("Compression error: {message}")]
    Compression {
        /// Codec error enum value, when the failure came from the codec
        code: Option<u32>,
        /// Codec diagnostic text
        message: String,
    },

    /// The codec reported a failure while decompressing
    #[error("Decompression error: {message}")]
    Decompression {
        /// Codec error enum value, when the failure came from the codec
        code: Option<u32>,
        /// Codec diagnostic text
        message: String,
    },

    /// The frame was produced with a different dictionary than the one supplied
    #[error("Dictionary mismatch: frame requires dictionary {expected}, got {found}")]
    DictionaryMismatch {
        /// Dictionary ID declared in the frame header (0 when none)
        expected: u32,
        /// Dictionary ID of the supplied dictionary (0 for raw-content dictionaries)
        found: u32,
    },

    /// The input is not a recognized frame or skippable record
    #[error("Frame format error: {message}")]
    FrameFormat {
        /// Description of the framing problem
        message: String,
    },

    /// Reading from or writing to an I/O adapter failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// A job handed to the concurrency bridge did not complete
    #[error("Bridge error: {message}")]
    Bridge {
        /// Description of the lost job
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Native allocation failures
    Initialization,
    /// Rejected arguments
    Parameter,
    /// Codec compression failures
    Compression,
    /// Codec decompression failures
    Decompression,
    /// Frame and dictionary disagree
    DictionaryMismatch,
    /// Unrecognized or malformed framing
    FrameFormat,
    /// I/O adapter failures
    Io,
    /// Concurrency bridge failures
    Bridge,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Initialization { .. } => ErrorKind::Initialization,
            Self::Parameter { .. } => ErrorKind::Parameter,
            Self::Compression { .. } => ErrorKind::Compression,
            Self::Decompression { .. } => ErrorKind::Decompression,
            Self::DictionaryMismatch { .. } => ErrorKind::DictionaryMismatch,
            Self::FrameFormat { .. } => ErrorKind::FrameFormat,
            Self::Io { .. } => ErrorKind::Io,
            Self::Bridge { .. } => ErrorKind::Bridge,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Initialization { .. } => ErrorSeverity::Critical,
            Self::Parameter { .. } | Self::FrameFormat { .. } => ErrorSeverity::Low,
            Self::DictionaryMismatch { .. } => ErrorSeverity::Low,
            Self::Compression { .. } | Self::Decompression { .. } => ErrorSeverity::High,
            Self::Io { .. } => ErrorSeverity::Medium,
            Self::Bridge { .. } => ErrorSeverity::High,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Nothing at the codec layer is retried; only the I/O adapters can hit
    /// transient conditions.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { message } => {
                message.contains("Interrupted")
                    || message.contains("WouldBlock")
                    || message.contains("TimedOut")
            }
            _ => false,
        }
    }

    /// Codec error enum value, if the codec produced this error
    ///
    /// This is the stable error number (for example 32 for a wrong
    /// dictionary), not the raw return value of the failing call.
    pub fn codec_code(&self) -> Option<u32> {
        match self {
            Self::Compression { code, .. } | Self::Decompression { code, .. } => *code,
            _ => None,
        }
    }

    /// Create a new initialization error
    pub fn initialization<S: Into<String>>(message: S) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    /// Create a new parameter error
    pub fn parameter<S: Into<String>>(message: S) -> Self {
        Self::Parameter {
            message: message.into(),
        }
    }

    /// Create a new compression error without a codec code
    pub fn compression<S: Into<String>>(message: S) -> Self {
        Self::Compression {
            code: None,
            message: message.into(),
        }
    }

    /// Create a compression error from a codec code and its diagnostic name
    pub fn compression_code<S: Into<String>>(code: u32, message: S) -> Self {
        Self::Compression {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Create a new decompression error without a codec code
    pub fn decompression<S: Into<String>>(message: S) -> Self {
        Self::Decompression {
            code: None,
            message: message.into(),
        }
    }

    /// Create a decompression error from a codec code and its diagnostic name
    pub fn decompression_code<S: Into<String>>(code: u32, message: S) -> Self {
        Self::Decompression {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Create a new dictionary mismatch error
    pub fn dictionary_mismatch(expected: u32, found: u32) -> Self {
        Self::DictionaryMismatch { expected, found }
    }

    /// Create a new frame format error
    pub fn frame_format<S: Into<String>>(message: S) -> Self {
        Self::FrameFormat {
            message: message.into(),
        }
    }

    /// Create a new bridge error
    pub fn bridge<S: Into<String>>(message: S) -> Self {
        Self::Bridge {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io { message } => std::io::Error::other(message),
            Error::Parameter { .. } => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, error.to_string())
            }
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_error_kind_consistency(message in ".*", code in any::<u32>()) {
            let errors = vec![
                Error::initialization(message.clone()),
                Error::parameter(message.clone()),
                Error::compression_code(code, message.clone()),
                Error::decompression_code(code, message.clone()),
                Error::frame_format(message.clone()),
                Error::bridge(message.clone()),
            ];

            for error in errors {
                let kind = error.kind();
                match error {
                    Error::Initialization { .. } => prop_assert_eq!(kind, ErrorKind::Initialization),
                    Error::Parameter { .. } => prop_assert_eq!(kind, ErrorKind::Parameter),
                    Error::Compression { .. } => {
                        prop_assert_eq!(kind, ErrorKind::Compression);
                        prop_assert_eq!(error.codec_code(), Some(code));
                    }
                    Error::Decompression { .. } => {
                        prop_assert_eq!(kind, ErrorKind::Decompression);
                        prop_assert_eq!(error.codec_code(), Some(code));
                    }
                    Error::FrameFormat { .. } => prop_assert_eq!(kind, ErrorKind::FrameFormat),
                    Error::Bridge { .. } => prop_assert_eq!(kind, ErrorKind::Bridge),
                    _ => {}
                }
                prop_assert!(!error.is_recoverable());
            }
        }

        #[test]
        fn test_mismatch_reports_both_ids(expected in any::<u32>(), found in any::<u32>()) {
            let error = Error::dictionary_mismatch(expected, found);
            let text = error.to_string();
            prop_assert!(text.contains(&expected.to_string()));
            prop_assert!(text.contains(&found.to_string()));
            prop_assert_eq!(error.kind(), ErrorKind::DictionaryMismatch);
        }
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn test_initialization_is_critical() {
        let error = Error::initialization("ZSTD_createCCtx returned NULL");
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "test file");
        let error = Error::from(io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert_eq!(error.severity(), ErrorSeverity::Medium);
        assert!(error.to_string().contains("test file"));
    }

    #[test]
    fn test_io_error_recoverability() {
        assert!(Error::Io {
            message: "Interrupted system call".to_string()
        }
        .is_recoverable());
        assert!(!Error::Io {
            message: "No space left on device".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_into_io_error_keeps_diagnostic() {
        let error = Error::decompression_code(20, "Unknown frame descriptor");
        let io_error: std::io::Error = error.into();
        assert_eq!(io_error.kind(), std::io::ErrorKind::InvalidData);
        assert!(io_error.to_string().contains("Unknown frame descriptor"));
    }

    #[test]
    fn test_codec_code_absent_for_non_codec_errors() {
        assert_eq!(Error::parameter("bad level").codec_code(), None);
        assert_eq!(Error::compression("no code").codec_code(), None);
    }
}
