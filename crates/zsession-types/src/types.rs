//! Core data types for zsession
//!
//! Plain data shared between the codec crate, the configuration crate and
//! the command-line tool.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dictionary identifier embedded in frames and dictionaries
///
/// Zero means "no dictionary" in a frame header and "raw content" for a
/// dictionary built from arbitrary bytes.
pub type DictionaryId = u32;

/// What a frame header declares about its decompressed size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContentSize {
    /// The header carries the exact decompressed length
    Known(u64),
    /// The frame was produced without a declared size (e.g. by streaming)
    Unknown,
}

impl ContentSize {
    /// Declared size, if any
    pub fn known(self) -> Option<u64> {
        match self {
            Self::Known(size) => Some(size),
            Self::Unknown => None,
        }
    }
}

/// Directive passed to each streaming compression step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EndDirective {
    /// Consume input, emit whatever output is ready
    Continue,
    /// Emit everything buffered so far without closing the frame
    Flush,
    /// Emit everything and close the frame
    End,
}

/// Where a compute-bound codec call runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BridgeMode {
    /// Run on the calling task
    #[default]
    Inline,
    /// Run on the runtime's blocking pool, yielding the scheduler meanwhile
    Offload,
}

impl BridgeMode {
    /// Build a mode from a boolean "use the bridge" flag
    pub fn from_flag(offload: bool) -> Self {
        if offload {
            Self::Offload
        } else {
            Self::Inline
        }
    }

    /// Check if calls are offloaded
    pub fn is_offload(self) -> bool {
        matches!(self, Self::Offload)
    }
}

/// Byte counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionStats {
    /// Input bytes accepted by the codec
    pub bytes_in: u64,
    /// Output bytes handed back to the caller
    pub bytes_out: u64,
    /// Number of codec primitive invocations
    pub codec_calls: u64,
    /// Frames closed (compression) or completed (decompression)
    pub frames: u64,
}

impl SessionStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Output size relative to input size
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            1.0
        } else {
            self.bytes_out as f64 / self.bytes_in as f64
        }
    }

    /// Merge statistics from another instance
    pub fn merge(&mut self, other: &SessionStats) {
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
        self.codec_calls += other.codec_calls;
        self.frames += other.frames;
    }
}
