//! Configuration types for zsession
//!
//! This module provides validated newtypes for the handful of numeric knobs
//! the codec layer accepts.

/// Compression level with validation
///
/// Zero selects the codec's default level. Negative levels trade ratio for
/// speed, down to the codec's minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "i32"))]
pub struct CompressionLevel(i32);

impl CompressionLevel {
    /// Fastest negative level accepted by the codec
    pub const MIN: i32 = -(1 << 17);
    /// Codec default (resolves to level 3)
    pub const DEFAULT: i32 = 0;
    /// Fastest positive level
    pub const FASTEST: i32 = 1;
    /// Best compression
    pub const BEST: i32 = 22;

    /// Create a new compression level with validation
    pub fn new(level: i32) -> Result<Self, String> {
        if level < Self::MIN {
            Err(format!("Compression level {} is below minimum {}", level, Self::MIN))
        } else if level > Self::BEST {
            Err(format!("Compression level {} exceeds maximum {}", level, Self::BEST))
        } else {
            Ok(Self(level))
        }
    }

    /// Get the compression level value
    pub fn get(self) -> i32 {
        self.0
    }

    /// Check if this is the codec default level
    pub fn is_default(self) -> bool {
        self.0 == Self::DEFAULT
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = String;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<CompressionLevel> for i32 {
    fn from(level: CompressionLevel) -> Self {
        level.0
    }
}

/// Worker thread hint for the codec's internal pool
///
/// Zero means single-threaded compression on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub struct WorkerCount(u32);

impl WorkerCount {
    /// Maximum worker count the codec accepts
    pub const MAX: u32 = 200;

    /// Create a new worker count with validation
    pub fn new(count: u32) -> Result<Self, String> {
        if count > Self::MAX {
            Err(format!("Worker count {} exceeds maximum {}", count, Self::MAX))
        } else {
            Ok(Self(count))
        }
    }

    /// Get the worker count value
    pub fn get(self) -> u32 {
        self.0
    }

    /// Check if multithreaded compression was requested
    pub fn is_multithreaded(self) -> bool {
        self.0 > 0
    }
}

impl TryFrom<u32> for WorkerCount {
    type Error = String;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<WorkerCount> for u32 {
    fn from(count: WorkerCount) -> Self {
        count.0
    }
}

/// Selects one of the 16 reserved skippable-record magic numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct MagicVariant(u8);

impl MagicVariant {
    /// Highest valid variant
    pub const MAX: u8 = 15;

    /// Create a new magic variant with validation
    pub fn new(variant: u8) -> Result<Self, String> {
        if variant > Self::MAX {
            Err(format!(
                "Magic variant {} is outside the skippable range 0..={}",
                variant,
                Self::MAX
            ))
        } else {
            Ok(Self(variant))
        }
    }

    /// Get the variant value
    pub fn get(self) -> u8 {
        self.0
    }

    /// All sixteen variants in ascending order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=Self::MAX).map(Self)
    }
}

impl TryFrom<u8> for MagicVariant {
    type Error = String;

    fn try_from(variant: u8) -> Result<Self, Self::Error> {
        Self::new(variant)
    }
}

impl From<MagicVariant> for u8 {
    fn from(variant: MagicVariant) -> Self {
        variant.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-131_072)]
    #[case(-1)]
    #[case(0)]
    #[case(3)]
    #[case(19)]
    #[case(22)]
    fn test_valid_levels(#[case] level: i32) {
        assert_eq!(CompressionLevel::new(level).unwrap().get(), level);
    }

    #[rstest]
    #[case(23)]
    #[case(100)]
    #[case(-131_073)]
    fn test_invalid_levels(#[case] level: i32) {
        assert!(CompressionLevel::new(level).is_err());
    }

    #[test]
    fn test_default_level() {
        let level = CompressionLevel::default();
        assert!(level.is_default());
        assert_eq!(i32::from(level), 0);
    }

    #[test]
    fn test_worker_count_bounds() {
        assert!(!WorkerCount::default().is_multithreaded());
        assert!(WorkerCount::new(4).unwrap().is_multithreaded());
        assert!(WorkerCount::new(WorkerCount::MAX).is_ok());
        assert!(WorkerCount::new(WorkerCount::MAX + 1).is_err());
    }

    #[test]
    fn test_magic_variants() {
        assert_eq!(MagicVariant::all().count(), 16);
        assert!(MagicVariant::new(15).is_ok());
        assert!(MagicVariant::new(16).is_err());
        assert_eq!(MagicVariant::try_from(7).unwrap().get(), 7);
    }
}
