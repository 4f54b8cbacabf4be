//! Explicit per-call and per-session configuration
//!
//! A dictionary argument is either raw bytes or a precompiled handle. It is
//! resolved into a precompiled dictionary exactly once, when a session or
//! context is constructed.

use std::sync::Arc;

use zsession_types::{CompressionLevel, Error, Result, WorkerCount};
use zstd::zstd_safe;

use crate::dictionary::{CompressionDictionary, DecompressionDictionary};

/// Dictionary supplied to a session, context or one-shot call
#[derive(Debug, Clone)]
pub enum DictArg {
    /// Raw dictionary bytes, compiled on construction
    Raw(Vec<u8>),
    /// A precompiled compression dictionary
    Compression(Arc<CompressionDictionary>),
    /// A precompiled decompression dictionary
    Decompression(Arc<DecompressionDictionary>),
}

impl DictArg {
    /// Resolve into a compression dictionary
    ///
    /// Raw bytes are compiled at `level`. A decompression handle cannot be
    /// used to compress.
    pub fn into_compression(self, level: CompressionLevel) -> Result<Arc<CompressionDictionary>> {
        match self {
            Self::Raw(bytes) => CompressionDictionary::with_level(&bytes, level).map(Arc::new),
            Self::Compression(dictionary) => Ok(dictionary),
            Self::Decompression(_) => Err(Error::parameter(
                "a decompression dictionary cannot be used for compression",
            )),
        }
    }

    /// Resolve into a decompression dictionary
    ///
    /// A compression handle cannot be used to decompress.
    pub fn into_decompression(self) -> Result<Arc<DecompressionDictionary>> {
        match self {
            Self::Raw(bytes) => DecompressionDictionary::new(&bytes).map(Arc::new),
            Self::Decompression(dictionary) => Ok(dictionary),
            Self::Compression(_) => Err(Error::parameter(
                "a compression dictionary cannot be used for decompression",
            )),
        }
    }

    /// Dictionary content, whatever form it was given in
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Raw(bytes) => bytes,
            Self::Compression(dictionary) => dictionary.as_bytes(),
            Self::Decompression(dictionary) => dictionary.as_bytes(),
        }
    }
}

impl From<Vec<u8>> for DictArg {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(bytes)
    }
}

impl From<&[u8]> for DictArg {
    fn from(bytes: &[u8]) -> Self {
        Self::Raw(bytes.to_vec())
    }
}

impl From<Arc<CompressionDictionary>> for DictArg {
    fn from(dictionary: Arc<CompressionDictionary>) -> Self {
        Self::Compression(dictionary)
    }
}

impl From<Arc<DecompressionDictionary>> for DictArg {
    fn from(dictionary: Arc<DecompressionDictionary>) -> Self {
        Self::Decompression(dictionary)
    }
}

/// Options for compression calls and sessions
#[derive(Debug, Clone, Default)]
pub struct CompressOptions {
    /// Compression level; a precompiled dictionary's own level wins over this
    pub level: CompressionLevel,
    /// Optional dictionary
    pub dictionary: Option<DictArg>,
    /// Worker-thread hint for the codec's internal pool
    pub workers: WorkerCount,
}

impl CompressOptions {
    /// Create options with the codec's default level
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options at `level`, validated against the linked codec
    pub fn with_level(level: i32) -> Result<Self> {
        Ok(Self {
            level: checked_level(level)?,
            ..Self::default()
        })
    }

    /// Set the compression level
    pub fn level(mut self, level: i32) -> Result<Self> {
        self.level = checked_level(level)?;
        Ok(self)
    }

    /// Attach a dictionary
    pub fn dictionary(mut self, dictionary: impl Into<DictArg>) -> Self {
        self.dictionary = Some(dictionary.into());
        self
    }

    /// Set the worker-thread hint
    pub fn workers(mut self, workers: u32) -> Result<Self> {
        self.workers = WorkerCount::new(workers).map_err(Error::parameter)?;
        Ok(self)
    }

    /// Resolve the dictionary argument, if any
    pub(crate) fn resolve_dictionary(&self) -> Result<Option<Arc<CompressionDictionary>>> {
        self.dictionary
            .clone()
            .map(|dictionary| dictionary.into_compression(self.level))
            .transpose()
    }

    /// Level compression actually runs at once `dictionary` is attached
    pub(crate) fn effective_level(&self, dictionary: Option<&CompressionDictionary>) -> CompressionLevel {
        dictionary.map_or(self.level, CompressionDictionary::level)
    }
}

/// Options for decompression calls and sessions
#[derive(Debug, Clone, Default)]
pub struct DecompressOptions {
    /// Optional dictionary
    pub dictionary: Option<DictArg>,
}

impl DecompressOptions {
    /// Create options without a dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a dictionary
    pub fn dictionary(mut self, dictionary: impl Into<DictArg>) -> Self {
        self.dictionary = Some(dictionary.into());
        self
    }

    /// Resolve the dictionary argument, if any
    pub(crate) fn resolve_dictionary(&self) -> Result<Option<Arc<DecompressionDictionary>>> {
        self.dictionary
            .clone()
            .map(DictArg::into_decompression)
            .transpose()
    }
}

/// Validate `level` against the range the linked codec supports
pub fn checked_level(level: i32) -> Result<CompressionLevel> {
    let (min, max) = (zstd_safe::min_c_level(), zstd_safe::max_c_level());
    if level < min || level > max {
        return Err(Error::parameter(format!(
            "Compression level {} is outside the supported range {}..={}",
            level, min, max
        )));
    }
    CompressionLevel::new(level).map_err(Error::parameter)
}
