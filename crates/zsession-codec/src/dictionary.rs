//! Dictionary store
//!
//! Dictionaries are built once, never mutated, and shared between sessions
//! through [`Arc`]. The handles deliberately do not implement `Clone`: the
//! native object has a single owner and everybody else borrows it.
//!
//! ```compile_fail
//! use zsession_codec::CompressionDictionary;
//!
//! let dictionary = CompressionDictionary::new(b"shared prefix", 3).unwrap();
//! let copy = dictionary.clone();
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use zsession_types::{CompressionLevel, DictionaryId, Error, Result};
use zstd::zstd_safe::{self, CDict, DDict};

fn dictionary_id_of(bytes: &[u8]) -> DictionaryId {
    zstd_safe::get_dict_id_from_dict(bytes).map_or(0, |id| id.get())
}

fn check_not_empty(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        Err(Error::parameter("dictionary content must not be empty"))
    } else {
        Ok(())
    }
}

/// Precompiled compression dictionary, bound to a compression level
pub struct CompressionDictionary {
    cdict: CDict<'static>,
    raw: Vec<u8>,
    level: CompressionLevel,
    id: DictionaryId,
}

impl CompressionDictionary {
    /// Build a dictionary from `bytes` at `level`
    ///
    /// `bytes` is either a trained dictionary or arbitrary raw content.
    pub fn new(bytes: &[u8], level: i32) -> Result<Self> {
        let level = CompressionLevel::new(level).map_err(Error::parameter)?;
        Self::with_level(bytes, level)
    }

    /// Build a dictionary from `bytes` at an already validated level
    pub fn with_level(bytes: &[u8], level: CompressionLevel) -> Result<Self> {
        check_not_empty(bytes)?;
        let cdict = CDict::try_create(bytes, level.get()).ok_or_else(|| {
            Error::initialization("failed to create compression dictionary")
        })?;
        let id = dictionary_id_of(bytes);
        debug!(id, size = bytes.len(), level = level.get(), "Created compression dictionary");
        Ok(Self {
            cdict,
            raw: bytes.to_vec(),
            level,
            id,
        })
    }

    /// Build a shareable handle
    pub fn shared(bytes: &[u8], level: i32) -> Result<Arc<Self>> {
        Self::new(bytes, level).map(Arc::new)
    }

    /// Dictionary ID written into frames this dictionary produces (0 for raw content)
    pub fn id(&self) -> DictionaryId {
        self.id
    }

    /// Level every compression with this dictionary runs at
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Content the dictionary was built from
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub(crate) fn cdict(&self) -> &CDict<'static> {
        &self.cdict
    }
}

impl fmt::Debug for CompressionDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionDictionary")
            .field("id", &self.id)
            .field("level", &self.level)
            .field("size", &self.raw.len())
            .finish()
    }
}

/// Precompiled decompression dictionary
pub struct DecompressionDictionary {
    ddict: DDict<'static>,
    raw: Vec<u8>,
    id: DictionaryId,
}

impl DecompressionDictionary {
    /// Build a dictionary from `bytes`
    pub fn new(bytes: &[u8]) -> Result<Self> {
        check_not_empty(bytes)?;
        let ddict = DDict::try_create(bytes).ok_or_else(|| {
            Error::initialization("failed to create decompression dictionary")
        })?;
        let id = dictionary_id_of(bytes);
        debug!(id, size = bytes.len(), "Created decompression dictionary");
        Ok(Self {
            ddict,
            raw: bytes.to_vec(),
            id,
        })
    }

    /// Build a shareable handle
    pub fn shared(bytes: &[u8]) -> Result<Arc<Self>> {
        Self::new(bytes).map(Arc::new)
    }

    /// Dictionary ID frames must declare to be decoded with this dictionary
    pub fn id(&self) -> DictionaryId {
        self.id
    }

    /// Content the dictionary was built from
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Reject a frame whose declared dictionary differs from this one
    ///
    /// Frames that declare no dictionary are accepted.
    pub fn check_frame(&self, frame: &[u8]) -> Result<()> {
        check_frame_dictionary(frame, Some(self))
    }

    pub(crate) fn ddict(&self) -> &DDict<'static> {
        &self.ddict
    }
}

impl fmt::Debug for DecompressionDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecompressionDictionary")
            .field("id", &self.id)
            .field("size", &self.raw.len())
            .finish()
    }
}

/// Compare the dictionary ID a frame declares with the supplied dictionary
pub(crate) fn check_frame_dictionary(
    frame: &[u8],
    dictionary: Option<&DecompressionDictionary>,
) -> Result<()> {
    let expected = crate::frame::frame_dictionary_id(frame);
    let found = dictionary.map_or(0, DecompressionDictionary::id);
    if expected != 0 && expected != found {
        return Err(Error::dictionary_mismatch(expected, found));
    }
    Ok(())
}
