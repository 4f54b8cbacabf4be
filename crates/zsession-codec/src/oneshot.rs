//! One-shot codec and reusable contexts
//!
//! The module-level [`compress`] and [`decompress`] run on a fresh context.
//! [`CompressionContext`] and [`DecompressionContext`] keep one native
//! context alive across calls. A context that has been used is reset to
//! session-only state at the start of its next call, never at the end of
//! the previous one.

use std::sync::Arc;

use tracing::debug;
use zsession_types::{CompressionLevel, Error, Result};
use zstd::zstd_safe::{self, CCtx, DCtx};

use crate::buffered::decompress_unknown_size;
use crate::dictionary::{check_frame_dictionary, CompressionDictionary, DecompressionDictionary};
use crate::frame::{self, FrameHeader};
use crate::native::{self, compression_error, decompression_error};
use crate::options::{CompressOptions, DecompressOptions, DictArg};

/// Compress `input` into a single frame
pub fn compress(input: &[u8], options: &CompressOptions) -> Result<Vec<u8>> {
    CompressionContext::new(options)?.compress(input)
}

/// Decompress every frame in `input`
pub fn decompress(input: &[u8], options: &DecompressOptions) -> Result<Vec<u8>> {
    DecompressionContext::new(options)?.decompress(input)
}

/// Compress `input` with a raw dictionary compiled at `level`
pub fn compress_using_dict(input: &[u8], dictionary: &[u8], level: i32) -> Result<Vec<u8>> {
    let options = CompressOptions::with_level(level)?.dictionary(dictionary);
    compress(input, &options)
}

/// Decompress `input` with a raw dictionary
pub fn decompress_using_dict(input: &[u8], dictionary: &[u8]) -> Result<Vec<u8>> {
    decompress(input, &DecompressOptions::new().dictionary(dictionary))
}

/// Version number of the linked codec, e.g. `10506` for 1.5.6
pub fn codec_version() -> u32 {
    zstd_safe::version_number()
}

/// Dotted version string of the linked codec
pub fn codec_version_string() -> String {
    let version = codec_version();
    format!(
        "{}.{}.{}",
        version / 10_000,
        (version / 100) % 100,
        version % 100
    )
}

/// A compression context reused across one-shot calls
pub struct CompressionContext {
    cctx: CCtx<'static>,
    dictionary: Option<Arc<CompressionDictionary>>,
    level: CompressionLevel,
    needs_reset: bool,
}

impl CompressionContext {
    /// Create a context configured by `options`
    pub fn new(options: &CompressOptions) -> Result<Self> {
        let dictionary = options.resolve_dictionary()?;
        let level = options.effective_level(dictionary.as_deref());
        let mut cctx = native::create_cctx()?;
        native::apply_level(&mut cctx, level)?;
        native::apply_workers(&mut cctx, options.workers)?;
        Ok(Self {
            cctx,
            dictionary,
            level,
            needs_reset: false,
        })
    }

    /// Level every call on this context runs at
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Attached dictionary, if any
    pub fn dictionary(&self) -> Option<&Arc<CompressionDictionary>> {
        self.dictionary.as_ref()
    }

    /// Compress `input` into a single frame
    pub fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.needs_reset {
            native::reset_cctx(&mut self.cctx)?;
        }
        self.needs_reset = true;

        let mut output = Vec::with_capacity(zstd_safe::compress_bound(input.len()));
        match &self.dictionary {
            Some(dictionary) => self
                .cctx
                .compress_using_cdict(&mut output, input, dictionary.cdict()),
            None => self.cctx.compress2(&mut output, input),
        }
        .map_err(compression_error)?;
        output.shrink_to_fit();

        debug!(
            input = input.len(),
            output = output.len(),
            level = self.level.get(),
            "One-shot compression finished"
        );
        Ok(output)
    }
}

/// A decompression context reused across one-shot calls
pub struct DecompressionContext {
    // Dropped before `dictionary`, whose DDict it may reference.
    dctx: DCtx<'static>,
    dictionary: Option<Arc<DecompressionDictionary>>,
    needs_reset: bool,
}

impl DecompressionContext {
    /// Create a context configured by `options`
    pub fn new(options: &DecompressOptions) -> Result<Self> {
        let dictionary = options.resolve_dictionary()?;
        Ok(Self {
            dctx: native::create_dctx()?,
            dictionary,
            needs_reset: false,
        })
    }

    /// Attached dictionary, if any
    pub fn dictionary(&self) -> Option<&Arc<DecompressionDictionary>> {
        self.dictionary.as_ref()
    }

    /// Decompress every frame in `input`
    ///
    /// A single frame with a declared size is decoded in one call into an
    /// exactly sized buffer. Frames without a declared size, concatenated
    /// frames and leading skippable records go through the buffered loop.
    pub fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let header = frame::inspect(input);
        if header == FrameHeader::NotAFrame {
            return Err(Error::frame_format("Not compressed by zstd"));
        }
        check_frame_dictionary(input, self.dictionary.as_deref())?;

        if self.needs_reset {
            native::reset_dctx(&mut self.dctx)?;
        }
        self.needs_reset = true;

        match header {
            FrameHeader::KnownSize(size) if is_single_frame(input) => {
                self.decompress_known_size(input, size)
            }
            _ => decompress_unknown_size(&mut self.dctx, input, self.dictionary.as_deref()),
        }
    }

    fn decompress_known_size(&mut self, input: &[u8], size: u64) -> Result<Vec<u8>> {
        let capacity = usize::try_from(size).map_err(|_| {
            Error::decompression(format!("declared content size {} does not fit in memory", size))
        })?;
        let mut output = Vec::new();
        output.try_reserve_exact(capacity).map_err(|_| {
            Error::decompression(format!("cannot allocate {} bytes for the declared content size", size))
        })?;

        let written = match &self.dictionary {
            Some(dictionary) => self
                .dctx
                .decompress_using_ddict(&mut output, input, dictionary.ddict()),
            None => self.dctx.decompress(&mut output, input),
        }
        .map_err(decompression_error)?;

        if written != capacity {
            return Err(Error::decompression(format!(
                "frame declared {} bytes but produced {}",
                capacity, written
            )));
        }
        debug!(input = input.len(), output = written, "One-shot decompression finished");
        Ok(output)
    }
}

/// True unless `input` holds more than one complete frame
///
/// A truncated frame counts as single so the codec reports the truncation.
fn is_single_frame(input: &[u8]) -> bool {
    frame::first_frame_len(input).map_or(true, |len| len == input.len())
}

/// A pair of lazily created contexts sharing one dictionary
///
/// Each direction's native context is allocated on its first use.
pub struct Context {
    compress_options: CompressOptions,
    decompress_options: DecompressOptions,
    compression: Option<CompressionContext>,
    decompression: Option<DecompressionContext>,
}

impl Context {
    /// Create a context compressing at `level` with an optional shared dictionary
    ///
    /// The dictionary is compiled once per direction when that direction
    /// is first used.
    pub fn new(level: i32, dictionary: Option<DictArg>) -> Result<Self> {
        let mut compress_options = CompressOptions::with_level(level)?;
        let mut decompress_options = DecompressOptions::new();
        if let Some(dictionary) = dictionary {
            decompress_options.dictionary = Some(match &dictionary {
                DictArg::Decompression(handle) => DictArg::Decompression(Arc::clone(handle)),
                other => DictArg::Raw(other.as_bytes().to_vec()),
            });
            compress_options.dictionary = Some(match dictionary {
                DictArg::Decompression(handle) => DictArg::Raw(handle.as_bytes().to_vec()),
                other => other,
            });
        }
        Ok(Self {
            compress_options,
            decompress_options,
            compression: None,
            decompression: None,
        })
    }

    /// Compress `input` into a single frame
    pub fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let context = match &mut self.compression {
            Some(context) => context,
            slot => slot.insert(CompressionContext::new(&self.compress_options)?),
        };
        context.compress(input)
    }

    /// Decompress every frame in `input`
    pub fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let context = match &mut self.decompression {
            Some(context) => context,
            slot => slot.insert(DecompressionContext::new(&self.decompress_options)?),
        };
        context.decompress(input)
    }
}
