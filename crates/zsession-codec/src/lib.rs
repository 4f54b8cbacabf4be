//! Session layer over the zstd codec
//!
//! This crate lets callers compress and decompress byte sequences either in
//! one shot or incrementally, with optional shared dictionaries. It includes:
//!
//! - **Frame inspection**: declared content size, dictionary ID and skippable detection
//! - **Dictionaries**: immutable precompiled dictionaries shared through `Arc`
//! - **One-shot codec**: single-call compression and decompression, plus reusable contexts
//! - **Streaming sessions**: chunked compression and decompression carrying state across calls
//! - **Skippable records**: an out-of-band side channel stored next to compressed frames
//! - **Concurrency bridge**: offload codec calls to tokio's blocking pool
//!
//! # Features
//!
//! - `serde` (default): Enable serialization support for shared types
//! - `multithread`: Link the multithreaded codec so worker hints take effect
//!
//! # Examples
//!
//! ```rust
//! use zsession_codec::{compress, decompress, CompressOptions, DecompressOptions};
//!
//! let data = b"Hello, world! Hello, world! Hello, world!";
//! let compressed = compress(data, &CompressOptions::with_level(3)?)?;
//! let restored = decompress(&compressed, &DecompressOptions::new())?;
//! assert_eq!(restored, data);
//! # Ok::<(), zsession_types::Error>(())
//! ```
//!
//! Streaming:
//!
//! ```rust
//! use zsession_codec::{CompressionSession, DecompressionSession, DecompressOptions};
//!
//! let mut session = CompressionSession::with_level(3)?;
//! let mut frame = session.compress(b"first chunk, ")?;
//! frame.extend(session.compress(b"second chunk")?);
//! frame.extend(session.finish()?);
//!
//! let mut decoder = DecompressionSession::new(&DecompressOptions::new())?;
//! assert_eq!(decoder.decompress(&frame)?, b"first chunk, second chunk");
//! # Ok::<(), zsession_types::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bridge;
pub mod buffered;
pub mod dictionary;
pub mod frame;
pub mod io;
pub mod oneshot;
pub mod options;
pub mod skippable;
pub mod streaming;

mod native;

#[cfg(test)]
mod error_tests;
#[cfg(test)]
mod property_tests;
#[cfg(test)]
mod test_support;

// Re-export main types
pub use bridge::{
    compress_async, decompress_async, AsyncCompressionSession, AsyncDecompressionSession,
    ExecutionBridge,
};
pub use buffered::decompress_buffered;
pub use dictionary::{CompressionDictionary, DecompressionDictionary};
pub use frame::{content_size, frame_dictionary_id, inspect, is_skippable, FrameHeader};
pub use io::{copy_compress, copy_decompress, SessionReader, SessionWriter};
pub use oneshot::{
    codec_version, codec_version_string, compress, compress_using_dict, decompress,
    decompress_using_dict, CompressionContext, Context, DecompressionContext,
};
pub use options::{checked_level, CompressOptions, DecompressOptions, DictArg};
pub use skippable::{
    prepend_skippable_record, read_skippable_record, read_skippable_record_with_variant,
    skippable_records, write_skippable_record, SkippableRecord,
};
pub use streaming::{decompress_streaming, CompressionSession, CompressionState, DecompressionSession};
