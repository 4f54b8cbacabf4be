//! Core traits for zsession sessions
//!
//! Sessions expose a chunk-at-a-time interface. The I/O adapters and the
//! command-line tool are written against these traits rather than the
//! concrete session types.

use crate::{Result, SessionStats};

#[cfg(feature = "async")]
use async_trait::async_trait;

/// A stateful compressor that emits one frame across many calls
pub trait ChunkCompressor {
    /// Feed a chunk and return whatever output is ready
    fn compress_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>>;

    /// Emit everything buffered so far without closing the frame
    fn flush(&mut self) -> Result<Vec<u8>>;

    /// Close the current frame and return its tail
    fn finish(&mut self) -> Result<Vec<u8>>;

    /// Counters accumulated since the session was created
    fn stats(&self) -> SessionStats;
}

/// A stateful decompressor that accepts compressed input in arbitrary pieces
pub trait ChunkDecompressor {
    /// Feed a chunk and return all output it makes available
    fn decompress_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>>;

    /// Whether all input fed so far ended on a frame boundary
    fn at_frame_boundary(&self) -> bool {
        true
    }

    /// Counters accumulated since the session was created
    fn stats(&self) -> SessionStats;
}

/// Async counterpart of [`ChunkCompressor`]
///
/// Implementations take owned buffers so the work can move to another thread.
#[cfg(feature = "async")]
#[async_trait]
pub trait AsyncChunkCompressor: Send + Sync {
    /// Feed a chunk and return whatever output is ready
    async fn compress_chunk(&self, input: Vec<u8>) -> Result<Vec<u8>>;

    /// Emit everything buffered so far without closing the frame
    async fn flush(&self) -> Result<Vec<u8>>;

    /// Close the current frame and return its tail
    async fn finish(&self) -> Result<Vec<u8>>;
}

/// Async counterpart of [`ChunkDecompressor`]
#[cfg(feature = "async")]
#[async_trait]
pub trait AsyncChunkDecompressor: Send + Sync {
    /// Feed a chunk and return all output it makes available
    async fn decompress_chunk(&self, input: Vec<u8>) -> Result<Vec<u8>>;
}
