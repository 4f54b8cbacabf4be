//! `std::io` adapters over streaming sessions

use std::io::{self, Read, Write};

use tracing::debug;
use zsession_types::{ChunkCompressor, ChunkDecompressor, Result, SessionStats};

use crate::options::{CompressOptions, DecompressOptions};
use crate::streaming::{CompressionSession, DecompressionSession};

/// Default read size for [`SessionReader`]
pub const DEFAULT_READ_CHUNK: usize = 128 * 1024;

/// Compresses everything written to it into an inner writer
///
/// The frame is closed by [`finish`](Self::finish). Dropping the writer
/// without finishing leaves the frame incomplete.
pub struct SessionWriter<W: Write, C: ChunkCompressor = CompressionSession> {
    inner: W,
    session: C,
}

impl<W: Write> SessionWriter<W> {
    /// Create a writer configured by `options`
    pub fn new(inner: W, options: &CompressOptions) -> Result<Self> {
        Ok(Self::with_session(inner, CompressionSession::new(options)?))
    }
}

impl<W: Write, C: ChunkCompressor> SessionWriter<W, C> {
    /// Wrap an existing compressor
    pub fn with_session(inner: W, session: C) -> Self {
        Self { inner, session }
    }

    /// Counters of the underlying session
    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    /// Close the frame and return the inner writer
    pub fn finish(mut self) -> Result<W> {
        let tail = self.session.finish()?;
        self.inner.write_all(&tail)?;
        self.inner.flush()?;
        debug!(stats = ?self.session.stats(), "Session writer finished");
        Ok(self.inner)
    }

    /// Inner writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write, C: ChunkCompressor> Write for SessionWriter<W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let output = self.session.compress_chunk(buf)?;
        self.inner.write_all(&output)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let output = self.session.flush()?;
        self.inner.write_all(&output)?;
        self.inner.flush()
    }
}

/// Decompresses everything read from an inner reader
pub struct SessionReader<R: Read, D: ChunkDecompressor = DecompressionSession> {
    inner: R,
    session: D,
    input: Vec<u8>,
    output: Vec<u8>,
    position: usize,
    eof: bool,
}

impl<R: Read> SessionReader<R> {
    /// Create a reader configured by `options`
    pub fn new(inner: R, options: &DecompressOptions) -> Result<Self> {
        Ok(Self::with_session(inner, DecompressionSession::new(options)?))
    }
}

impl<R: Read, D: ChunkDecompressor> SessionReader<R, D> {
    /// Wrap an existing decompressor
    pub fn with_session(inner: R, session: D) -> Self {
        Self {
            inner,
            session,
            input: vec![0u8; DEFAULT_READ_CHUNK],
            output: Vec::new(),
            position: 0,
            eof: false,
        }
    }

    /// Counters of the underlying session
    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    /// Return the inner reader
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn refill(&mut self) -> io::Result<()> {
        while self.position == self.output.len() && !self.eof {
            let read = self.inner.read(&mut self.input)?;
            if read == 0 {
                self.eof = true;
                if !self.session.at_frame_boundary() {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "compressed stream ended mid-frame",
                    ));
                }
                break;
            }
            self.output = self.session.decompress_chunk(&self.input[..read])?;
            self.position = 0;
        }
        Ok(())
    }
}

impl<R: Read, D: ChunkDecompressor> Read for SessionReader<R, D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.refill()?;
        let available = &self.output[self.position..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.position += count;
        Ok(count)
    }
}

/// Compress everything `reader` yields into `writer`
///
/// Returns the number of compressed bytes written.
pub fn copy_compress<R: Read, W: Write>(mut reader: R, writer: W, options: &CompressOptions) -> Result<u64> {
    let mut encoder = SessionWriter::new(CountingWriter::new(writer), options)?;
    io::copy(&mut reader, &mut encoder)?;
    Ok(encoder.finish()?.count)
}

/// Decompress everything `reader` yields into `writer`
///
/// Returns the number of decompressed bytes written.
pub fn copy_decompress<R: Read, W: Write>(reader: R, mut writer: W, options: &DecompressOptions) -> Result<u64> {
    let mut decoder = SessionReader::new(reader, options)?;
    let written = io::copy(&mut decoder, &mut writer)?;
    writer.flush()?;
    Ok(written)
}

struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
