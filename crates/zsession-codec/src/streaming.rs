//! Streaming sessions
//!
//! Long-lived compressor and decompressor objects that accept input in
//! arbitrary chunks and carry codec state across calls. Each session owns
//! its native context exclusively and borrows its dictionary through an
//! [`Arc`].

use std::sync::Arc;

use tracing::{debug, info};
use zsession_types::{
    ChunkCompressor, ChunkDecompressor, CompressionLevel, EndDirective, Result, SessionStats,
};
use zstd::zstd_safe::{CCtx, DCtx};

use crate::buffered::{compress_loop, decompress_loop, FrameHeaderBuffer};
use crate::dictionary::{CompressionDictionary, DecompressionDictionary};
use crate::native::{self, compression_error, decompression_error};
use crate::options::{CompressOptions, DecompressOptions};

/// Lifecycle of a [`CompressionSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionState {
    /// Configured, no input seen for the current frame
    Ready,
    /// Inside a frame
    Compressing,
    /// Inside a frame, everything so far has been emitted
    Flushed,
    /// The last frame was closed; the next input starts a new frame
    Finished,
}

/// Incremental compressor producing one frame per [`finish`](Self::finish)
pub struct CompressionSession {
    // Declared before `dictionary`: the context references its CDict and
    // must be dropped first.
    cctx: CCtx<'static>,
    dictionary: Option<Arc<CompressionDictionary>>,
    level: CompressionLevel,
    scratch: Vec<u8>,
    pending: Vec<u8>,
    needs_reset: bool,
    state: CompressionState,
    stats: SessionStats,
}

impl CompressionSession {
    /// Create a session configured by `options`
    ///
    /// A dictionary that cannot be attached fails construction.
    pub fn new(options: &CompressOptions) -> Result<Self> {
        let dictionary = options.resolve_dictionary()?;
        let level = options.effective_level(dictionary.as_deref());

        let mut cctx = native::create_cctx()?;
        native::apply_level(&mut cctx, level)?;
        if let Some(dictionary) = &dictionary {
            cctx.ref_cdict(dictionary.cdict())
                .map_err(compression_error)?;
        }
        native::apply_workers(&mut cctx, options.workers)?;

        info!(
            level = level.get(),
            dictionary = dictionary.as_ref().map(|d| d.id()),
            workers = options.workers.get(),
            "Compression session created"
        );
        Ok(Self {
            cctx,
            dictionary,
            level,
            scratch: vec![0u8; native::compress_scratch_size()],
            pending: Vec::new(),
            needs_reset: false,
            state: CompressionState::Ready,
            stats: SessionStats::new(),
        })
    }

    /// Create a session at `level` without a dictionary
    pub fn with_level(level: i32) -> Result<Self> {
        Self::new(&CompressOptions::with_level(level)?)
    }

    /// Current lifecycle state
    pub fn state(&self) -> CompressionState {
        self.state
    }

    /// Level the session compresses at
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Attached dictionary, if any
    pub fn dictionary(&self) -> Option<&Arc<CompressionDictionary>> {
        self.dictionary.as_ref()
    }

    /// Counters accumulated since the session was created
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Feed `chunk` and return whatever output is ready
    ///
    /// Output retained by earlier [`write`](Self::write) calls is returned first.
    pub fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut output = std::mem::take(&mut self.pending);
        self.run(chunk, EndDirective::Continue, &mut output)?;
        Ok(output)
    }

    /// Feed several chunks, retaining their output for the next flush or finish
    ///
    /// Returns the number of input bytes accepted.
    pub fn write<I, C>(&mut self, chunks: I) -> Result<usize>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let mut pending = std::mem::take(&mut self.pending);
        let mut accepted = 0;
        for chunk in chunks {
            let chunk = chunk.as_ref();
            if let Err(error) = self.run(chunk, EndDirective::Continue, &mut pending) {
                self.pending = pending;
                return Err(error);
            }
            accepted += chunk.len();
        }
        self.pending = pending;
        Ok(accepted)
    }

    /// Emit everything buffered so far without closing the frame
    pub fn flush(&mut self) -> Result<Vec<u8>> {
        let mut output = std::mem::take(&mut self.pending);
        self.run(&[], EndDirective::Flush, &mut output)?;
        Ok(output)
    }

    /// Close the current frame and return its remaining bytes
    ///
    /// The next call after this starts a new frame on a reset context.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let mut output = std::mem::take(&mut self.pending);
        self.run(&[], EndDirective::End, &mut output)?;
        Ok(output)
    }

    /// Abandon the current frame; the next call starts a new one
    pub fn reset(&mut self) {
        self.pending.clear();
        self.needs_reset = true;
        self.state = CompressionState::Ready;
    }

    fn run(&mut self, input: &[u8], directive: EndDirective, output: &mut Vec<u8>) -> Result<()> {
        if self.needs_reset {
            native::reset_cctx(&mut self.cctx)?;
            self.needs_reset = false;
        }

        let progress = compress_loop(&mut self.cctx, &mut self.scratch, input, directive, output)?;
        self.stats.bytes_in += input.len() as u64;
        self.stats.bytes_out += progress.produced as u64;
        self.stats.codec_calls += progress.calls;

        self.state = match directive {
            EndDirective::Continue if input.is_empty() => self.state,
            EndDirective::Continue => CompressionState::Compressing,
            EndDirective::Flush => CompressionState::Flushed,
            EndDirective::End => {
                self.stats.frames += 1;
                self.needs_reset = true;
                CompressionState::Finished
            }
        };
        debug!(
            input = input.len(),
            produced = progress.produced,
            calls = progress.calls,
            ?directive,
            "Compression step"
        );
        Ok(())
    }
}

impl ChunkCompressor for CompressionSession {
    fn compress_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.compress(input)
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        CompressionSession::flush(self)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        CompressionSession::finish(self)
    }

    fn stats(&self) -> SessionStats {
        self.stats
    }
}

/// Incremental decompressor; concatenated frames decode transparently
pub struct DecompressionSession {
    // Dropped before `dictionary`, whose DDict it references.
    dctx: DCtx<'static>,
    dictionary: Option<Arc<DecompressionDictionary>>,
    scratch: Vec<u8>,
    at_frame_start: bool,
    header: FrameHeaderBuffer,
    stats: SessionStats,
}

impl DecompressionSession {
    /// Create a session configured by `options`
    pub fn new(options: &DecompressOptions) -> Result<Self> {
        let dictionary = options.resolve_dictionary()?;
        let mut dctx = native::create_dctx()?;
        if let Some(dictionary) = &dictionary {
            dctx.ref_ddict(dictionary.ddict())
                .map_err(decompression_error)?;
        }
        info!(
            dictionary = dictionary.as_ref().map(|d| d.id()),
            "Decompression session created"
        );
        Ok(Self {
            dctx,
            dictionary,
            scratch: vec![0u8; native::decompress_scratch_size()],
            at_frame_start: true,
            header: FrameHeaderBuffer::default(),
            stats: SessionStats::new(),
        })
    }

    /// Attached dictionary, if any
    pub fn dictionary(&self) -> Option<&Arc<DecompressionDictionary>> {
        self.dictionary.as_ref()
    }

    /// Counters accumulated since the session was created
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Whether every frame started so far has been fully decoded
    pub fn at_frame_boundary(&self) -> bool {
        self.at_frame_start && self.header.is_empty()
    }

    /// Feed `chunk` and return all output it makes available
    ///
    /// The whole chunk is always consumed. A chunk may end mid-frame; the
    /// rest of that frame is expected in the next call.
    pub fn decompress(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.run(chunk, false, &mut output)?;
        Ok(output)
    }

    /// Decode up to the end of the next frame
    ///
    /// Returns the output and the number of bytes of `chunk` consumed.
    /// Consumption stops as soon as a frame is complete and flushed, so the
    /// count locates the frame end within `chunk`.
    pub fn decompress_with_pos(&mut self, chunk: &[u8]) -> Result<(Vec<u8>, usize)> {
        let mut output = Vec::new();
        let consumed = self.run(chunk, true, &mut output)?;
        Ok((output, consumed))
    }

    /// Discard any partially decoded frame
    pub fn reset(&mut self) -> Result<()> {
        native::reset_dctx(&mut self.dctx)?;
        self.at_frame_start = true;
        self.header.clear();
        Ok(())
    }

    fn run(&mut self, input: &[u8], stop_at_frame_end: bool, output: &mut Vec<u8>) -> Result<usize> {
        let progress = decompress_loop(
            &mut self.dctx,
            &mut self.scratch,
            input,
            self.dictionary.as_deref(),
            &mut self.header,
            self.at_frame_start,
            stop_at_frame_end,
            output,
        )?;
        self.at_frame_start = progress.at_frame_start;
        self.stats.bytes_in += progress.consumed as u64;
        self.stats.bytes_out += progress.produced as u64;
        self.stats.codec_calls += progress.calls;
        self.stats.frames += progress.frames;
        debug!(
            input = input.len(),
            consumed = progress.consumed,
            produced = progress.produced,
            frames = progress.frames,
            "Decompression step"
        );
        Ok(progress.consumed)
    }
}

impl ChunkDecompressor for DecompressionSession {
    fn decompress_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.decompress(input)
    }

    fn at_frame_boundary(&self) -> bool {
        self.at_frame_boundary()
    }

    fn stats(&self) -> SessionStats {
        self.stats
    }
}

/// Decompress a sequence of compressed chunks, handing each output to `sink`
///
/// Returns the total number of decompressed bytes. Empty outputs are not
/// passed to `sink`.
pub fn decompress_streaming<I, C, F>(chunks: I, options: &DecompressOptions, mut sink: F) -> Result<u64>
where
    I: IntoIterator<Item = C>,
    C: AsRef<[u8]>,
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut session = DecompressionSession::new(options)?;
    let mut total = 0u64;
    for chunk in chunks {
        let output = session.decompress(chunk.as_ref())?;
        if !output.is_empty() {
            total += output.len() as u64;
            sink(&output)?;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oneshot::{compress, decompress};
    use crate::test_support::{noise, record, text, trained_dictionary};
    use rstest::rstest;
    use zsession_types::{ContentSize, Error, ErrorKind};

    fn stream(data: &[u8], chunk_size: usize, options: &CompressOptions) -> Vec<u8> {
        let mut session = CompressionSession::new(options).unwrap();
        let mut output = Vec::new();
        for chunk in data.chunks(chunk_size.max(1)) {
            output.extend(session.compress(chunk).unwrap());
        }
        output.extend(session.finish().unwrap());
        output
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(4096)]
    #[case(1 << 20)]
    fn test_chunked_compression_round_trip(#[case] chunk_size: usize) {
        let data = text(200_000);
        let compressed = stream(&data, chunk_size, &CompressOptions::new());
        assert_eq!(crate::frame::content_size(&compressed).unwrap(), ContentSize::Unknown);
        assert_eq!(decompress(&compressed, &DecompressOptions::new()).unwrap(), data);
    }

    #[test]
    fn test_state_transitions() {
        let mut session = CompressionSession::with_level(3).unwrap();
        assert_eq!(session.state(), CompressionState::Ready);
        session.compress(&[]).unwrap();
        assert_eq!(session.state(), CompressionState::Ready);
        session.compress(b"abc").unwrap();
        assert_eq!(session.state(), CompressionState::Compressing);
        session.flush().unwrap();
        assert_eq!(session.state(), CompressionState::Flushed);
        session.finish().unwrap();
        assert_eq!(session.state(), CompressionState::Finished);
        assert_eq!(session.stats().frames, 1);
    }

    #[test]
    fn test_flush_makes_prefix_decodable() {
        let mut session = CompressionSession::with_level(3).unwrap();
        let mut decoder = DecompressionSession::new(&DecompressOptions::new()).unwrap();

        let mut compressed = session.compress(b"first part, ").unwrap();
        compressed.extend(session.flush().unwrap());
        assert_eq!(decoder.decompress(&compressed).unwrap(), b"first part, ");

        let mut tail = session.compress(b"second part").unwrap();
        tail.extend(session.finish().unwrap());
        assert_eq!(decoder.decompress(&tail).unwrap(), b"second part");
    }

    #[test]
    fn test_session_emits_one_frame_per_finish() {
        let mut session = CompressionSession::with_level(1).unwrap();
        let mut output = session.compress(b"frame one").unwrap();
        output.extend(session.finish().unwrap());
        output.extend(session.compress(b" frame two").unwrap());
        output.extend(session.finish().unwrap());

        let first_len = crate::frame::first_frame_len(&output).unwrap();
        assert!(first_len < output.len());
        assert_eq!(
            decompress(&output, &DecompressOptions::new()).unwrap(),
            b"frame one frame two"
        );
    }

    #[test]
    fn test_write_retains_output_until_finish() {
        let mut session = CompressionSession::with_level(3).unwrap();
        let chunks = [text(70_000), noise(300_000, 9), text(5)];
        let accepted = session.write(chunks.iter()).unwrap();
        assert_eq!(accepted, 370_005);

        let compressed = session.finish().unwrap();
        let expected: Vec<u8> = chunks.concat();
        assert_eq!(decompress(&compressed, &DecompressOptions::new()).unwrap(), expected);
    }

    #[test]
    fn test_multi_frame_decompression_is_transparent() {
        let first = compress(b"alpha ", &CompressOptions::new()).unwrap();
        let second = stream(b"beta", 2, &CompressOptions::new());
        let joined = [first, second].concat();

        let mut session = DecompressionSession::new(&DecompressOptions::new()).unwrap();
        let mut output = Vec::new();
        for piece in joined.chunks(3) {
            output.extend(session.decompress(piece).unwrap());
        }
        assert_eq!(output, b"alpha beta");
        assert_eq!(session.stats().frames, 2);
    }

    #[test]
    fn test_decompress_with_pos_stops_at_frame_end() {
        let first = compress(b"one", &CompressOptions::new()).unwrap();
        let second = compress(b"two", &CompressOptions::new()).unwrap();
        let joined = [first.clone(), second].concat();

        let mut session = DecompressionSession::new(&DecompressOptions::new()).unwrap();
        let (output, consumed) = session.decompress_with_pos(&joined).unwrap();
        assert_eq!(output, b"one");
        assert_eq!(consumed, first.len());

        let (output, consumed) = session.decompress_with_pos(&joined[consumed..]).unwrap();
        assert_eq!(output, b"two");
        assert_eq!(consumed, joined.len() - first.len());
    }

    #[test]
    fn test_streaming_dictionary_round_trip() {
        let alpha = trained_dictionary("alpha");
        let beta = trained_dictionary("beta");
        let data: Vec<u8> = (0..50).flat_map(|i| record("alpha", i).into_bytes()).collect();

        let options = CompressOptions::with_level(3).unwrap().dictionary(alpha.clone());
        let compressed = stream(&data, 100, &options);
        assert_ne!(crate::frame::frame_dictionary_id(&compressed), 0);

        let mut session =
            DecompressionSession::new(&DecompressOptions::new().dictionary(alpha)).unwrap();
        assert_eq!(session.decompress(&compressed).unwrap(), data);

        let mut wrong =
            DecompressionSession::new(&DecompressOptions::new().dictionary(beta)).unwrap();
        let error = wrong.decompress(&compressed).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DictionaryMismatch);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(5)]
    fn test_dictionary_mismatch_with_split_header(#[case] piece: usize) {
        let alpha = trained_dictionary("alpha");
        let beta = trained_dictionary("beta");
        let data: Vec<u8> = (0..20).flat_map(|i| record("alpha", i).into_bytes()).collect();
        let compressed = compress(&data, &CompressOptions::new().dictionary(alpha.clone())).unwrap();
        let expected = crate::frame::frame_dictionary_id(&compressed);

        let mut session =
            DecompressionSession::new(&DecompressOptions::new().dictionary(beta)).unwrap();
        let error = compressed
            .chunks(piece)
            .map(|chunk| session.decompress(chunk))
            .find_map(Result::err)
            .unwrap();
        assert_eq!(error.kind(), ErrorKind::DictionaryMismatch);
        assert!(matches!(error, Error::DictionaryMismatch { expected: e, .. } if e == expected));

        let mut session =
            DecompressionSession::new(&DecompressOptions::new().dictionary(alpha)).unwrap();
        let mut output = Vec::new();
        for chunk in compressed.chunks(piece) {
            output.extend(session.decompress(chunk).unwrap());
        }
        assert_eq!(output, data);
        assert!(session.at_frame_boundary());
    }

    #[test]
    fn test_partial_header_is_not_a_frame_boundary() {
        let compressed = compress(b"split header", &CompressOptions::new()).unwrap();
        let mut session = DecompressionSession::new(&DecompressOptions::new()).unwrap();
        assert!(session.decompress(&compressed[..3]).unwrap().is_empty());
        assert!(!session.at_frame_boundary());
        assert_eq!(session.decompress(&compressed[3..]).unwrap(), b"split header");
        assert!(session.at_frame_boundary());
    }

    #[test]
    fn test_precompiled_dictionary_frames_decode_one_shot() {
        let dictionary = trained_dictionary("alpha");
        let cdict = CompressionDictionary::shared(&dictionary, 3).unwrap();
        let ddict = DecompressionDictionary::shared(&dictionary).unwrap();
        let data: Vec<u8> = (0..30).flat_map(|i| record("alpha", i).into_bytes()).collect();

        let compressed = stream(&data, 64, &CompressOptions::new().dictionary(cdict.clone()));
        assert_eq!(crate::frame::frame_dictionary_id(&compressed), cdict.id());
        assert_eq!(
            decompress(&compressed, &DecompressOptions::new().dictionary(ddict.clone())).unwrap(),
            data
        );

        let session = CompressionSession::new(&CompressOptions::new().dictionary(cdict.clone())).unwrap();
        assert!(Arc::ptr_eq(session.dictionary().unwrap(), &cdict));
        let session = DecompressionSession::new(&DecompressOptions::new().dictionary(ddict.clone())).unwrap();
        assert!(Arc::ptr_eq(session.dictionary().unwrap(), &ddict));
    }

    #[test]
    fn test_worker_hint_degrades_without_failing() {
        let data = text(300_000);
        let options = CompressOptions::with_level(3).unwrap().workers(4).unwrap();

        let compressed = stream(&data, 65_536, &options);
        assert_eq!(decompress(&compressed, &DecompressOptions::new()).unwrap(), data);

        let one_shot = compress(&data, &options).unwrap();
        assert_eq!(decompress(&one_shot, &DecompressOptions::new()).unwrap(), data);
    }

    #[test]
    fn test_decompress_streaming_sink() {
        let data = noise(400_000, 21);
        let compressed = stream(&data, 65_536, &CompressOptions::new());
        let mut collected = Vec::new();
        let total = decompress_streaming(compressed.chunks(1000), &DecompressOptions::new(), |out| {
            collected.extend_from_slice(out);
            Ok(())
        })
        .unwrap();
        assert_eq!(total, data.len() as u64);
        assert_eq!(collected, data);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut session = CompressionSession::with_level(3).unwrap();
        session.write([b"discarded".as_slice()]).unwrap();
        session.reset();
        let mut output = session.compress(b"kept").unwrap();
        output.extend(session.finish().unwrap());
        assert_eq!(decompress(&output, &DecompressOptions::new()).unwrap(), b"kept");
    }

    #[test]
    fn test_garbage_chunk_fails() {
        let mut session = DecompressionSession::new(&DecompressOptions::new()).unwrap();
        let error = session.decompress(b"garbage garbage garbage").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Decompression);
    }
}
