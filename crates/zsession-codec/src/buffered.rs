//! Buffered codec loops
//!
//! Drives the streaming primitives with a fixed-size scratch chunk and
//! appends each produced chunk to a growing accumulator. Used whenever the
//! output size cannot be predicted: frames without a declared size, and
//! every call on a streaming session.

use tracing::debug;
use zsession_types::{EndDirective, Error, Result};
use zstd::zstd_safe::{zstd_sys::ZSTD_EndDirective, CCtx, DCtx, InBuffer, OutBuffer};

use crate::dictionary::{check_frame_dictionary, DecompressionDictionary};
use crate::frame::{header_len, MAX_HEADER_LEN};
use crate::native::{self, compression_error, decompression_error};

fn native_directive(directive: EndDirective) -> ZSTD_EndDirective {
    match directive {
        EndDirective::Continue => ZSTD_EndDirective::ZSTD_e_continue,
        EndDirective::Flush => ZSTD_EndDirective::ZSTD_e_flush,
        EndDirective::End => ZSTD_EndDirective::ZSTD_e_end,
    }
}

/// Outcome of one compression loop
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CompressProgress {
    pub produced: usize,
    pub calls: u64,
}

/// Feed `input` through the streaming compressor under `directive`
///
/// With [`EndDirective::Continue`] the loop runs until the input is fully
/// consumed. With `Flush` or `End` it also keeps going while the codec
/// reports pending output.
pub(crate) fn compress_loop(
    cctx: &mut CCtx<'_>,
    scratch: &mut [u8],
    input: &[u8],
    directive: EndDirective,
    output: &mut Vec<u8>,
) -> Result<CompressProgress> {
    let mut progress = CompressProgress::default();
    if directive == EndDirective::Continue && input.is_empty() {
        return Ok(progress);
    }

    let mut in_buffer = InBuffer::around(input);
    loop {
        let mut out_buffer = OutBuffer::around(&mut *scratch);
        let remaining = cctx
            .compress_stream2(&mut out_buffer, &mut in_buffer, native_directive(directive))
            .map_err(compression_error)?;
        let produced = out_buffer.pos();
        output.extend_from_slice(&scratch[..produced]);
        progress.produced += produced;
        progress.calls += 1;

        let consumed = in_buffer.pos() == input.len();
        let done = match directive {
            EndDirective::Continue => consumed,
            EndDirective::Flush | EndDirective::End => consumed && remaining == 0,
        };
        if done {
            break;
        }
    }
    Ok(progress)
}

/// Outcome of one decompression loop
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DecompressProgress {
    pub consumed: usize,
    pub produced: usize,
    pub calls: u64,
    pub frames: u64,
    /// The loop ended exactly on a frame boundary
    pub at_frame_start: bool,
}

/// Leading bytes of a frame whose header has not been fully seen yet
///
/// A header split across input chunks is collected here so its dictionary
/// ID is checked once the whole header is available.
#[derive(Debug, Default)]
pub(crate) struct FrameHeaderBuffer(Vec<u8>);

impl FrameHeaderBuffer {
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    /// Append the start of `bytes`, returning how many bytes were taken
    fn fill(&mut self, bytes: &[u8]) -> usize {
        let take = bytes.len().min(MAX_HEADER_LEN.saturating_sub(self.0.len()));
        self.0.extend_from_slice(&bytes[..take]);
        take
    }

    /// The collected header, once it is complete
    fn complete(&self) -> Option<&[u8]> {
        header_len(&self.0)
            .filter(|&len| self.0.len() >= len)
            .map(|_| self.0.as_slice())
    }
}

/// Feed `input` through the streaming decompressor
///
/// The loop ends once the input is exhausted and the scratch buffer was not
/// filled by the last call, so nothing stays buffered inside the codec.
/// Frame boundaries are crossed transparently unless `stop_at_frame_end`
/// is set. Whenever a new frame begins, its declared dictionary is checked
/// against `dictionary`; `header` carries a partial header between calls.
#[allow(clippy::too_many_arguments)]
pub(crate) fn decompress_loop(
    dctx: &mut DCtx<'_>,
    scratch: &mut [u8],
    input: &[u8],
    dictionary: Option<&DecompressionDictionary>,
    header: &mut FrameHeaderBuffer,
    mut at_frame_start: bool,
    stop_at_frame_end: bool,
    output: &mut Vec<u8>,
) -> Result<DecompressProgress> {
    let mut progress = DecompressProgress::default();
    let mut in_buffer = InBuffer::around(input);
    let mut filled = false;
    // Input offset up to which bytes already sit in `header`
    let mut collected_until = 0;

    while in_buffer.pos() < input.len() || filled {
        let before = in_buffer.pos();
        if at_frame_start && before < input.len() && before >= collected_until {
            collected_until = before + header.fill(&input[before..]);
            if let Some(frame_header) = header.complete() {
                check_frame_dictionary(frame_header, dictionary)?;
                header.clear();
                at_frame_start = false;
                collected_until = 0;
            }
        }

        let mut out_buffer = OutBuffer::around(&mut *scratch);
        let hint = dctx
            .decompress_stream(&mut out_buffer, &mut in_buffer)
            .map_err(decompression_error)?;
        let produced = out_buffer.pos();
        output.extend_from_slice(&scratch[..produced]);
        progress.produced += produced;
        progress.calls += 1;
        filled = produced == scratch.len();

        if hint == 0 {
            progress.frames += 1;
            at_frame_start = true;
            filled = false;
            if stop_at_frame_end {
                break;
            }
        } else if in_buffer.pos() == before && produced == 0 {
            if before == input.len() {
                break;
            }
            return Err(Error::decompression("codec made no progress on the input"));
        }
    }

    progress.consumed = in_buffer.pos();
    progress.at_frame_start = at_frame_start;
    Ok(progress)
}

/// Decompress `input` whose total output size is unknown
///
/// Runs on a fresh session state and accepts any number of concatenated
/// frames or skippable records.
pub(crate) fn decompress_unknown_size(
    dctx: &mut DCtx<'_>,
    input: &[u8],
    dictionary: Option<&DecompressionDictionary>,
) -> Result<Vec<u8>> {
    if let Some(dictionary) = dictionary {
        dctx.ref_ddict(dictionary.ddict())
            .map_err(decompression_error)?;
    }
    let mut scratch = vec![0u8; native::decompress_scratch_size()];
    let mut output = Vec::with_capacity(input.len().saturating_mul(2));
    let mut header = FrameHeaderBuffer::default();
    let progress = decompress_loop(
        dctx,
        &mut scratch,
        input,
        dictionary,
        &mut header,
        true,
        false,
        &mut output,
    )?;
    debug!(
        input = input.len(),
        output = output.len(),
        calls = progress.calls,
        frames = progress.frames,
        "Buffered decompression finished"
    );
    Ok(output)
}

/// Decompress `input` with no declared size using a fresh context
pub fn decompress_buffered(input: &[u8], dictionary: Option<&DecompressionDictionary>) -> Result<Vec<u8>> {
    let mut dctx = native::create_dctx()?;
    decompress_unknown_size(&mut dctx, input, dictionary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noise, text, unsized_frame};
    use zsession_types::ErrorKind;

    #[test]
    fn test_unknown_size_round_trip() {
        let data = text(300_000);
        let frame = unsized_frame(&data);
        assert_eq!(decompress_buffered(&frame, None).unwrap(), data);
    }

    #[test]
    fn test_output_larger_than_scratch_is_drained() {
        let data = vec![0u8; native::decompress_scratch_size() * 5 + 17];
        let frame = unsized_frame(&data);
        assert_eq!(decompress_buffered(&frame, None).unwrap(), data);
    }

    #[test]
    fn test_concatenated_frames_are_transparent() {
        let first = noise(10_000, 7);
        let second = text(20_000);
        let mut input = unsized_frame(&first);
        input.extend(zstd::bulk::compress(&second, 3).unwrap());

        let output = decompress_buffered(&input, None).unwrap();
        assert_eq!(output.len(), first.len() + second.len());
        assert_eq!(&output[..first.len()], first.as_slice());
        assert_eq!(&output[first.len()..], second.as_slice());
    }

    #[test]
    fn test_truncated_frame_returns_prefix() {
        let data = noise(200_000, 3);
        let frame = unsized_frame(&data);
        let cut = &frame[..frame.len() / 2];
        let output = decompress_buffered(cut, None).unwrap();
        assert!(output.len() < data.len());
        assert_eq!(output.as_slice(), &data[..output.len()]);
    }

    #[test]
    fn test_garbage_fails() {
        let error = decompress_buffered(b"this is not a frame at all", None).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Decompression);
        assert!(error.codec_code().is_some());
    }

    #[test]
    fn test_compress_loop_directives() {
        let mut cctx = native::create_cctx().unwrap();
        let mut scratch = vec![0u8; native::compress_scratch_size()];
        let mut output = Vec::new();
        let data = text(100_000);

        compress_loop(&mut cctx, &mut scratch, &data, EndDirective::Continue, &mut output).unwrap();
        let flushed = compress_loop(&mut cctx, &mut scratch, &[], EndDirective::Flush, &mut output)
            .unwrap();
        assert!(flushed.calls >= 1);
        compress_loop(&mut cctx, &mut scratch, &[], EndDirective::End, &mut output).unwrap();

        assert_eq!(decompress_buffered(&output, None).unwrap(), data);
    }
}
