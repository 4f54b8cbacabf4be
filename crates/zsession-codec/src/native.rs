//! Thin helpers around the native codec handles
//!
//! Every allocation and every error code coming out of `zstd_safe` passes
//! through here so the rest of the crate only sees [`Error`].

use tracing::warn;
use zsession_types::{CompressionLevel, Error, Result, WorkerCount};
use zstd::zstd_safe::{self, CCtx, CParameter, DCtx, ErrorCode, ResetDirective};

/// Allocate a compression context
pub(crate) fn create_cctx() -> Result<CCtx<'static>> {
    CCtx::try_create()
        .ok_or_else(|| Error::initialization("failed to allocate a compression context"))
}

/// Allocate a decompression context
pub(crate) fn create_dctx() -> Result<DCtx<'static>> {
    DCtx::try_create()
        .ok_or_else(|| Error::initialization("failed to allocate a decompression context"))
}

/// Codec error number of a failed call's return value
///
/// Failing calls return the negated error number as a `size_t`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn error_number(code: ErrorCode) -> u32 {
    code.wrapping_neg() as u32
}

/// Map a codec error code raised while compressing
pub(crate) fn compression_error(code: ErrorCode) -> Error {
    Error::compression_code(error_number(code), zstd_safe::get_error_name(code))
}

/// Map a codec error code raised while decompressing
pub(crate) fn decompression_error(code: ErrorCode) -> Error {
    Error::decompression_code(error_number(code), zstd_safe::get_error_name(code))
}

/// Return a context to session-only state, keeping its parameters
pub(crate) fn reset_cctx(cctx: &mut CCtx<'_>) -> Result<()> {
    cctx.reset(ResetDirective::SessionOnly)
        .map(drop)
        .map_err(compression_error)
}

/// Return a context to session-only state, keeping any loaded dictionary
pub(crate) fn reset_dctx(dctx: &mut DCtx<'_>) -> Result<()> {
    dctx.reset(ResetDirective::SessionOnly)
        .map(drop)
        .map_err(decompression_error)
}

/// Apply the compression level parameter
pub(crate) fn apply_level(cctx: &mut CCtx<'_>, level: CompressionLevel) -> Result<()> {
    cctx.set_parameter(CParameter::CompressionLevel(level.get()))
        .map(drop)
        .map_err(compression_error)
}

/// Apply the worker-count hint
///
/// A codec built without multithreading cannot honour the hint; that case
/// is reported as a warning and compression stays single-threaded.
#[cfg(feature = "multithread")]
pub(crate) fn apply_workers(cctx: &mut CCtx<'_>, workers: WorkerCount) -> Result<()> {
    if !workers.is_multithreaded() {
        return Ok(());
    }
    if let Err(code) = cctx.set_parameter(CParameter::NbWorkers(workers.get())) {
        warn!(
            workers = workers.get(),
            reason = zstd_safe::get_error_name(code),
            "Worker hint rejected by the codec, compressing single-threaded"
        );
    }
    Ok(())
}

/// Apply the worker-count hint
///
/// This build links the single-threaded codec, so any non-zero hint is
/// reported as a warning and ignored.
#[cfg(not(feature = "multithread"))]
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn apply_workers(_cctx: &mut CCtx<'_>, workers: WorkerCount) -> Result<()> {
    if workers.is_multithreaded() {
        warn!(
            workers = workers.get(),
            "Codec built without multithreading, compressing single-threaded"
        );
    }
    Ok(())
}

/// Recommended size of the per-session output scratch buffer (compression)
pub(crate) fn compress_scratch_size() -> usize {
    CCtx::out_size()
}

/// Recommended size of the per-session output scratch buffer (decompression)
pub(crate) fn decompress_scratch_size() -> usize {
    DCtx::out_size()
}
