//! Skippable records
//!
//! A skippable record is an 8-byte header (one of 16 reserved magic numbers
//! followed by a little-endian payload length) and an opaque payload. The
//! codec skips these records while decompressing, which makes them a side
//! channel for metadata stored next to compressed frames.

use tracing::debug;
use zsession_types::{Error, MagicVariant, Result};

use crate::frame::{is_skippable_magic, leading_magic, SKIPPABLE_MAGIC_START};

/// Size of the record header
pub const SKIPPABLE_HEADER_SIZE: usize = 8;

/// A skippable record borrowed from a larger buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippableRecord<'a> {
    /// Which of the 16 magic numbers the record uses
    pub variant: MagicVariant,
    /// The opaque payload
    pub payload: &'a [u8],
}

impl SkippableRecord<'_> {
    /// Total encoded length including the header
    pub fn encoded_len(&self) -> usize {
        SKIPPABLE_HEADER_SIZE + self.payload.len()
    }
}

fn header(payload_len: usize, variant: MagicVariant) -> Result<[u8; SKIPPABLE_HEADER_SIZE]> {
    let length = u32::try_from(payload_len).map_err(|_| {
        Error::parameter(format!(
            "skippable payload of {} bytes exceeds the 4 GiB record limit",
            payload_len
        ))
    })?;
    let magic = SKIPPABLE_MAGIC_START + u32::from(variant.get());
    let mut header = [0u8; SKIPPABLE_HEADER_SIZE];
    header[..4].copy_from_slice(&magic.to_le_bytes());
    header[4..].copy_from_slice(&length.to_le_bytes());
    Ok(header)
}

/// Encode `payload` as a skippable record
pub fn write_skippable_record(payload: &[u8], variant: MagicVariant) -> Result<Vec<u8>> {
    let header = header(payload.len(), variant)?;
    let mut record = Vec::with_capacity(SKIPPABLE_HEADER_SIZE + payload.len());
    record.extend_from_slice(&header);
    record.extend_from_slice(payload);
    debug!(payload = payload.len(), variant = variant.get(), "Wrote skippable record");
    Ok(record)
}

/// Place a skippable record in front of an existing compressed buffer
///
/// Probing the start of the result finds the record; decompressing the
/// result skips it and yields the original content.
pub fn prepend_skippable_record(compressed: &[u8], payload: &[u8], variant: MagicVariant) -> Result<Vec<u8>> {
    let header = header(payload.len(), variant)?;
    let mut combined = Vec::with_capacity(SKIPPABLE_HEADER_SIZE + payload.len() + compressed.len());
    combined.extend_from_slice(&header);
    combined.extend_from_slice(payload);
    combined.extend_from_slice(compressed);
    Ok(combined)
}

/// Parse the skippable record at the start of `bytes`
///
/// Returns `Ok(None)` when `bytes` does not start with a skippable magic.
/// A record whose header or payload is cut short is a frame format error.
/// Bytes after the record are ignored.
pub fn read_skippable_record_with_variant(bytes: &[u8]) -> Result<Option<SkippableRecord<'_>>> {
    let Some(magic) = leading_magic(bytes).filter(|magic| is_skippable_magic(*magic)) else {
        return Ok(None);
    };

    let length = bytes
        .get(4..SKIPPABLE_HEADER_SIZE)
        .and_then(|raw| raw.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| Error::frame_format("skippable record header is truncated"))?;
    let end = usize::try_from(length)
        .ok()
        .and_then(|length| SKIPPABLE_HEADER_SIZE.checked_add(length))
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            Error::frame_format(format!(
                "skippable record declares {} payload bytes but only {} are present",
                length,
                bytes.len() - SKIPPABLE_HEADER_SIZE
            ))
        })?;

    let variant = MagicVariant::new((magic - SKIPPABLE_MAGIC_START) as u8).map_err(Error::frame_format)?;
    Ok(Some(SkippableRecord {
        variant,
        payload: &bytes[SKIPPABLE_HEADER_SIZE..end],
    }))
}

/// Payload of the skippable record at the start of `bytes`
///
/// Returns `Ok(None)` when `bytes` does not start with a skippable magic.
pub fn read_skippable_record(bytes: &[u8]) -> Result<Option<&[u8]>> {
    Ok(read_skippable_record_with_variant(bytes)?.map(|record| record.payload))
}

/// Iterate over consecutive skippable records at the start of `bytes`
///
/// Stops at the first byte that does not start a skippable record and
/// yields the remainder's offset through [`SkippableRecords::offset`].
pub fn skippable_records(bytes: &[u8]) -> SkippableRecords<'_> {
    SkippableRecords { bytes, offset: 0 }
}

/// Iterator returned by [`skippable_records`]
#[derive(Debug, Clone)]
pub struct SkippableRecords<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl SkippableRecords<'_> {
    /// Offset of the first byte not yet consumed
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for SkippableRecords<'a> {
    type Item = Result<SkippableRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.bytes[self.offset..];
        match read_skippable_record_with_variant(rest) {
            Ok(Some(record)) => {
                self.offset += record.encoded_len();
                Some(Ok(record))
            }
            Ok(None) => None,
            Err(error) => {
                self.offset = self.bytes.len();
                Some(Err(error))
            }
        }
    }
}
