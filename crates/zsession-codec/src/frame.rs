//! Frame inspection
//!
//! Reads only frame headers. Nothing here allocates output; the result of
//! [`inspect`] decides whether decompression can take the one-shot path or
//! has to fall back to the buffered loop.

use zsession_types::{ContentSize, DictionaryId, Error, Result};
use zstd::zstd_safe;

/// First magic number of the skippable range
pub const SKIPPABLE_MAGIC_START: u32 = 0x184D_2A50;

/// Mask that maps every skippable magic onto [`SKIPPABLE_MAGIC_START`]
pub const SKIPPABLE_MAGIC_MASK: u32 = 0xFFFF_FFF0;

/// Magic number opening every compressed frame
pub const FRAME_MAGIC: u32 = 0xFD2F_B528;

/// What a buffer's leading header says about it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHeader {
    /// A compressed frame declaring its exact decompressed size
    KnownSize(u64),
    /// A compressed frame without a declared size
    UnknownSize,
    /// A skippable record carrying this many payload bytes
    Skippable(u32),
    /// Neither a compressed frame nor a skippable record
    NotAFrame,
}

impl FrameHeader {
    /// Content size as declared by the header, when the input is a frame
    pub fn content_size(self) -> Option<ContentSize> {
        match self {
            Self::KnownSize(size) => Some(ContentSize::Known(size)),
            Self::UnknownSize => Some(ContentSize::Unknown),
            Self::Skippable(_) | Self::NotAFrame => None,
        }
    }
}

/// Read the little-endian magic number at the start of `bytes`
pub(crate) fn leading_magic(bytes: &[u8]) -> Option<u32> {
    let head: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(head))
}

/// Check whether `magic` lies in the 16-value skippable range
pub fn is_skippable_magic(magic: u32) -> bool {
    magic & SKIPPABLE_MAGIC_MASK == SKIPPABLE_MAGIC_START
}

/// Check whether `bytes` starts with a skippable record magic
pub fn is_skippable(bytes: &[u8]) -> bool {
    leading_magic(bytes).is_some_and(is_skippable_magic)
}

/// Classify the header at the start of `bytes`
pub fn inspect(bytes: &[u8]) -> FrameHeader {
    match leading_magic(bytes) {
        Some(magic) if is_skippable_magic(magic) => {
            let length = bytes
                .get(4..8)
                .and_then(|raw| raw.try_into().ok())
                .map(u32::from_le_bytes);
            length.map_or(FrameHeader::NotAFrame, FrameHeader::Skippable)
        }
        _ => match zstd_safe::get_frame_content_size(bytes) {
            Ok(Some(size)) => FrameHeader::KnownSize(size),
            Ok(None) => FrameHeader::UnknownSize,
            Err(_) => FrameHeader::NotAFrame,
        },
    }
}

/// Declared content size of the frame at the start of `bytes`
///
/// Fails with a frame format error when `bytes` does not start with a
/// compressed frame.
pub fn content_size(bytes: &[u8]) -> Result<ContentSize> {
    inspect(bytes)
        .content_size()
        .ok_or_else(|| Error::frame_format("Not compressed by zstd"))
}

/// Dictionary ID declared by the frame at the start of `bytes`
///
/// Returns 0 when the frame was produced without a dictionary, by a
/// raw-content dictionary, or when the header cannot be read.
pub fn frame_dictionary_id(bytes: &[u8]) -> DictionaryId {
    zstd_safe::get_dict_id_from_frame(bytes).map_or(0, |id| id.get())
}

/// Longest possible compressed frame header
pub(crate) const MAX_HEADER_LEN: usize = 18;

/// Length of the header at the start of `bytes`
///
/// `None` while `bytes` is too short to tell. Anything other than a
/// compressed frame reports just its magic number, since no dictionary ID
/// can follow it.
pub(crate) fn header_len(bytes: &[u8]) -> Option<usize> {
    if leading_magic(bytes)? != FRAME_MAGIC {
        return Some(4);
    }
    let descriptor = *bytes.get(4)?;
    let single_segment = descriptor & 0x20 != 0;
    let dictionary_id = [0, 1, 2, 4][usize::from(descriptor & 0x03)];
    let content_size = match descriptor >> 6 {
        0 => usize::from(single_segment),
        1 => 2,
        2 => 4,
        _ => 8,
    };
    Some(5 + usize::from(!single_segment) + dictionary_id + content_size)
}

/// Compressed length of the first frame in `bytes`, if it is complete
pub fn first_frame_len(bytes: &[u8]) -> Option<usize> {
    zstd_safe::find_frame_compressed_size(bytes).ok()
}
