//! Error handling tests for zsession-codec

use crate::dictionary::{CompressionDictionary, DecompressionDictionary};
use crate::oneshot::{compress, decompress, DecompressionContext};
use crate::options::{CompressOptions, DecompressOptions, DictArg};
use crate::skippable::{read_skippable_record, write_skippable_record};
use crate::streaming::{CompressionSession, DecompressionSession};
use crate::test_support::{record, text, trained_dictionary};
use zsession_types::{Error, ErrorKind, ErrorSeverity, MagicVariant};

/// Random bytes are rejected before any decompression work
#[test]
fn test_random_bytes_are_not_a_frame() {
    let error = decompress(&[0xFF; 100], &DecompressOptions::new()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::FrameFormat);
    assert_eq!(error.severity(), ErrorSeverity::Low);
    assert!(error.to_string().contains("Not compressed by zstd"));
}

/// A corrupted block is reported with the codec's diagnostic
#[test]
fn test_corrupted_block_carries_codec_diagnostic() {
    let data = text(50_000);
    let mut compressed = compress(&data, &CompressOptions::new()).unwrap();
    let last = compressed.len() - 1;
    for byte in &mut compressed[12..last] {
        *byte ^= 0x5A;
    }

    match decompress(&compressed, &DecompressOptions::new()) {
        Err(Error::Decompression { message, .. }) => assert!(!message.is_empty()),
        other => panic!("expected a decompression error, got {:?}", other),
    }
}

/// A failed call leaves a reused context usable
#[test]
fn test_context_usable_after_failure() {
    let mut context = DecompressionContext::new(&DecompressOptions::new()).unwrap();
    let good = compress(b"good frame", &CompressOptions::new()).unwrap();
    let mut bad = good.clone();
    bad.truncate(bad.len() - 2);

    assert!(context.decompress(&bad).is_err());
    assert_eq!(context.decompress(&good).unwrap(), b"good frame");
}

/// The dictionary check happens before decoding and reports both IDs
#[test]
fn test_mismatch_reports_ids() {
    let alpha = trained_dictionary("alpha");
    let beta = trained_dictionary("beta");
    let cdict = CompressionDictionary::shared(&alpha, 3).unwrap();
    let ddict = DecompressionDictionary::shared(&beta).unwrap();

    let compressed = compress(
        record("alpha", 1).as_bytes(),
        &CompressOptions::new().dictionary(DictArg::Compression(cdict.clone())),
    )
    .unwrap();

    let error = decompress(&compressed, &DecompressOptions::new().dictionary(ddict.clone())).unwrap_err();
    assert_eq!(
        error,
        Error::DictionaryMismatch {
            expected: cdict.id(),
            found: ddict.id(),
        }
    );
}

/// Sessions refuse a dictionary built for the other direction
#[test]
fn test_session_construction_fails_on_wrong_dictionary_kind() {
    let ddict = DecompressionDictionary::shared(b"dictionary").unwrap();
    let result = CompressionSession::new(&CompressOptions::new().dictionary(ddict));
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Parameter));

    let cdict = CompressionDictionary::shared(b"dictionary", 3).unwrap();
    let result = DecompressionSession::new(&DecompressOptions::new().dictionary(cdict));
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Parameter));
}

/// A session rejects an input stream that turns into garbage mid-way
#[test]
fn test_session_fails_on_trailing_garbage() {
    let mut input = compress(b"valid", &CompressOptions::new()).unwrap();
    input.extend_from_slice(b"trailing garbage that is not a frame");

    let mut session = DecompressionSession::new(&DecompressOptions::new()).unwrap();
    let error = session.decompress(&input).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Decompression);
}

/// Skippable probing never errors on ordinary data
#[test]
fn test_skippable_probe_on_ordinary_data() {
    assert!(read_skippable_record(b"plain bytes").unwrap().is_none());
    let record = write_skippable_record(&[], MagicVariant::default()).unwrap();
    assert_eq!(read_skippable_record(&record).unwrap(), Some(&[][..]));
}

/// Errors convert into `std::io::Error` for the adapters
#[test]
fn test_codec_errors_surface_as_invalid_data() {
    let error = decompress(b"nope", &DecompressOptions::new()).unwrap_err();
    let io_error: std::io::Error = error.into();
    assert_eq!(io_error.kind(), std::io::ErrorKind::InvalidData);
}
