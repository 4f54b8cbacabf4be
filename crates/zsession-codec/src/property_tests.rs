//! Property-based tests for zsession-codec

use crate::oneshot::{compress, decompress, CompressionContext};
use crate::options::{CompressOptions, DecompressOptions};
use crate::skippable::{read_skippable_record, write_skippable_record};
use crate::streaming::{CompressionSession, DecompressionSession};
use crate::test_support::max_level;
use proptest::prelude::*;
use zsession_types::MagicVariant;

/// Generate various data patterns for testing
fn data_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(vec![]),
        prop::collection::vec(any::<u8>(), 1..=4096),
        (any::<u8>(), 1usize..=64 * 1024).prop_map(|(byte, size)| vec![byte; size]),
        prop::collection::vec(32u8..=126, 1..=32 * 1024),
    ]
}

/// Generate compression levels, including fast negative ones
fn level_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![Just(0), -5i32..=-1, 1i32..=9, Just(max_level())]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_one_shot_round_trip(data in data_strategy(), level in level_strategy()) {
        let options = CompressOptions::with_level(level).unwrap();
        let compressed = compress(&data, &options).unwrap();
        let restored = decompress(&compressed, &DecompressOptions::new()).unwrap();
        prop_assert_eq!(restored, data);
    }

    #[test]
    fn test_any_chunking_round_trips(
        data in data_strategy(),
        cuts in prop::collection::vec(1usize..5000, 0..12),
    ) {
        let mut session = CompressionSession::new(&CompressOptions::new()).unwrap();
        let mut compressed = Vec::new();
        let mut rest = data.as_slice();
        for cut in cuts {
            let (head, tail) = rest.split_at(cut.min(rest.len()));
            compressed.extend(session.compress(head).unwrap());
            rest = tail;
        }
        compressed.extend(session.compress(rest).unwrap());
        compressed.extend(session.finish().unwrap());

        let streamed = decompress(&compressed, &DecompressOptions::new()).unwrap();
        let one_shot = decompress(
            &compress(&data, &CompressOptions::new()).unwrap(),
            &DecompressOptions::new(),
        )
        .unwrap();
        prop_assert_eq!(&streamed, &data);
        prop_assert_eq!(streamed, one_shot);
    }

    #[test]
    fn test_decompression_chunking_is_irrelevant(data in data_strategy(), piece in 1usize..2048) {
        let compressed = compress(&data, &CompressOptions::new()).unwrap();
        let mut session = DecompressionSession::new(&DecompressOptions::new()).unwrap();
        let mut restored = Vec::new();
        for chunk in compressed.chunks(piece) {
            restored.extend(session.decompress(chunk).unwrap());
        }
        prop_assert_eq!(restored, data);
    }

    #[test]
    fn test_reused_context_is_stateless(
        first in data_strategy(),
        second in data_strategy(),
        level in level_strategy(),
    ) {
        let options = CompressOptions::with_level(level).unwrap();
        let mut context = CompressionContext::new(&options).unwrap();
        let reused_first = context.compress(&first).unwrap();
        let reused_second = context.compress(&second).unwrap();
        prop_assert_eq!(reused_first, compress(&first, &options).unwrap());
        prop_assert_eq!(reused_second, compress(&second, &options).unwrap());
    }

    #[test]
    fn test_skippable_round_trip(payload in prop::collection::vec(any::<u8>(), 0..512), variant in 0u8..=15) {
        let record = write_skippable_record(&payload, MagicVariant::new(variant).unwrap()).unwrap();
        prop_assert_eq!(read_skippable_record(&record).unwrap(), Some(payload.as_slice()));
    }

    #[test]
    fn test_arbitrary_input_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decompress(&data, &DecompressOptions::new());
        let _ = read_skippable_record(&data);
        let mut session = DecompressionSession::new(&DecompressOptions::new()).unwrap();
        let _ = session.decompress(&data);
    }
}
