//! Shared fixtures for the unit tests

use zstd::zstd_safe;

/// Train a small dictionary whose ID depends on `seed`
pub(crate) fn trained_dictionary(seed: &str) -> Vec<u8> {
    let samples: Vec<Vec<u8>> = (0..2000)
        .map(|i| record(seed, i).into_bytes())
        .collect();
    zstd::dict::from_samples(&samples, 4096).unwrap()
}

/// One JSON-ish record resembling the training samples
pub(crate) fn record(seed: &str, i: usize) -> String {
    format!(
        "{{\"seed\":\"{seed}\",\"id\":{i},\"name\":\"user-{}\",\"tags\":[\"{seed}-a\",\"{seed}-b\"],\"active\":{}}}",
        i % 97,
        i % 2 == 0
    )
}

/// Compressible text of roughly `len` bytes
pub(crate) fn text(len: usize) -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Deterministic pseudo-random bytes
pub(crate) fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// A frame produced by the codec's own stream encoder (no declared size)
pub(crate) fn unsized_frame(data: &[u8]) -> Vec<u8> {
    let mut encoder = zstd::stream::Encoder::new(Vec::new(), 3).unwrap();
    std::io::Write::write_all(&mut encoder, data).unwrap();
    encoder.finish().unwrap()
}

/// Maximum compression level supported by the linked codec
pub(crate) fn max_level() -> i32 {
    zstd_safe::max_c_level()
}
