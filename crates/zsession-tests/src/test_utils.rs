//! Shared test data generators

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test data generation patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestDataPattern {
    /// All zeros - highly compressible
    Zeros,
    /// Deterministic pseudo-random bytes - incompressible
    Random,
    /// Alternating runs of zeros and noise
    Mixed,
    /// Repeated English-like text
    Text,
    /// Small JSON records sharing one schema, the dictionary use case
    Records,
}

impl TestDataPattern {
    /// Every pattern
    pub fn all() -> [Self; 5] {
        [Self::Zeros, Self::Random, Self::Mixed, Self::Text, Self::Records]
    }
}

/// Generate `size` bytes of data following `pattern`
///
/// The output is deterministic so benchmark runs stay comparable.
pub fn generate_test_data(size: usize, pattern: TestDataPattern) -> Vec<u8> {
    match pattern {
        TestDataPattern::Zeros => vec![0u8; size],
        TestDataPattern::Random => noise(size, 0x9E37_79B9_7F4A_7C15),
        TestDataPattern::Mixed => {
            let noisy = noise(size, 0x2545_F491_4F6C_DD1D);
            (0..size)
                .map(|i| if i % 1000 < 300 { 0 } else { noisy[i] })
                .collect()
        }
        TestDataPattern::Text => {
            const WORDS: &[&str] = &[
                "session", "frame", "dictionary", "stream", "chunk", "level", "codec",
                "record", "buffer", "context",
            ];
            let mut text = String::with_capacity(size + 16);
            let mut i = 0usize;
            while text.len() < size {
                text.push_str(WORDS[(i * 7 + i / 3) % WORDS.len()]);
                text.push(if i % 11 == 10 { '\n' } else { ' ' });
                i += 1;
            }
            text.truncate(size);
            text.into_bytes()
        }
        TestDataPattern::Records => {
            let mut data = Vec::with_capacity(size + 128);
            let mut i = 0;
            while data.len() < size {
                data.extend_from_slice(json_records("bench", i, 1).concat().as_slice());
                i += 1;
            }
            data.truncate(size);
            data
        }
    }
}

/// `count` JSON records starting at index `start`, all sharing one schema
pub fn json_records(tag: &str, start: usize, count: usize) -> Vec<Vec<u8>> {
    (start..start + count)
        .map(|i| {
            format!(
                "{{\"id\":{},\"source\":\"{}\",\"user\":\"user-{}\",\"status\":\"{}\",\"latency_ms\":{},\"tags\":[\"{}\",\"zone-{}\"]}}\n",
                i,
                tag,
                i % 97,
                if i % 5 == 0 { "error" } else { "ok" },
                (i * 37) % 1000,
                tag,
                i % 7
            )
            .into_bytes()
        })
        .collect()
}

/// Train a dictionary on records tagged with `tag`
///
/// Different tags produce dictionaries with different IDs.
pub fn train_dictionary(tag: &str) -> Vec<u8> {
    let samples = json_records(tag, 0, 2000);
    zstd::dict::from_samples(&samples, 4096).expect("dictionary training failed")
}

/// Create a file in `temp_dir` holding `size` bytes of `pattern`
pub fn create_test_file(
    temp_dir: &TempDir,
    name: &str,
    size: usize,
    pattern: TestDataPattern,
) -> PathBuf {
    let file_path = temp_dir.path().join(name);
    fs::write(&file_path, generate_test_data(size, pattern)).expect("Failed to write test file");
    file_path
}

/// Common input sizes
pub struct CommonSizes;

impl CommonSizes {
    /// 1KB
    pub const TINY: usize = 1024;
    /// 64KB
    pub const MEDIUM: usize = 64 * 1024;
    /// 1MB
    pub const LARGE: usize = 1024 * 1024;
    /// 4MB
    pub const XLARGE: usize = 4 * 1024 * 1024;

    /// Sizes used by the benchmarks
    pub fn benchmark() -> Vec<(&'static str, usize)> {
        vec![
            ("1KB", Self::TINY),
            ("64KB", Self::MEDIUM),
            ("1MB", Self::LARGE),
        ]
    }
}

fn noise(size: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_test_data_patterns() {
        for pattern in TestDataPattern::all() {
            let data = generate_test_data(4096, pattern);
            assert_eq!(data.len(), 4096, "{:?}", pattern);
        }
        assert!(generate_test_data(64, TestDataPattern::Zeros).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_data_is_deterministic() {
        assert_eq!(
            generate_test_data(1000, TestDataPattern::Random),
            generate_test_data(1000, TestDataPattern::Random)
        );
    }

    #[test]
    fn test_create_test_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_test_file(&temp_dir, "test.dat", 1024, TestDataPattern::Text);

        assert!(file_path.exists());
        assert_eq!(fs::metadata(&file_path).unwrap().len(), 1024);
    }
}
