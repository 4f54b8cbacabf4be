//! zsession test suite
//!
//! Cross-crate integration tests and criterion benchmarks for the zsession
//! workspace, plus the shared data generators they use.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Shared test data and dictionary helpers
///
/// Used by the integration tests and the benchmarks so that both work on the
/// same inputs.
pub mod test_utils;

pub use test_utils::{
    create_test_file, generate_test_data, json_records, train_dictionary, CommonSizes,
    TestDataPattern,
};
