//! Result type alias for zsession operations

use crate::Error;

/// Result type alias for zsession operations
pub type Result<T> = std::result::Result<T, Error>;
