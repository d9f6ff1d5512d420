//! Result type alias for configuration operations

use crate::error::StratumError;

/// Standard Result type for configuration operations
pub type Result<T> = std::result::Result<T, StratumError>;
