//! Error types for sandcrate

use thiserror::Error;

/// Main error type for sandcrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Sensor error: {0}")]
    Sensor(String),

    #[error("Topology mismatch: cached {expected:?} grid, got {actual:?}")]
    TopologyMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for sandcrate operations
pub type Result<T> = std::result::Result<T, Error>;
