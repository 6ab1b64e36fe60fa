//! Error types for the Galaxy3D spatial index
//!
//! This module defines the error types raised when entries or
//! configurations handed to the octree are unusable.

use std::fmt;

/// Result type for Galaxy3D spatial operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D spatial index errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Bounding volume is inverted or contains NaN / infinite values
    InvalidBounds(String),

    /// Octree configuration is unusable (world size, depth)
    InvalidConfig(String),

    /// Entry key is unknown, or the entry does not have the expected kind
    InvalidEntry(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidBounds(msg) => write!(f, "Invalid bounds: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            Error::InvalidEntry(msg) => write!(f, "Invalid entry: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
