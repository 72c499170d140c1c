//! # Error Types
//!
//! This module defines error types used throughout the bayan library.
//!
//! The variants follow the failure taxonomy of a print job:
//!
//! | Variant | Raised by | Handling |
//! |---------|-----------|----------|
//! | `DataNotFound` | invoice provider | surfaced, session unaffected |
//! | `Decode` | bitmap codec | recovered locally with a placeholder |
//! | `Connection` | transport session | surfaced with recovery guidance |
//! | `Write` | transport session | surfaced, connection kept for retry |
//! | `LayoutInvariant` | layout compiler | generation aborted |

use thiserror::Error;

/// Guidance appended to connection failures once every connector profile
/// has been tried.
pub const CONNECTION_GUIDANCE: &str = "Try: 1. turn the printer off and on, \
2. unpair and re-pair it in the Bluetooth settings, \
3. make sure it is not connected to another device";

/// Main error type for bayan operations
#[derive(Debug, Error)]
pub enum BayanError {
    /// Invoice identifier did not resolve to a record
    #[error("Invoice not found: {0}")]
    DataNotFound(String),

    /// Invoice query or record consistency failure
    #[error("Invoice data error: {0}")]
    Data(String),

    /// Malformed raster image handed to the bitmap codec
    #[error("Decode error: {0}")]
    Decode(String),

    /// All connector profiles exhausted
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Payload delivery failed on an established connection
    #[error("Write failed: {0}")]
    Write(String),

    /// Computed layout is inconsistent (negative or undersized canvas)
    #[error("Layout invariant violated: {0}")]
    LayoutInvariant(String),

    /// Invalid template, profile or command-line configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Surface rendering or image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BayanError {
    /// Build a connection error carrying the standard recovery guidance.
    pub fn connection_exhausted(device: &str, cause: &str) -> Self {
        Self::Connection(format!(
            "could not connect to {}: {}. {}",
            device, cause, CONNECTION_GUIDANCE
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_exhausted_carries_guidance() {
        let err = BayanError::connection_exhausted("ZQ520", "refused");
        let msg = err.to_string();
        assert!(msg.starts_with("Connection failed: could not connect to ZQ520"));
        assert!(msg.contains("re-pair"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BayanError = io.into();
        assert!(matches!(err, BayanError::Io(_)));
    }
}
