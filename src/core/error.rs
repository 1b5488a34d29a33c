//! Error types for key-wrap operations.
//!
//! This module provides a unified error type for wrap and unwrap.
//! The integrity-failure message is intentionally vague: distinguishing a
//! wrong KEK from tampered ciphertext would leak information an attacker
//! can use.

use thiserror::Error;

/// Errors that can occur when wrapping or unwrapping key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyWrapError {
    /// The KEK length is not one the block-cipher engine supports.
    ///
    /// The AES engine accepts 16, 24, or 32 bytes (AES-128/192/256).
    #[error("Unsupported KEK size")]
    UnsupportedKekSize,

    /// The key data length is invalid.
    ///
    /// Wrap input must be a non-empty multiple of 8 bytes; unwrap input
    /// must be at least 16 bytes and a multiple of 8.
    #[error("Invalid key data length")]
    InvalidKeyDataLength,

    /// The integrity check failed during unwrap.
    /// Intentionally vague for security.
    #[error("Integrity check failed")]
    IntegrityCheckFailed,
}

/// Result type alias for key-wrap operations.
pub type KeyWrapResult<T> = Result<T, KeyWrapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KeyWrapError::UnsupportedKekSize;
        assert_eq!(err.to_string(), "Unsupported KEK size");

        let err = KeyWrapError::InvalidKeyDataLength;
        assert_eq!(err.to_string(), "Invalid key data length");

        let err = KeyWrapError::IntegrityCheckFailed;
        assert_eq!(err.to_string(), "Integrity check failed");
    }

    #[test]
    fn test_integrity_error_does_not_name_a_cause() {
        // Wrong KEK and corrupted ciphertext must be indistinguishable.
        let msg = KeyWrapError::IntegrityCheckFailed.to_string();
        assert!(!msg.to_lowercase().contains("key"));
        assert!(!msg.to_lowercase().contains("tamper"));
    }
}
