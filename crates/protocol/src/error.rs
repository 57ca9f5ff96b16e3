//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering all possible failure modes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    // Key material errors
    /// The public key blob is too short or structurally invalid.
    #[error("malformed key blob: {0}")]
    MalformedKey(String),

    // Cryptographic errors
    /// Invalid cryptographic input, such as a zero modulus.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The ciphertext does not fit the expected width.
    ///
    /// This indicates a modulus that is wider than the configured key length.
    /// The ciphertext is never truncated to make it fit.
    #[error("ciphertext is {len} bytes, expected at most {expected} bytes")]
    CryptoInvariant {
        /// Actual serialized length.
        len: usize,
        /// Configured key length.
        expected: usize,
    },

    // Payload errors
    /// A field cannot be represented in the wire encoding.
    #[error("cannot encode field `{field}`: {reason}")]
    Encoding {
        /// Name of the offending field.
        field: &'static str,
        /// Why the field was rejected.
        reason: String,
    },

    // Frame errors
    /// Frame exceeds maximum allowed size.
    #[error("frame too large: {size} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge {
        /// Declared frame size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    // Serialization errors
    /// Failed to serialize data.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Failed to deserialize data.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_eof() || err.is_syntax() {
            ProtocolError::Deserialization(err.to_string())
        } else {
            ProtocolError::Serialization(err.to_string())
        }
    }
}
