//! Public key extraction from the service's raw key blob.
//!
//! The blob layout is fixed and carries no version tag:
//!
//! ```text
//! [0..16)     unrelated prefix, skipped
//! [48..177)   modulus, 129 bytes big-endian
//! [177..179)  unused
//! [179..182)  public exponent, 3 bytes big-endian
//! ```
//!
//! Offsets below are relative to the view after the skipped prefix.

use num_bigint::BigUint;

use crate::error::{ProtocolError, Result};

/// Bytes skipped at the start of every key blob.
pub const KEY_BLOB_PREFIX_LEN: usize = 16;

/// Offset of the modulus in the post-prefix view.
pub const MODULUS_OFFSET: usize = 32;

/// Width of the modulus slot in bytes.
pub const MODULUS_LEN: usize = 129;

/// Offset of the public exponent in the post-prefix view.
pub const EXPONENT_OFFSET: usize = 163;

/// Width of the exponent slot in bytes.
pub const EXPONENT_LEN: usize = 3;

/// Minimum length of a key blob, prefix included.
pub const MIN_KEY_BLOB_LEN: usize = KEY_BLOB_PREFIX_LEN + EXPONENT_OFFSET + EXPONENT_LEN;

/// An RSA public key as shipped by the service.
///
/// The key is trusted as-is: no primality or bit-length checks are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    /// The RSA modulus `n`.
    pub modulus: BigUint,
    /// The public exponent `e` (at most 24 bits).
    pub exponent: u32,
}

impl PublicKey {
    /// Create a public key from its components.
    pub fn new(modulus: BigUint, exponent: u32) -> Self {
        Self { modulus, exponent }
    }

    /// Extract the modulus and exponent from a raw key blob.
    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        if blob.len() < MIN_KEY_BLOB_LEN {
            return Err(ProtocolError::MalformedKey(format!(
                "need at least {} bytes, have {}",
                MIN_KEY_BLOB_LEN,
                blob.len()
            )));
        }

        let view = &blob[KEY_BLOB_PREFIX_LEN..];

        let modulus = BigUint::from_bytes_be(&view[MODULUS_OFFSET..MODULUS_OFFSET + MODULUS_LEN]);
        let exponent = view[EXPONENT_OFFSET..EXPONENT_OFFSET + EXPONENT_LEN]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));

        tracing::debug!(
            modulus_bits = modulus.bits(),
            exponent,
            "extracted public key from blob"
        );

        Ok(Self { modulus, exponent })
    }

    /// Size of the modulus in bits.
    pub fn bits(&self) -> u64 {
        self.modulus.bits()
    }
}
