//! Legacy OAEP-style RSA encryption.
//!
//! The service decrypts a padded block laid out as
//!
//! ```text
//! EM = 0x00 || maskedSeed (20) || maskedDB (key_len - 21)
//! DB = SHA-1(label) || 0x00.. || 0x01 || 0x00
//! ```
//!
//! which is close to RFC 8017 OAEP with an empty message, except that the
//! `0x01` separator sits at `db_len - 2 - label.len()` instead of directly
//! before the message. The output has to match that layout byte for byte,
//! so this module does not use a general-purpose RSA implementation.
//!
//! Only empty messages are supported. Encrypting a real message would need
//! the standard layout with the separator immediately before `M`.

use num_bigint::BigUint;
use num_traits::Zero;
use sha1::{Digest, Sha1};

use crate::error::{ProtocolError, Result};
use crate::key::PublicKey;
use crate::seed::{SeedSource, SEED_LENGTH};

/// SHA-1 digest length in bytes.
pub const HASH_LENGTH: usize = 20;

/// Key length used by the service (1024-bit RSA).
pub const LEGACY_KEY_LENGTH: usize = 128;

/// Sizes of the padded block, derived from the key length and the hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OaepParameters {
    key_len: usize,
    hash_len: usize,
}

impl OaepParameters {
    /// Parameters for a key of `key_len` bytes with SHA-1.
    ///
    /// The data block must have room for the label hash and the separator.
    pub fn new(key_len: usize) -> Result<Self> {
        let min = 2 * HASH_LENGTH + 3;
        if key_len < min {
            return Err(ProtocolError::Crypto(format!(
                "key length {} is too small, need at least {} bytes",
                key_len, min
            )));
        }
        Ok(Self {
            key_len,
            hash_len: HASH_LENGTH,
        })
    }

    /// The parameters the service expects: 128-byte key, SHA-1.
    pub const fn legacy() -> Self {
        Self {
            key_len: LEGACY_KEY_LENGTH,
            hash_len: HASH_LENGTH,
        }
    }

    /// Length of the padded block and of the ciphertext.
    pub fn key_len(&self) -> usize {
        self.key_len
    }

    /// Digest length of the hash function.
    pub fn hash_len(&self) -> usize {
        self.hash_len
    }

    /// Length of the data block: `key_len - hash_len - 1`.
    pub fn db_len(&self) -> usize {
        self.key_len - self.hash_len - 1
    }
}

impl Default for OaepParameters {
    fn default() -> Self {
        Self::legacy()
    }
}

/// MGF1 mask generation with SHA-1.
///
/// Concatenates `SHA-1(seed || counter)` for a big-endian 32-bit counter
/// starting at zero, truncated to `mask_len` bytes.
pub fn mgf1(seed: &[u8], mask_len: usize) -> Vec<u8> {
    let mut mask = Vec::with_capacity(mask_len + HASH_LENGTH);
    let mut counter: u32 = 0;

    while mask.len() < mask_len {
        let mut hasher = Sha1::new();
        hasher.update(seed);
        hasher.update(counter.to_be_bytes());
        mask.extend_from_slice(&hasher.finalize());
        counter = counter.wrapping_add(1);
    }

    mask.truncate(mask_len);
    mask
}

/// Compute `base^exponent mod modulus`.
///
/// Fails if the modulus is zero.
pub fn modpow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(ProtocolError::Crypto("modulus must be non-zero".to_string()));
    }
    Ok(base.modpow(exponent, modulus))
}

fn xor_in_place(target: &mut [u8], mask: &[u8]) {
    for (t, m) in target.iter_mut().zip(mask) {
        *t ^= m;
    }
}

/// Encoder producing the padded block and its RSA encryption.
#[derive(Debug, Clone, Default)]
pub struct OaepEncoder {
    params: OaepParameters,
    seed_source: SeedSource,
}

impl OaepEncoder {
    /// Create an encoder with the legacy parameters and a secure seed source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with explicit parameters and seed source.
    pub fn with_options(params: OaepParameters, seed_source: SeedSource) -> Self {
        Self {
            params,
            seed_source,
        }
    }

    /// Returns the parameters of this encoder.
    pub fn params(&self) -> &OaepParameters {
        &self.params
    }

    /// Returns the seed source of this encoder.
    pub fn seed_source(&self) -> &SeedSource {
        &self.seed_source
    }

    /// Build the padded block `EM` for `label` with the given seed.
    pub fn pad(&self, label: &str, seed: [u8; SEED_LENGTH]) -> Result<Vec<u8>> {
        let h = self.params.hash_len();
        let db_len = self.params.db_len();

        let separator = db_len
            .checked_sub(2 + label.len())
            .filter(|&index| index >= h)
            .ok_or_else(|| {
                ProtocolError::Crypto(format!(
                    "label of {} bytes does not fit a {}-byte data block",
                    label.len(),
                    db_len
                ))
            })?;

        let mut db = vec![0u8; db_len];
        db[..h].copy_from_slice(&Sha1::digest(label.as_bytes()));
        db[separator] = 0x01;

        let db_mask = mgf1(&seed, db_len);
        xor_in_place(&mut db, &db_mask);

        let mut masked_seed = seed;
        let seed_mask = mgf1(&db, h);
        xor_in_place(&mut masked_seed, &seed_mask);

        let mut em = vec![0u8; self.params.key_len()];
        em[1..1 + h].copy_from_slice(&masked_seed);
        em[1 + h..].copy_from_slice(&db);
        Ok(em)
    }

    /// Pad with a fresh seed and encrypt under `key`.
    ///
    /// The ciphertext is left-padded with zeros to exactly `key_len` bytes.
    pub fn encode(&self, label: &str, key: &PublicKey) -> Result<Vec<u8>> {
        let key_len = self.params.key_len();
        let em = self.pad(label, self.seed_source.next_seed())?;

        let m = BigUint::from_bytes_be(&em);
        let c = modpow(&m, &BigUint::from(key.exponent), &key.modulus)?;

        let bytes = c.to_bytes_be();
        if bytes.len() > key_len {
            return Err(ProtocolError::CryptoInvariant {
                len: bytes.len(),
                expected: key_len,
            });
        }

        let mut ciphertext = vec![0u8; key_len];
        ciphertext[key_len - bytes.len()..].copy_from_slice(&bytes);

        tracing::trace!(
            key_len,
            deterministic = self.seed_source.is_deterministic(),
            "encrypted padded block"
        );
        Ok(ciphertext)
    }

    /// Recover the unmasked seed from a decrypted block.
    ///
    /// The block is `0x00 || maskedSeed || maskedDB`; the leading byte is not checked.
    pub fn recover_seed(&self, decrypted_block: &[u8]) -> Result<[u8; SEED_LENGTH]> {
        let h = self.params.hash_len();
        if decrypted_block.len() < 1 + h {
            return Err(ProtocolError::Crypto(format!(
                "decrypted block is {} bytes, need at least {}",
                decrypted_block.len(),
                1 + h
            )));
        }

        let mut seed = [0u8; SEED_LENGTH];
        seed.copy_from_slice(&decrypted_block[1..1 + h]);
        let seed_mask = mgf1(&decrypted_block[1 + h..], h);
        xor_in_place(&mut seed, &seed_mask);
        Ok(seed)
    }
}
