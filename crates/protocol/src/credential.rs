//! Encrypted credential envelope.
//!
//! The credential sent to the service is the RSA ciphertext prefixed with a
//! little-endian 32-bit authentication mechanism tag:
//!
//! ```text
//! LE32(auth_mechanism) || ciphertext (key_len bytes)
//! ```

use crate::error::Result;
use crate::key::PublicKey;
use crate::oaep::{OaepEncoder, OaepParameters};
use crate::seed::{SeedSource, SEED_LENGTH};

/// Authentication mechanism used by the reference client.
pub const DEFAULT_AUTH_MECHANISM: u32 = 1;

/// Size of the mechanism tag in bytes.
pub const AUTH_MECHANISM_SIZE: usize = 4;

/// Prefix `ciphertext` with the little-endian mechanism tag.
pub fn wrap(auth_mechanism: u32, ciphertext: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(AUTH_MECHANISM_SIZE + ciphertext.len());
    output.extend_from_slice(&auth_mechanism.to_le_bytes());
    output.extend_from_slice(ciphertext);
    output
}

/// Encrypts credentials against a service key blob.
///
/// Runs key extraction, padding, RSA encryption and wrapping in one call.
#[derive(Debug, Clone)]
pub struct CredentialEncryptor {
    auth_mechanism: u32,
    encoder: OaepEncoder,
}

impl Default for CredentialEncryptor {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialEncryptor {
    /// Create an encryptor with the default mechanism and a secure seed source.
    pub fn new() -> Self {
        Self {
            auth_mechanism: DEFAULT_AUTH_MECHANISM,
            encoder: OaepEncoder::new(),
        }
    }

    /// Set the authentication mechanism tag.
    pub fn with_auth_mechanism(mut self, auth_mechanism: u32) -> Self {
        self.auth_mechanism = auth_mechanism;
        self
    }

    /// Set the seed source used for padding.
    pub fn with_seed_source(mut self, seed_source: SeedSource) -> Self {
        self.encoder = OaepEncoder::with_options(*self.encoder.params(), seed_source);
        self
    }

    /// Set the padding parameters.
    pub fn with_params(mut self, params: OaepParameters) -> Self {
        self.encoder = OaepEncoder::with_options(params, *self.encoder.seed_source());
        self
    }

    /// Returns the authentication mechanism tag.
    pub fn auth_mechanism(&self) -> u32 {
        self.auth_mechanism
    }

    /// Returns the underlying padding encoder.
    pub fn encoder(&self) -> &OaepEncoder {
        &self.encoder
    }

    /// Encrypt a credential for the key contained in `key_blob`.
    pub fn encrypt(&self, key_blob: &[u8]) -> Result<Vec<u8>> {
        let key = PublicKey::from_blob(key_blob)?;
        self.encrypt_with_key(&key)
    }

    /// Encrypt a credential for an already extracted key.
    pub fn encrypt_with_key(&self, key: &PublicKey) -> Result<Vec<u8>> {
        let ciphertext = self.encoder.encode("", key)?;
        let envelope = wrap(self.auth_mechanism, &ciphertext);

        tracing::debug!(
            auth_mechanism = self.auth_mechanism,
            len = envelope.len(),
            "built credential envelope"
        );
        Ok(envelope)
    }

    /// Recover the seed from a block the service decrypted.
    pub fn recover_seed(&self, decrypted_block: &[u8]) -> Result<[u8; SEED_LENGTH]> {
        self.encoder.recover_seed(decrypted_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::key::{KEY_BLOB_PREFIX_LEN, MIN_KEY_BLOB_LEN, MODULUS_OFFSET};
    use crate::seed::DEBUG_SEED;

    fn identity_blob() -> Vec<u8> {
        // Modulus 0x00 || 0xFF * 128 with exponent 1
        let mut blob = vec![0u8; MIN_KEY_BLOB_LEN];
        let start = KEY_BLOB_PREFIX_LEN + MODULUS_OFFSET + 1;
        blob[start..start + 128].fill(0xFF);
        blob[MIN_KEY_BLOB_LEN - 1] = 0x01;
        blob
    }

    #[test]
    fn test_wrap_little_endian_tag() {
        let wrapped = wrap(1, &[0xAA, 0xBB]);
        assert_eq!(wrapped, vec![0x01, 0x00, 0x00, 0x00, 0xAA, 0xBB]);

        let wrapped = wrap(0x0403_0201, &[]);
        assert_eq!(wrapped, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_default_encryptor() {
        let encryptor = CredentialEncryptor::default();
        assert_eq!(encryptor.auth_mechanism(), DEFAULT_AUTH_MECHANISM);
        assert!(!encryptor.encoder().seed_source().is_deterministic());
        assert_eq!(*encryptor.encoder().params(), OaepParameters::legacy());
    }

    #[test]
    fn test_encrypt_envelope_shape() {
        let envelope = CredentialEncryptor::new()
            .with_auth_mechanism(7)
            .encrypt(&identity_blob())
            .unwrap();
        assert_eq!(envelope.len(), 132);
        assert_eq!(&envelope[..4], &[7, 0, 0, 0]);
    }

    #[test]
    fn test_encrypt_with_identity_key_exposes_padding() {
        let encryptor = CredentialEncryptor::new().with_seed_source(SeedSource::debug());
        let envelope = encryptor.encrypt(&identity_blob()).unwrap();

        let expected = encryptor.encoder().pad("", DEBUG_SEED).unwrap();
        assert_eq!(&envelope[4..], &expected[..]);
        assert_eq!(encryptor.recover_seed(&envelope[4..]).unwrap(), DEBUG_SEED);
    }

    #[test]
    fn test_builder_order_is_irrelevant() {
        let a = CredentialEncryptor::new()
            .with_seed_source(SeedSource::debug())
            .with_params(OaepParameters::legacy());
        let b = CredentialEncryptor::new()
            .with_params(OaepParameters::legacy())
            .with_seed_source(SeedSource::debug());
        assert_eq!(
            a.encrypt(&identity_blob()).unwrap(),
            b.encrypt(&identity_blob()).unwrap()
        );
    }

    #[test]
    fn test_encrypt_malformed_blob() {
        let err = CredentialEncryptor::new().encrypt(&[0u8; 100]).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedKey(_)));
    }

    #[test]
    fn test_encrypt_zero_modulus_blob() {
        let blob = vec![0u8; MIN_KEY_BLOB_LEN];
        let err = CredentialEncryptor::new().encrypt(&blob).unwrap_err();
        assert!(matches!(err, ProtocolError::Crypto(_)));
    }
}
