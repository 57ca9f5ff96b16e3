//! Seed sources for the OAEP padding.

use rand::rngs::OsRng;
use rand::RngCore;

/// Length of an OAEP seed in bytes (one SHA-1 digest).
pub const SEED_LENGTH: usize = 20;

/// Fixed seed used by the service's reference client in debug builds.
///
/// Encrypting with this seed makes the ciphertext reproducible, which is the
/// only way to compare output against captured traffic.
pub const DEBUG_SEED: [u8; SEED_LENGTH] = [
    90, 64, 187, 211, 235, 2, 14, 254, 104, 220, 29, 151, 185, 105, 121, 211, 98, 253, 44, 232,
];

/// Where the encoder takes its 20-byte seed from.
///
/// Production code uses [`SeedSource::Secure`]. [`SeedSource::Fixed`] exists
/// for test vectors and interop debugging and must never be configured in a
/// deployed client.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedSource {
    /// Operating system CSPRNG.
    #[default]
    Secure,
    /// A caller-supplied constant seed.
    Fixed([u8; SEED_LENGTH]),
}

impl SeedSource {
    /// The fixed seed of the reference client.
    pub fn debug() -> Self {
        Self::Fixed(DEBUG_SEED)
    }

    /// Produce the next seed.
    pub fn next_seed(&self) -> [u8; SEED_LENGTH] {
        match self {
            Self::Secure => {
                let mut seed = [0u8; SEED_LENGTH];
                OsRng.fill_bytes(&mut seed);
                seed
            }
            Self::Fixed(seed) => *seed,
        }
    }

    /// Whether this source yields the same seed on every call.
    pub fn is_deterministic(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }
}

impl std::fmt::Debug for SeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secure => f.write_str("Secure"),
            Self::Fixed(_) => f.debug_tuple("Fixed").field(&"[REDACTED]").finish(),
        }
    }
}
