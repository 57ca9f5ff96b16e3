//! # Clink Protocol Library
//!
//! Credential encryption and message framing for connecting to a cloud
//! desktop gateway.
//!
//! ## Overview
//!
//! The gateway authenticates clients with a credential encrypted under an
//! RSA key it ships as a raw blob, and exchanges messages as little-endian
//! type-length-value frames. This crate provides:
//!
//! - **Key Extraction**: modulus and exponent from the fixed-offset key blob
//! - **Legacy OAEP**: the gateway's SHA-1 OAEP variant, MGF1 and modular exponentiation
//! - **Credential Envelope**: the mechanism-tagged ciphertext
//! - **Framing**: TLV encoding, snapshot decoding and stream reassembly
//! - **Connection Payload**: the fixed-layout connection request
//!
//! ## Architecture
//!
//! ```text
//! key blob ──► PublicKey ──► OaepEncoder ──► wrap ──┐
//!                              │  mgf1, modpow      │
//!                              ▼                    ▼
//!                          SeedSource           framing::encode ──► transport
//! DesktopInfo ──► payload::encode ──────────────────┘
//!
//! transport ──► framing::decode / Reassembler ──► Frame
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use clink_protocol::{framing, payload, FrameCodec};
//!
//! let body = payload::encode(5, "abc", "dev1", "acct").unwrap();
//! let codec = FrameCodec::build_messages();
//! let bytes = codec.encode(0x0C, &body);
//!
//! let frames = framing::decode(&bytes);
//! assert_eq!(frames[0].build_body(), Some(&body[..]));
//! ```
//!
//! ## Modules
//!
//! - [`key`]: Key blob parsing
//! - [`oaep`]: Padding, MGF1 and modular exponentiation
//! - [`seed`]: Seed sources
//! - [`credential`]: Credential envelope
//! - [`framing`]: TLV frame codec and reassembler
//! - [`payload`]: Connection request payload
//! - [`connect`]: Connection parameter records
//! - [`error`]: Error types

pub mod connect;
pub mod credential;
pub mod error;
pub mod framing;
pub mod key;
pub mod oaep;
pub mod payload;
pub mod seed;

pub use connect::{ConnectInfo, ConnectMessage, DesktopInfo};
pub use credential::{wrap, CredentialEncryptor, DEFAULT_AUTH_MECHANISM};
pub use error::{ProtocolError, Result};
pub use framing::{
    Frame, FrameCodec, Reassembler, BUILD_HEADER_SIZE, BUILD_MARKER, FRAME_HEADER_SIZE,
    MAX_FRAME_SIZE,
};
pub use key::{PublicKey, MIN_KEY_BLOB_LEN};
pub use oaep::{mgf1, modpow, OaepEncoder, OaepParameters};
pub use payload::{DEVICE_TYPE, PAYLOAD_HEADER_SIZE};
pub use seed::{SeedSource, DEBUG_SEED, SEED_LENGTH};
