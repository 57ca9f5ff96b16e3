//! Command implementations.
//!
//! Each command reads its inputs, runs the protocol crate and returns the
//! text to print, so the binary stays a thin argument parser.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::ValueEnum;
use clink_protocol::framing::{self, Frame, Reassembler};
use clink_protocol::{ConnectInfo, ConnectMessage, CredentialEncryptor, SeedSource};

use crate::config::Config;

/// Encoding of a key blob file.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlobFormat {
    /// Raw bytes
    #[default]
    Raw,
    /// Hex text
    Hex,
    /// Standard base64 text
    Base64,
}

/// Optional framing applied to command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    /// Frame type to wrap the output in.
    pub frame_type: u16,
    /// Add the build sub-header.
    pub build_message: bool,
}

fn maybe_frame(data: Vec<u8>, frame: Option<FrameOptions>) -> Vec<u8> {
    match frame {
        Some(opts) => framing::encode(opts.frame_type, &data, opts.build_message),
        None => data,
    }
}

/// Decode hex text, ignoring whitespace.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).context("Invalid hex input")
}

/// Read a key blob in the given format.
pub fn read_key_blob(path: &Path, format: BlobFormat) -> Result<Vec<u8>> {
    let raw = fs::read(path)
        .with_context(|| format!("Failed to read key blob: {}", path.display()))?;

    match format {
        BlobFormat::Raw => Ok(raw),
        BlobFormat::Hex => parse_hex(&String::from_utf8_lossy(&raw)),
        BlobFormat::Base64 => STANDARD
            .decode(String::from_utf8_lossy(&raw).trim())
            .context("Invalid base64 key blob"),
    }
}

/// Read a connection record from a JSON file.
pub fn read_connect_info(path: &Path) -> Result<ConnectInfo> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read connection info: {}", path.display()))?;
    ConnectInfo::from_json(&json)
        .with_context(|| format!("Failed to parse connection info: {}", path.display()))
}

/// Encrypt a credential for `blob` and return it as hex.
pub fn credential(
    blob: &[u8],
    auth_mechanism: u32,
    fixed_seed: bool,
    frame: Option<FrameOptions>,
) -> Result<String> {
    let seed_source = if fixed_seed {
        tracing::warn!("Using the fixed debug seed; never send this output to a real gateway");
        SeedSource::debug()
    } else {
        SeedSource::Secure
    };

    let envelope = CredentialEncryptor::new()
        .with_auth_mechanism(auth_mechanism)
        .with_seed_source(seed_source)
        .encrypt(blob)
        .context("Failed to encrypt credential")?;

    tracing::info!(len = envelope.len(), "Encrypted credential");
    Ok(hex::encode(maybe_frame(envelope, frame)))
}

/// Encode the connection request payload and return it as hex.
pub fn connect_payload(
    info: &ConnectInfo,
    device_code: &str,
    frame: Option<FrameOptions>,
) -> Result<String> {
    let body = info
        .desktop_info
        .to_payload(device_code)
        .context("Failed to encode connection payload")?;

    tracing::info!(
        desktop_id = info.desktop_info.desktop_id,
        len = body.len(),
        "Encoded connection payload"
    );
    Ok(hex::encode(maybe_frame(body, frame)))
}

/// Build the proxy connect message as JSON.
pub fn connect_message(info: &ConnectInfo, servername: Option<&str>) -> Result<String> {
    let message = ConnectMessage::for_desktop(&info.desktop_info, servername);
    message.to_json().context("Failed to serialize connect message")
}

fn render_frame(out: &mut String, index: usize, frame: &Frame) -> fmt::Result {
    write!(
        out,
        "#{} type=0x{:04x} size={} len={}",
        index,
        frame.frame_type,
        frame.declared_size,
        frame.payload.len()
    )?;
    if frame.partial {
        out.push_str(" partial");
    }
    let body = match frame.build_body() {
        Some(body) => {
            out.push_str(" build");
            body
        }
        None => &frame.payload[..],
    };
    writeln!(out, " data={}", hex::encode(body))
}

/// Render the effective configuration as TOML.
pub fn show_config(config: &Config) -> Result<String> {
    config.to_toml()
}

/// Write `config` to `path`, refusing to replace an existing file.
pub fn init_config(config: &Config, path: &Path) -> Result<String> {
    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }
    config.save(path)?;
    Ok(format!("Wrote {}", path.display()))
}

/// Decode frames from `bytes` and describe them, one line per frame.
///
/// With `stream` the bytes go through a [`Reassembler`] limited to
/// `max_frame_size`, and leftovers are reported as a trailing partial frame.
pub fn decode(bytes: &[u8], stream: bool, max_frame_size: usize) -> Result<String> {
    let frames = if stream {
        let mut reassembler = Reassembler::with_max_frame_size(max_frame_size);
        let mut frames = reassembler.push(bytes).context("Failed to decode frame stream")?;
        frames.extend(reassembler.finish());
        frames
    } else {
        framing::decode(bytes)
    };

    tracing::debug!(count = frames.len(), "Decoded frames");

    let mut out = String::new();
    for (index, frame) in frames.iter().enumerate() {
        render_frame(&mut out, index, frame).context("Failed to render frame")?;
    }
    Ok(out)
}
