//! TLV message framing.
//!
//! # Frame Format
//!
//! Each frame consists of:
//! - 2 bytes: message type (little-endian)
//! - 4 bytes: size of everything after the header (little-endian)
//! - 8 bytes, build messages only: raw data length (LE32) and the marker `8` (LE32)
//! - N bytes: data
//!
//! # Partial frames
//!
//! [`decode`] works on one snapshot buffer. A frame whose declared size runs
//! past the end of the buffer is returned as a partial frame holding every
//! remaining byte, header included. Zero bytes shorter than a header that
//! trail the last complete frame are alignment padding and are dropped.
//!
//! [`Reassembler`] is the streaming counterpart: it keeps incomplete frames
//! buffered until the rest of their bytes arrive.

use bytes::{Buf, BytesMut};

use crate::error::{ProtocolError, Result};

/// Frame header size: 2 (type) + 4 (size) = 6 bytes.
pub const FRAME_HEADER_SIZE: usize = 6;

/// Size of the sub-header carried by build messages.
pub const BUILD_HEADER_SIZE: usize = 8;

/// Constant the service expects in the second half of the build sub-header.
pub const BUILD_MARKER: u32 = 8;

/// Default limit on a single frame in the reassembler (16 MB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type.
    pub frame_type: u16,
    /// Size declared in the header.
    pub declared_size: u32,
    /// Frame data. For partial frames this is every remaining byte, header included.
    pub payload: Vec<u8>,
    /// Whether the buffer ended before the declared size was reached.
    pub partial: bool,
}

impl Frame {
    /// Create a complete frame carrying `payload`.
    pub fn new(frame_type: u16, payload: Vec<u8>) -> Self {
        Self {
            frame_type,
            declared_size: payload.len() as u32,
            payload,
            partial: false,
        }
    }

    /// Returns the data of a build message with its sub-header stripped.
    ///
    /// Returns `None` if the payload does not start with a consistent sub-header.
    pub fn build_body(&self) -> Option<&[u8]> {
        if self.partial || self.payload.len() < BUILD_HEADER_SIZE {
            return None;
        }
        let raw_len = read_u32_le(&self.payload[0..4]) as usize;
        let marker = read_u32_le(&self.payload[4..8]);
        let body = &self.payload[BUILD_HEADER_SIZE..];
        (marker == BUILD_MARKER && raw_len == body.len()).then_some(body)
    }
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_header(bytes: &[u8]) -> (u16, u32) {
    let frame_type = u16::from_le_bytes([bytes[0], bytes[1]]);
    (frame_type, read_u32_le(&bytes[2..6]))
}

/// Body length for a declared size, or `None` if the size is negative as a signed 32-bit value.
fn body_len(declared_size: u32) -> Option<usize> {
    i32::try_from(declared_size).ok().map(|size| size as usize)
}

fn is_padding(rest: &[u8]) -> bool {
    !rest.is_empty() && rest.len() < FRAME_HEADER_SIZE && rest.iter().all(|&b| b == 0)
}

/// Encode one frame.
///
/// Build messages carry the 8-byte sub-header between the header and the data,
/// and the declared size covers it.
pub fn encode(frame_type: u16, data: &[u8], is_build_message: bool) -> Vec<u8> {
    let extra = if is_build_message { BUILD_HEADER_SIZE } else { 0 };
    let size = extra + data.len();

    let mut output = Vec::with_capacity(FRAME_HEADER_SIZE + size);
    output.extend_from_slice(&frame_type.to_le_bytes());
    output.extend_from_slice(&(size as u32).to_le_bytes());

    if is_build_message {
        output.extend_from_slice(&(data.len() as u32).to_le_bytes());
        output.extend_from_slice(&BUILD_MARKER.to_le_bytes());
    }

    output.extend_from_slice(data);
    output
}

/// Decode every frame in a snapshot buffer.
///
/// Never fails: a truncated trailing frame comes back with `partial` set.
pub fn decode(buffer: &[u8]) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut offset = 0;

    while buffer.len() - offset >= FRAME_HEADER_SIZE {
        let (frame_type, declared_size) = read_header(&buffer[offset..]);
        let available = buffer.len() - offset - FRAME_HEADER_SIZE;

        let len = match body_len(declared_size) {
            Some(len) if len <= available => len,
            _ => {
                tracing::debug!(
                    frame_type,
                    declared_size,
                    available,
                    "buffer ends inside frame, returning partial frame"
                );
                frames.push(Frame {
                    frame_type,
                    declared_size,
                    payload: buffer[offset..].to_vec(),
                    partial: true,
                });
                break;
            }
        };

        let start = offset + FRAME_HEADER_SIZE;
        frames.push(Frame {
            frame_type,
            declared_size,
            payload: buffer[start..start + len].to_vec(),
            partial: false,
        });
        offset = start + len;

        if is_padding(&buffer[offset..]) {
            tracing::trace!(len = buffer.len() - offset, "dropping trailing padding");
            break;
        }
    }

    frames
}

/// Frame encoder and snapshot decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec {
    /// Whether encoded frames carry the build sub-header.
    build_message: bool,
}

impl FrameCodec {
    /// Create a codec producing plain frames.
    pub fn new() -> Self {
        Self {
            build_message: false,
        }
    }

    /// Create a codec producing build messages.
    pub fn build_messages() -> Self {
        Self {
            build_message: true,
        }
    }

    /// Whether this codec produces build messages.
    pub fn is_build_message(&self) -> bool {
        self.build_message
    }

    /// Encode one frame.
    pub fn encode(&self, frame_type: u16, data: &[u8]) -> Vec<u8> {
        encode(frame_type, data, self.build_message)
    }

    /// Decode every frame in a snapshot buffer.
    pub fn decode(&self, buffer: &[u8]) -> Vec<Frame> {
        decode(buffer)
    }
}

/// Stateful frame decoder for a live byte stream.
///
/// Bytes of an incomplete frame are kept until a later [`push`](Self::push)
/// completes it, so frames split across reads are never emitted as partial.
/// An all-zero tail may be the start of a header, so it is only treated as
/// padding once the stream ends in [`finish`](Self::finish).
#[derive(Debug)]
pub struct Reassembler {
    buffer: BytesMut,
    max_frame_size: usize,
    discard_padding: bool,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reassembler {
    /// Create a reassembler with the default frame size limit.
    pub fn new() -> Self {
        Self::with_max_frame_size(MAX_FRAME_SIZE)
    }

    /// Create a reassembler rejecting frames larger than `max_frame_size`.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_frame_size,
            discard_padding: true,
        }
    }

    /// Report a short all-zero tail from [`finish`](Self::finish) as a
    /// partial frame instead of dropping it as padding.
    pub fn keep_padding(mut self) -> Self {
        self.discard_padding = false;
        self
    }

    /// Number of buffered bytes not yet part of an emitted frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Feed received bytes and return every frame they complete.
    ///
    /// A declared size above the limit fails with [`ProtocolError::FrameTooLarge`]
    /// and discards the buffered bytes, since the stream cannot be resynchronized.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);
        let mut frames = Vec::new();

        while self.buffer.len() >= FRAME_HEADER_SIZE {
            let (frame_type, declared_size) = read_header(&self.buffer);

            let len = match body_len(declared_size) {
                Some(len) if len <= self.max_frame_size => len,
                _ => {
                    self.buffer.clear();
                    return Err(ProtocolError::FrameTooLarge {
                        size: declared_size as usize,
                        max: self.max_frame_size,
                    });
                }
            };

            if self.buffer.len() < FRAME_HEADER_SIZE + len {
                tracing::trace!(
                    frame_type,
                    need = FRAME_HEADER_SIZE + len,
                    have = self.buffer.len(),
                    "waiting for rest of frame"
                );
                break;
            }

            self.buffer.advance(FRAME_HEADER_SIZE);
            let payload = self.buffer.split_to(len).to_vec();
            frames.push(Frame {
                frame_type,
                declared_size,
                payload,
                partial: false,
            });
        }

        Ok(frames)
    }

    /// Finish the stream, returning leftover bytes as a partial frame.
    ///
    /// Leftovers shorter than a header carry frame type 0. A short all-zero
    /// tail is padding and yields nothing unless [`keep_padding`](Self::keep_padding)
    /// was set.
    pub fn finish(self) -> Option<Frame> {
        if self.buffer.is_empty() || (self.discard_padding && is_padding(&self.buffer)) {
            return None;
        }
        let (frame_type, declared_size) = if self.buffer.len() >= FRAME_HEADER_SIZE {
            read_header(&self.buffer)
        } else {
            (0, 0)
        };
        Some(Frame {
            frame_type,
            declared_size,
            payload: self.buffer.to_vec(),
            partial: true,
        })
    }
}
