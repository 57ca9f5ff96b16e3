//! Connection request payload.
//!
//! ```text
//! [0..4)    desktop id (LE32)
//! [4..36)   four (length LE32, offset LE32) descriptors
//! [36..)    token\0  device type\0  device code\0  tenant account\0
//! ```
//!
//! Each `length` counts the terminating zero byte and each `offset` is
//! absolute within the buffer. Strings must be ASCII; anything else is
//! rejected rather than replaced.

use crate::error::{ProtocolError, Result};

/// Device type string sent by desktop clients.
pub const DEVICE_TYPE: &str = "60";

/// Number of variable-length fields.
pub const FIELD_COUNT: usize = 4;

/// Header size: 4 (desktop id) + 4 × (4 length + 4 offset) = 36 bytes.
pub const PAYLOAD_HEADER_SIZE: usize = 4 + FIELD_COUNT * 8;

fn check_ascii(field: &'static str, value: &str) -> Result<()> {
    match value.bytes().position(|b| !b.is_ascii()) {
        Some(index) => Err(ProtocolError::Encoding {
            field,
            reason: format!("non-ASCII character at byte {}", index),
        }),
        None => Ok(()),
    }
}

/// Encode a connection request payload.
///
/// All fields are validated before anything is written.
pub fn encode(
    desktop_id: i32,
    token: &str,
    device_code: &str,
    tenant_account: &str,
) -> Result<Vec<u8>> {
    let fields: [(&'static str, &str); FIELD_COUNT] = [
        ("token", token),
        ("device_type", DEVICE_TYPE),
        ("device_code", device_code),
        ("tenant_account", tenant_account),
    ];

    for (name, value) in fields {
        check_ascii(name, value)?;
    }

    let total = PAYLOAD_HEADER_SIZE + fields.iter().map(|(_, v)| v.len() + 1).sum::<usize>();
    if u32::try_from(total).is_err() {
        return Err(ProtocolError::Encoding {
            field: "payload",
            reason: format!("{} bytes does not fit a 32-bit offset", total),
        });
    }

    let mut buffer = Vec::with_capacity(total);
    buffer.extend_from_slice(&desktop_id.to_le_bytes());

    let mut offset = PAYLOAD_HEADER_SIZE;
    for (_, value) in fields {
        let length = value.len() + 1;
        buffer.extend_from_slice(&(length as u32).to_le_bytes());
        buffer.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += length;
    }

    for (_, value) in fields {
        buffer.extend_from_slice(value.as_bytes());
        buffer.push(0);
    }

    debug_assert_eq!(buffer.len(), total);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(buffer: &[u8], index: usize) -> (u32, u32) {
        let at = 4 + index * 8;
        let length = u32::from_le_bytes(buffer[at..at + 4].try_into().unwrap());
        let offset = u32::from_le_bytes(buffer[at + 4..at + 8].try_into().unwrap());
        (length, offset)
    }

    #[test]
    fn test_header_size() {
        assert_eq!(PAYLOAD_HEADER_SIZE, 36);
    }

    #[test]
    fn test_reference_layout() {
        let buffer = encode(5, "abc", "dev1", "acct").unwrap();
        assert_eq!(buffer.len(), 53);
        assert_eq!(&buffer[0..4], &[5, 0, 0, 0]);
        assert_eq!(descriptor(&buffer, 0), (4, 36));
        assert_eq!(descriptor(&buffer, 1), (3, 40));
        assert_eq!(descriptor(&buffer, 2), (5, 43));
        assert_eq!(descriptor(&buffer, 3), (5, 48));
        assert_eq!(&buffer[36..], b"abc\060\0dev1\0acct\0");
    }

    #[test]
    fn test_negative_desktop_id() {
        let buffer = encode(-2, "abc", "dev1", "acct").unwrap();
        assert_eq!(&buffer[0..4], &[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&buffer[36..], b"abc\060\0dev1\0acct\0");
    }

    #[test]
    fn test_offsets_point_at_fields() {
        let buffer = encode(0x1234_5678, "tok-123", "", "user@tenant").unwrap();
        assert_eq!(&buffer[0..4], &[0x78, 0x56, 0x34, 0x12]);

        let expected = ["tok-123", DEVICE_TYPE, "", "user@tenant"];
        for (index, value) in expected.iter().enumerate() {
            let (length, offset) = descriptor(&buffer, index);
            let start = offset as usize;
            let end = start + length as usize;
            assert_eq!(&buffer[start..end - 1], value.as_bytes());
            assert_eq!(buffer[end - 1], 0);
        }
        let (length, offset) = descriptor(&buffer, 3);
        assert_eq!((offset + length) as usize, buffer.len());
    }

    #[test]
    fn test_empty_fields() {
        let buffer = encode(0, "", "", "").unwrap();
        assert_eq!(buffer.len(), 36 + 1 + 3 + 1 + 1);
        assert_eq!(descriptor(&buffer, 0), (1, 36));
        assert_eq!(descriptor(&buffer, 1), (3, 37));
        assert_eq!(descriptor(&buffer, 2), (1, 40));
        assert_eq!(descriptor(&buffer, 3), (1, 41));
    }

    #[test]
    fn test_non_ascii_rejected() {
        let err = encode(1, "abc", "设备", "acct").unwrap_err();
        match err {
            ProtocolError::Encoding { field, reason } => {
                assert_eq!(field, "device_code");
                assert!(reason.contains("byte 0"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = encode(1, "abc", "dev", "accté").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Encoding {
                field: "tenant_account",
                ..
            }
        ));
    }
}
