use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::field::Field;

/// Message header: a single word carrying the command or event id.
pub const HEADER_SIZE: usize = 4;

/// Id bits of the header word.
pub const HDR_ID: Field = Field::new(0x00FF_FFFF, 0);
/// Platform-private bits of the header word.
pub const HDR_PLT_PRIV: Field = Field::new(0xFF00_0000, 24);

/// Largest id the header can carry.
pub const MAX_MESSAGE_ID: u32 = HDR_ID.max_value();

/// A command or event with its header split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Command or event id.
    pub id: u32,
    /// Platform-private byte, zero for host-originated commands.
    pub plt_priv: u8,
    /// The record bytes following the header.
    pub payload: Bytes,
}

impl Message {
    pub fn new(id: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            plt_priv: 0,
            payload: payload.into(),
        }
    }

    /// Total wire size (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Prefix `payload` with the header for `id`.
///
/// Wire format:
/// ```text
/// ┌───────────────────────────┬────────────────────────────┐
/// │ Header (4B LE)            │ Record                     │
/// │ bits 0-23: id             │ whole 4-byte fields        │
/// │ bits 24-31: plt_priv      │                            │
/// └───────────────────────────┴────────────────────────────┘
/// ```
/// Length and integrity checks belong to the transport underneath.
pub fn encode_message(id: u32, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if id > MAX_MESSAGE_ID {
        return Err(WireError::InvalidValue {
            field: "message id",
            value: id,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(HDR_ID.put(id));
    dst.put_slice(payload);
    Ok(())
}

/// Split the header off a complete message.
pub fn decode_message(mut src: Bytes) -> Result<Message> {
    if src.len() < HEADER_SIZE {
        return Err(WireError::Truncated {
            record: "message header",
            need: HEADER_SIZE,
            have: src.len(),
        });
    }
    let word = src.get_u32_le();
    Ok(Message {
        id: HDR_ID.get(word),
        plt_priv: HDR_PLT_PRIV.get(word) as u8,
        payload: src,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        encode_message(0x3001, &[1, 2, 3, 4], &mut buf).unwrap();
        assert_eq!(&buf[..4], &[0x01, 0x30, 0x00, 0x00]);

        let msg = decode_message(buf.freeze()).unwrap();
        assert_eq!(msg.id, 0x3001);
        assert_eq!(msg.plt_priv, 0);
        assert_eq!(msg.payload.as_ref(), &[1, 2, 3, 4]);
        assert_eq!(msg.wire_size(), 8);
    }

    #[test]
    fn test_decode_masks_platform_bits() {
        let raw = Bytes::from_static(&[0x00, 0x90, 0x00, 0xAB]);
        let msg = decode_message(raw).unwrap();
        assert_eq!(msg.id, 0x9000);
        assert_eq!(msg.plt_priv, 0xAB);
        assert!(msg.payload.is_empty());
    }

    #[test]
    fn test_decode_short_header() {
        let result = decode_message(Bytes::from_static(&[0x01, 0x00]));
        assert!(matches!(result, Err(WireError::Truncated { need: 4, have: 2, .. })));
    }

    #[test]
    fn test_encode_rejects_wide_id() {
        let mut buf = BytesMut::new();
        let result = encode_message(0x0100_0000, &[], &mut buf);
        assert!(matches!(result, Err(WireError::InvalidValue { .. })));
        assert!(buf.is_empty());
    }
}
