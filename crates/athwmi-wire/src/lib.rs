//! Fixed-width record primitives and TLV framing for the WMI control path.
//!
//! This is the lowest layer of athwmi. Every record exchanged with the
//! firmware is a sequence of little-endian 4-byte fields:
//! - Sub-word values are packed with explicit `(mask, shift)` [`Field`] pairs
//! - MAC addresses occupy two words ([`MacAddr`])
//! - Optional repeated data follows the fixed header as [`tlv`] blocks
//!
//! Decoding never trusts a length or count from the wire without checking it
//! against the buffer and a per-field maximum first.

pub mod codec;
pub mod error;
pub mod field;
pub mod mac;
pub mod reader;
pub mod tlv;
pub mod writer;

/// Every wire field is exactly this many bytes.
pub const WORD_SIZE: usize = 4;

pub use codec::{decode_message, encode_message, Message, HEADER_SIZE, MAX_MESSAGE_ID};
pub use error::{Result, WireError};
pub use field::{pack, Field};
pub use mac::MacAddr;
pub use reader::{check_count, RecordReader};
pub use tlv::{Ssid, TlvBlock, TlvParse};
pub use writer::{padded_len, RecordWriter};
