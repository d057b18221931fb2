//! Tag-length-value blocks appended after a command's fixed header.
//!
//! Each block is `{tag, length-or-count, payload}` with a one-word tag and a
//! one-word length. List blocks carry an entry count; the IE block carries
//! its unpadded byte length. Tags 1-4 are defined; anything else is skipped
//! on parse so newer firmware can append blocks older hosts do not know.

use bytes::Bytes;
use tracing::trace;

use crate::error::{Result, WireError};
use crate::mac::MacAddr;
use crate::reader::{check_count, RecordReader};
use crate::writer::{padded_len, RecordWriter};
use crate::WORD_SIZE;

/// Channel frequency list.
pub const CHAN_LIST_TAG: u32 = 0x1;
/// SSID list.
pub const SSID_LIST_TAG: u32 = 0x2;
/// BSSID list.
pub const BSSID_LIST_TAG: u32 = 0x3;
/// Raw information-element blob.
pub const IE_TAG: u32 = 0x4;

/// Tag and length words.
pub const TLV_HEADER_SIZE: usize = 2 * WORD_SIZE;

pub const MAX_CHANNELS: usize = 64;
pub const MAX_SSIDS: usize = 16;
pub const MAX_BSSIDS: usize = 4;
pub const MAX_IE_LEN: usize = 256;
pub const MAX_SSID_LEN: usize = 32;

/// Length word plus the fixed 32-byte SSID array.
const SSID_ENTRY_SIZE: usize = WORD_SIZE + MAX_SSID_LEN;

/// Returns a human-readable name for a TLV tag.
pub fn tag_name(tag: u32) -> &'static str {
    match tag {
        CHAN_LIST_TAG => "CHAN_LIST",
        SSID_LIST_TAG => "SSID_LIST",
        BSSID_LIST_TAG => "BSSID_LIST",
        IE_TAG => "IE",
        _ => "UNKNOWN",
    }
}

/// An SSID of at most 32 bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Ssid(Bytes);

impl Ssid {
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() > MAX_SSID_LEN {
            return Err(WireError::LengthTooLarge {
                field: "ssid",
                len: bytes.len(),
                max: MAX_SSID_LEN,
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as `{ssid_len, ssid[32]}`.
    pub fn encode(&self, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.0.len() as u32);
        w.put_fixed_bytes("ssid", &self.0, MAX_SSID_LEN)
    }

    pub fn decode(r: &mut RecordReader) -> Result<Self> {
        r.require(SSID_ENTRY_SIZE)?;
        let len = r.get_count("ssid_len", MAX_SSID_LEN)?;
        let raw = r.get_fixed_bytes::<MAX_SSID_LEN>()?;
        Ok(Self(Bytes::copy_from_slice(&raw[..len])))
    }
}

/// One recognized TLV block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvBlock {
    /// Channel frequencies in MHz.
    ChannelList(Vec<u32>),
    SsidList(Vec<Ssid>),
    BssidList(Vec<MacAddr>),
    /// Information elements, unpadded.
    Ie(Bytes),
}

impl TlvBlock {
    pub fn tag(&self) -> u32 {
        match self {
            TlvBlock::ChannelList(_) => CHAN_LIST_TAG,
            TlvBlock::SsidList(_) => SSID_LIST_TAG,
            TlvBlock::BssidList(_) => BSSID_LIST_TAG,
            TlvBlock::Ie(_) => IE_TAG,
        }
    }

    /// Entry count for lists, byte length for the IE blob.
    pub fn length(&self) -> usize {
        match self {
            TlvBlock::ChannelList(v) => v.len(),
            TlvBlock::SsidList(v) => v.len(),
            TlvBlock::BssidList(v) => v.len(),
            TlvBlock::Ie(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Bytes this block takes on the wire, header included.
    pub fn wire_size(&self) -> usize {
        let payload = match self {
            TlvBlock::ChannelList(v) => v.len() * WORD_SIZE,
            TlvBlock::SsidList(v) => v.len() * SSID_ENTRY_SIZE,
            TlvBlock::BssidList(v) => v.len() * MacAddr::WIRE_SIZE,
            TlvBlock::Ie(b) => padded_len(b.len()),
        };
        TLV_HEADER_SIZE + payload
    }

    fn check_limits(&self) -> Result<()> {
        match self {
            TlvBlock::ChannelList(v) => check_count("channels", v.len(), MAX_CHANNELS),
            TlvBlock::SsidList(v) => check_count("ssids", v.len(), MAX_SSIDS),
            TlvBlock::BssidList(v) => check_count("bssids", v.len(), MAX_BSSIDS),
            TlvBlock::Ie(b) if b.len() > MAX_IE_LEN => Err(WireError::LengthTooLarge {
                field: "ie",
                len: b.len(),
                max: MAX_IE_LEN,
            }),
            TlvBlock::Ie(_) => Ok(()),
        }
    }

    fn encode(&self, w: &mut RecordWriter) -> Result<()> {
        self.check_limits()?;
        w.put_u32(self.tag());
        w.put_u32(self.length() as u32);
        match self {
            TlvBlock::ChannelList(freqs) => w.put_words(freqs),
            TlvBlock::SsidList(ssids) => {
                for ssid in ssids {
                    ssid.encode(w)?;
                }
            }
            TlvBlock::BssidList(bssids) => {
                for &bssid in bssids {
                    w.put_mac(bssid);
                }
            }
            TlvBlock::Ie(ie) => w.put_bytes_padded(ie),
        }
        Ok(())
    }
}

/// Append `blocks` to `w` in canonical order.
///
/// Blocks are emitted channel list first, then SSID list, BSSID list and
/// IE blob. Empty blocks are omitted.
pub fn write_blocks(blocks: &[TlvBlock], w: &mut RecordWriter) -> Result<()> {
    let mut ordered: Vec<&TlvBlock> = blocks.iter().filter(|b| !b.is_empty()).collect();
    ordered.sort_by_key(|b| b.tag());
    for block in ordered {
        block.encode(w)?;
    }
    Ok(())
}

/// Build a standalone TLV payload.
pub fn build(blocks: &[TlvBlock]) -> Result<Bytes> {
    let size = blocks.iter().map(TlvBlock::wire_size).sum();
    let mut w = RecordWriter::with_capacity(size);
    write_blocks(blocks, &mut w)?;
    Ok(w.freeze())
}

/// Outcome of parsing a TLV tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvParse {
    /// Every block fit in the buffer.
    Complete(Vec<TlvBlock>),
    /// The buffer ended inside a block; `offset` is where that block began.
    Partial { blocks: Vec<TlvBlock>, offset: usize },
}

impl TlvParse {
    pub fn blocks(&self) -> &[TlvBlock] {
        match self {
            TlvParse::Complete(blocks) | TlvParse::Partial { blocks, .. } => blocks,
        }
    }

    pub fn into_blocks(self) -> Vec<TlvBlock> {
        match self {
            TlvParse::Complete(blocks) | TlvParse::Partial { blocks, .. } => blocks,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, TlvParse::Complete(_))
    }
}

/// Parse a TLV tail.
///
/// Unknown tags are skipped by exactly `length` bytes. A block that runs
/// past the end of the buffer stops parsing with [`TlvParse::Partial`].
/// A known block claiming more entries than its maximum is an error.
pub fn parse(bytes: impl Into<Bytes>) -> Result<TlvParse> {
    let mut r = RecordReader::new("tlv", bytes);
    parse_from(&mut r)
}

/// Parse the TLV blocks remaining in `r`.
pub fn parse_from(r: &mut RecordReader) -> Result<TlvParse> {
    let mut blocks = Vec::new();

    while r.remaining() > 0 {
        let offset = r.position();
        if r.remaining() < TLV_HEADER_SIZE {
            return Ok(TlvParse::Partial { blocks, offset });
        }
        let tag = r.get_u32()?;
        let length = r.get_u32()? as usize;

        let payload = match tag {
            CHAN_LIST_TAG => {
                check_count("channels", length, MAX_CHANNELS)?;
                length * WORD_SIZE
            }
            SSID_LIST_TAG => {
                check_count("ssids", length, MAX_SSIDS)?;
                length * SSID_ENTRY_SIZE
            }
            BSSID_LIST_TAG => {
                check_count("bssids", length, MAX_BSSIDS)?;
                length * MacAddr::WIRE_SIZE
            }
            IE_TAG => {
                check_count("ie_len", length, MAX_IE_LEN)?;
                length
            }
            _ => length,
        };

        if r.remaining() < payload {
            trace!(tag, length, offset, "tlv block runs past end of buffer");
            return Ok(TlvParse::Partial { blocks, offset });
        }

        let block = match tag {
            CHAN_LIST_TAG => {
                let mut freqs = Vec::with_capacity(length);
                for _ in 0..length {
                    freqs.push(r.get_u32()?);
                }
                TlvBlock::ChannelList(freqs)
            }
            SSID_LIST_TAG => {
                let mut ssids = Vec::with_capacity(length);
                for _ in 0..length {
                    ssids.push(Ssid::decode(r)?);
                }
                TlvBlock::SsidList(ssids)
            }
            BSSID_LIST_TAG => {
                let mut bssids = Vec::with_capacity(length);
                for _ in 0..length {
                    bssids.push(r.get_mac()?);
                }
                TlvBlock::BssidList(bssids)
            }
            IE_TAG => TlvBlock::Ie(r.get_bytes_padded(length)?),
            _ => {
                trace!(tag, length, "skipping unknown tlv block");
                r.skip(length)?;
                continue;
            }
        };
        blocks.push(block);
    }

    Ok(TlvParse::Complete(blocks))
}
