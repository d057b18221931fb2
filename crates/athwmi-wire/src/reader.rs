use bytes::{Buf, Bytes};

use crate::error::{Result, WireError};
use crate::mac::MacAddr;
use crate::writer::padded_len;
use crate::WORD_SIZE;

/// Reads a wire record one 4-byte field at a time.
///
/// Every read is bounds checked. Running past the end of the buffer yields
/// [`WireError::Truncated`] naming the record being decoded, never a panic.
#[derive(Debug, Clone)]
pub struct RecordReader {
    record: &'static str,
    buf: Bytes,
    consumed: usize,
}

impl RecordReader {
    /// Create a reader over `bytes` for the record called `record`.
    pub fn new(record: &'static str, bytes: impl Into<Bytes>) -> Self {
        Self {
            record,
            buf: bytes.into(),
            consumed: 0,
        }
    }

    /// Name of the record being decoded.
    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Fail unless at least `len` more bytes are available.
    ///
    /// Decoders call this once with the size of their fixed part before
    /// reading any field.
    pub fn require(&self, len: usize) -> Result<()> {
        if self.buf.remaining() < len {
            return Err(WireError::Truncated {
                record: self.record,
                need: self.consumed + len,
                have: self.consumed + self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        self.require(WORD_SIZE)?;
        self.consumed += WORD_SIZE;
        Ok(self.buf.get_u32_le())
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        self.require(WORD_SIZE)?;
        self.consumed += WORD_SIZE;
        Ok(self.buf.get_i32_le())
    }

    /// Any non-zero word reads as `true`.
    pub fn get_bool(&mut self) -> Result<bool> {
        Ok(self.get_u32()? != 0)
    }

    pub fn get_words<const N: usize>(&mut self) -> Result<[u32; N]> {
        self.require(N * WORD_SIZE)?;
        let mut words = [0u32; N];
        for word in &mut words {
            *word = self.get_u32()?;
        }
        Ok(words)
    }

    pub fn get_mac(&mut self) -> Result<MacAddr> {
        self.require(MacAddr::WIRE_SIZE)?;
        let word0 = self.get_u32()?;
        let word1 = self.get_u32()?;
        Ok(MacAddr::from_words(word0, word1))
    }

    /// Read a count word and check it against `max` before anything is
    /// sized from it.
    pub fn get_count(&mut self, field: &'static str, max: usize) -> Result<usize> {
        let count = self.get_u32()? as usize;
        check_count(field, count, max)?;
        Ok(count)
    }

    /// Read exactly `len` bytes.
    pub fn get_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.require(len)?;
        self.consumed += len;
        Ok(self.buf.copy_to_bytes(len))
    }

    /// Read `len` bytes and consume the zero padding after them.
    ///
    /// Missing padding at the very end of the buffer is tolerated.
    pub fn get_bytes_padded(&mut self, len: usize) -> Result<Bytes> {
        let bytes = self.get_bytes(len)?;
        let pad = (padded_len(len) - len).min(self.buf.remaining());
        self.skip(pad)?;
        Ok(bytes)
    }

    /// Read a fixed-size byte array, including its padding.
    pub fn get_fixed_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.require(padded_len(N))?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        self.consumed += N;
        self.skip(padded_len(N) - N)?;
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.require(len)?;
        self.buf.advance(len);
        self.consumed += len;
        Ok(())
    }

    /// Take everything that is left.
    pub fn rest(&mut self) -> Bytes {
        self.consumed += self.buf.remaining();
        std::mem::take(&mut self.buf)
    }
}

/// Reject a count above `max`.
pub fn check_count(field: &'static str, count: usize, max: usize) -> Result<()> {
    if count > max {
        return Err(WireError::CountTooLarge { field, count, max });
    }
    Ok(())
}
