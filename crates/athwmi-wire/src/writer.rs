use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::mac::MacAddr;
use crate::WORD_SIZE;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Round `len` up to the next word boundary.
pub const fn padded_len(len: usize) -> usize {
    (len + WORD_SIZE - 1) & !(WORD_SIZE - 1)
}

/// Builds a wire record one 4-byte field at a time.
///
/// Everything written through this type stays word aligned: scalar fields
/// are single little-endian words and byte blobs are zero padded.
#[derive(Debug, Default)]
pub struct RecordWriter {
    buf: BytesMut,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    /// Booleans occupy a whole word holding 0 or 1.
    pub fn put_bool(&mut self, value: bool) {
        self.put_u32(u32::from(value));
    }

    pub fn put_words(&mut self, words: &[u32]) {
        for &word in words {
            self.put_u32(word);
        }
    }

    pub fn put_mac(&mut self, mac: MacAddr) {
        let (word0, word1) = mac.to_words();
        self.put_u32(word0);
        self.put_u32(word1);
    }

    /// Append `bytes` followed by zeros up to the next word boundary.
    pub fn put_bytes_padded(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
        self.buf.put_bytes(0, padded_len(bytes.len()) - bytes.len());
    }

    /// Append a fixed-size byte array of `size` bytes, zero filled past `bytes`.
    pub fn put_fixed_bytes(&mut self, field: &'static str, bytes: &[u8], size: usize) -> Result<()> {
        if bytes.len() > size {
            return Err(WireError::LengthTooLarge {
                field,
                len: bytes.len(),
                max: size,
            });
        }
        self.buf.put_slice(bytes);
        self.buf.put_bytes(0, padded_len(size) - bytes.len());
        Ok(())
    }

    /// Append `count` zero words.
    pub fn put_zeros(&mut self, count: usize) {
        self.buf.put_bytes(0, count * WORD_SIZE);
    }

    /// Append an already encoded, word-aligned record.
    pub fn put_record(&mut self, record: &[u8]) {
        self.buf.put_slice(record);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn into_inner(self) -> BytesMut {
        self.buf
    }
}
