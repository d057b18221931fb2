//! Packed sub-word fields.
//!
//! Sub-word values are never laid out as native narrower integers. Each one
//! is described by a `(mask, shift)` pair over a 32-bit word, and every record
//! type declares its pairs as constants next to its codec.

/// A bit field inside a 32-bit wire word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    /// Bits occupied by the field, already shifted into position.
    pub mask: u32,
    /// Position of the field's least significant bit.
    pub shift: u32,
}

impl Field {
    /// Create a field from its mask and LSB position.
    pub const fn new(mask: u32, shift: u32) -> Self {
        Self { mask, shift }
    }

    /// Extract the field value from `word`.
    pub const fn get(self, word: u32) -> u32 {
        (word & self.mask) >> self.shift
    }

    /// Return `word` with the field replaced by `value`.
    ///
    /// Bits of `value` that do not fit the field are dropped.
    pub const fn set(self, word: u32, value: u32) -> u32 {
        (word & !self.mask) | ((value << self.shift) & self.mask)
    }

    /// The field value positioned in an otherwise empty word.
    pub const fn put(self, value: u32) -> u32 {
        self.set(0, value)
    }

    /// Largest value the field can hold.
    pub const fn max_value(self) -> u32 {
        self.mask >> self.shift
    }

    /// True if the field is a single flag bit set in `word`.
    pub const fn is_set(self, word: u32) -> bool {
        word & self.mask != 0
    }
}

/// Pack `(field, value)` pairs into one word.
pub fn pack(pairs: &[(Field, u32)]) -> u32 {
    pairs
        .iter()
        .fold(0, |word, (field, value)| field.set(word, *value))
}
