/// Errors that can occur while encoding or decoding wire records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The buffer is shorter than the record's fixed part.
    #[error("{record} truncated ({have} bytes, need {need})")]
    Truncated {
        record: &'static str,
        need: usize,
        have: usize,
    },

    /// A count field exceeds the maximum accepted for its array.
    #[error("{field} count {count} exceeds max {max}")]
    CountTooLarge {
        field: &'static str,
        count: usize,
        max: usize,
    },

    /// A field holds a value outside its defined range.
    #[error("invalid {field} value {value:#x}")]
    InvalidValue { field: &'static str, value: u32 },

    /// A host-side argument is too large to encode.
    #[error("{field} too long ({len}, max {max})")]
    LengthTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, WireError>;
