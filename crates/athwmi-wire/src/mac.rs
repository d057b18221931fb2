use std::fmt;

/// A 6-byte MAC address.
///
/// On the wire a MAC address takes two words. Byte 0 is the low-order byte
/// of word 0 and byte 5 sits in bits 8-15 of word 1; the upper half of word 1
/// is zero.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// The broadcast address `ff:ff:ff:ff:ff:ff`.
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);

    /// Size on the wire in bytes.
    pub const WIRE_SIZE: usize = 8;

    /// Build from the two wire words.
    pub fn from_words(word0: u32, word1: u32) -> Self {
        let lo = word0.to_le_bytes();
        let hi = word1.to_le_bytes();
        Self([lo[0], lo[1], lo[2], lo[3], hi[0], hi[1]])
    }

    /// The two wire words.
    pub fn to_words(self) -> (u32, u32) {
        let b = self.0;
        let word0 = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let word1 = u32::from_le_bytes([b[4], b[5], 0, 0]);
        (word0, word1)
    }

    pub fn octets(self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(self) -> bool {
        self == Self::BROADCAST
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_take_low_byte_first() {
        let mac = MacAddr([0x00, 0x03, 0x7f, 0x12, 0x34, 0x56]);
        let (w0, w1) = mac.to_words();
        assert_eq!(w0, 0x127f_0300);
        assert_eq!(w1, 0x0000_5634);
    }

    #[test]
    fn high_half_of_second_word_is_ignored() {
        let mac = MacAddr::from_words(0x0403_0201, 0xBEEF_0605);
        assert_eq!(mac.octets(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn display_is_colon_separated() {
        let mac = MacAddr([0xaa, 0xbb, 0xcc, 0x01, 0x02, 0x03]);
        assert_eq!(mac.to_string(), "aa:bb:cc:01:02:03");
        assert!(MacAddr::BROADCAST.is_broadcast());
    }
}
