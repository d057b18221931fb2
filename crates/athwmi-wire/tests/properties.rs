//! Property tests for the packing primitives and TLV framing.

use athwmi_wire::tlv::{self, MAX_BSSIDS, MAX_CHANNELS, MAX_IE_LEN, MAX_SSIDS, MAX_SSID_LEN};
use athwmi_wire::{Field, MacAddr, Ssid, TlvBlock};
use bytes::Bytes;
use proptest::prelude::*;

fn field_strategy() -> impl Strategy<Value = Field> {
    (1u32..=32, 0u32..32).prop_filter_map("field must fit in a word", |(width, shift)| {
        if width + shift > 32 {
            return None;
        }
        let mask = if width == 32 {
            u32::MAX
        } else {
            ((1u32 << width) - 1) << shift
        };
        Some(Field::new(mask, shift))
    })
}

fn ssid_strategy() -> impl Strategy<Value = Ssid> {
    proptest::collection::vec(any::<u8>(), 0..=MAX_SSID_LEN)
        .prop_map(|bytes| Ssid::new(bytes).expect("length is bounded"))
}

proptest! {
    /// Whatever sits in the other bits, set-then-get returns the value
    /// truncated to the field width and leaves the other bits alone.
    #[test]
    fn field_set_get_symmetry(field in field_strategy(), word in any::<u32>(), value in any::<u32>()) {
        let updated = field.set(word, value);
        prop_assert_eq!(field.get(updated), value & field.max_value());
        prop_assert_eq!(updated & !field.mask, word & !field.mask);
    }

    #[test]
    fn mac_word_conversion_is_lossless(octets in any::<[u8; 6]>()) {
        let mac = MacAddr(octets);
        let (word0, word1) = mac.to_words();
        prop_assert_eq!(word1 >> 16, 0);
        prop_assert_eq!(MacAddr::from_words(word0, word1), mac);
    }

    #[test]
    fn tlv_parse_recovers_built_blocks(
        channels in proptest::collection::vec(any::<u32>(), 0..=MAX_CHANNELS),
        ssids in proptest::collection::vec(ssid_strategy(), 0..=MAX_SSIDS),
        bssids in proptest::collection::vec(any::<[u8; 6]>(), 0..=MAX_BSSIDS),
        ie in proptest::collection::vec(any::<u8>(), 0..=MAX_IE_LEN),
    ) {
        let blocks = vec![
            TlvBlock::ChannelList(channels),
            TlvBlock::SsidList(ssids),
            TlvBlock::BssidList(bssids.into_iter().map(MacAddr).collect()),
            TlvBlock::Ie(Bytes::from(ie)),
        ];
        let expected: Vec<TlvBlock> = blocks.iter().filter(|b| !b.is_empty()).cloned().collect();

        let wire = tlv::build(&blocks).expect("blocks are within limits");
        prop_assert_eq!(wire.len() % 4, 0);

        let parsed = tlv::parse(wire).expect("well-formed tail");
        prop_assert!(parsed.is_complete());
        prop_assert_eq!(parsed.into_blocks(), expected);
    }

    /// Cutting a valid tail anywhere never errors; it yields a prefix of the
    /// blocks.
    #[test]
    fn tlv_parse_tolerates_any_truncation(
        channels in proptest::collection::vec(any::<u32>(), 1..8),
        ssids in proptest::collection::vec(ssid_strategy(), 1..4),
        cut in any::<prop::sample::Index>(),
    ) {
        let blocks = vec![TlvBlock::ChannelList(channels), TlvBlock::SsidList(ssids)];
        let wire = tlv::build(&blocks).expect("blocks are within limits");
        let cut = cut.index(wire.len());

        let parsed = tlv::parse(wire.slice(..cut)).expect("truncation is tolerated");
        let got = parsed.blocks();
        prop_assert!(got.len() <= blocks.len());
        prop_assert_eq!(got, &blocks[..got.len()]);
    }
}
