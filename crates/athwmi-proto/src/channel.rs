//! The channel descriptor shared by scan, pdev and vdev commands.

use std::fmt;

use athwmi_wire::{Field, RecordReader, RecordWriter, WireError};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generation::AbiContext;
use crate::record::Record;

/// PHY operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum PhyMode {
    #[default]
    Mode11a = 0,
    Mode11g = 1,
    Mode11b = 2,
    Mode11gOnly = 3,
    Mode11naHt20 = 4,
    Mode11ngHt20 = 5,
    Mode11naHt40 = 6,
    Mode11ngHt40 = 7,
    Mode11acVht20 = 8,
    Mode11acVht40 = 9,
    Mode11acVht80 = 10,
    Mode11acVht20_2g = 11,
    Mode11acVht40_2g = 12,
    Mode11acVht80_2g = 13,
    Unknown = 14,
}

impl PhyMode {
    const ALL: [PhyMode; 15] = [
        PhyMode::Mode11a,
        PhyMode::Mode11g,
        PhyMode::Mode11b,
        PhyMode::Mode11gOnly,
        PhyMode::Mode11naHt20,
        PhyMode::Mode11ngHt20,
        PhyMode::Mode11naHt40,
        PhyMode::Mode11ngHt40,
        PhyMode::Mode11acVht20,
        PhyMode::Mode11acVht40,
        PhyMode::Mode11acVht80,
        PhyMode::Mode11acVht20_2g,
        PhyMode::Mode11acVht40_2g,
        PhyMode::Mode11acVht80_2g,
        PhyMode::Unknown,
    ];

    pub fn from_u32(value: u32) -> Result<Self> {
        Self::ALL.get(value as usize).copied().ok_or_else(|| {
            WireError::InvalidValue {
                field: "phy_mode",
                value,
            }
            .into()
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhyMode::Mode11a => "11a",
            PhyMode::Mode11g => "11g",
            PhyMode::Mode11b => "11b",
            PhyMode::Mode11gOnly => "11gonly",
            PhyMode::Mode11naHt20 => "11na-ht20",
            PhyMode::Mode11ngHt20 => "11ng-ht20",
            PhyMode::Mode11naHt40 => "11na-ht40",
            PhyMode::Mode11ngHt40 => "11ng-ht40",
            PhyMode::Mode11acVht20 => "11ac-vht20",
            PhyMode::Mode11acVht40 => "11ac-vht40",
            PhyMode::Mode11acVht80 => "11ac-vht80",
            PhyMode::Mode11acVht20_2g => "11ac-vht20-2g",
            PhyMode::Mode11acVht40_2g => "11ac-vht40-2g",
            PhyMode::Mode11acVht80_2g => "11ac-vht80-2g",
            PhyMode::Unknown => "<unknown>",
        }
    }
}

impl fmt::Display for PhyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// flags word
pub const CHAN_MODE: Field = Field::new(0x0000_003F, 0);
pub const CHAN_HT40_PLUS: Field = Field::new(1 << 6, 6);
pub const CHAN_PASSIVE: Field = Field::new(1 << 7, 7);
pub const CHAN_ADHOC_ALLOWED: Field = Field::new(1 << 8, 8);
pub const CHAN_AP_DISABLED: Field = Field::new(1 << 9, 9);
pub const CHAN_DFS: Field = Field::new(1 << 10, 10);
pub const CHAN_ALLOW_HT: Field = Field::new(1 << 11, 11);
pub const CHAN_ALLOW_VHT: Field = Field::new(1 << 12, 12);

// reginfo0 word, power in 0.5 dBm units
pub const REG_MIN_POWER: Field = Field::new(0x0000_00FF, 0);
pub const REG_MAX_POWER: Field = Field::new(0x0000_FF00, 8);
pub const REG_REG_POWER: Field = Field::new(0x00FF_0000, 16);
pub const REG_CLASS_ID: Field = Field::new(0xFF00_0000, 24);

// reginfo1 word
pub const REG_ANTENNA_MAX: Field = Field::new(0x0000_00FF, 0);

/// One channel descriptor: six words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelArg {
    pub freq: u32,
    pub band_center_freq1: u32,
    /// Second segment centre, 80+80 only.
    pub band_center_freq2: u32,
    pub mode: PhyMode,
    pub passive: bool,
    pub allow_ibss: bool,
    pub allow_ht: bool,
    pub allow_vht: bool,
    pub ht40plus: bool,
    pub ap_disabled: bool,
    pub chan_radar: bool,
    pub min_power: u8,
    pub max_power: u8,
    pub max_reg_power: u8,
    pub reg_class_id: u8,
    pub max_antenna_gain: u8,
}

impl ChannelArg {
    pub const WIRE_SIZE: usize = 6 * 4;

    fn flags(&self) -> u32 {
        let mut word = CHAN_MODE.put(self.mode as u32);
        for (field, on) in [
            (CHAN_HT40_PLUS, self.ht40plus),
            (CHAN_PASSIVE, self.passive),
            (CHAN_ADHOC_ALLOWED, self.allow_ibss),
            (CHAN_AP_DISABLED, self.ap_disabled),
            (CHAN_DFS, self.chan_radar),
            (CHAN_ALLOW_HT, self.allow_ht),
            (CHAN_ALLOW_VHT, self.allow_vht),
        ] {
            word = field.set(word, u32::from(on));
        }
        word
    }
}

impl Record for ChannelArg {
    const NAME: &'static str = "wmi_channel";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.freq);
        w.put_u32(self.band_center_freq1);
        w.put_u32(self.band_center_freq2);
        w.put_u32(self.flags());
        w.put_u32(athwmi_wire::pack(&[
            (REG_MIN_POWER, u32::from(self.min_power)),
            (REG_MAX_POWER, u32::from(self.max_power)),
            (REG_REG_POWER, u32::from(self.max_reg_power)),
            (REG_CLASS_ID, u32::from(self.reg_class_id)),
        ]));
        w.put_u32(REG_ANTENNA_MAX.put(u32::from(self.max_antenna_gain)));
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::WIRE_SIZE)?;
        let [freq, band_center_freq1, band_center_freq2, flags, reginfo0, reginfo1] =
            r.get_words::<6>()?;
        Ok(Self {
            freq,
            band_center_freq1,
            band_center_freq2,
            mode: PhyMode::from_u32(CHAN_MODE.get(flags))?,
            passive: CHAN_PASSIVE.is_set(flags),
            allow_ibss: CHAN_ADHOC_ALLOWED.is_set(flags),
            allow_ht: CHAN_ALLOW_HT.is_set(flags),
            allow_vht: CHAN_ALLOW_VHT.is_set(flags),
            ht40plus: CHAN_HT40_PLUS.is_set(flags),
            ap_disabled: CHAN_AP_DISABLED.is_set(flags),
            chan_radar: CHAN_DFS.is_set(flags),
            min_power: REG_MIN_POWER.get(reginfo0) as u8,
            max_power: REG_MAX_POWER.get(reginfo0) as u8,
            max_reg_power: REG_REG_POWER.get(reginfo0) as u8,
            reg_class_id: REG_CLASS_ID.get(reginfo0) as u8,
            max_antenna_gain: REG_ANTENNA_MAX.get(reginfo1) as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ProtocolGeneration;

    fn ctx() -> AbiContext {
        AbiContext::new(ProtocolGeneration::Main)
    }

    #[test]
    fn flags_and_power_pack_into_their_words() {
        let chan = ChannelArg {
            freq: 5180,
            band_center_freq1: 5210,
            mode: PhyMode::Mode11acVht80,
            passive: true,
            allow_vht: true,
            chan_radar: true,
            min_power: 0,
            max_power: 40,
            max_reg_power: 46,
            reg_class_id: 1,
            max_antenna_gain: 6,
            ..Default::default()
        };
        let bytes = chan.to_bytes(&ctx()).unwrap();
        assert_eq!(bytes.len(), ChannelArg::WIRE_SIZE);

        let flags = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        assert_eq!(flags, 10 | (1 << 7) | (1 << 10) | (1 << 12));
        let reginfo0 = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        assert_eq!(reginfo0, 0x012E_2800);

        assert_eq!(ChannelArg::from_bytes(&ctx(), bytes).unwrap(), chan);
    }

    #[test]
    fn rejects_undefined_mode() {
        let mut w = RecordWriter::new();
        w.put_words(&[2412, 2412, 0, 15, 0, 0]);
        assert!(ChannelArg::from_bytes(&ctx(), w.freeze()).is_err());
    }

    #[test]
    fn short_descriptor_is_truncated() {
        let err = ChannelArg::from_bytes(&ctx(), vec![0u8; 20]).unwrap_err();
        assert_eq!(
            err,
            WireError::Truncated {
                record: "wmi_channel",
                need: 24,
                have: 20
            }
            .into()
        );
    }
}
