use athwmi_wire::{check_count, MacAddr, RecordReader, RecordWriter};
use serde::{Deserialize, Serialize};

use crate::channel::PhyMode;
use crate::error::Result;
use crate::generation::AbiContext;
use crate::ids::Command;
use crate::params::PeerParam;
use crate::record::{CommandRecord, Record};

pub const MAX_SUPPORTED_RATES: usize = 128;

/// Rate words in a rate set: four rates per word plus one spare.
const RATE_SET_WORDS: usize = MAX_SUPPORTED_RATES / 4 + 1;

// peer_flags
pub const PEER_AUTH: u32 = 0x0000_0001;
pub const PEER_QOS: u32 = 0x0000_0002;
pub const PEER_NEED_PTK_4_WAY: u32 = 0x0000_0004;
pub const PEER_NEED_GTK_2_WAY: u32 = 0x0000_0010;
pub const PEER_APSD: u32 = 0x0000_0800;
pub const PEER_HT: u32 = 0x0000_1000;
pub const PEER_40MHZ: u32 = 0x0000_2000;
pub const PEER_STBC: u32 = 0x0000_8000;
pub const PEER_LDPC: u32 = 0x0001_0000;
pub const PEER_DYN_MIMOPS: u32 = 0x0002_0000;
pub const PEER_STATIC_MIMOPS: u32 = 0x0004_0000;
pub const PEER_SPATIAL_MUX: u32 = 0x0020_0000;
pub const PEER_VHT: u32 = 0x0200_0000;
pub const PEER_80MHZ: u32 = 0x0400_0000;
pub const PEER_PMF: u32 = 0x0800_0000;

// peer_rate_caps
pub const RC_DS_FLAG: u32 = 0x01;
pub const RC_CW40_FLAG: u32 = 0x02;
pub const RC_SGI_FLAG: u32 = 0x04;
pub const RC_HT_FLAG: u32 = 0x08;
pub const RC_RTSCTS_FLAG: u32 = 0x10;
pub const RC_TX_STBC_FLAG: u32 = 0x20;
pub const RC_RX_STBC_FLAG: u32 = 0xC0;
pub const RC_WEP_TKIP_FLAG: u32 = 0x100;
pub const RC_TS_FLAG: u32 = 0x200;
pub const RC_UAPSD_FLAG: u32 = 0x400;

/// Listen interval ceiling, in beacon intervals.
pub const MAX_HW_LISTEN_INTERVAL: u32 = 5;

/// Spatial multiplexing power-save states for [`PeerParam::SmpsState`].
pub const PEER_SMPS_PS_NONE: u32 = 0x0;
pub const PEER_SMPS_STATIC: u32 = 0x1;
pub const PEER_SMPS_DYNAMIC: u32 = 0x2;

/// PEER_CREATE and PEER_DELETE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerArg {
    pub vdev_id: u32,
    pub peer: MacAddr,
}

impl Record for PeerArg {
    const NAME: &'static str = "peer";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        w.put_mac(self.peer);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4 + MacAddr::WIRE_SIZE)?;
        Ok(Self {
            vdev_id: r.get_u32()?,
            peer: r.get_mac()?,
        })
    }
}

impl CommandRecord for PeerArg {
    const COMMANDS: &'static [Command] = &[Command::PeerCreate, Command::PeerDelete];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerFlushTidsArg {
    pub vdev_id: u32,
    pub peer: MacAddr,
    pub tid_bitmap: u32,
}

impl Record for PeerFlushTidsArg {
    const NAME: &'static str = "peer_flush_tids";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        w.put_mac(self.peer);
        w.put_u32(self.tid_bitmap);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4 + MacAddr::WIRE_SIZE + 4)?;
        Ok(Self {
            vdev_id: r.get_u32()?,
            peer: r.get_mac()?,
            tid_bitmap: r.get_u32()?,
        })
    }
}

impl CommandRecord for PeerFlushTidsArg {
    const COMMANDS: &'static [Command] = &[Command::PeerFlushTids];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerSetParamArg {
    pub vdev_id: u32,
    pub peer: MacAddr,
    pub param: PeerParam,
    pub value: u32,
}

impl Record for PeerSetParamArg {
    const NAME: &'static str = "peer_set_param";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        w.put_mac(self.peer);
        w.put_words(&[self.param.id(), self.value]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4 + MacAddr::WIRE_SIZE + 2 * 4)?;
        let vdev_id = r.get_u32()?;
        let peer = r.get_mac()?;
        let [id, value] = r.get_words::<2>()?;
        Ok(Self {
            vdev_id,
            peer,
            param: PeerParam::from_id(id)?,
            value,
        })
    }
}

impl CommandRecord for PeerSetParamArg {
    const COMMANDS: &'static [Command] = &[Command::PeerSetParam];
}

/// Up to 128 one-byte rates, packed least significant byte first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSet {
    pub rates: Vec<u8>,
}

impl RateSet {
    pub const WIRE_SIZE: usize = 4 + RATE_SET_WORDS * 4;

    fn put(&self, w: &mut RecordWriter) -> Result<()> {
        check_count("num_rates", self.rates.len(), MAX_SUPPORTED_RATES)?;
        w.put_u32(self.rates.len() as u32);
        let mut words = [0u32; RATE_SET_WORDS];
        for (k, &rate) in self.rates.iter().enumerate() {
            words[k / 4] |= u32::from(rate) << (8 * (k % 4));
        }
        w.put_words(&words);
        Ok(())
    }

    fn get(r: &mut RecordReader) -> Result<Self> {
        let count = r.get_count("num_rates", MAX_SUPPORTED_RATES)?;
        let words = r.get_words::<RATE_SET_WORDS>()?;
        let rates = (0..count)
            .map(|k| (words[k / 4] >> (8 * (k % 4))) as u8)
            .collect();
        Ok(Self { rates })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VhtRateSet {
    pub rx_max_rate: u32,
    pub rx_mcs_set: u32,
    pub tx_max_rate: u32,
    pub tx_mcs_set: u32,
}

/// PEER_ASSOC: everything the firmware rate control needs about a peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerAssocArg {
    pub peer: MacAddr,
    pub vdev_id: u32,
    /// `false` for a reassociation.
    pub new_assoc: bool,
    pub aid: u16,
    pub flags: u32,
    pub caps: u16,
    pub listen_intval: u32,
    pub ht_caps: u32,
    pub max_mpdu: u32,
    /// 0..=16.
    pub mpdu_density: u32,
    pub rate_caps: u32,
    pub legacy_rates: RateSet,
    pub ht_rates: RateSet,
    pub num_spatial_streams: u32,
    pub vht_caps: u32,
    pub phymode: PhyMode,
    pub vht_rates: VhtRateSet,
    /// HT operation element, five bytes across two words.
    pub ht_info: [u32; 2],
}

impl PeerAssocArg {
    pub const WIRE_SIZE: usize =
        MacAddr::WIRE_SIZE + 10 * 4 + 2 * RateSet::WIRE_SIZE + 3 * 4 + 4 * 4 + 2 * 4;
}

impl Record for PeerAssocArg {
    const NAME: &'static str = "peer_assoc";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_mac(self.peer);
        w.put_u32(self.vdev_id);
        w.put_bool(self.new_assoc);
        w.put_words(&[
            u32::from(self.aid),
            self.flags,
            u32::from(self.caps),
            self.listen_intval,
            self.ht_caps,
            self.max_mpdu,
            self.mpdu_density,
            self.rate_caps,
        ]);
        self.legacy_rates.put(w)?;
        self.ht_rates.put(w)?;
        w.put_words(&[self.num_spatial_streams, self.vht_caps, self.phymode as u32]);
        let vht = &self.vht_rates;
        w.put_words(&[vht.rx_max_rate, vht.rx_mcs_set, vht.tx_max_rate, vht.tx_mcs_set]);
        w.put_words(&self.ht_info);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::WIRE_SIZE)?;
        let peer = r.get_mac()?;
        let vdev_id = r.get_u32()?;
        let new_assoc = r.get_bool()?;
        let [aid, flags, caps, listen_intval, ht_caps, max_mpdu, mpdu_density, rate_caps] =
            r.get_words::<8>()?;
        let legacy_rates = RateSet::get(r)?;
        let ht_rates = RateSet::get(r)?;
        let [num_spatial_streams, vht_caps, phymode] = r.get_words::<3>()?;
        let [rx_max_rate, rx_mcs_set, tx_max_rate, tx_mcs_set] = r.get_words::<4>()?;
        Ok(Self {
            peer,
            vdev_id,
            new_assoc,
            aid: aid as u16,
            flags,
            caps: caps as u16,
            listen_intval,
            ht_caps,
            max_mpdu,
            mpdu_density,
            rate_caps,
            legacy_rates,
            ht_rates,
            num_spatial_streams,
            vht_caps,
            phymode: PhyMode::from_u32(phymode)?,
            vht_rates: VhtRateSet {
                rx_max_rate,
                rx_mcs_set,
                tx_max_rate,
                tx_mcs_set,
            },
            ht_info: r.get_words::<2>()?,
        })
    }
}

impl CommandRecord for PeerAssocArg {
    const COMMANDS: &'static [Command] = &[Command::PeerAssoc];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddWdsEntryArg {
    pub peer: MacAddr,
    pub wds: MacAddr,
}

impl Record for AddWdsEntryArg {
    const NAME: &'static str = "peer_add_wds_entry";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_mac(self.peer);
        w.put_mac(self.wds);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(2 * MacAddr::WIRE_SIZE)?;
        Ok(Self {
            peer: r.get_mac()?,
            wds: r.get_mac()?,
        })
    }
}

impl CommandRecord for AddWdsEntryArg {
    const COMMANDS: &'static [Command] = &[Command::PeerAddWdsEntry];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveWdsEntryArg {
    pub wds: MacAddr,
}

impl Record for RemoveWdsEntryArg {
    const NAME: &'static str = "peer_remove_wds_entry";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_mac(self.wds);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        Ok(Self { wds: r.get_mac()? })
    }
}

impl CommandRecord for RemoveWdsEntryArg {
    const COMMANDS: &'static [Command] = &[Command::PeerRemoveWdsEntry];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ProtocolGeneration;

    fn ctx() -> AbiContext {
        AbiContext::new(ProtocolGeneration::TenX)
    }

    #[test]
    fn rates_pack_four_per_word() {
        let mut w = RecordWriter::new();
        RateSet {
            rates: vec![0x82, 0x84, 0x8b, 0x96, 0x0c],
        }
        .put(&mut w)
        .unwrap();
        let bytes = w.freeze();
        assert_eq!(bytes.len(), RateSet::WIRE_SIZE);
        assert_eq!(&bytes[..4], &5u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0x968b_8482u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &0x0000_000cu32.to_le_bytes());
    }

    #[test]
    fn too_many_rates_rejected() {
        let mut w = RecordWriter::new();
        let set = RateSet {
            rates: vec![1; MAX_SUPPORTED_RATES + 1],
        };
        assert!(set.put(&mut w).is_err());
    }

    #[test]
    fn assoc_layout() {
        let arg = PeerAssocArg {
            peer: MacAddr([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]),
            vdev_id: 1,
            new_assoc: true,
            aid: 3,
            flags: PEER_AUTH | PEER_QOS | PEER_HT | PEER_VHT,
            caps: 0x0431,
            listen_intval: 1,
            max_mpdu: 65535,
            legacy_rates: RateSet {
                rates: vec![12, 18, 24, 36, 48, 72, 96, 108],
            },
            ht_rates: RateSet {
                rates: (0..16).collect(),
            },
            num_spatial_streams: 2,
            phymode: PhyMode::Mode11acVht80,
            vht_rates: VhtRateSet {
                rx_max_rate: 867,
                rx_mcs_set: 0xFFFA,
                tx_max_rate: 867,
                tx_mcs_set: 0xFFFA,
            },
            ..Default::default()
        };
        let bytes = arg.to_bytes(&ctx()).unwrap();
        assert_eq!(bytes.len(), PeerAssocArg::WIRE_SIZE);
        assert_eq!(PeerAssocArg::from_bytes(&ctx(), bytes).unwrap(), arg);
    }

    #[test]
    fn set_param_uses_shared_numbering() {
        let arg = PeerSetParamArg {
            vdev_id: 0,
            peer: MacAddr::BROADCAST,
            param: PeerParam::Authorize,
            value: 1,
        };
        let bytes = arg.to_bytes(&ctx()).unwrap();
        assert_eq!(&bytes[12..16], &3u32.to_le_bytes());
        assert_eq!(PeerSetParamArg::from_bytes(&ctx(), bytes).unwrap(), arg);
    }

    #[test]
    fn wds_entries() {
        let add = AddWdsEntryArg {
            peer: MacAddr([2, 0, 0, 0, 0, 1]),
            wds: MacAddr([2, 0, 0, 0, 0, 2]),
        };
        let bytes = add.to_bytes(&ctx()).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(AddWdsEntryArg::from_bytes(&ctx(), bytes).unwrap(), add);
        assert!(RemoveWdsEntryArg::from_bytes(&ctx(), vec![0u8; 4]).is_err());
    }
}
