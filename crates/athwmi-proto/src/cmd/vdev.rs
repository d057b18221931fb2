use athwmi_wire::tlv::MAX_SSID_LEN;
use athwmi_wire::{check_count, Field, MacAddr, RecordReader, RecordWriter, Ssid, WireError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::channel::ChannelArg;
use crate::error::Result;
use crate::generation::AbiContext;
use crate::ids::Command;
use crate::params::VdevParam;
use crate::record::{CommandRecord, Record};

pub const VDEV_START_HIDDEN_SSID: u32 = 1 << 0;
pub const VDEV_START_PMF_ENABLED: u32 = 1 << 1;

/// NoA descriptor slots in the start request, whatever the count says.
pub const VDEV_START_NOA_SLOTS: usize = 2;

pub const MAX_KEY_INDEX: u32 = 3;
pub const MAX_KEY_LEN: usize = 32;

pub const KEY_PAIRWISE: u32 = 0x00;
pub const KEY_GROUP: u32 = 0x01;
/// Default transmit key, static WEP.
pub const KEY_TX_USAGE: u32 = 0x02;

// fixed rate byte, see VdevParam::FixedRate
pub const RATE_PREAMBLE: Field = Field::new(0xC0, 6);
pub const RATE_NSS: Field = Field::new(0x30, 4);
pub const RATE_MCS: Field = Field::new(0x0F, 0);
/// Disables a fixed rate.
pub const FIXED_RATE_NONE: u32 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum RatePreamble {
    Ofdm = 0,
    Cck = 1,
    Ht = 2,
    Vht = 3,
}

/// Fixed rate code: preamble, spatial streams (0 means one) and rate or MCS index.
pub fn fixed_rate(preamble: RatePreamble, nss: u32, mcs: u32) -> u32 {
    athwmi_wire::pack(&[
        (RATE_PREAMBLE, preamble as u32),
        (RATE_NSS, nss),
        (RATE_MCS, mcs),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum VdevType {
    Ap = 1,
    Sta = 2,
    Ibss = 3,
    Monitor = 4,
}

impl VdevType {
    pub fn from_u32(value: u32) -> Result<Self> {
        Ok(match value {
            1 => VdevType::Ap,
            2 => VdevType::Sta,
            3 => VdevType::Ibss,
            4 => VdevType::Monitor,
            _ => {
                return Err(WireError::InvalidValue {
                    field: "vdev_type",
                    value,
                }
                .into())
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum VdevSubtype {
    #[default]
    None = 0,
    P2pDevice = 1,
    P2pClient = 2,
    P2pGo = 3,
}

impl VdevSubtype {
    pub fn from_u32(value: u32) -> Result<Self> {
        Ok(match value {
            0 => VdevSubtype::None,
            1 => VdevSubtype::P2pDevice,
            2 => VdevSubtype::P2pClient,
            3 => VdevSubtype::P2pGo,
            _ => {
                return Err(WireError::InvalidValue {
                    field: "vdev_subtype",
                    value,
                }
                .into())
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VdevCreateArg {
    pub vdev_id: u32,
    pub vdev_type: VdevType,
    pub subtype: VdevSubtype,
    pub mac: MacAddr,
}

impl Record for VdevCreateArg {
    const NAME: &'static str = "vdev_create";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[self.vdev_id, self.vdev_type as u32, self.subtype as u32]);
        w.put_mac(self.mac);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(3 * 4 + MacAddr::WIRE_SIZE)?;
        let [vdev_id, vdev_type, subtype] = r.get_words::<3>()?;
        Ok(Self {
            vdev_id,
            vdev_type: VdevType::from_u32(vdev_type)?,
            subtype: VdevSubtype::from_u32(subtype)?,
            mac: r.get_mac()?,
        })
    }
}

impl CommandRecord for VdevCreateArg {
    const COMMANDS: &'static [Command] = &[Command::VdevCreate];
}

/// Argument of the commands that name only a vdev.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VdevIdArg {
    pub vdev_id: u32,
}

impl Record for VdevIdArg {
    const NAME: &'static str = "vdev_id";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        Ok(Self {
            vdev_id: r.get_u32()?,
        })
    }
}

impl CommandRecord for VdevIdArg {
    const COMMANDS: &'static [Command] = &[
        Command::VdevDelete,
        Command::VdevStop,
        Command::VdevDown,
        Command::VdevStandbyResponse,
        Command::VdevResumeResponse,
    ];
}

/// P2P notice-of-absence schedule entry, times in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoaDescriptor {
    /// 255 for a continuous schedule.
    pub type_count: u32,
    pub duration: u32,
    pub interval: u32,
    /// Low 32 bits of the TSF at which the schedule starts.
    pub start_time: u32,
}

impl NoaDescriptor {
    pub const WIRE_SIZE: usize = 4 * 4;

    pub(crate) fn put(&self, w: &mut RecordWriter) {
        w.put_words(&[self.type_count, self.duration, self.interval, self.start_time]);
    }

    pub(crate) fn get(r: &mut RecordReader) -> Result<Self> {
        let [type_count, duration, interval, start_time] = r.get_words::<4>()?;
        Ok(Self {
            type_count,
            duration,
            interval,
            start_time,
        })
    }
}

/// VDEV_START_REQUEST and VDEV_RESTART_REQUEST.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VdevStartRequestArg {
    pub channel: ChannelArg,
    pub vdev_id: u32,
    pub requestor_id: u32,
    pub bcn_intval: u32,
    pub dtim_period: u32,
    pub hidden_ssid: bool,
    pub pmf_enabled: bool,
    pub ssid: Ssid,
    pub bcn_tx_rate: u32,
    pub bcn_tx_power: u32,
    /// Set during CAC so the radio does not ack directed frames.
    pub disable_hw_ack: bool,
    pub noa: Vec<NoaDescriptor>,
}

impl VdevStartRequestArg {
    pub const WIRE_SIZE: usize =
        ChannelArg::WIRE_SIZE + 5 * 4 + 4 + MAX_SSID_LEN + 4 * 4 + VDEV_START_NOA_SLOTS * NoaDescriptor::WIRE_SIZE;

    fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.hidden_ssid {
            flags |= VDEV_START_HIDDEN_SSID;
        }
        if self.pmf_enabled {
            flags |= VDEV_START_PMF_ENABLED;
        }
        flags
    }
}

impl Record for VdevStartRequestArg {
    const NAME: &'static str = "vdev_start_request";

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        check_count("num_noa_descriptors", self.noa.len(), VDEV_START_NOA_SLOTS)?;
        self.channel.encode(ctx, w)?;
        w.put_words(&[
            self.vdev_id,
            self.requestor_id,
            self.bcn_intval,
            self.dtim_period,
            self.flags(),
        ]);
        self.ssid.encode(w)?;
        w.put_words(&[self.bcn_tx_rate, self.bcn_tx_power, self.noa.len() as u32]);
        w.put_bool(self.disable_hw_ack);
        for noa in &self.noa {
            noa.put(w);
        }
        let unused = VDEV_START_NOA_SLOTS - self.noa.len();
        w.put_zeros(unused * NoaDescriptor::WIRE_SIZE / 4);
        Ok(())
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::WIRE_SIZE)?;
        let channel = ChannelArg::decode(ctx, r)?;
        let [vdev_id, requestor_id, bcn_intval, dtim_period, flags] = r.get_words::<5>()?;
        let ssid = Ssid::decode(r)?;
        let [bcn_tx_rate, bcn_tx_power] = r.get_words::<2>()?;
        let num_noa = r.get_count("num_noa_descriptors", VDEV_START_NOA_SLOTS)?;
        let disable_hw_ack = r.get_bool()?;
        let mut noa = Vec::with_capacity(num_noa);
        for _ in 0..num_noa {
            noa.push(NoaDescriptor::get(r)?);
        }
        r.skip((VDEV_START_NOA_SLOTS - num_noa) * NoaDescriptor::WIRE_SIZE)?;
        Ok(Self {
            channel,
            vdev_id,
            requestor_id,
            bcn_intval,
            dtim_period,
            hidden_ssid: flags & VDEV_START_HIDDEN_SSID != 0,
            pmf_enabled: flags & VDEV_START_PMF_ENABLED != 0,
            ssid,
            bcn_tx_rate,
            bcn_tx_power,
            disable_hw_ack,
            noa,
        })
    }
}

impl CommandRecord for VdevStartRequestArg {
    const COMMANDS: &'static [Command] = &[Command::VdevStartRequest, Command::VdevRestartRequest];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VdevUpArg {
    pub vdev_id: u32,
    pub assoc_id: u32,
    pub bssid: MacAddr,
}

impl Record for VdevUpArg {
    const NAME: &'static str = "vdev_up";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[self.vdev_id, self.assoc_id]);
        w.put_mac(self.bssid);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(2 * 4 + MacAddr::WIRE_SIZE)?;
        let [vdev_id, assoc_id] = r.get_words::<2>()?;
        Ok(Self {
            vdev_id,
            assoc_id,
            bssid: r.get_mac()?,
        })
    }
}

impl CommandRecord for VdevUpArg {
    const COMMANDS: &'static [Command] = &[Command::VdevUp];
}

/// VDEV_SET_PARAM. The parameter id is resolved for the active generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VdevSetParamArg {
    pub vdev_id: u32,
    pub param: VdevParam,
    pub value: u32,
}

impl Record for VdevSetParamArg {
    const NAME: &'static str = "vdev_set_param";

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        let id = self.param.resolve(ctx.generation())?;
        w.put_words(&[self.vdev_id, id, self.value]);
        Ok(())
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(3 * 4)?;
        let [vdev_id, id, value] = r.get_words::<3>()?;
        Ok(Self {
            vdev_id,
            param: VdevParam::from_id(id, ctx.generation())?,
            value,
        })
    }
}

impl CommandRecord for VdevSetParamArg {
    const COMMANDS: &'static [Command] = &[Command::VdevSetParam];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum Cipher {
    #[default]
    None = 0,
    Wep = 1,
    Tkip = 2,
    AesOcb = 3,
    AesCcm = 4,
    Wapi = 5,
    Ckip = 6,
    AesCmac = 7,
}

impl Cipher {
    pub fn from_u32(value: u32) -> Result<Self> {
        Ok(match value {
            0 => Cipher::None,
            1 => Cipher::Wep,
            2 => Cipher::Tkip,
            3 => Cipher::AesOcb,
            4 => Cipher::AesCcm,
            5 => Cipher::Wapi,
            6 => Cipher::Ckip,
            7 => Cipher::AesCmac,
            _ => {
                return Err(WireError::InvalidValue {
                    field: "key_cipher",
                    value,
                }
                .into())
            }
        })
    }
}

/// 64-bit replay counter carried as low and high words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySeqCounter {
    pub low: u32,
    pub high: u32,
}

/// VDEV_INSTALL_KEY.
///
/// `key_data` holds the key followed by the tx and rx MIC keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallKeyArg {
    pub vdev_id: u32,
    pub peer: MacAddr,
    pub key_idx: u32,
    pub key_flags: u32,
    pub cipher: Cipher,
    pub rsc_counter: KeySeqCounter,
    pub global_rsc_counter: KeySeqCounter,
    pub tsc_counter: KeySeqCounter,
    pub wpi_rsc_counter: [u8; 16],
    pub wpi_tsc_counter: [u8; 16],
    pub txmic_len: u32,
    pub rxmic_len: u32,
    pub key_data: Bytes,
}

impl InstallKeyArg {
    const HEADER_SIZE: usize = 4 + MacAddr::WIRE_SIZE + 3 * 4 + 3 * 8 + 2 * 16 + 3 * 4;
}

impl Record for InstallKeyArg {
    const NAME: &'static str = "vdev_install_key";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        if self.key_idx > MAX_KEY_INDEX {
            return Err(WireError::InvalidValue {
                field: "key_idx",
                value: self.key_idx,
            }
            .into());
        }
        if self.key_data.len() > MAX_KEY_LEN {
            return Err(WireError::LengthTooLarge {
                field: "key_len",
                len: self.key_data.len(),
                max: MAX_KEY_LEN,
            }
            .into());
        }
        w.put_u32(self.vdev_id);
        w.put_mac(self.peer);
        w.put_words(&[self.key_idx, self.key_flags, self.cipher as u32]);
        for counter in [self.rsc_counter, self.global_rsc_counter, self.tsc_counter] {
            w.put_words(&[counter.low, counter.high]);
        }
        w.put_fixed_bytes("wpi_key_rsc_counter", &self.wpi_rsc_counter, 16)?;
        w.put_fixed_bytes("wpi_key_tsc_counter", &self.wpi_tsc_counter, 16)?;
        w.put_words(&[self.key_data.len() as u32, self.txmic_len, self.rxmic_len]);
        w.put_bytes_padded(&self.key_data);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::HEADER_SIZE)?;
        let vdev_id = r.get_u32()?;
        let peer = r.get_mac()?;
        let [key_idx, key_flags, cipher] = r.get_words::<3>()?;
        let [rsc_l, rsc_h, grsc_l, grsc_h, tsc_l, tsc_h] = r.get_words::<6>()?;
        let wpi_rsc_counter = r.get_fixed_bytes::<16>()?;
        let wpi_tsc_counter = r.get_fixed_bytes::<16>()?;
        let key_len = r.get_count("key_len", MAX_KEY_LEN)?;
        let [txmic_len, rxmic_len] = r.get_words::<2>()?;
        Ok(Self {
            vdev_id,
            peer,
            key_idx,
            key_flags,
            cipher: Cipher::from_u32(cipher)?,
            rsc_counter: KeySeqCounter {
                low: rsc_l,
                high: rsc_h,
            },
            global_rsc_counter: KeySeqCounter {
                low: grsc_l,
                high: grsc_h,
            },
            tsc_counter: KeySeqCounter {
                low: tsc_l,
                high: tsc_h,
            },
            wpi_rsc_counter,
            wpi_tsc_counter,
            txmic_len,
            rxmic_len,
            key_data: r.get_bytes_padded(key_len)?,
        })
    }
}

impl CommandRecord for InstallKeyArg {
    const COMMANDS: &'static [Command] = &[Command::VdevInstallKey];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PhyMode;
    use crate::generation::ProtocolGeneration;

    fn ctx() -> AbiContext {
        AbiContext::new(ProtocolGeneration::Main)
    }

    #[test]
    fn create_carries_type_and_mac() {
        let arg = VdevCreateArg {
            vdev_id: 0,
            vdev_type: VdevType::Ap,
            subtype: VdevSubtype::P2pGo,
            mac: MacAddr([0x00, 0x03, 0x7f, 0x11, 0x22, 0x33]),
        };
        let bytes = arg.to_bytes(&ctx()).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[12..20], &[0x00, 0x03, 0x7f, 0x11, 0x22, 0x33, 0, 0]);
        assert_eq!(VdevCreateArg::from_bytes(&ctx(), bytes).unwrap(), arg);

        let mut w = RecordWriter::new();
        w.put_words(&[0, 9, 0, 0, 0]);
        assert!(VdevCreateArg::from_bytes(&ctx(), w.freeze()).is_err());
    }

    #[test]
    fn start_request_always_has_two_noa_slots() {
        let arg = VdevStartRequestArg {
            channel: ChannelArg {
                freq: 5180,
                band_center_freq1: 5190,
                mode: PhyMode::Mode11naHt40,
                ht40plus: true,
                ..Default::default()
            },
            vdev_id: 1,
            bcn_intval: 100,
            dtim_period: 2,
            hidden_ssid: true,
            ssid: Ssid::new(&b"ap-lab"[..]).unwrap(),
            noa: vec![NoaDescriptor {
                type_count: 255,
                duration: 20_000,
                interval: 102_400,
                start_time: 0x1234,
            }],
            ..Default::default()
        };
        let bytes = arg.to_bytes(&ctx()).unwrap();
        assert_eq!(bytes.len(), VdevStartRequestArg::WIRE_SIZE);
        assert_eq!(bytes.len(), 24 + 20 + 36 + 16 + 32);
        // flags word after vdev_id, requestor_id, interval and dtim
        assert_eq!(&bytes[40..44], &VDEV_START_HIDDEN_SSID.to_le_bytes());
        assert_eq!(VdevStartRequestArg::from_bytes(&ctx(), bytes).unwrap(), arg);
    }

    #[test]
    fn start_request_rejects_three_noa_descriptors() {
        let arg = VdevStartRequestArg {
            noa: vec![NoaDescriptor::default(); 3],
            ..Default::default()
        };
        assert!(arg.to_bytes(&ctx()).is_err());
    }

    #[test]
    fn set_param_tenx_numbering() {
        let tenx = AbiContext::new(ProtocolGeneration::TenX);
        let arg = VdevSetParamArg {
            vdev_id: 3,
            param: VdevParam::FeatureWmm,
            value: 1,
        };
        let bytes = arg.to_bytes(&tenx).unwrap();
        assert_eq!(&bytes[4..8], &18u32.to_le_bytes());
        assert_eq!(VdevSetParamArg::from_bytes(&tenx, bytes).unwrap(), arg);
    }

    #[test]
    fn install_key_pads_key_data() {
        let arg = InstallKeyArg {
            vdev_id: 0,
            peer: MacAddr([2, 0, 0, 0, 0, 1]),
            key_idx: 1,
            key_flags: KEY_GROUP,
            cipher: Cipher::AesCcm,
            key_data: Bytes::from_static(&[0xAB; 13]),
            ..Default::default()
        };
        let bytes = arg.to_bytes(&ctx()).unwrap();
        assert_eq!(bytes.len(), InstallKeyArg::HEADER_SIZE + 16);
        assert_eq!(InstallKeyArg::from_bytes(&ctx(), bytes).unwrap(), arg);
    }

    #[test]
    fn install_key_limits() {
        let long = InstallKeyArg {
            key_data: Bytes::from(vec![0u8; MAX_KEY_LEN + 1]),
            ..Default::default()
        };
        assert!(long.to_bytes(&ctx()).is_err());
        let bad_idx = InstallKeyArg {
            key_idx: 4,
            ..Default::default()
        };
        assert!(bad_idx.to_bytes(&ctx()).is_err());
    }

    #[test]
    fn fixed_rate_code() {
        assert_eq!(fixed_rate(RatePreamble::Vht, 1, 9), 0xD9);
        assert_eq!(fixed_rate(RatePreamble::Ofdm, 0, 3), 0x03);
    }
}
