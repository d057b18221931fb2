//! Station and AP power save, plus the station keep-alive template.

use std::net::Ipv4Addr;

use athwmi_wire::{MacAddr, RecordReader, RecordWriter, WireError};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generation::AbiContext;
use crate::ids::Command;
use crate::params::{ApPsParam, StaPsMode, StaPsParam};
use crate::record::{CommandRecord, Record};

// uapsd bits of ApPsParam::Uapsd, one delivery and one trigger bit per AC
pub const AP_PS_UAPSD_AC0_DELIVERY_EN: u32 = 1 << 0;
pub const AP_PS_UAPSD_AC0_TRIGGER_EN: u32 = 1 << 1;
pub const AP_PS_UAPSD_AC1_DELIVERY_EN: u32 = 1 << 2;
pub const AP_PS_UAPSD_AC1_TRIGGER_EN: u32 = 1 << 3;
pub const AP_PS_UAPSD_AC2_DELIVERY_EN: u32 = 1 << 4;
pub const AP_PS_UAPSD_AC2_TRIGGER_EN: u32 = 1 << 5;
pub const AP_PS_UAPSD_AC3_DELIVERY_EN: u32 = 1 << 6;
pub const AP_PS_UAPSD_AC3_TRIGGER_EN: u32 = 1 << 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaPsModeArg {
    pub vdev_id: u32,
    pub mode: StaPsMode,
}

impl Record for StaPsModeArg {
    const NAME: &'static str = "sta_powersave_mode";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[self.vdev_id, self.mode as u32]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(2 * 4)?;
        let [vdev_id, mode] = r.get_words::<2>()?;
        Ok(Self {
            vdev_id,
            mode: StaPsMode::from_id(mode)?,
        })
    }
}

impl CommandRecord for StaPsModeArg {
    const COMMANDS: &'static [Command] = &[Command::StaPowersaveMode];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaPsParamArg {
    pub vdev_id: u32,
    pub param: StaPsParam,
    pub value: u32,
}

impl Record for StaPsParamArg {
    const NAME: &'static str = "sta_powersave_param";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[self.vdev_id, self.param.id(), self.value]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(3 * 4)?;
        let [vdev_id, param, value] = r.get_words::<3>()?;
        Ok(Self {
            vdev_id,
            param: StaPsParam::from_id(param)?,
            value,
        })
    }
}

impl CommandRecord for StaPsParamArg {
    const COMMANDS: &'static [Command] = &[Command::StaPowersaveParam];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MimoPsModeArg {
    pub vdev_id: u32,
    pub mode: u32,
}

impl Record for MimoPsModeArg {
    const NAME: &'static str = "sta_mimo_ps_mode";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[self.vdev_id, self.mode]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(2 * 4)?;
        let [vdev_id, mode] = r.get_words::<2>()?;
        Ok(Self { vdev_id, mode })
    }
}

impl CommandRecord for MimoPsModeArg {
    const COMMANDS: &'static [Command] = &[Command::StaMimoPsMode];
}

/// Power-save setting the AP keeps for one associated station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApPsPeerArg {
    pub vdev_id: u32,
    pub peer: MacAddr,
    pub param: ApPsParam,
    pub value: u32,
}

impl Record for ApPsPeerArg {
    const NAME: &'static str = "ap_ps_peer";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        w.put_mac(self.peer);
        w.put_words(&[self.param as u32, self.value]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4 + MacAddr::WIRE_SIZE + 2 * 4)?;
        let vdev_id = r.get_u32()?;
        let peer = r.get_mac()?;
        let [param, value] = r.get_words::<2>()?;
        Ok(Self {
            vdev_id,
            peer,
            param: ApPsParam::from_id(param)?,
            value,
        })
    }
}

impl CommandRecord for ApPsPeerArg {
    const COMMANDS: &'static [Command] = &[Command::ApPsPeerParam];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum KeepaliveMethod {
    #[default]
    NullFrame = 1,
    UnsolicitedArpResponse = 2,
}

impl KeepaliveMethod {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            1 => Ok(KeepaliveMethod::NullFrame),
            2 => Ok(KeepaliveMethod::UnsolicitedArpResponse),
            _ => Err(WireError::InvalidValue {
                field: "keepalive_method",
                value,
            }
            .into()),
        }
    }
}

/// ARP response template. Addresses go out in network byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpResponse {
    pub src_ip: Ipv4Addr,
    pub dest_ip: Ipv4Addr,
    pub dest_mac: MacAddr,
}

impl Default for ArpResponse {
    fn default() -> Self {
        Self {
            src_ip: Ipv4Addr::UNSPECIFIED,
            dest_ip: Ipv4Addr::UNSPECIFIED,
            dest_mac: MacAddr::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepaliveArg {
    pub vdev_id: u32,
    pub enabled: bool,
    pub method: KeepaliveMethod,
    /// Seconds.
    pub interval: u32,
    pub arp_resp: ArpResponse,
}

impl KeepaliveArg {
    pub const WIRE_SIZE: usize = 4 * 4 + 2 * 4 + MacAddr::WIRE_SIZE;
}

impl Record for KeepaliveArg {
    const NAME: &'static str = "sta_keepalive";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        w.put_bool(self.enabled);
        w.put_words(&[self.method as u32, self.interval]);
        w.put_fixed_bytes("src_ip4_addr", &self.arp_resp.src_ip.octets(), 4)?;
        w.put_fixed_bytes("dest_ip4_addr", &self.arp_resp.dest_ip.octets(), 4)?;
        w.put_mac(self.arp_resp.dest_mac);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::WIRE_SIZE)?;
        let vdev_id = r.get_u32()?;
        let enabled = r.get_bool()?;
        let [method, interval] = r.get_words::<2>()?;
        Ok(Self {
            vdev_id,
            enabled,
            method: KeepaliveMethod::from_u32(method)?,
            interval,
            arp_resp: ArpResponse {
                src_ip: Ipv4Addr::from(r.get_fixed_bytes::<4>()?),
                dest_ip: Ipv4Addr::from(r.get_fixed_bytes::<4>()?),
                dest_mac: r.get_mac()?,
            },
        })
    }
}

impl CommandRecord for KeepaliveArg {
    const COMMANDS: &'static [Command] = &[Command::StaKeepalive];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ProtocolGeneration;

    fn ctx() -> AbiContext {
        AbiContext::new(ProtocolGeneration::Main)
    }

    #[test]
    fn keepalive_ip_addresses_are_big_endian() {
        let arg = KeepaliveArg {
            vdev_id: 0,
            enabled: true,
            method: KeepaliveMethod::UnsolicitedArpResponse,
            interval: 30,
            arp_resp: ArpResponse {
                src_ip: Ipv4Addr::new(192, 168, 1, 10),
                dest_ip: Ipv4Addr::new(192, 168, 1, 1),
                dest_mac: MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            },
        };
        let bytes = arg.to_bytes(&ctx()).unwrap();
        assert_eq!(bytes.len(), KeepaliveArg::WIRE_SIZE);
        assert_eq!(&bytes[16..20], &[192, 168, 1, 10]);
        assert_eq!(&bytes[20..24], &[192, 168, 1, 1]);
        assert_eq!(KeepaliveArg::from_bytes(&ctx(), bytes).unwrap(), arg);
    }

    #[test]
    fn keepalive_method_is_checked() {
        let mut w = RecordWriter::new();
        w.put_words(&[0, 1, 3, 10, 0, 0, 0, 0]);
        assert!(KeepaliveArg::from_bytes(&ctx(), w.freeze()).is_err());
    }

    #[test]
    fn sta_ps_records() {
        let mode = StaPsModeArg {
            vdev_id: 2,
            mode: StaPsMode::Enabled,
        };
        let bytes = mode.to_bytes(&ctx()).unwrap();
        assert_eq!(&bytes[4..], &1u32.to_le_bytes());
        assert_eq!(StaPsModeArg::from_bytes(&ctx(), bytes).unwrap(), mode);

        let param = StaPsParamArg {
            vdev_id: 2,
            param: StaPsParam::InactivityTime,
            value: 200,
        };
        let bytes = param.to_bytes(&ctx()).unwrap();
        assert_eq!(&bytes[4..8], &3u32.to_le_bytes());
        assert_eq!(StaPsParamArg::from_bytes(&ctx(), bytes).unwrap(), param);
    }

    #[test]
    fn ap_ps_peer_uapsd() {
        let arg = ApPsPeerArg {
            vdev_id: 0,
            peer: MacAddr([2, 0, 0, 0, 0, 9]),
            param: ApPsParam::Uapsd,
            value: AP_PS_UAPSD_AC3_DELIVERY_EN | AP_PS_UAPSD_AC3_TRIGGER_EN,
        };
        let bytes = arg.to_bytes(&ctx()).unwrap();
        assert_eq!(&bytes[16..20], &0xC0u32.to_le_bytes());
        assert_eq!(ApPsPeerArg::from_bytes(&ctx(), bytes).unwrap(), arg);
    }
}
