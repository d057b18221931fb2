use athwmi_wire::tlv::{self, TlvBlock, TlvParse, MAX_CHANNELS};
use athwmi_wire::{check_count, MacAddr, RecordReader, RecordWriter, Ssid, WireError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::channel::ChannelArg;
use crate::error::Result;
use crate::event::scan::ScanEventType;
use crate::generation::AbiContext;
use crate::ids::Command;
use crate::record::{get_main_only, put_main_only, CommandRecord, Record};

/// Requestor ids generated by the host carry this prefix.
pub const HOST_SCAN_REQUESTOR_ID_PREFIX: u32 = 0xA000;
/// Scan ids generated by the host cycle through the low 12 bits under this prefix.
pub const HOST_SCAN_REQ_ID_PREFIX: u32 = 0xA000;

// scan_ctrl_flags
pub const SCAN_FLAG_PASSIVE: u32 = 0x1;
pub const SCAN_ADD_BCAST_PROBE_REQ: u32 = 0x2;
pub const SCAN_ADD_CCK_RATES: u32 = 0x4;
pub const SCAN_ADD_OFDM_RATES: u32 = 0x8;
pub const SCAN_CHAN_STAT_EVENT: u32 = 0x10;
pub const SCAN_FILTER_PROBE_REQ: u32 = 0x20;
pub const SCAN_BYPASS_DFS_CHN: u32 = 0x40;
pub const SCAN_CONTINUE_ON_ERROR: u32 = 0x80;
/// Scan class bits reserved for the firmware.
pub const SCAN_CLASS_MASK: u32 = 0xFF00_0000;

/// Input to the firmware scan scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ScanPriority {
    VeryLow = 0,
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
    VeryHigh = 4,
}

impl ScanPriority {
    pub fn from_u32(value: u32) -> Result<Self> {
        Ok(match value {
            0 => ScanPriority::VeryLow,
            1 => ScanPriority::Low,
            2 => ScanPriority::Medium,
            3 => ScanPriority::High,
            4 => ScanPriority::VeryHigh,
            _ => {
                return Err(WireError::InvalidValue {
                    field: "scan_priority",
                    value,
                }
                .into())
            }
        })
    }
}

/// START_SCAN: fixed header followed by channel, SSID, BSSID and IE blocks.
///
/// 10.x firmware has no `burst_duration` word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartScanArg {
    pub scan_id: u32,
    pub scan_req_id: u32,
    pub vdev_id: u32,
    pub scan_priority: ScanPriority,
    /// Mask of [`ScanEventType`] bits the host wants reported.
    pub notify_scan_events: u32,
    pub dwell_time_active: u32,
    pub dwell_time_passive: u32,
    pub min_rest_time: u32,
    pub max_rest_time: u32,
    pub repeat_probe_time: u32,
    pub probe_spacing_time: u32,
    pub idle_time: u32,
    pub max_scan_time: u32,
    pub probe_delay: u32,
    pub scan_ctrl_flags: u32,
    pub burst_duration: u32,
    /// Channel frequencies in MHz.
    pub channels: Vec<u32>,
    pub ssids: Vec<Ssid>,
    pub bssids: Vec<MacAddr>,
    pub ie: Bytes,
}

impl Default for StartScanArg {
    fn default() -> Self {
        Self {
            scan_id: 0,
            scan_req_id: 1,
            vdev_id: 0,
            scan_priority: ScanPriority::Low,
            notify_scan_events: ScanEventType::STARTED.bits()
                | ScanEventType::COMPLETED.bits()
                | ScanEventType::BSS_CHANNEL.bits()
                | ScanEventType::FOREIGN_CHANNEL.bits()
                | ScanEventType::DEQUEUED.bits(),
            dwell_time_active: 50,
            dwell_time_passive: 150,
            min_rest_time: 50,
            max_rest_time: 500,
            repeat_probe_time: 0,
            probe_spacing_time: 0,
            idle_time: 0,
            max_scan_time: 20000,
            probe_delay: 5,
            scan_ctrl_flags: SCAN_ADD_OFDM_RATES | SCAN_CHAN_STAT_EVENT,
            burst_duration: 0,
            channels: Vec::new(),
            ssids: Vec::new(),
            bssids: vec![MacAddr::BROADCAST],
            ie: Bytes::new(),
        }
    }
}

impl StartScanArg {
    fn blocks(&self) -> [TlvBlock; 4] {
        [
            TlvBlock::ChannelList(self.channels.clone()),
            TlvBlock::SsidList(self.ssids.clone()),
            TlvBlock::BssidList(self.bssids.clone()),
            TlvBlock::Ie(self.ie.clone()),
        ]
    }
}

impl Record for StartScanArg {
    const NAME: &'static str = "start_scan";

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[
            self.scan_id,
            self.scan_req_id,
            self.vdev_id,
            self.scan_priority as u32,
            self.notify_scan_events,
            self.dwell_time_active,
            self.dwell_time_passive,
            self.min_rest_time,
            self.max_rest_time,
            self.repeat_probe_time,
            self.probe_spacing_time,
            self.idle_time,
            self.max_scan_time,
            self.probe_delay,
            self.scan_ctrl_flags,
        ]);
        put_main_only(ctx, w, self.burst_duration);
        tlv::write_blocks(&self.blocks(), w)?;
        Ok(())
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(if ctx.is_tenx() { 15 * 4 } else { 16 * 4 })?;
        let [scan_id, scan_req_id, vdev_id, priority] = r.get_words::<4>()?;
        let [notify_scan_events, dwell_time_active, dwell_time_passive, min_rest_time, max_rest_time] =
            r.get_words::<5>()?;
        let [repeat_probe_time, probe_spacing_time, idle_time, max_scan_time, probe_delay, scan_ctrl_flags] =
            r.get_words::<6>()?;
        let burst_duration = get_main_only(ctx, r)?;

        let mut arg = Self {
            scan_id,
            scan_req_id,
            vdev_id,
            scan_priority: ScanPriority::from_u32(priority)?,
            notify_scan_events,
            dwell_time_active,
            dwell_time_passive,
            min_rest_time,
            max_rest_time,
            repeat_probe_time,
            probe_spacing_time,
            idle_time,
            max_scan_time,
            probe_delay,
            scan_ctrl_flags,
            burst_duration,
            channels: Vec::new(),
            ssids: Vec::new(),
            bssids: Vec::new(),
            ie: Bytes::new(),
        };

        let parsed = tlv::parse_from(r)?;
        if let TlvParse::Partial { offset, .. } = &parsed {
            warn!(offset, "start_scan tlv tail is truncated");
        }
        for block in parsed.into_blocks() {
            match block {
                TlvBlock::ChannelList(v) => arg.channels = v,
                TlvBlock::SsidList(v) => arg.ssids = v,
                TlvBlock::BssidList(v) => arg.bssids = v,
                TlvBlock::Ie(ie) => arg.ie = ie,
            }
        }
        Ok(arg)
    }
}

impl CommandRecord for StartScanArg {
    const COMMANDS: &'static [Command] = &[Command::StartScan];
}

/// Which scans a STOP_SCAN cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopScanTarget {
    One { scan_id: u32 },
    VdevAll { vdev_id: u32 },
    All,
}

impl StopScanTarget {
    pub const ONE: u32 = 0x0000_0000;
    pub const VDEV_ALL: u32 = 0x0100_0000;
    pub const ALL: u32 = 0x0400_0000;

    pub fn req_type(self) -> u32 {
        match self {
            StopScanTarget::One { .. } => Self::ONE,
            StopScanTarget::VdevAll { .. } => Self::VDEV_ALL,
            StopScanTarget::All => Self::ALL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopScanArg {
    pub req_id: u32,
    pub target: StopScanTarget,
}

impl Record for StopScanArg {
    const NAME: &'static str = "stop_scan";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        let (scan_id, vdev_id) = match self.target {
            StopScanTarget::One { scan_id } => (scan_id, 0),
            StopScanTarget::VdevAll { vdev_id } => (0, vdev_id),
            StopScanTarget::All => (0, 0),
        };
        w.put_words(&[self.req_id, scan_id, self.target.req_type(), vdev_id]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4 * 4)?;
        let [req_id, scan_id, req_type, vdev_id] = r.get_words::<4>()?;
        let target = match req_type {
            StopScanTarget::ONE => StopScanTarget::One { scan_id },
            StopScanTarget::VDEV_ALL => StopScanTarget::VdevAll { vdev_id },
            StopScanTarget::ALL => StopScanTarget::All,
            value => {
                return Err(WireError::InvalidValue {
                    field: "req_type",
                    value,
                }
                .into())
            }
        };
        Ok(Self { req_id, target })
    }
}

impl CommandRecord for StopScanArg {
    const COMMANDS: &'static [Command] = &[Command::StopScan];
}

/// SCAN_CHAN_LIST: the regulatory channel set the firmware may scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanChanListArg {
    pub channels: Vec<ChannelArg>,
}

impl Record for ScanChanListArg {
    const NAME: &'static str = "scan_chan_list";

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        check_count("num_scan_chans", self.channels.len(), MAX_CHANNELS)?;
        w.put_u32(self.channels.len() as u32);
        for channel in &self.channels {
            channel.encode(ctx, w)?;
        }
        Ok(())
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4)?;
        let count = r.get_count("num_scan_chans", MAX_CHANNELS)?;
        r.require(count * ChannelArg::WIRE_SIZE)?;
        let channels = (0..count)
            .map(|_| ChannelArg::decode(ctx, r))
            .collect::<Result<_>>()?;
        Ok(Self { channels })
    }
}

impl CommandRecord for ScanChanListArg {
    const COMMANDS: &'static [Command] = &[Command::ScanChanList];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PhyMode;
    use crate::generation::ProtocolGeneration;
    use athwmi_wire::tlv::{CHAN_LIST_TAG, SSID_LIST_TAG};

    fn word(bytes: &[u8], index: usize) -> u32 {
        let at = index * 4;
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn stock_defaults() {
        let arg = StartScanArg::default();
        assert_eq!(arg.scan_req_id, 1);
        assert_eq!(arg.scan_priority, ScanPriority::Low);
        assert_eq!(arg.notify_scan_events, 0x1F);
        assert_eq!(arg.scan_ctrl_flags, 0x18);
        assert_eq!(arg.max_scan_time, 20000);
        assert_eq!(arg.bssids, vec![MacAddr::BROADCAST]);
    }

    #[test]
    fn main_header_then_channels_then_ssids() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let arg = StartScanArg {
            scan_id: HOST_SCAN_REQ_ID_PREFIX | 3,
            vdev_id: 1,
            burst_duration: 7,
            channels: vec![2412, 2437],
            ssids: vec![Ssid::new(&b"lab"[..]).unwrap()],
            bssids: Vec::new(),
            ..Default::default()
        };
        let bytes = arg.to_bytes(&ctx).unwrap();
        assert_eq!(bytes.len(), 64 + (8 + 8) + (8 + 36));
        assert_eq!(word(&bytes, 15), 7);
        assert_eq!(word(&bytes, 16), CHAN_LIST_TAG);
        assert_eq!(word(&bytes, 17), 2);
        assert_eq!(word(&bytes, 20), SSID_LIST_TAG);
        assert_eq!(StartScanArg::from_bytes(&ctx, bytes).unwrap(), arg);
    }

    #[test]
    fn tenx_header_has_no_burst_duration() {
        let ctx = AbiContext::new(ProtocolGeneration::TenX);
        let arg = StartScanArg {
            burst_duration: 7,
            bssids: Vec::new(),
            channels: vec![5180],
            ..Default::default()
        };
        let bytes = arg.to_bytes(&ctx).unwrap();
        assert_eq!(bytes.len(), 60 + 12);
        assert_eq!(word(&bytes, 15), CHAN_LIST_TAG);
        let decoded = StartScanArg::from_bytes(&ctx, bytes).unwrap();
        assert_eq!(decoded.burst_duration, 0);
        assert_eq!(decoded.channels, vec![5180]);
    }

    #[test]
    fn too_many_bssids_fail_encode() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let arg = StartScanArg {
            bssids: vec![MacAddr::BROADCAST; 5],
            ..Default::default()
        };
        assert!(arg.to_bytes(&ctx).is_err());
    }

    #[test]
    fn stop_scan_targets() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let stop = StopScanArg {
            req_id: 1,
            target: StopScanTarget::VdevAll { vdev_id: 2 },
        };
        let bytes = stop.to_bytes(&ctx).unwrap();
        assert_eq!(word(&bytes, 2), 0x0100_0000);
        assert_eq!(word(&bytes, 3), 2);
        assert_eq!(StopScanArg::from_bytes(&ctx, bytes).unwrap(), stop);

        let mut w = RecordWriter::new();
        w.put_words(&[1, 0, 0x0200_0000, 0]);
        assert!(StopScanArg::from_bytes(&ctx, w.freeze()).is_err());
    }

    #[test]
    fn chan_list_count_precedes_records() {
        let ctx = AbiContext::new(ProtocolGeneration::TenX);
        let list = ScanChanListArg {
            channels: vec![
                ChannelArg {
                    freq: 2412,
                    band_center_freq1: 2412,
                    mode: PhyMode::Mode11ngHt20,
                    ..Default::default()
                },
                ChannelArg {
                    freq: 5260,
                    band_center_freq1: 5260,
                    mode: PhyMode::Mode11a,
                    passive: true,
                    chan_radar: true,
                    ..Default::default()
                },
            ],
        };
        let bytes = list.to_bytes(&ctx).unwrap();
        assert_eq!(bytes.len(), 4 + 2 * ChannelArg::WIRE_SIZE);
        assert_eq!(ScanChanListArg::from_bytes(&ctx, bytes).unwrap(), list);
    }
}
