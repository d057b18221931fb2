use std::fmt;

use athwmi_wire::{RecordReader, RecordWriter};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generation::AbiContext;
use crate::record::Record;

/// Scan progress bits; also used as the notify mask in START_SCAN.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanEventType(u32);

impl ScanEventType {
    pub const STARTED: Self = Self(0x1);
    pub const COMPLETED: Self = Self(0x2);
    pub const BSS_CHANNEL: Self = Self(0x4);
    pub const FOREIGN_CHANNEL: Self = Self(0x8);
    pub const DEQUEUED: Self = Self(0x10);
    pub const PREEMPTED: Self = Self(0x20);
    pub const START_FAILED: Self = Self(0x40);
    pub const RESTARTED: Self = Self(0x80);

    const NAMES: [(Self, &'static str); 8] = [
        (Self::STARTED, "started"),
        (Self::COMPLETED, "completed"),
        (Self::BSS_CHANNEL, "bss_channel"),
        (Self::FOREIGN_CHANNEL, "foreign_channel"),
        (Self::DEQUEUED, "dequeued"),
        (Self::PREEMPTED, "preempted"),
        (Self::START_FAILED, "start_failed"),
        (Self::RESTARTED, "restarted"),
    ];

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ScanEventType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for ScanEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut rest = self.0;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
                rest &= !flag.0;
            }
        }
        if rest != 0 || first {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{rest:#x}")?;
        }
        Ok(())
    }
}

/// Why a scan ended. Firmware may report reasons this host has no name for.
///
/// Serializes as the raw reason code, so every value maps back to the same
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ScanCompletionReason {
    Completed,
    Cancelled,
    Preempted,
    Timedout,
    Other(UnknownReason),
}

/// A reason code outside the named set. Only built by
/// [`ScanCompletionReason::from_u32`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownReason(u32);

impl UnknownReason {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl ScanCompletionReason {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => ScanCompletionReason::Completed,
            1 => ScanCompletionReason::Cancelled,
            2 => ScanCompletionReason::Preempted,
            3 => ScanCompletionReason::Timedout,
            other => ScanCompletionReason::Other(UnknownReason(other)),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            ScanCompletionReason::Completed => 0,
            ScanCompletionReason::Cancelled => 1,
            ScanCompletionReason::Preempted => 2,
            ScanCompletionReason::Timedout => 3,
            ScanCompletionReason::Other(reason) => reason.value(),
        }
    }
}

impl From<u32> for ScanCompletionReason {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl From<ScanCompletionReason> for u32 {
    fn from(reason: ScanCompletionReason) -> Self {
        reason.as_u32()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanEvent {
    pub event_type: ScanEventType,
    pub reason: ScanCompletionReason,
    /// MHz; only meaningful for channel events.
    pub channel_freq: u32,
    pub scan_req_id: u32,
    pub scan_id: u32,
    pub vdev_id: u32,
}

impl ScanEvent {
    pub const WIRE_SIZE: usize = 6 * 4;

    /// The scan is over, one way or another.
    pub fn is_terminal(&self) -> bool {
        self.event_type.contains(ScanEventType::COMPLETED)
            || self.event_type.contains(ScanEventType::START_FAILED)
    }
}

impl Record for ScanEvent {
    const NAME: &'static str = "scan_event";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[
            self.event_type.bits(),
            self.reason.as_u32(),
            self.channel_freq,
            self.scan_req_id,
            self.scan_id,
            self.vdev_id,
        ]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::WIRE_SIZE)?;
        let [event_type, reason, channel_freq, scan_req_id, scan_id, vdev_id] =
            r.get_words::<6>()?;
        Ok(Self {
            event_type: ScanEventType::from_bits(event_type),
            reason: ScanCompletionReason::from_u32(reason),
            channel_freq,
            scan_req_id,
            scan_id,
            vdev_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ProtocolGeneration;

    #[test]
    fn completed_with_unknown_reason() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let mut w = RecordWriter::new();
        w.put_words(&[0x2, 9, 0, 0xA001, 3, 0]);
        let event = ScanEvent::from_bytes(&ctx, w.freeze()).unwrap();
        assert!(event.is_terminal());
        assert!(matches!(event.reason, ScanCompletionReason::Other(r) if r.value() == 9));
        assert_eq!(event.scan_req_id, 0xA001);
        assert_eq!(event.to_bytes(&ctx).unwrap().len(), ScanEvent::WIRE_SIZE);
    }

    #[test]
    fn reason_codes_map_back_to_one_variant() {
        for code in [0, 1, 2, 3, 4, 9, u32::MAX] {
            let reason = ScanCompletionReason::from_u32(code);
            assert_eq!(reason.as_u32(), code);
            assert_eq!(ScanCompletionReason::from_u32(reason.as_u32()), reason);
        }
        assert_eq!(ScanCompletionReason::from_u32(2), ScanCompletionReason::Preempted);

        let json = serde_json::to_string(&ScanCompletionReason::Timedout).unwrap();
        assert_eq!(json, "3");
        let parsed: ScanCompletionReason = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, ScanCompletionReason::Cancelled);
    }

    #[test]
    fn foreign_channel_is_not_terminal() {
        let event = ScanEvent {
            event_type: ScanEventType::FOREIGN_CHANNEL,
            reason: ScanCompletionReason::Completed,
            channel_freq: 5180,
            scan_req_id: 1,
            scan_id: 1,
            vdev_id: 0,
        };
        assert!(!event.is_terminal());
    }

    #[test]
    fn event_type_debug_names_bits() {
        let mask = ScanEventType::STARTED | ScanEventType::COMPLETED;
        assert_eq!(format!("{mask:?}"), "started|completed");
        assert_eq!(format!("{:?}", ScanEventType::from_bits(0x102)), "completed|0x100");
        assert_eq!(format!("{:?}", ScanEventType::default()), "0x0");
    }
}
