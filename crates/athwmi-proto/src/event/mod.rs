//! Firmware-to-host event records.
//!
//! [`decode_event`] turns a resolved [`Event`] and its payload into a typed
//! [`WmiEvent`]. Events without a typed decoder are passed through as
//! [`WmiEvent::Unparsed`] so callers can still see them.

pub mod misc;
pub mod mgmt_rx;
pub mod phyerr;
pub mod ready;
pub mod scan;
pub mod stats;
pub mod swba;
pub mod vdev;

use bytes::Bytes;
use tracing::debug;

use crate::error::Result;
use crate::generation::AbiContext;
use crate::ids::Event;
use crate::record::Record;

pub use mgmt_rx::MgmtRxEvent;
pub use misc::{ChanInfoEvent, DebugMesg, EchoEvent};
pub use phyerr::{FftReport, PhyErr, PhyErrEvent, PhyErrReport, RadarReport};
pub use ready::{FirmwareVersion, HalRegCapabilities, MemRequest, Ready, ServiceReady};
pub use scan::{ScanCompletionReason, ScanEvent, ScanEventType, UnknownReason};
pub use stats::{PdevStats, PeerStats, RxDbgStats, StatsEvent, TxDbgStats};
pub use swba::{BeaconInfo, HostSwbaEvent, P2pNoaInfo, TbttOffsetEvent, TimInfo};
pub use vdev::{PeerStaKickout, VdevIdEvent, VdevResponseType, VdevStartResp};

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmiEvent {
    ServiceReady(ServiceReady),
    Ready(Ready),
    Scan(ScanEvent),
    VdevStartResp(VdevStartResp),
    VdevStopped(VdevIdEvent),
    VdevStandbyReq(VdevIdEvent),
    VdevResumeReq(VdevIdEvent),
    PeerStaKickout(PeerStaKickout),
    MgmtRx(MgmtRxEvent),
    PhyErr(PhyErrEvent),
    HostSwba(HostSwbaEvent),
    TbttOffsetUpdate(TbttOffsetEvent),
    UpdateStats(StatsEvent),
    ChanInfo(ChanInfoEvent),
    Echo(EchoEvent),
    DebugMesg(DebugMesg),
    /// The TPC table is passed through untouched.
    PdevTpcConfig(Bytes),
    /// A known event this host does not decode.
    Unparsed { event: Event, payload: Bytes },
}

impl WmiEvent {
    pub fn kind(&self) -> Event {
        match self {
            WmiEvent::ServiceReady(_) => Event::ServiceReady,
            WmiEvent::Ready(_) => Event::Ready,
            WmiEvent::Scan(_) => Event::Scan,
            WmiEvent::VdevStartResp(_) => Event::VdevStartResp,
            WmiEvent::VdevStopped(_) => Event::VdevStopped,
            WmiEvent::VdevStandbyReq(_) => Event::VdevStandbyReq,
            WmiEvent::VdevResumeReq(_) => Event::VdevResumeReq,
            WmiEvent::PeerStaKickout(_) => Event::PeerStaKickout,
            WmiEvent::MgmtRx(_) => Event::MgmtRx,
            WmiEvent::PhyErr(_) => Event::PhyErr,
            WmiEvent::HostSwba(_) => Event::HostSwba,
            WmiEvent::TbttOffsetUpdate(_) => Event::TbttOffsetUpdate,
            WmiEvent::UpdateStats(_) => Event::UpdateStats,
            WmiEvent::ChanInfo(_) => Event::ChanInfo,
            WmiEvent::Echo(_) => Event::Echo,
            WmiEvent::DebugMesg(_) => Event::DebugMesg,
            WmiEvent::PdevTpcConfig(_) => Event::PdevTpcConfig,
            WmiEvent::Unparsed { event, .. } => *event,
        }
    }

    /// Encode the event body as the firmware would send it.
    pub fn to_payload(&self, ctx: &AbiContext) -> Result<Bytes> {
        match self {
            WmiEvent::ServiceReady(e) => e.to_bytes(ctx),
            WmiEvent::Ready(e) => e.to_bytes(ctx),
            WmiEvent::Scan(e) => e.to_bytes(ctx),
            WmiEvent::VdevStartResp(e) => e.to_bytes(ctx),
            WmiEvent::VdevStopped(e) | WmiEvent::VdevStandbyReq(e) | WmiEvent::VdevResumeReq(e) => {
                e.to_bytes(ctx)
            }
            WmiEvent::PeerStaKickout(e) => e.to_bytes(ctx),
            WmiEvent::MgmtRx(e) => e.to_bytes(ctx),
            WmiEvent::PhyErr(e) => e.to_bytes(ctx),
            WmiEvent::HostSwba(e) => e.to_bytes(ctx),
            WmiEvent::TbttOffsetUpdate(e) => e.to_bytes(ctx),
            WmiEvent::UpdateStats(e) => e.to_bytes(ctx),
            WmiEvent::ChanInfo(e) => e.to_bytes(ctx),
            WmiEvent::Echo(e) => e.to_bytes(ctx),
            WmiEvent::DebugMesg(e) => Ok(e.raw.clone()),
            WmiEvent::PdevTpcConfig(payload) | WmiEvent::Unparsed { payload, .. } => {
                Ok(payload.clone())
            }
        }
    }
}

/// Decode the payload of an already resolved event.
///
/// A fixed header shorter than its record is an error; the caller drops the
/// event and the channel stays usable.
pub fn decode_event(ctx: &AbiContext, event: Event, payload: Bytes) -> Result<WmiEvent> {
    let decoded = match event {
        Event::ServiceReady => WmiEvent::ServiceReady(ServiceReady::from_bytes(ctx, payload)?),
        Event::Ready => WmiEvent::Ready(Ready::from_bytes(ctx, payload)?),
        Event::Scan => WmiEvent::Scan(ScanEvent::from_bytes(ctx, payload)?),
        Event::VdevStartResp => WmiEvent::VdevStartResp(VdevStartResp::from_bytes(ctx, payload)?),
        Event::VdevStopped => WmiEvent::VdevStopped(VdevIdEvent::from_bytes(ctx, payload)?),
        Event::VdevStandbyReq => WmiEvent::VdevStandbyReq(VdevIdEvent::from_bytes(ctx, payload)?),
        Event::VdevResumeReq => WmiEvent::VdevResumeReq(VdevIdEvent::from_bytes(ctx, payload)?),
        Event::PeerStaKickout => {
            WmiEvent::PeerStaKickout(PeerStaKickout::from_bytes(ctx, payload)?)
        }
        Event::MgmtRx => WmiEvent::MgmtRx(MgmtRxEvent::from_bytes(ctx, payload)?),
        Event::PhyErr => WmiEvent::PhyErr(PhyErrEvent::from_bytes(ctx, payload)?),
        Event::HostSwba => WmiEvent::HostSwba(HostSwbaEvent::from_bytes(ctx, payload)?),
        Event::TbttOffsetUpdate => {
            WmiEvent::TbttOffsetUpdate(TbttOffsetEvent::from_bytes(ctx, payload)?)
        }
        Event::UpdateStats => WmiEvent::UpdateStats(StatsEvent::from_bytes(ctx, payload)?),
        Event::ChanInfo => WmiEvent::ChanInfo(ChanInfoEvent::from_bytes(ctx, payload)?),
        Event::Echo => WmiEvent::Echo(EchoEvent::from_bytes(ctx, payload)?),
        Event::DebugMesg => WmiEvent::DebugMesg(DebugMesg::from_payload(payload)),
        Event::PdevTpcConfig => WmiEvent::PdevTpcConfig(payload),
        other => WmiEvent::Unparsed {
            event: other,
            payload,
        },
    };
    debug!(event = ?decoded.kind(), generation = ?ctx.generation(), "decoded event");
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtoError;
    use crate::generation::ProtocolGeneration;
    use athwmi_wire::{MacAddr, WireError};

    #[test]
    fn typed_events_survive_payload_round_trip() {
        let ctx = AbiContext::new(ProtocolGeneration::TenX);
        let events = [
            WmiEvent::Ready(Ready {
                sw_version: 0x0100_0001,
                abi_version: 1,
                mac: MacAddr([0, 3, 0x7f, 1, 2, 3]),
                status: 0,
            }),
            WmiEvent::VdevStandbyReq(VdevIdEvent { vdev_id: 2 }),
            WmiEvent::Echo(EchoEvent { value: 0x1234 }),
            WmiEvent::PdevTpcConfig(Bytes::from_static(&[1, 2, 3, 4])),
        ];
        for event in events {
            let payload = event.to_payload(&ctx).unwrap();
            assert_eq!(decode_event(&ctx, event.kind(), payload).unwrap(), event);
        }
    }

    #[test]
    fn undecoded_events_pass_through() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let payload = Bytes::from_static(&[9, 9, 9, 9]);
        let event = decode_event(&ctx, Event::Roam, payload.clone()).unwrap();
        assert_eq!(
            event,
            WmiEvent::Unparsed {
                event: Event::Roam,
                payload
            }
        );
        assert_eq!(event.kind(), Event::Roam);
    }

    #[test]
    fn truncated_fixed_header_fails() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let err = decode_event(&ctx, Event::Scan, Bytes::from_static(&[0; 8])).unwrap_err();
        assert!(matches!(err, ProtoError::Wire(WireError::Truncated { .. })));
    }
}
