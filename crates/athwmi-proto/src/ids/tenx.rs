//! 10.x numbering.
//!
//! Commands and events are numbered sequentially inside a single window
//! instead of per group. A handful of ids sit outside the sequence.

use super::{Command as C, Event as E, IdBlock, IdTable};
use crate::generation::ProtocolGeneration;

pub const WINDOW_START: u32 = 0x9000;
pub const WINDOW_END: u32 = 0x9FFF;

/// INIT follows the window end and is not part of it.
pub const INIT_ID: u32 = WINDOW_END + 1;
/// UTF is pinned just below the window end for both directions.
pub const PDEV_UTF_ID: u32 = WINDOW_END - 1;

const READY_BASE: u32 = 0x8000;

pub static COMMANDS: IdTable<C> = IdTable {
    generation: ProtocolGeneration::TenX,
    blocks: &[IdBlock {
        base: WINDOW_START,
        members: &[
            C::StartScan,
            C::StopScan,
            C::ScanChanList,
            C::Echo,
            C::PdevSetRegdomain,
            C::PdevSetChannel,
            C::PdevSetParam,
            C::PdevPktlogEnable,
            C::PdevPktlogDisable,
            C::PdevSetWmmParams,
            C::PdevSetHtCapIe,
            C::PdevSetVhtCapIe,
            C::PdevSetBaseMacaddr,
            C::PdevSetDscpTidMap,
            C::PdevSetQuietMode,
            C::PdevGreenApPsEnable,
            C::PdevGetTpcConfig,
            C::VdevCreate,
            C::VdevDelete,
            C::VdevStartRequest,
            C::VdevRestartRequest,
            C::VdevUp,
            C::VdevStop,
            C::VdevDown,
            C::VdevStandbyResponse,
            C::VdevResumeResponse,
            C::VdevSetParam,
            C::VdevInstallKey,
            C::PeerCreate,
            C::PeerDelete,
            C::PeerFlushTids,
            C::PeerSetParam,
            C::PeerAssoc,
            C::PeerAddWdsEntry,
            C::PeerRemoveWdsEntry,
            C::PeerMcastGroup,
            C::BcnTx,
            C::BcnPrbTmpl,
            C::BcnFilterRx,
            C::PrbReqFilterRx,
            C::MgmtTx,
            C::AddbaClearResp,
            C::AddbaSend,
            C::AddbaStatus,
            C::DelbaSend,
            C::AddbaSetResp,
            C::SendSingleamsdu,
            C::StaPowersaveMode,
            C::StaPowersaveParam,
            C::StaMimoPsMode,
            C::DbglogCfg,
            C::PdevDfsEnable,
            C::PdevDfsDisable,
            C::PdevQvit,
            C::RoamScanMode,
            C::RoamScanRssiThreshold,
            C::RoamScanPeriod,
            C::RoamScanRssiChangeThreshold,
            C::RoamApProfile,
            C::OflScanAddApProfile,
            C::OflScanRemoveApProfile,
            C::OflScanPeriod,
            C::P2pDevSetDeviceInfo,
            C::P2pDevSetDiscoverability,
            C::P2pGoSetBeaconIe,
            C::P2pGoSetProbeRespIe,
            C::ApPsPeerParam,
            C::ApPsPeerUapsdCoex,
            C::PeerRateRetrySched,
            C::WlanProfileTrigger,
            C::WlanProfileSetHistIntvl,
            C::WlanProfileGetProfileData,
            C::WlanProfileEnableProfileId,
            C::WlanProfileListProfileId,
            C::PdevSuspend,
            C::PdevResume,
            C::AddBcnFilter,
            C::RmvBcnFilter,
            C::WowAddWakePattern,
            C::WowDelWakePattern,
            C::WowEnableDisableWakeEvent,
            C::WowEnable,
            C::WowHostwakeupFromSleep,
            C::RttMeasreq,
            C::RttTsf,
            C::PdevSendBcn,
            C::VdevSpectralScanConfigure,
            C::VdevSpectralScanEnable,
            C::RequestStats,
            C::GpioConfig,
            C::GpioOutput,
        ],
    }],
    pinned: &[(C::Init, INIT_ID), (C::PdevUtf, PDEV_UTF_ID)],
};

pub static EVENTS: IdTable<E> = IdTable {
    generation: ProtocolGeneration::TenX,
    blocks: &[
        IdBlock {
            base: READY_BASE,
            members: &[E::ServiceReady, E::Ready],
        },
        IdBlock {
            base: WINDOW_START,
            members: &[
                E::Scan,
                E::Echo,
                E::DebugMesg,
                E::UpdateStats,
                E::InstRssiStats,
                E::VdevStartResp,
                E::VdevStandbyReq,
                E::VdevResumeReq,
                E::VdevStopped,
                E::PeerStaKickout,
                E::HostSwba,
                E::TbttOffsetUpdate,
                E::MgmtRx,
                E::ChanInfo,
                E::PhyErr,
                E::Roam,
                E::ProfileMatch,
                E::DebugPrint,
                E::PdevQvit,
                E::WlanProfileData,
                E::RttMeasurementReport,
                E::TsfMeasurementReport,
                E::RttErrorReport,
                E::WowWakeupHost,
                E::DcsInterference,
                E::PdevTpcConfig,
                E::GpioInput,
            ],
        },
    ],
    pinned: &[(E::PdevUtf, PDEV_UTF_ID)],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_command_ids() {
        assert_eq!(COMMANDS.resolve(C::StartScan), Some(0x9000));
        assert_eq!(COMMANDS.resolve(C::Echo), Some(0x9003));
        assert_eq!(COMMANDS.resolve(C::VdevCreate), Some(0x9011));
        assert_eq!(COMMANDS.resolve(C::PeerCreate), Some(0x901C));
        assert_eq!(COMMANDS.resolve(C::RoamScanMode), Some(0x9036));
        assert_eq!(COMMANDS.resolve(C::GpioOutput), Some(0x905A));
        assert_eq!(COMMANDS.resolve(C::Init), Some(0xA000));
        assert_eq!(COMMANDS.resolve(C::PdevUtf), Some(0x9FFE));
    }

    #[test]
    fn known_event_ids() {
        assert_eq!(EVENTS.resolve(E::ServiceReady), Some(0x8000));
        assert_eq!(EVENTS.resolve(E::Ready), Some(0x8001));
        assert_eq!(EVENTS.resolve(E::Scan), Some(0x9000));
        assert_eq!(EVENTS.resolve(E::VdevStartResp), Some(0x9005));
        assert_eq!(EVENTS.resolve(E::MgmtRx), Some(0x900C));
        assert_eq!(EVENTS.resolve(E::GpioInput), Some(0x901A));
        assert_eq!(EVENTS.resolve(E::PdevUtf), Some(0x9FFE));
    }

    #[test]
    fn commands_stay_inside_window() {
        for (command, id) in COMMANDS.entries() {
            if command == C::Init {
                assert_eq!(id, WINDOW_END + 1);
                continue;
            }
            assert!(
                (WINDOW_START..=WINDOW_END).contains(&id),
                "{command:?} at {id:#x} escapes the window"
            );
        }
    }

    #[test]
    fn main_only_operations_are_absent() {
        for cmd in [
            C::ScanSchPrioTbl,
            C::BcnTmpl,
            C::PrbTmpl,
            C::P2pSetVendorIeData,
            C::GtkOffload,
            C::CsaOffloadEnable,
            C::StaKeepalive,
            C::ForceFwHang,
        ] {
            assert_eq!(COMMANDS.resolve(cmd), None, "{cmd:?}");
        }
        for event in [E::VdevInstallKeyComplete, E::GtkRekeyFail, E::CsaHandling] {
            assert_eq!(EVENTS.resolve(event), None, "{event:?}");
        }
    }
}
