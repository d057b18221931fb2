//! Main-generation numbering.

use super::{group_base, Command as C, Event as E, Group, IdBlock, IdTable};
use crate::generation::ProtocolGeneration;

/// The reserved group 0 holds only INIT for commands and the two readiness
/// events.
const RESERVED: u32 = group_base(0);

pub static COMMANDS: IdTable<C> = IdTable {
    generation: ProtocolGeneration::Main,
    blocks: &[
        IdBlock {
            base: RESERVED,
            members: &[C::Init],
        },
        IdBlock {
            base: Group::Scan.base(),
            members: &[C::StartScan, C::StopScan, C::ScanChanList, C::ScanSchPrioTbl],
        },
        IdBlock {
            base: Group::Pdev.base(),
            members: &[
                C::PdevSetRegdomain,
                C::PdevSetChannel,
                C::PdevSetParam,
                C::PdevPktlogEnable,
                C::PdevPktlogDisable,
                C::PdevSetWmmParams,
                C::PdevSetHtCapIe,
                C::PdevSetVhtCapIe,
                C::PdevSetDscpTidMap,
                C::PdevSetQuietMode,
                C::PdevGreenApPsEnable,
                C::PdevGetTpcConfig,
                C::PdevSetBaseMacaddr,
            ],
        },
        IdBlock {
            base: Group::Vdev.base(),
            members: &[
                C::VdevCreate,
                C::VdevDelete,
                C::VdevStartRequest,
                C::VdevRestartRequest,
                C::VdevUp,
                C::VdevStop,
                C::VdevDown,
                C::VdevSetParam,
                C::VdevInstallKey,
            ],
        },
        IdBlock {
            base: Group::Peer.base(),
            members: &[
                C::PeerCreate,
                C::PeerDelete,
                C::PeerFlushTids,
                C::PeerSetParam,
                C::PeerAssoc,
                C::PeerAddWdsEntry,
                C::PeerRemoveWdsEntry,
                C::PeerMcastGroup,
            ],
        },
        IdBlock {
            base: Group::Mgmt.base(),
            members: &[
                C::BcnTx,
                C::PdevSendBcn,
                C::BcnTmpl,
                C::BcnFilterRx,
                C::PrbReqFilterRx,
                C::MgmtTx,
                C::PrbTmpl,
            ],
        },
        IdBlock {
            base: Group::BaNeg.base(),
            members: &[
                C::AddbaClearResp,
                C::AddbaSend,
                C::AddbaStatus,
                C::DelbaSend,
                C::AddbaSetResp,
                C::SendSingleamsdu,
            ],
        },
        IdBlock {
            base: Group::StaPs.base(),
            members: &[C::StaPowersaveMode, C::StaPowersaveParam, C::StaMimoPsMode],
        },
        IdBlock {
            base: Group::Dfs.base(),
            members: &[C::PdevDfsEnable, C::PdevDfsDisable],
        },
        IdBlock {
            base: Group::Roam.base(),
            members: &[
                C::RoamScanMode,
                C::RoamScanRssiThreshold,
                C::RoamScanPeriod,
                C::RoamScanRssiChangeThreshold,
                C::RoamApProfile,
            ],
        },
        IdBlock {
            base: Group::OflScan.base(),
            members: &[
                C::OflScanAddApProfile,
                C::OflScanRemoveApProfile,
                C::OflScanPeriod,
            ],
        },
        IdBlock {
            base: Group::P2p.base(),
            members: &[
                C::P2pDevSetDeviceInfo,
                C::P2pDevSetDiscoverability,
                C::P2pGoSetBeaconIe,
                C::P2pGoSetProbeRespIe,
                C::P2pSetVendorIeData,
            ],
        },
        IdBlock {
            base: Group::ApPs.base(),
            members: &[C::ApPsPeerParam, C::ApPsPeerUapsdCoex],
        },
        IdBlock {
            base: Group::RateCtrl.base(),
            members: &[C::PeerRateRetrySched],
        },
        IdBlock {
            base: Group::Profile.base(),
            members: &[
                C::WlanProfileTrigger,
                C::WlanProfileSetHistIntvl,
                C::WlanProfileGetProfileData,
                C::WlanProfileEnableProfileId,
                C::WlanProfileListProfileId,
            ],
        },
        IdBlock {
            base: Group::Suspend.base(),
            members: &[C::PdevSuspend, C::PdevResume],
        },
        IdBlock {
            base: Group::BcnFilter.base(),
            members: &[C::AddBcnFilter, C::RmvBcnFilter],
        },
        IdBlock {
            base: Group::Wow.base(),
            members: &[
                C::WowAddWakePattern,
                C::WowDelWakePattern,
                C::WowEnableDisableWakeEvent,
                C::WowEnable,
                C::WowHostwakeupFromSleep,
            ],
        },
        IdBlock {
            base: Group::Rtt.base(),
            members: &[C::RttMeasreq, C::RttTsf],
        },
        IdBlock {
            base: Group::Spectral.base(),
            members: &[C::VdevSpectralScanConfigure, C::VdevSpectralScanEnable],
        },
        IdBlock {
            base: Group::Stats.base(),
            members: &[C::RequestStats],
        },
        IdBlock {
            base: Group::ArpNsOfl.base(),
            members: &[C::SetArpNsOffload],
        },
        IdBlock {
            base: Group::NloOfl.base(),
            members: &[C::NetworkListOffloadConfig],
        },
        IdBlock {
            base: Group::GtkOfl.base(),
            members: &[C::GtkOffload],
        },
        IdBlock {
            base: Group::CsaOfl.base(),
            members: &[C::CsaOffloadEnable, C::CsaOffloadChanswitch],
        },
        IdBlock {
            base: Group::Chatter.base(),
            members: &[C::ChatterSetMode],
        },
        // The station power-save extensions were appended to this group.
        IdBlock {
            base: Group::TidAddba.base(),
            members: &[
                C::PeerTidAddba,
                C::PeerTidDelba,
                C::StaDtimPsMethod,
                C::StaUapsdAutoTrig,
                C::StaKeepalive,
            ],
        },
        IdBlock {
            base: Group::Misc.base(),
            members: &[
                C::Echo,
                C::PdevUtf,
                C::DbglogCfg,
                C::PdevQvit,
                C::PdevFtmIntg,
                C::VdevSetKeepalive,
                C::VdevGetKeepalive,
                C::ForceFwHang,
            ],
        },
        IdBlock {
            base: Group::Gpio.base(),
            members: &[C::GpioConfig, C::GpioOutput],
        },
    ],
    pinned: &[],
};

pub static EVENTS: IdTable<E> = IdTable {
    generation: ProtocolGeneration::Main,
    blocks: &[
        IdBlock {
            base: RESERVED,
            members: &[E::ServiceReady, E::Ready],
        },
        IdBlock {
            base: Group::Scan.base(),
            members: &[E::Scan],
        },
        IdBlock {
            base: Group::Pdev.base(),
            members: &[E::PdevTpcConfig, E::ChanInfo, E::PhyErr],
        },
        IdBlock {
            base: Group::Vdev.base(),
            members: &[E::VdevStartResp, E::VdevStopped, E::VdevInstallKeyComplete],
        },
        IdBlock {
            base: Group::Peer.base(),
            members: &[E::PeerStaKickout],
        },
        IdBlock {
            base: Group::Mgmt.base(),
            members: &[E::MgmtRx, E::HostSwba, E::TbttOffsetUpdate],
        },
        IdBlock {
            base: Group::BaNeg.base(),
            members: &[E::TxDelbaComplete, E::TxAddbaComplete],
        },
        IdBlock {
            base: Group::Roam.base(),
            members: &[E::Roam, E::ProfileMatch],
        },
        IdBlock {
            base: Group::Wow.base(),
            members: &[E::WowWakeupHost],
        },
        IdBlock {
            base: Group::Rtt.base(),
            members: &[
                E::RttMeasurementReport,
                E::TsfMeasurementReport,
                E::RttErrorReport,
            ],
        },
        IdBlock {
            base: Group::GtkOfl.base(),
            members: &[E::GtkOffloadStatus, E::GtkRekeyFail],
        },
        IdBlock {
            base: Group::CsaOfl.base(),
            members: &[E::CsaHandling],
        },
        IdBlock {
            base: Group::Misc.base(),
            members: &[
                E::Echo,
                E::PdevUtf,
                E::DebugMesg,
                E::UpdateStats,
                E::DebugPrint,
                E::DcsInterference,
                E::PdevQvit,
                E::WlanProfileData,
                E::PdevFtmIntg,
                E::WlanFreqAvoid,
                E::VdevGetKeepalive,
            ],
        },
        IdBlock {
            base: Group::Gpio.base(),
            members: &[E::GpioInput],
        },
    ],
    pinned: &[],
};
