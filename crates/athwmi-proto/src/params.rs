//! Parameter ids carried by the `*_SET_PARAM` commands.
//!
//! Physical and virtual device parameters are numbered differently by the
//! two generations: each generation lists its parameters sequentially from
//! 1 and the lists diverge part way through. Peer and power-save parameters
//! share one numbering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};
use crate::generation::ProtocolGeneration;
use crate::ids::IdBlock;

/// Wire value of a parameter the active generation does not define.
pub const PARAM_UNSUPPORTED: u32 = 0;

fn lookup<T: Copy + PartialEq + fmt::Debug>(
    kind: &'static str,
    table: &IdBlock<T>,
    param: T,
    generation: ProtocolGeneration,
) -> Result<u32> {
    table.id_of(param).ok_or_else(|| ProtoError::UnsupportedParam {
        kind,
        param: format!("{param:?}"),
        generation,
    })
}

fn reverse<T: Copy>(kind: &'static str, table: &IdBlock<T>, id: u32) -> Result<T> {
    id.checked_sub(table.base)
        .and_then(|k| table.members.get(k as usize))
        .copied()
        .ok_or(ProtoError::UnknownParam { kind, id })
}

/// Physical device parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdevParam {
    TxChainMask,
    RxChainMask,
    TxpowerLimit2g,
    TxpowerLimit5g,
    TxpowerScale,
    BeaconGenMode,
    BeaconTxMode,
    ResmgrOffchanMode,
    ProtectionMode,
    DynamicBw,
    NonAggSwRetryTh,
    AggSwRetryTh,
    StaKickoutTh,
    AcAggrsizeScaling,
    LtrEnable,
    LtrAcLatencyBe,
    LtrAcLatencyBk,
    LtrAcLatencyVi,
    LtrAcLatencyVo,
    LtrAcLatencyTimeout,
    LtrSleepOverride,
    LtrRxOverride,
    LtrTxActivityTimeout,
    L1ssEnable,
    DsleepEnable,
    PcielpTxbufFlush,
    PcielpTxbufWatermark,
    PcielpTxbufTmoEn,
    PcielpTxbufTmoValue,
    PdevStatsUpdatePeriod,
    VdevStatsUpdatePeriod,
    PeerStatsUpdatePeriod,
    BcnfltStatsUpdatePeriod,
    PmfQos,
    /// ARP (Main) or ARP and DHCP (10.x) access-category override.
    ArpAcOverride,
    Dcs,
    AniEnable,
    AniPollPeriod,
    AniListenPeriod,
    AniOfdmLevel,
    AniCckLevel,
    Dyntxchain,
    ProxySta,
    IdlePsConfig,
    PowerGatingSleep,
    FastChannelReset,
    BurstDur,
    BurstEnable,
}

use PdevParam as P;

static MAIN_PDEV: IdBlock<PdevParam> = IdBlock {
    base: 1,
    members: &[
        P::TxChainMask,
        P::RxChainMask,
        P::TxpowerLimit2g,
        P::TxpowerLimit5g,
        P::TxpowerScale,
        P::BeaconGenMode,
        P::BeaconTxMode,
        P::ResmgrOffchanMode,
        P::ProtectionMode,
        P::DynamicBw,
        P::NonAggSwRetryTh,
        P::AggSwRetryTh,
        P::StaKickoutTh,
        P::AcAggrsizeScaling,
        P::LtrEnable,
        P::LtrAcLatencyBe,
        P::LtrAcLatencyBk,
        P::LtrAcLatencyVi,
        P::LtrAcLatencyVo,
        P::LtrAcLatencyTimeout,
        P::LtrSleepOverride,
        P::LtrRxOverride,
        P::LtrTxActivityTimeout,
        P::L1ssEnable,
        P::DsleepEnable,
        P::PcielpTxbufFlush,
        P::PcielpTxbufWatermark,
        P::PcielpTxbufTmoEn,
        P::PcielpTxbufTmoValue,
        P::PdevStatsUpdatePeriod,
        P::VdevStatsUpdatePeriod,
        P::PeerStatsUpdatePeriod,
        P::BcnfltStatsUpdatePeriod,
        P::PmfQos,
        P::ArpAcOverride,
        P::Dcs,
        P::AniEnable,
        P::AniPollPeriod,
        P::AniListenPeriod,
        P::AniOfdmLevel,
        P::AniCckLevel,
        P::Dyntxchain,
        P::ProxySta,
        P::IdlePsConfig,
        P::PowerGatingSleep,
    ],
};

static TENX_PDEV: IdBlock<PdevParam> = IdBlock {
    base: 1,
    members: &[
        P::TxChainMask,
        P::RxChainMask,
        P::TxpowerLimit2g,
        P::TxpowerLimit5g,
        P::TxpowerScale,
        P::BeaconGenMode,
        P::BeaconTxMode,
        P::ResmgrOffchanMode,
        P::ProtectionMode,
        P::DynamicBw,
        P::NonAggSwRetryTh,
        P::AggSwRetryTh,
        P::StaKickoutTh,
        P::AcAggrsizeScaling,
        P::LtrEnable,
        P::LtrAcLatencyBe,
        P::LtrAcLatencyBk,
        P::LtrAcLatencyVi,
        P::LtrAcLatencyVo,
        P::LtrAcLatencyTimeout,
        P::LtrSleepOverride,
        P::LtrRxOverride,
        P::LtrTxActivityTimeout,
        P::L1ssEnable,
        P::DsleepEnable,
        P::PdevStatsUpdatePeriod,
        P::VdevStatsUpdatePeriod,
        P::PeerStatsUpdatePeriod,
        P::BcnfltStatsUpdatePeriod,
        P::PmfQos,
        P::ArpAcOverride,
        P::Dcs,
        P::AniEnable,
        P::AniPollPeriod,
        P::AniListenPeriod,
        P::AniOfdmLevel,
        P::AniCckLevel,
        P::Dyntxchain,
        P::FastChannelReset,
        P::BurstDur,
        P::BurstEnable,
    ],
};

impl PdevParam {
    const KIND: &'static str = "pdev";

    fn table(generation: ProtocolGeneration) -> &'static IdBlock<PdevParam> {
        match generation {
            ProtocolGeneration::Main => &MAIN_PDEV,
            ProtocolGeneration::TenX => &TENX_PDEV,
        }
    }

    /// Numeric id, or [`PARAM_UNSUPPORTED`].
    pub fn id(self, generation: ProtocolGeneration) -> u32 {
        Self::table(generation)
            .id_of(self)
            .unwrap_or(PARAM_UNSUPPORTED)
    }

    pub fn resolve(self, generation: ProtocolGeneration) -> Result<u32> {
        lookup(Self::KIND, Self::table(generation), self, generation)
    }

    pub fn from_id(id: u32, generation: ProtocolGeneration) -> Result<Self> {
        reverse(Self::KIND, Self::table(generation), id)
    }
}

/// Virtual device parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VdevParam {
    RtsThreshold,
    FragmentationThreshold,
    BeaconInterval,
    ListenInterval,
    MulticastRate,
    MgmtTxRate,
    SlotTime,
    Preamble,
    SwbaTime,
    StatsUpdatePeriod,
    PwrsaveAgeoutTime,
    HostSwbaInterval,
    DtimPeriod,
    OcSchedulerAirTimeLimit,
    Wds,
    AtimWindow,
    BmissCountMax,
    BmissFirstBcnt,
    BmissFinalBcnt,
    FeatureWmm,
    Chwidth,
    Chextoffset,
    DisableHtprotection,
    StaQuickkickout,
    MgmtRate,
    ProtectionMode,
    FixedRate,
    Sgi,
    Ldpc,
    TxStbc,
    RxStbc,
    IntraBssFwd,
    DefKeyid,
    Nss,
    BcastDataRate,
    McastDataRate,
    McastIndicate,
    DhcpIndicate,
    UnknownDestIndicate,
    ApKeepaliveMinIdleInactiveTimeSecs,
    ApKeepaliveMaxIdleInactiveTimeSecs,
    ApKeepaliveMaxUnresponsiveTimeSecs,
    ApEnableNawds,
    Mcast2ucastSet,
    EnableRtscts,
    Txbf,
    PacketPowersave,
    DropUnencry,
    TxEncapType,
    ApDetectOutOfSyncSleepingStaTimeSecs,
}

use VdevParam as V;

static MAIN_VDEV: IdBlock<VdevParam> = IdBlock {
    base: 1,
    members: &[
        V::RtsThreshold,
        V::FragmentationThreshold,
        V::BeaconInterval,
        V::ListenInterval,
        V::MulticastRate,
        V::MgmtTxRate,
        V::SlotTime,
        V::Preamble,
        V::SwbaTime,
        V::StatsUpdatePeriod,
        V::PwrsaveAgeoutTime,
        V::HostSwbaInterval,
        V::DtimPeriod,
        V::OcSchedulerAirTimeLimit,
        V::Wds,
        V::AtimWindow,
        V::BmissCountMax,
        V::BmissFirstBcnt,
        V::BmissFinalBcnt,
        V::FeatureWmm,
        V::Chwidth,
        V::Chextoffset,
        V::DisableHtprotection,
        V::StaQuickkickout,
        V::MgmtRate,
        V::ProtectionMode,
        V::FixedRate,
        V::Sgi,
        V::Ldpc,
        V::TxStbc,
        V::RxStbc,
        V::IntraBssFwd,
        V::DefKeyid,
        V::Nss,
        V::BcastDataRate,
        V::McastDataRate,
        V::McastIndicate,
        V::DhcpIndicate,
        V::UnknownDestIndicate,
        V::ApKeepaliveMinIdleInactiveTimeSecs,
        V::ApKeepaliveMaxIdleInactiveTimeSecs,
        V::ApKeepaliveMaxUnresponsiveTimeSecs,
        V::ApEnableNawds,
        V::EnableRtscts,
        V::Txbf,
        V::PacketPowersave,
        V::DropUnencry,
        V::TxEncapType,
    ],
};

static TENX_VDEV: IdBlock<VdevParam> = IdBlock {
    base: 1,
    members: &[
        V::RtsThreshold,
        V::FragmentationThreshold,
        V::BeaconInterval,
        V::ListenInterval,
        V::MulticastRate,
        V::MgmtTxRate,
        V::SlotTime,
        V::Preamble,
        V::SwbaTime,
        V::StatsUpdatePeriod,
        V::PwrsaveAgeoutTime,
        V::HostSwbaInterval,
        V::DtimPeriod,
        V::OcSchedulerAirTimeLimit,
        V::Wds,
        V::AtimWindow,
        V::BmissCountMax,
        V::FeatureWmm,
        V::Chwidth,
        V::Chextoffset,
        V::DisableHtprotection,
        V::StaQuickkickout,
        V::MgmtRate,
        V::ProtectionMode,
        V::FixedRate,
        V::Sgi,
        V::Ldpc,
        V::TxStbc,
        V::RxStbc,
        V::IntraBssFwd,
        V::DefKeyid,
        V::Nss,
        V::BcastDataRate,
        V::McastDataRate,
        V::McastIndicate,
        V::DhcpIndicate,
        V::UnknownDestIndicate,
        V::ApKeepaliveMinIdleInactiveTimeSecs,
        V::ApKeepaliveMaxIdleInactiveTimeSecs,
        V::ApKeepaliveMaxUnresponsiveTimeSecs,
        V::ApEnableNawds,
        V::Mcast2ucastSet,
        V::EnableRtscts,
        V::ApDetectOutOfSyncSleepingStaTimeSecs,
    ],
};

impl VdevParam {
    const KIND: &'static str = "vdev";

    fn table(generation: ProtocolGeneration) -> &'static IdBlock<VdevParam> {
        match generation {
            ProtocolGeneration::Main => &MAIN_VDEV,
            ProtocolGeneration::TenX => &TENX_VDEV,
        }
    }

    /// Numeric id, or [`PARAM_UNSUPPORTED`].
    pub fn id(self, generation: ProtocolGeneration) -> u32 {
        Self::table(generation)
            .id_of(self)
            .unwrap_or(PARAM_UNSUPPORTED)
    }

    pub fn resolve(self, generation: ProtocolGeneration) -> Result<u32> {
        lookup(Self::KIND, Self::table(generation), self, generation)
    }

    pub fn from_id(id: u32, generation: ProtocolGeneration) -> Result<Self> {
        reverse(Self::KIND, Self::table(generation), id)
    }
}

/// Peer parameters, shared by both generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum PeerParam {
    SmpsState = 1,
    Ampdu = 2,
    Authorize = 3,
    ChanWidth = 4,
    Nss = 5,
    Use4Addr = 6,
}

impl PeerParam {
    pub const ALL: [PeerParam; 6] = [
        PeerParam::SmpsState,
        PeerParam::Ampdu,
        PeerParam::Authorize,
        PeerParam::ChanWidth,
        PeerParam::Nss,
        PeerParam::Use4Addr,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.id() == id)
            .ok_or(ProtoError::UnknownParam { kind: "peer", id })
    }
}

/// Station power-save parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum StaPsParam {
    RxWakePolicy = 0,
    TxWakeThreshold = 1,
    PspollCount = 2,
    InactivityTime = 3,
    Uapsd = 4,
}

impl StaPsParam {
    pub const ALL: [StaPsParam; 5] = [
        StaPsParam::RxWakePolicy,
        StaPsParam::TxWakeThreshold,
        StaPsParam::PspollCount,
        StaPsParam::InactivityTime,
        StaPsParam::Uapsd,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.id() == id)
            .ok_or(ProtoError::UnknownParam { kind: "sta ps", id })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum StaPsMode {
    Disabled = 0,
    Enabled = 1,
}

impl StaPsMode {
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(StaPsMode::Disabled),
            1 => Ok(StaPsMode::Enabled),
            _ => Err(ProtoError::UnknownParam {
                kind: "sta ps mode",
                id,
            }),
        }
    }
}

/// Per-peer power-save parameters for AP mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ApPsParam {
    Uapsd = 0,
    MaxSp = 1,
    AgeoutTime = 2,
}

impl ApPsParam {
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(ApPsParam::Uapsd),
            1 => Ok(ApPsParam::MaxSp),
            2 => Ok(ApPsParam::AgeoutTime),
            _ => Err(ProtoError::UnknownParam { kind: "ap ps", id }),
        }
    }
}
