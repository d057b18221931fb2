//! Logical commands and events, and their numeric ids per generation.
//!
//! Each generation has its own static table in [`main`] and [`tenx`]. A table
//! is a list of [`IdBlock`]s: the members of a block take consecutive ids
//! from the block's base in declaration order. New members go at the end of
//! their block; inserting one would renumber everything after it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};
use crate::generation::ProtocolGeneration;

pub mod main;
pub mod tenx;

/// Wire value of a command with no id in the active generation.
pub const CMD_UNSUPPORTED: u32 = 0;

/// Main-generation command and event groups.
///
/// Groups 0-2 are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Group {
    Scan = 3,
    Pdev,
    Vdev,
    Peer,
    Mgmt,
    BaNeg,
    StaPs,
    Dfs,
    Roam,
    OflScan,
    P2p,
    ApPs,
    RateCtrl,
    Profile,
    Suspend,
    BcnFilter,
    Wow,
    Rtt,
    Spectral,
    Stats,
    ArpNsOfl,
    NloOfl,
    GtkOfl,
    CsaOfl,
    Chatter,
    TidAddba,
    Misc,
    Gpio,
}

impl Group {
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// First id of the group: `(index << 12) | 1`.
    pub const fn base(self) -> u32 {
        group_base(self as u32)
    }
}

/// First id of group `index`.
pub const fn group_base(index: u32) -> u32 {
    (index << 12) | 0x1
}

/// Abstract commands, independent of generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Command {
    Init,
    StartScan,
    StopScan,
    ScanChanList,
    ScanSchPrioTbl,
    PdevSetRegdomain,
    PdevSetChannel,
    PdevSetParam,
    PdevPktlogEnable,
    PdevPktlogDisable,
    PdevSetWmmParams,
    PdevSetHtCapIe,
    PdevSetVhtCapIe,
    PdevSetDscpTidMap,
    PdevSetQuietMode,
    PdevGreenApPsEnable,
    PdevGetTpcConfig,
    PdevSetBaseMacaddr,
    VdevCreate,
    VdevDelete,
    VdevStartRequest,
    VdevRestartRequest,
    VdevUp,
    VdevStop,
    VdevDown,
    VdevStandbyResponse,
    VdevResumeResponse,
    VdevSetParam,
    VdevInstallKey,
    PeerCreate,
    PeerDelete,
    PeerFlushTids,
    PeerSetParam,
    PeerAssoc,
    PeerAddWdsEntry,
    PeerRemoveWdsEntry,
    PeerMcastGroup,
    BcnTx,
    PdevSendBcn,
    BcnTmpl,
    BcnPrbTmpl,
    BcnFilterRx,
    PrbReqFilterRx,
    MgmtTx,
    PrbTmpl,
    AddbaClearResp,
    AddbaSend,
    AddbaStatus,
    DelbaSend,
    AddbaSetResp,
    SendSingleamsdu,
    StaPowersaveMode,
    StaPowersaveParam,
    StaMimoPsMode,
    PdevDfsEnable,
    PdevDfsDisable,
    RoamScanMode,
    RoamScanRssiThreshold,
    RoamScanPeriod,
    RoamScanRssiChangeThreshold,
    RoamApProfile,
    OflScanAddApProfile,
    OflScanRemoveApProfile,
    OflScanPeriod,
    P2pDevSetDeviceInfo,
    P2pDevSetDiscoverability,
    P2pGoSetBeaconIe,
    P2pGoSetProbeRespIe,
    P2pSetVendorIeData,
    ApPsPeerParam,
    ApPsPeerUapsdCoex,
    PeerRateRetrySched,
    WlanProfileTrigger,
    WlanProfileSetHistIntvl,
    WlanProfileGetProfileData,
    WlanProfileEnableProfileId,
    WlanProfileListProfileId,
    PdevSuspend,
    PdevResume,
    AddBcnFilter,
    RmvBcnFilter,
    WowAddWakePattern,
    WowDelWakePattern,
    WowEnableDisableWakeEvent,
    WowEnable,
    WowHostwakeupFromSleep,
    RttMeasreq,
    RttTsf,
    VdevSpectralScanConfigure,
    VdevSpectralScanEnable,
    RequestStats,
    SetArpNsOffload,
    NetworkListOffloadConfig,
    GtkOffload,
    CsaOffloadEnable,
    CsaOffloadChanswitch,
    ChatterSetMode,
    PeerTidAddba,
    PeerTidDelba,
    StaDtimPsMethod,
    StaUapsdAutoTrig,
    StaKeepalive,
    Echo,
    PdevUtf,
    DbglogCfg,
    PdevQvit,
    PdevFtmIntg,
    VdevSetKeepalive,
    VdevGetKeepalive,
    ForceFwHang,
    GpioConfig,
    GpioOutput,
}

/// Abstract events, independent of generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Event {
    ServiceReady,
    Ready,
    Scan,
    PdevTpcConfig,
    ChanInfo,
    PhyErr,
    VdevStartResp,
    VdevStopped,
    VdevInstallKeyComplete,
    VdevStandbyReq,
    VdevResumeReq,
    PeerStaKickout,
    MgmtRx,
    HostSwba,
    TbttOffsetUpdate,
    TxDelbaComplete,
    TxAddbaComplete,
    Roam,
    ProfileMatch,
    WowWakeupHost,
    RttMeasurementReport,
    TsfMeasurementReport,
    RttErrorReport,
    GtkOffloadStatus,
    GtkRekeyFail,
    CsaHandling,
    Echo,
    PdevUtf,
    DebugMesg,
    UpdateStats,
    InstRssiStats,
    DebugPrint,
    DcsInterference,
    PdevQvit,
    WlanProfileData,
    PdevFtmIntg,
    WlanFreqAvoid,
    VdevGetKeepalive,
    GpioInput,
}

/// A run of consecutive ids starting at `base`.
#[derive(Debug)]
pub struct IdBlock<T: 'static> {
    pub base: u32,
    pub members: &'static [T],
}

impl<T: Copy + PartialEq> IdBlock<T> {
    /// Id of `op` if it belongs to this block.
    pub fn id_of(&self, op: T) -> Option<u32> {
        self.members
            .iter()
            .position(|&m| m == op)
            .map(|k| self.base + k as u32)
    }

    /// Every `(member, id)` pair in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (T, u32)> + '_ {
        self.members
            .iter()
            .enumerate()
            .map(move |(k, &m)| (m, self.base + k as u32))
    }
}

/// One generation's numbering for commands or events.
#[derive(Debug)]
pub struct IdTable<T: 'static> {
    pub generation: ProtocolGeneration,
    pub blocks: &'static [IdBlock<T>],
    /// Members with a fixed id outside any block.
    pub pinned: &'static [(T, u32)],
}

impl<T: Copy + PartialEq> IdTable<T> {
    pub fn resolve(&self, op: T) -> Option<u32> {
        self.blocks
            .iter()
            .find_map(|block| block.id_of(op))
            .or_else(|| {
                self.pinned
                    .iter()
                    .find(|(member, _)| *member == op)
                    .map(|&(_, id)| id)
            })
    }

    /// Every `(member, id)` pair in the table.
    pub fn entries(&self) -> impl Iterator<Item = (T, u32)> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.entries())
            .chain(self.pinned.iter().copied())
    }
}

fn command_table(generation: ProtocolGeneration) -> &'static IdTable<Command> {
    match generation {
        ProtocolGeneration::Main => &main::COMMANDS,
        ProtocolGeneration::TenX => &tenx::COMMANDS,
    }
}

fn event_table(generation: ProtocolGeneration) -> &'static IdTable<Event> {
    match generation {
        ProtocolGeneration::Main => &main::EVENTS,
        ProtocolGeneration::TenX => &tenx::EVENTS,
    }
}

/// Numeric id of `command`, or [`CMD_UNSUPPORTED`].
pub fn command_id(command: Command, generation: ProtocolGeneration) -> u32 {
    command_table(generation)
        .resolve(command)
        .unwrap_or(CMD_UNSUPPORTED)
}

/// Numeric id of `command`, failing if the generation lacks it.
pub fn resolve(command: Command, generation: ProtocolGeneration) -> Result<u32> {
    command_table(generation)
        .resolve(command)
        .ok_or(ProtoError::Unsupported {
            command,
            generation,
        })
}

/// Numeric id of `event` in `generation`, if it exists there.
pub fn event_id(event: Event, generation: ProtocolGeneration) -> Option<u32> {
    event_table(generation).resolve(event)
}

/// Forward and reverse id maps for one generation.
///
/// Built once at attach. Lookups of ids the host does not know return an
/// error so newer firmware cannot crash an older host.
#[derive(Debug, Clone)]
pub struct IdSpace {
    generation: ProtocolGeneration,
    commands: HashMap<Command, u32>,
    events: HashMap<Event, u32>,
    events_by_id: HashMap<u32, Event>,
}

impl IdSpace {
    pub fn new(generation: ProtocolGeneration) -> Self {
        let commands = command_table(generation).entries().collect();
        let mut events = HashMap::new();
        let mut events_by_id = HashMap::new();
        for (event, id) in event_table(generation).entries() {
            events.insert(event, id);
            events_by_id.insert(id, event);
        }
        Self {
            generation,
            commands,
            events,
            events_by_id,
        }
    }

    pub fn generation(&self) -> ProtocolGeneration {
        self.generation
    }

    pub fn command_id(&self, command: Command) -> Result<u32> {
        self.commands
            .get(&command)
            .copied()
            .ok_or(ProtoError::Unsupported {
                command,
                generation: self.generation,
            })
    }

    pub fn supports(&self, command: Command) -> bool {
        self.commands.contains_key(&command)
    }

    pub fn event_id(&self, event: Event) -> Option<u32> {
        self.events.get(&event).copied()
    }

    /// Reverse lookup for an inbound event id.
    pub fn event_for(&self, id: u32) -> Result<Event> {
        self.events_by_id
            .get(&id)
            .copied()
            .ok_or(ProtoError::UnknownEventId {
                id,
                generation: self.generation,
            })
    }
}
