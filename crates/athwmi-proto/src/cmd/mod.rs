//! Command argument records.
//!
//! Each argument type implements [`Record`](crate::record::Record) for its
//! wire layout and [`CommandRecord`](crate::record::CommandRecord) for the
//! commands it may be sent as.

pub mod init;
pub mod mgmt;
pub mod misc;
pub mod pdev;
pub mod peer;
pub mod power;
pub mod scan;
pub mod vdev;

pub use init::{HostMemoryChunk, InitCmd, ResourceConfig};
pub use mgmt::{BcnTxArg, MgmtTxArg};
pub use misc::{
    CsaChanswitchArg, CsaOffloadEnableArg, DbglogCfgArg, DbglogLevel, EchoArg, ForceFwHangArg,
    FwHangType,
};
pub use pdev::{
    DscpTidMapArg, GetTpcConfigArg, PdevSetParamArg, QuietModeArg, RegdomainArg, RequestStatsArg,
    StatsId, SuspendArg, SuspendOpt, WmmParams, WmmParamsArg,
};
pub use peer::{
    AddWdsEntryArg, PeerArg, PeerAssocArg, PeerFlushTidsArg, PeerSetParamArg, RateSet,
    RemoveWdsEntryArg, VhtRateSet,
};
pub use power::{
    ApPsPeerArg, ArpResponse, KeepaliveArg, KeepaliveMethod, MimoPsModeArg, StaPsModeArg,
    StaPsParamArg,
};
pub use scan::{ScanChanListArg, ScanPriority, StartScanArg, StopScanArg, StopScanTarget};
pub use vdev::{
    Cipher, InstallKeyArg, KeySeqCounter, NoaDescriptor, VdevCreateArg, VdevIdArg,
    VdevSetParamArg, VdevStartRequestArg, VdevSubtype, VdevType, VdevUpArg,
};
