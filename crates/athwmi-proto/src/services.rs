//! Service capability registry.
//!
//! The firmware announces the optional features it implements as a bitmap
//! in its service-ready event. The registry is built once from that bitmap
//! and only read afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::Command;

/// Highest number of services the bitmap format can describe.
pub const MAX_SERVICE: usize = 64;

/// Bitmap words carried by the service-ready event.
pub const SERVICE_BITMAP_WORDS: usize = 16;

const BITS_PER_WORD: usize = 32;

/// Services known to this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum Service {
    BeaconOffload = 0,
    ScanOffload,
    RoamOffload,
    BcnMissOffload,
    StaPwrsave,
    StaAdvancedPwrsave,
    ApUapsd,
    ApDfs,
    Ac11,
    Blockack,
    Phyerr,
    BcnFilter,
    Rtt,
    Ratectrl,
    Wow,
    RatectrlCache,
    IramTids,
    ArpnsOffload,
    Nlo,
    GtkOffload,
    ScanSch,
    CsaOffload,
    Chatter,
    CoexFreqavoid,
    PacketPowerSave,
    ForceFwHang,
    Gpio,
    StaDtimPsModulatedDtim,
    StaUapsdBasicAutoTrig,
    StaUapsdVarAutoTrig,
    StaKeepAlive,
    TxEncap,
}

impl Service {
    pub const ALL: [Service; 32] = [
        Service::BeaconOffload,
        Service::ScanOffload,
        Service::RoamOffload,
        Service::BcnMissOffload,
        Service::StaPwrsave,
        Service::StaAdvancedPwrsave,
        Service::ApUapsd,
        Service::ApDfs,
        Service::Ac11,
        Service::Blockack,
        Service::Phyerr,
        Service::BcnFilter,
        Service::Rtt,
        Service::Ratectrl,
        Service::Wow,
        Service::RatectrlCache,
        Service::IramTids,
        Service::ArpnsOffload,
        Service::Nlo,
        Service::GtkOffload,
        Service::ScanSch,
        Service::CsaOffload,
        Service::Chatter,
        Service::CoexFreqavoid,
        Service::PacketPowerSave,
        Service::ForceFwHang,
        Service::Gpio,
        Service::StaDtimPsModulatedDtim,
        Service::StaUapsdBasicAutoTrig,
        Service::StaUapsdVarAutoTrig,
        Service::StaKeepAlive,
        Service::TxEncap,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Name as printed by firmware tooling.
    pub fn name(self) -> &'static str {
        match self {
            Service::BeaconOffload => "BEACON_OFFLOAD",
            Service::ScanOffload => "SCAN_OFFLOAD",
            Service::RoamOffload => "ROAM_OFFLOAD",
            Service::BcnMissOffload => "BCN_MISS_OFFLOAD",
            Service::StaPwrsave => "STA_PWRSAVE",
            Service::StaAdvancedPwrsave => "STA_ADVANCED_PWRSAVE",
            Service::ApUapsd => "AP_UAPSD",
            Service::ApDfs => "AP_DFS",
            Service::Ac11 => "11AC",
            Service::Blockack => "BLOCKACK",
            Service::Phyerr => "PHYERR",
            Service::BcnFilter => "BCN_FILTER",
            Service::Rtt => "RTT",
            Service::Ratectrl => "RATECTRL",
            Service::Wow => "WOW",
            Service::RatectrlCache => "RATECTRL CACHE",
            Service::IramTids => "IRAM TIDS",
            Service::ArpnsOffload => "ARPNS_OFFLOAD",
            Service::Nlo => "NLO",
            Service::GtkOffload => "GTK_OFFLOAD",
            Service::ScanSch => "SCAN_SCH",
            Service::CsaOffload => "CSA_OFFLOAD",
            Service::Chatter => "CHATTER",
            Service::CoexFreqavoid => "COEX_FREQAVOID",
            Service::PacketPowerSave => "PACKET_POWER_SAVE",
            Service::ForceFwHang => "FORCE FW HANG",
            Service::Gpio => "GPIO",
            Service::StaDtimPsModulatedDtim => "MODULATED DTIM",
            Service::StaUapsdBasicAutoTrig => "BASIC UAPSD",
            Service::StaUapsdVarAutoTrig => "VAR UAPSD",
            Service::StaKeepAlive => "STA KEEP ALIVE",
            Service::TxEncap => "TX ENCAP",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The service a command depends on, if any.
pub fn required_service(command: Command) -> Option<Service> {
    use Command as C;

    let service = match command {
        C::ScanSchPrioTbl => Service::ScanSch,
        C::PdevDfsEnable | C::PdevDfsDisable => Service::ApDfs,
        C::RoamScanMode
        | C::RoamScanRssiThreshold
        | C::RoamScanPeriod
        | C::RoamScanRssiChangeThreshold
        | C::RoamApProfile => Service::RoamOffload,
        C::OflScanAddApProfile | C::OflScanRemoveApProfile | C::OflScanPeriod => {
            Service::ScanOffload
        }
        C::AddBcnFilter | C::RmvBcnFilter => Service::BcnFilter,
        C::WowAddWakePattern
        | C::WowDelWakePattern
        | C::WowEnableDisableWakeEvent
        | C::WowEnable
        | C::WowHostwakeupFromSleep => Service::Wow,
        C::RttMeasreq | C::RttTsf => Service::Rtt,
        C::SetArpNsOffload => Service::ArpnsOffload,
        C::NetworkListOffloadConfig => Service::Nlo,
        C::GtkOffload => Service::GtkOffload,
        C::CsaOffloadEnable | C::CsaOffloadChanswitch => Service::CsaOffload,
        C::ChatterSetMode => Service::Chatter,
        C::StaDtimPsMethod => Service::StaDtimPsModulatedDtim,
        C::StaUapsdAutoTrig => Service::StaUapsdBasicAutoTrig,
        C::StaKeepalive | C::VdevSetKeepalive | C::VdevGetKeepalive => Service::StaKeepAlive,
        C::ForceFwHang => Service::ForceFwHang,
        C::GpioConfig | C::GpioOutput => Service::Gpio,
        _ => return None,
    };
    Some(service)
}

/// Read-only view of the negotiated capability bitmap.
///
/// Service `n` lives in word `n / 32`, bit `n % 32`. A query past the end of
/// the received words answers `false`, so a host and firmware with lists of
/// different lengths still agree on the common prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistry {
    words: Vec<u32>,
}

impl ServiceRegistry {
    pub fn from_bitmap(words: &[u32]) -> Self {
        Self {
            words: words.to_vec(),
        }
    }

    pub fn has(&self, service: Service) -> bool {
        self.has_id(service.id() as usize)
    }

    /// Query by raw id, including ids this host has no name for.
    pub fn has_id(&self, id: usize) -> bool {
        self.words
            .get(id / BITS_PER_WORD)
            .is_some_and(|word| word & (1 << (id % BITS_PER_WORD)) != 0)
    }

    /// Known services the firmware advertises.
    pub fn enabled(&self) -> impl Iterator<Item = Service> + '_ {
        Service::ALL.into_iter().filter(|&s| self.has(s))
    }

    pub fn bitmap(&self) -> &[u32] {
        &self.words
    }
}

impl FromIterator<Service> for ServiceRegistry {
    fn from_iter<I: IntoIterator<Item = Service>>(iter: I) -> Self {
        let mut words = vec![0u32; SERVICE_BITMAP_WORDS];
        for service in iter {
            let id = service.id() as usize;
            words[id / BITS_PER_WORD] |= 1 << (id % BITS_PER_WORD);
        }
        Self { words }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_map_to_services() {
        let registry = ServiceRegistry::from_bitmap(&[0x8000_4001, 0x1]);
        assert!(registry.has(Service::BeaconOffload));
        assert!(registry.has(Service::Wow));
        assert!(registry.has(Service::TxEncap));
        assert!(!registry.has(Service::Rtt));
        assert!(registry.has_id(32));
        assert!(!registry.has_id(33));
    }

    #[test]
    fn queries_past_the_bitmap_are_false() {
        let registry = ServiceRegistry::from_bitmap(&[u32::MAX]);
        assert!(registry.has_id(31));
        assert!(!registry.has_id(32));
        assert!(!registry.has_id(MAX_SERVICE));
        assert!(!registry.has_id(usize::MAX));
        assert!(!ServiceRegistry::default().has(Service::BeaconOffload));
    }

    #[test]
    fn collect_builds_full_width_bitmap() {
        let registry: ServiceRegistry = [Service::Gpio, Service::StaKeepAlive].into_iter().collect();
        assert_eq!(registry.bitmap().len(), SERVICE_BITMAP_WORDS);
        assert_eq!(
            registry.enabled().collect::<Vec<_>>(),
            vec![Service::Gpio, Service::StaKeepAlive]
        );
    }

    #[test]
    fn names_and_ids() {
        assert_eq!(Service::from_id(31), Some(Service::TxEncap));
        assert_eq!(Service::from_id(32), None);
        assert_eq!(Service::Ac11.to_string(), "11AC");
        assert_eq!(Service::StaUapsdVarAutoTrig.name(), "VAR UAPSD");
        for (k, service) in Service::ALL.into_iter().enumerate() {
            assert_eq!(service.id() as usize, k);
        }
    }

    #[test]
    fn gating_table() {
        assert_eq!(required_service(Command::WowEnable), Some(Service::Wow));
        assert_eq!(required_service(Command::GtkOffload), Some(Service::GtkOffload));
        assert_eq!(required_service(Command::StaKeepalive), Some(Service::StaKeepAlive));
        assert_eq!(required_service(Command::StartScan), None);
        assert_eq!(required_service(Command::VdevCreate), None);
    }
}
