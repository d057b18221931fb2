//! The attach handshake events: SERVICE_READY and READY.

use athwmi_wire::{check_count, Field, MacAddr, RecordReader, RecordWriter};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::generation::{AbiContext, ProtocolGeneration};
use crate::record::{get_main_only, put_main_only, Record};
use crate::services::{ServiceRegistry, SERVICE_BITMAP_WORDS};

/// Most memory requests one SERVICE_READY may carry.
pub const MAX_MEM_REQS: usize = 16;

/// Spatial streams the host supports; larger `num_rf_chains` values are clamped.
pub const MAX_SPATIAL_STREAM: u32 = 3;

// num_unit_info
pub const NUM_UNITS_IS_NUM_VDEVS: u32 = 0x1;
pub const NUM_UNITS_IS_NUM_PEERS: u32 = 0x2;

// sw_version and sw_version_1
pub const FW_VER_MAJOR: Field = Field::new(0xFF00_0000, 24);
pub const FW_VER_MINOR: Field = Field::new(0x00FF_FFFF, 0);
pub const FW_VER_RELEASE: Field = Field::new(0xFFFF_0000, 16);
pub const FW_VER_BUILD: Field = Field::new(0x0000_FFFF, 0);

/// Words before the memory request array.
const MAIN_FIXED_WORDS: usize = 40;
const TENX_FIXED_WORDS: usize = 38;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u32,
    pub minor: u32,
    pub release: u32,
    pub build: u32,
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.release, self.build)
    }
}

/// Regulatory capabilities from the EEPROM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalRegCapabilities {
    pub eeprom_rd: u32,
    pub eeprom_rd_ext: u32,
    pub regcap1: u32,
    pub regcap2: u32,
    pub wireless_modes: u32,
    pub low_2ghz_chan: u32,
    pub high_2ghz_chan: u32,
    pub low_5ghz_chan: u32,
    pub high_5ghz_chan: u32,
}

impl HalRegCapabilities {
    fn put(&self, w: &mut RecordWriter) {
        w.put_words(&[
            self.eeprom_rd,
            self.eeprom_rd_ext,
            self.regcap1,
            self.regcap2,
            self.wireless_modes,
            self.low_2ghz_chan,
            self.high_2ghz_chan,
            self.low_5ghz_chan,
            self.high_5ghz_chan,
        ]);
    }

    fn get(r: &mut RecordReader) -> Result<Self> {
        let [eeprom_rd, eeprom_rd_ext, regcap1, regcap2, wireless_modes, low_2ghz_chan, high_2ghz_chan, low_5ghz_chan, high_5ghz_chan] =
            r.get_words::<9>()?;
        Ok(Self {
            eeprom_rd,
            eeprom_rd_ext,
            regcap1,
            regcap2,
            wireless_modes,
            low_2ghz_chan,
            high_2ghz_chan,
            low_5ghz_chan,
            high_5ghz_chan,
        })
    }
}

/// A block of host memory the firmware asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemRequest {
    pub req_id: u32,
    pub unit_size: u32,
    /// When one of the `NUM_UNITS_IS_*` bits is set the host derives the
    /// unit count from its resource limits and `num_units` is 0.
    pub num_unit_info: u32,
    pub num_units: u32,
}

impl MemRequest {
    pub const WIRE_SIZE: usize = 4 * 4;
}

/// SERVICE_READY: firmware identity, capabilities and memory requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceReady {
    pub sw_version: u32,
    /// Main only; 0 on 10.x.
    pub sw_version_1: u32,
    pub abi_version: u32,
    pub phy_capability: u32,
    pub max_frag_entry: u32,
    pub service_bitmap: [u32; SERVICE_BITMAP_WORDS],
    /// At most [`MAX_SPATIAL_STREAM`] after decoding.
    pub num_rf_chains: u32,
    pub ht_cap_info: u32,
    pub vht_cap_info: u32,
    pub vht_supp_mcs: u32,
    pub hw_min_tx_power: u32,
    pub hw_max_tx_power: u32,
    pub hal_reg_capabilities: HalRegCapabilities,
    pub sys_cap_info: u32,
    pub min_pkt_size_enable: u32,
    /// Main only; 0 on 10.x.
    pub max_bcn_ie_size: u32,
    pub mem_reqs: Vec<MemRequest>,
}

impl ServiceReady {
    pub fn services(&self) -> ServiceRegistry {
        ServiceRegistry::from_bitmap(&self.service_bitmap)
    }

    /// 10.x firmware has no second version word and reports major and
    /// minor only.
    pub fn firmware_version(&self, generation: ProtocolGeneration) -> FirmwareVersion {
        let (release, build) = match generation {
            ProtocolGeneration::Main => (
                FW_VER_RELEASE.get(self.sw_version_1),
                FW_VER_BUILD.get(self.sw_version_1),
            ),
            ProtocolGeneration::TenX => (0, 0),
        };
        FirmwareVersion {
            major: FW_VER_MAJOR.get(self.sw_version),
            minor: FW_VER_MINOR.get(self.sw_version),
            release,
            build,
        }
    }

    fn fixed_size(ctx: &AbiContext) -> usize {
        let words = if ctx.is_tenx() {
            TENX_FIXED_WORDS
        } else {
            MAIN_FIXED_WORDS
        };
        words * 4
    }
}

impl Record for ServiceReady {
    const NAME: &'static str = "service_ready";

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        check_count("num_mem_reqs", self.mem_reqs.len(), MAX_MEM_REQS)?;
        w.put_u32(self.sw_version);
        put_main_only(ctx, w, self.sw_version_1);
        w.put_words(&[self.abi_version, self.phy_capability, self.max_frag_entry]);
        w.put_words(&self.service_bitmap);
        w.put_words(&[
            self.num_rf_chains,
            self.ht_cap_info,
            self.vht_cap_info,
            self.vht_supp_mcs,
            self.hw_min_tx_power,
            self.hw_max_tx_power,
        ]);
        self.hal_reg_capabilities.put(w);
        w.put_words(&[self.sys_cap_info, self.min_pkt_size_enable]);
        put_main_only(ctx, w, self.max_bcn_ie_size);
        w.put_u32(self.mem_reqs.len() as u32);
        for req in &self.mem_reqs {
            w.put_words(&[req.req_id, req.unit_size, req.num_unit_info, req.num_units]);
        }
        Ok(())
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::fixed_size(ctx))?;
        let sw_version = r.get_u32()?;
        let sw_version_1 = get_main_only(ctx, r)?;
        let [abi_version, phy_capability, max_frag_entry] = r.get_words::<3>()?;
        let service_bitmap = r.get_words::<SERVICE_BITMAP_WORDS>()?;

        let mut num_rf_chains = r.get_u32()?;
        if num_rf_chains > MAX_SPATIAL_STREAM {
            warn!(
                num_rf_chains,
                max = MAX_SPATIAL_STREAM,
                "firmware reports more rf chains than supported, clamping"
            );
            num_rf_chains = MAX_SPATIAL_STREAM;
        }

        let [ht_cap_info, vht_cap_info, vht_supp_mcs, hw_min_tx_power, hw_max_tx_power] =
            r.get_words::<5>()?;
        let hal_reg_capabilities = HalRegCapabilities::get(r)?;
        let [sys_cap_info, min_pkt_size_enable] = r.get_words::<2>()?;
        let max_bcn_ie_size = get_main_only(ctx, r)?;

        let count = r.get_count("num_mem_reqs", MAX_MEM_REQS)?;
        r.require(count * MemRequest::WIRE_SIZE)?;
        let mut mem_reqs = Vec::with_capacity(count);
        for _ in 0..count {
            let [req_id, unit_size, num_unit_info, num_units] = r.get_words::<4>()?;
            mem_reqs.push(MemRequest {
                req_id,
                unit_size,
                num_unit_info,
                num_units,
            });
        }

        Ok(Self {
            sw_version,
            sw_version_1,
            abi_version,
            phy_capability,
            max_frag_entry,
            service_bitmap,
            num_rf_chains,
            ht_cap_info,
            vht_cap_info,
            vht_supp_mcs,
            hw_min_tx_power,
            hw_max_tx_power,
            hal_reg_capabilities,
            sys_cap_info,
            min_pkt_size_enable,
            max_bcn_ie_size,
            mem_reqs,
        })
    }
}

/// READY: the firmware accepted INIT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ready {
    pub sw_version: u32,
    pub abi_version: u32,
    pub mac: MacAddr,
    pub status: u32,
}

impl Record for Ready {
    const NAME: &'static str = "ready";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[self.sw_version, self.abi_version]);
        w.put_mac(self.mac);
        w.put_u32(self.status);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(2 * 4 + MacAddr::WIRE_SIZE + 4)?;
        let [sw_version, abi_version] = r.get_words::<2>()?;
        Ok(Self {
            sw_version,
            abi_version,
            mac: r.get_mac()?,
            status: r.get_u32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtoError;
    use crate::services::Service;
    use athwmi_wire::WireError;

    fn sample() -> ServiceReady {
        let registry: ServiceRegistry = [Service::BeaconOffload, Service::Wow, Service::Ac11]
            .into_iter()
            .collect();
        let mut service_bitmap = [0u32; SERVICE_BITMAP_WORDS];
        service_bitmap.copy_from_slice(registry.bitmap());
        ServiceReady {
            sw_version: 0x0100_0025,
            sw_version_1: 0x0002_0636,
            abi_version: 1,
            service_bitmap,
            num_rf_chains: 2,
            mem_reqs: vec![MemRequest {
                req_id: 1,
                unit_size: 2048,
                num_unit_info: NUM_UNITS_IS_NUM_PEERS,
                num_units: 0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn main_layout_has_both_version_words() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let ready = ServiceReady {
            max_bcn_ie_size: 512,
            ..sample()
        };
        let bytes = ready.to_bytes(&ctx).unwrap();
        assert_eq!(bytes.len(), MAIN_FIXED_WORDS * 4 + MemRequest::WIRE_SIZE);
        let decoded = ServiceReady::from_bytes(&ctx, bytes).unwrap();
        assert_eq!(decoded, ready);
        assert_eq!(
            decoded.firmware_version(ProtocolGeneration::Main),
            FirmwareVersion {
                major: 1,
                minor: 0x25,
                release: 2,
                build: 0x636
            }
        );
        assert!(decoded.services().has(Service::Wow));
        assert!(!decoded.services().has(Service::Rtt));
    }

    #[test]
    fn tenx_layout_drops_version_1_and_ie_size() {
        let ctx = AbiContext::new(ProtocolGeneration::TenX);
        let ready = ServiceReady {
            sw_version_1: 0,
            ..sample()
        };
        let bytes = ready.to_bytes(&ctx).unwrap();
        assert_eq!(bytes.len(), TENX_FIXED_WORDS * 4 + MemRequest::WIRE_SIZE);
        // abi_version directly follows sw_version
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        let decoded = ServiceReady::from_bytes(&ctx, bytes).unwrap();
        assert_eq!(decoded, ready);
        assert_eq!(decoded.firmware_version(ProtocolGeneration::TenX).release, 0);
    }

    #[test]
    fn rf_chains_are_clamped() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let ready = ServiceReady {
            num_rf_chains: 4,
            ..sample()
        };
        let decoded = ServiceReady::from_bytes(&ctx, ready.to_bytes(&ctx).unwrap()).unwrap();
        assert_eq!(decoded.num_rf_chains, MAX_SPATIAL_STREAM);
    }

    #[test]
    fn mem_req_count_is_bounded() {
        let ctx = AbiContext::new(ProtocolGeneration::TenX);
        let mut w = RecordWriter::new();
        // num_mem_reqs is the last fixed word
        w.put_zeros(TENX_FIXED_WORDS - 1);
        w.put_u32(17);
        let err = ServiceReady::from_bytes(&ctx, w.freeze()).unwrap_err();
        assert_eq!(
            err,
            ProtoError::Wire(WireError::CountTooLarge {
                field: "num_mem_reqs",
                count: 17,
                max: MAX_MEM_REQS
            })
        );
    }

    #[test]
    fn short_service_ready_is_truncated() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let err = ServiceReady::from_bytes(&ctx, vec![0u8; 100]).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::Wire(WireError::Truncated { need: 160, have: 100, .. })
        ));
    }

    #[test]
    fn ready_round_trip() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let ready = Ready {
            sw_version: 0x0100_0025,
            abi_version: 1,
            mac: MacAddr([0x00, 0x03, 0x7f, 0xaa, 0xbb, 0xcc]),
            status: 0,
        };
        let bytes = ready.to_bytes(&ctx).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(Ready::from_bytes(&ctx, bytes).unwrap(), ready);
    }
}
