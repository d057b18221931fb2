//! Firmware generation selection.
//!
//! The generation is chosen once per attach from an out-of-band indicator
//! and then threaded through every codec call as an immutable [`AbiContext`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two incompatible WMI wire-format families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolGeneration {
    /// Main-branch firmware: group-based ids.
    Main,
    /// 10.x firmware: ids confined to the `0x9000..=0x9FFF` window.
    TenX,
}

impl ProtocolGeneration {
    /// Pick the generation advertised by the firmware image.
    pub fn select(indicator: &FirmwareDescriptor) -> Self {
        if indicator.wmi_10x {
            ProtocolGeneration::TenX
        } else {
            ProtocolGeneration::Main
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProtocolGeneration::Main => "main",
            ProtocolGeneration::TenX => "10.x",
        }
    }
}

impl fmt::Display for ProtocolGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feature flags advertised by the firmware image outside of WMI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareDescriptor {
    /// The image speaks the 10.x WMI dialect.
    pub wmi_10x: bool,
    /// Management frames arrive with the extended per-chain RSSI header.
    pub ext_mgmt_rx: bool,
}

impl FirmwareDescriptor {
    pub fn main() -> Self {
        Self::default()
    }

    pub fn tenx() -> Self {
        Self {
            wmi_10x: true,
            ..Self::default()
        }
    }
}

/// Which management-rx header the firmware emits.
///
/// Both shapes start identically and carry no discriminator, so the choice
/// comes from the firmware descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MgmtRxShape {
    /// `{channel, snr, rate, phy_mode, buf_len, status}`.
    V1,
    /// V1 followed by four per-chain RSSI words.
    V2,
}

/// Immutable per-attach protocol context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbiContext {
    generation: ProtocolGeneration,
    mgmt_rx: MgmtRxShape,
}

impl AbiContext {
    /// Derive the context from the firmware descriptor.
    pub fn select(descriptor: &FirmwareDescriptor) -> Self {
        let mgmt_rx = if descriptor.ext_mgmt_rx {
            MgmtRxShape::V2
        } else {
            MgmtRxShape::V1
        };
        Self {
            generation: ProtocolGeneration::select(descriptor),
            mgmt_rx,
        }
    }

    /// Context for `generation` with the basic management-rx header.
    pub fn new(generation: ProtocolGeneration) -> Self {
        Self {
            generation,
            mgmt_rx: MgmtRxShape::V1,
        }
    }

    pub fn generation(&self) -> ProtocolGeneration {
        self.generation
    }

    pub fn mgmt_rx_shape(&self) -> MgmtRxShape {
        self.mgmt_rx
    }

    pub fn is_tenx(&self) -> bool {
        self.generation == ProtocolGeneration::TenX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_follows_indicator() {
        assert_eq!(
            ProtocolGeneration::select(&FirmwareDescriptor::main()),
            ProtocolGeneration::Main
        );
        assert_eq!(
            ProtocolGeneration::select(&FirmwareDescriptor::tenx()),
            ProtocolGeneration::TenX
        );
    }

    #[test]
    fn mgmt_rx_shape_comes_from_descriptor() {
        let ctx = AbiContext::select(&FirmwareDescriptor {
            wmi_10x: false,
            ext_mgmt_rx: true,
        });
        assert_eq!(ctx.generation(), ProtocolGeneration::Main);
        assert_eq!(ctx.mgmt_rx_shape(), MgmtRxShape::V2);

        let ctx = AbiContext::select(&FirmwareDescriptor::tenx());
        assert!(ctx.is_tenx());
        assert_eq!(ctx.mgmt_rx_shape(), MgmtRxShape::V1);
    }

    #[test]
    fn generation_serializes_snake_case() {
        let json = serde_json::to_string(&ProtocolGeneration::TenX).unwrap();
        assert_eq!(json, "\"ten_x\"");
        assert_eq!(ProtocolGeneration::TenX.to_string(), "10.x");
    }
}
