//! Host-side codec for the WMI control plane of ath10k-class firmware.
//!
//! athwmi translates logical operations (create a vdev, start a scan, set a
//! parameter) into the binary records the firmware expects, and firmware
//! events back into typed values. Two incompatible firmware generations are
//! supported; the one in use is chosen once at attach.
//!
//! # Crate Structure
//!
//! - [`wire`]: 4-byte record reader/writer, `(mask, shift)` fields, message header, TLV blocks
//! - [`proto`]: generation context, id tables, service capabilities, command and event records
//! - [`transport`]: message transport seam and an in-process loopback
//! - [`session`]: attach sequence, dispatch and outstanding operations (behind `session` feature)

/// Re-export wire primitives.
pub mod wire {
    pub use athwmi_wire::*;
}

/// Re-export protocol types.
pub mod proto {
    pub use athwmi_proto::*;
}

/// Re-export transport types.
pub mod transport {
    pub use athwmi_transport::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use athwmi_session::*;
}
