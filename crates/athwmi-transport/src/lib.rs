//! Message transport seam for the WMI control path.
//!
//! The codec layers above never touch a bus. They hand complete messages to
//! a [`WmiTransport`] and take complete messages back from it. The real link
//! (a host-interface pipe to the firmware) lives outside this workspace; the
//! in-process [`LoopbackTransport`] stands in for it in tests and simulators.

pub mod error;
pub mod loopback;
pub mod traits;

pub use error::{Result, TransportError};
pub use loopback::{LoopbackSink, LoopbackSource, LoopbackTransport};
pub use traits::{SplitTransport, WmiSink, WmiSource, WmiTransport};
