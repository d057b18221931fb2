//! WMI protocol layer: ids, capabilities and typed records.
//!
//! Everything here is pure. A [`generation::AbiContext`] chosen once at
//! attach selects the id tables, parameter maps and record layouts for one
//! of the two firmware generations, and every codec takes it explicitly.

pub mod channel;
pub mod cmd;
pub mod error;
pub mod event;
pub mod generation;
pub mod ids;
pub mod params;
pub mod record;
pub mod services;

pub use channel::{ChannelArg, PhyMode};
pub use error::{ProtoError, Result};
pub use event::{decode_event, WmiEvent};
pub use generation::{AbiContext, FirmwareDescriptor, MgmtRxShape, ProtocolGeneration};
pub use ids::{Command, Event, IdSpace};
pub use params::{ApPsParam, PdevParam, PeerParam, StaPsMode, StaPsParam, VdevParam};
pub use record::{CommandRecord, Record};
pub use services::{required_service, Service, ServiceRegistry};
