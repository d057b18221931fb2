//! Attached WMI control channel.
//!
//! This is the stateful layer. [`Session::attach`] runs the readiness
//! handshake over a [`WmiTransport`](athwmi_transport::WmiTransport), then
//! commands are issued through the [`Dispatcher`] and responses matched
//! against a table of outstanding operations. [`Session::split`] hands out
//! a sender and a receiver half so commands can be issued while another
//! thread polls events.

pub mod attach;
pub mod dispatch;
pub mod error;
pub mod memory;
pub mod pending;
pub mod session;

pub use attach::AttachConfig;
pub use dispatch::{DispatchConfig, Dispatcher};
pub use error::{Result, SessionError};
pub use memory::{plan_chunks, units_for, BumpAllocator, HostMemory};
pub use pending::{PendingFailure, PendingKey, PendingTable};
pub use session::{Received, Session, SessionReceiver, SessionSender};
