use std::time::Duration;

use athwmi_proto::{Command, ProtoError, Service};

use crate::pending::PendingKey;

/// Errors that can occur while attaching to or talking with firmware.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Id, parameter or record codec failure.
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] athwmi_transport::TransportError),

    /// JSON configuration could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The command needs a service the firmware did not advertise.
    #[error("{command:?} requires service {service}")]
    CapabilityMissing { command: Command, service: Service },

    /// No readiness event arrived within the bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Resource negotiation with the firmware failed.
    #[error("attach failed: {0}")]
    AttachFailed(String),

    /// A capability-gated command was issued before the service list arrived.
    #[error("firmware services not known yet")]
    NotAttached,

    /// The outstanding-operation table is full.
    #[error("too many outstanding operations (max {max})")]
    TooManyPending { max: usize },

    /// An operation with the same key is already outstanding.
    #[error("{0:?} is already outstanding")]
    AlreadyPending(PendingKey),
}

impl SessionError {
    /// True for errors that leave no usable session.
    ///
    /// Only attach-time failures qualify; per-message errors are local.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Timeout(_) | SessionError::AttachFailed(_)
        )
    }
}

impl From<athwmi_wire::WireError> for SessionError {
    fn from(err: athwmi_wire::WireError) -> Self {
        SessionError::Proto(err.into())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
