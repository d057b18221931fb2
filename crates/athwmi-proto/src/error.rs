use athwmi_wire::WireError;

use crate::generation::ProtocolGeneration;
use crate::ids::Command;

/// Errors raised while mapping logical operations to and from wire records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtoError {
    /// Record-level encode or decode failure.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// The command has no id in the active generation.
    #[error("{command:?} is not supported by {generation} firmware")]
    Unsupported {
        command: Command,
        generation: ProtocolGeneration,
    },

    /// An inbound event id missing from the reverse table.
    #[error("unknown event id {id:#x} for {generation} firmware")]
    UnknownEventId {
        id: u32,
        generation: ProtocolGeneration,
    },

    /// A parameter that the active generation does not define.
    #[error("{kind} parameter {param} is not supported by {generation} firmware")]
    UnsupportedParam {
        kind: &'static str,
        param: String,
        generation: ProtocolGeneration,
    },

    /// A numeric parameter id with no logical counterpart.
    #[error("unknown {kind} parameter id {id}")]
    UnknownParam { kind: &'static str, id: u32 },

    /// The argument record does not belong to the requested command.
    #[error("{record} cannot be sent as {command:?}")]
    ArgumentMismatch {
        command: Command,
        record: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ProtoError>;
