use std::time::Duration;

use athwmi_proto::{
    decode_event, required_service, AbiContext, Command, CommandRecord, IdSpace, ProtoError,
    ServiceRegistry, WmiEvent,
};
use athwmi_wire::{decode_message, encode_message, WireError};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Limits applied by the dispatcher and the outstanding-operation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deadline given to tracked operations without an explicit one.
    #[serde(with = "crate::attach::duration_ms")]
    pub default_op_timeout: Duration,
    /// Most operations that may be awaiting a response at once.
    pub max_outstanding: usize,
    /// Largest inbound event payload accepted, in bytes.
    pub max_event_payload: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_op_timeout: Duration::from_secs(3),
            max_outstanding: 64,
            max_event_payload: 64 * 1024,
        }
    }
}

/// Maps logical commands to wire messages and wire messages to events.
///
/// Holds only attach-time state: the generation context, its id tables and,
/// once SERVICE_READY has been seen, the firmware's service list. None of it
/// changes afterwards, so encode and decode need no locking.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ctx: AbiContext,
    ids: IdSpace,
    registry: Option<ServiceRegistry>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(ctx: AbiContext, config: DispatchConfig) -> Self {
        Self {
            ctx,
            ids: IdSpace::new(ctx.generation()),
            registry: None,
            config,
        }
    }

    /// Record the firmware's advertised services.
    pub fn set_registry(&mut self, registry: ServiceRegistry) {
        self.registry = Some(registry);
    }

    pub fn context(&self) -> &AbiContext {
        &self.ctx
    }

    pub fn ids(&self) -> &IdSpace {
        &self.ids
    }

    pub fn registry(&self) -> Option<&ServiceRegistry> {
        self.registry.as_ref()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Build the complete wire message for `command` with argument `arg`.
    ///
    /// Checks run in order: the command must have an id in the active
    /// generation, its service (if any) must be advertised, and `arg` must
    /// be a record the command takes. No bytes are built before all pass.
    pub fn issue<A: CommandRecord>(&self, command: Command, arg: &A) -> Result<Bytes> {
        let id = self.ids.command_id(command)?;

        if let Some(service) = required_service(command) {
            let registry = self.registry.as_ref().ok_or(SessionError::NotAttached)?;
            if !registry.has(service) {
                return Err(SessionError::CapabilityMissing { command, service });
            }
        }

        if !A::accepts(command) {
            return Err(ProtoError::ArgumentMismatch {
                command,
                record: A::NAME,
            }
            .into());
        }

        let payload = arg.to_bytes(&self.ctx)?;
        let mut message = BytesMut::new();
        encode_message(id, &payload, &mut message)?;
        debug!(
            command = ?command,
            id = format_args!("{:#x}", id),
            len = payload.len(),
            generation = ?self.ctx.generation(),
            "issued command"
        );
        Ok(message.freeze())
    }

    /// Decode the payload of inbound event `id`.
    ///
    /// An unknown id or a truncated record is logged and returned as an
    /// error; the caller drops that one event and carries on.
    pub fn receive(&self, id: u32, payload: Bytes) -> Result<WmiEvent> {
        let event = self.ids.event_for(id).inspect_err(|_| {
            warn!(
                id = format_args!("{:#x}", id),
                generation = ?self.ctx.generation(),
                "dropping event with unknown id"
            );
        })?;
        let len = payload.len();
        decode_event(&self.ctx, event, payload).map_err(|err| {
            warn!(event = ?event, len, error = %err, "dropping undecodable event");
            SessionError::from(err)
        })
    }

    /// Split the header off a complete inbound message and decode it.
    pub fn receive_message(&self, message: Bytes) -> Result<WmiEvent> {
        let message = decode_message(message)?;
        if message.payload.len() > self.config.max_event_payload {
            warn!(
                id = format_args!("{:#x}", message.id),
                len = message.payload.len(),
                max = self.config.max_event_payload,
                "dropping oversize event"
            );
            return Err(WireError::LengthTooLarge {
                field: "event payload",
                len: message.payload.len(),
                max: self.config.max_event_payload,
            }
            .into());
        }
        self.receive(message.id, message.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use athwmi_proto::cmd::{EchoArg, ForceFwHangArg, FwHangType, VdevIdArg};
    use athwmi_proto::event::{EchoEvent, ScanEvent};
    use athwmi_proto::{Event, ProtocolGeneration, Record, Service};
    use athwmi_wire::HEADER_SIZE;

    fn main_dispatcher() -> Dispatcher {
        Dispatcher::new(
            AbiContext::new(ProtocolGeneration::Main),
            DispatchConfig::default(),
        )
    }

    fn registry_with(services: &[Service]) -> ServiceRegistry {
        let mut words = [0u32; 16];
        for service in services {
            let id = service.id() as usize;
            words[id / 32] |= 1 << (id % 32);
        }
        ServiceRegistry::from_bitmap(&words)
    }

    #[test]
    fn issue_prefixes_resolved_id() {
        let dispatcher = main_dispatcher();
        let id = dispatcher.ids().command_id(Command::Echo).unwrap();
        let bytes = dispatcher
            .issue(Command::Echo, &EchoArg { value: 0xabcd })
            .unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 4);
        assert_eq!(&bytes[..4], &id.to_le_bytes());
        assert_eq!(&bytes[4..], &0xabcdu32.to_le_bytes());
    }

    #[test]
    fn unsupported_command_rejected_before_encoding() {
        let dispatcher = Dispatcher::new(
            AbiContext::new(ProtocolGeneration::TenX),
            DispatchConfig::default(),
        );
        let arg = ForceFwHangArg {
            hang_type: FwHangType::Assert,
            delay_ms: 0,
        };
        let err = dispatcher.issue(Command::ForceFwHang, &arg).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Proto(ProtoError::Unsupported {
                command: Command::ForceFwHang,
                generation: ProtocolGeneration::TenX
            })
        ));
    }

    #[test]
    fn gated_command_needs_service() {
        let mut dispatcher = main_dispatcher();
        let arg = ForceFwHangArg {
            hang_type: FwHangType::Assert,
            delay_ms: 0,
        };
        assert!(matches!(
            dispatcher.issue(Command::ForceFwHang, &arg),
            Err(SessionError::NotAttached)
        ));

        dispatcher.set_registry(registry_with(&[Service::BeaconOffload]));
        assert!(matches!(
            dispatcher.issue(Command::ForceFwHang, &arg),
            Err(SessionError::CapabilityMissing {
                command: Command::ForceFwHang,
                service: Service::ForceFwHang
            })
        ));

        dispatcher.set_registry(registry_with(&[Service::ForceFwHang]));
        assert!(dispatcher.issue(Command::ForceFwHang, &arg).is_ok());
    }

    #[test]
    fn ungated_command_works_before_attach() {
        let dispatcher = main_dispatcher();
        assert!(dispatcher
            .issue(Command::VdevStop, &VdevIdArg { vdev_id: 1 })
            .is_ok());
    }

    #[test]
    fn mismatched_argument_rejected() {
        let dispatcher = main_dispatcher();
        let err = dispatcher
            .issue(Command::VdevStop, &EchoArg { value: 1 })
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Proto(ProtoError::ArgumentMismatch {
                command: Command::VdevStop,
                record: "echo"
            })
        ));
    }

    #[test]
    fn receive_unknown_id_is_local() {
        let dispatcher = main_dispatcher();
        let err = dispatcher
            .receive(0x7F_FFFF, Bytes::from_static(&[0; 4]))
            .unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(
            err,
            SessionError::Proto(ProtoError::UnknownEventId { id: 0x7F_FFFF, .. })
        ));

        let echo_id = dispatcher.ids().event_id(Event::Echo).unwrap();
        let event = dispatcher
            .receive(echo_id, Bytes::from_static(&[7, 0, 0, 0]))
            .unwrap();
        assert_eq!(event, WmiEvent::Echo(EchoEvent { value: 7 }));
    }

    #[test]
    fn receive_truncated_header_fails() {
        let dispatcher = main_dispatcher();
        let scan_id = dispatcher.ids().event_id(Event::Scan).unwrap();
        let err = dispatcher
            .receive(scan_id, Bytes::from(vec![0u8; ScanEvent::WIRE_SIZE - 4]))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Proto(ProtoError::Wire(WireError::Truncated { .. }))
        ));
    }

    #[test]
    fn receive_message_splits_header() {
        let dispatcher = main_dispatcher();
        let ctx = *dispatcher.context();
        let echo_id = dispatcher.ids().event_id(Event::Echo).unwrap();
        let payload = EchoEvent { value: 42 }.to_bytes(&ctx).unwrap();
        let mut message = BytesMut::new();
        encode_message(echo_id, &payload, &mut message).unwrap();

        let event = dispatcher.receive_message(message.freeze()).unwrap();
        assert_eq!(event, WmiEvent::Echo(EchoEvent { value: 42 }));

        assert!(matches!(
            dispatcher.receive_message(Bytes::from_static(&[1, 0])),
            Err(SessionError::Proto(ProtoError::Wire(
                WireError::Truncated { .. }
            )))
        ));
    }

    #[test]
    fn oversize_event_rejected() {
        let dispatcher = Dispatcher::new(
            AbiContext::new(ProtocolGeneration::Main),
            DispatchConfig {
                max_event_payload: 8,
                ..Default::default()
            },
        );
        let echo_id = dispatcher.ids().event_id(Event::Echo).unwrap();
        let mut message = BytesMut::new();
        encode_message(echo_id, &[0u8; 12], &mut message).unwrap();
        assert!(matches!(
            dispatcher.receive_message(message.freeze()),
            Err(SessionError::Proto(ProtoError::Wire(
                WireError::LengthTooLarge { len: 12, max: 8, .. }
            )))
        ));
    }
}
