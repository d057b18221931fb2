use std::sync::Arc;
use std::time::{Duration, Instant};

use athwmi_proto::cmd::InitCmd;
use athwmi_proto::event::{FirmwareVersion, Ready, ServiceReady};
use athwmi_proto::{
    AbiContext, Command, CommandRecord, FirmwareDescriptor, ProtocolGeneration, ServiceRegistry,
    WmiEvent,
};
use athwmi_transport::{SplitTransport, WmiSink, WmiSource, WmiTransport};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::attach::AttachConfig;
use crate::dispatch::Dispatcher;
use crate::error::{Result, SessionError};
use crate::memory::{plan_chunks, HostMemory};
use crate::pending::{PendingFailure, PendingKey, PendingTable};

/// An attached WMI control channel.
///
/// Only [`Session::attach`] creates one, so every session has a fixed
/// generation and a known service list.
#[derive(Debug)]
pub struct Session<T: WmiTransport> {
    transport: T,
    dispatcher: Arc<Dispatcher>,
    pending: Arc<PendingTable>,
    services: ServiceRegistry,
    service_ready: ServiceReady,
    ready: Ready,
}

impl<T: WmiTransport> Session<T> {
    /// Run the attach sequence over `transport`.
    ///
    /// Waits for SERVICE_READY, answers with INIT (resource limits plus the
    /// host memory the firmware asked for) and waits for READY. Both waits
    /// are bounded; running out is [`SessionError::Timeout`].
    pub fn attach(
        mut transport: T,
        descriptor: &FirmwareDescriptor,
        memory: &mut impl HostMemory,
        config: &AttachConfig,
    ) -> Result<Self> {
        let ctx = AbiContext::select(descriptor);
        let generation = ctx.generation();
        let mut dispatcher = Dispatcher::new(ctx, config.dispatch.clone());
        debug!(
            generation = ?generation,
            mgmt_rx = ?ctx.mgmt_rx_shape(),
            transport = transport.transport_name(),
            "attaching"
        );

        let service_ready = wait_for(
            &mut transport,
            &dispatcher,
            config.service_ready_timeout,
            |event| match event {
                WmiEvent::ServiceReady(service_ready) => Some(service_ready),
                _ => None,
            },
        )?;
        let version = service_ready.firmware_version(generation);
        let services = service_ready.services();
        info!(
            firmware = %version,
            abi = service_ready.abi_version,
            services = services.enabled().count(),
            mem_reqs = service_ready.mem_reqs.len(),
            "service ready"
        );

        if service_ready.mem_reqs.len() > config.max_mem_reqs {
            return Err(SessionError::AttachFailed(format!(
                "firmware requested {} memory blocks (max {})",
                service_ready.mem_reqs.len(),
                config.max_mem_reqs
            )));
        }
        let resource = config.resource_for(generation)?;
        let chunks = plan_chunks(&service_ready.mem_reqs, &resource, memory)?;

        dispatcher.set_registry(services.clone());
        let init = dispatcher.issue(Command::Init, &InitCmd { resource, chunks })?;
        transport.send(init)?;

        let ready = wait_for(
            &mut transport,
            &dispatcher,
            config.ready_timeout,
            |event| match event {
                WmiEvent::Ready(ready) => Some(ready),
                _ => None,
            },
        )?;
        if ready.status != 0 {
            warn!(status = ready.status, "firmware reported non-zero ready status");
        }
        info!(mac = %ready.mac, generation = ?generation, "firmware ready");

        Ok(Self {
            transport,
            pending: Arc::new(PendingTable::new(config.dispatch.max_outstanding)),
            dispatcher: Arc::new(dispatcher),
            services,
            service_ready,
            ready,
        })
    }

    /// Issue a command without tracking a response.
    pub fn send<A: CommandRecord>(&mut self, command: Command, arg: &A) -> Result<()> {
        let message = self.dispatcher.issue(command, arg)?;
        self.transport.send(message)?;
        Ok(())
    }

    /// Issue a command and track the response matching `key`.
    pub fn send_tracked<A: CommandRecord>(
        &mut self,
        command: Command,
        arg: &A,
        key: PendingKey,
    ) -> Result<()> {
        let timeout = self.dispatcher.config().default_op_timeout;
        self.send_tracked_with_timeout(command, arg, key, timeout)
    }

    pub fn send_tracked_with_timeout<A: CommandRecord>(
        &mut self,
        command: Command,
        arg: &A,
        key: PendingKey,
        timeout: Duration,
    ) -> Result<()> {
        let transport = &mut self.transport;
        send_tracked(&self.dispatcher, &self.pending, command, arg, key, timeout, |m| {
            transport.send(m)
        })
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// A decoded event completes any operation it answers. An event that
    /// cannot be decoded is returned as an error; the session stays usable.
    pub fn poll_event(&mut self, timeout: Duration) -> Result<Option<WmiEvent>> {
        Ok(self.poll(timeout)?.map(|received| received.event))
    }

    /// Like [`poll_event`](Self::poll_event), also naming the operation the
    /// event completed.
    pub fn poll(&mut self, timeout: Duration) -> Result<Option<Received>> {
        let message = self.transport.recv(timeout)?;
        receive(&self.dispatcher, &self.pending, message)
    }

    /// Report tracked operations whose deadline has passed.
    pub fn expire_pending(&self) -> Vec<PendingFailure> {
        self.pending.expire(Instant::now())
    }

    pub fn context(&self) -> &AbiContext {
        self.dispatcher.context()
    }

    pub fn generation(&self) -> ProtocolGeneration {
        self.dispatcher.context().generation()
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn service_ready(&self) -> &ServiceReady {
        &self.service_ready
    }

    pub fn ready(&self) -> &Ready {
        &self.ready
    }

    pub fn firmware_version(&self) -> FirmwareVersion {
        self.service_ready.firmware_version(self.generation())
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T: SplitTransport> Session<T> {
    /// Split into halves that can issue commands and receive events from
    /// different threads.
    ///
    /// Both halves share the dispatcher and the outstanding-operation table.
    pub fn split(self) -> (SessionSender<T::Sink>, SessionReceiver<T::Source>) {
        let (sink, source) = self.transport.split();
        (
            SessionSender {
                sink,
                dispatcher: Arc::clone(&self.dispatcher),
                pending: Arc::clone(&self.pending),
            },
            SessionReceiver {
                source,
                dispatcher: self.dispatcher,
                pending: self.pending,
            },
        )
    }
}

/// An event together with the tracked operation it completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub event: WmiEvent,
    pub completed: Option<PendingKey>,
}

/// Command-issuing half of a split [`Session`].
#[derive(Debug)]
pub struct SessionSender<S> {
    sink: S,
    dispatcher: Arc<Dispatcher>,
    pending: Arc<PendingTable>,
}

impl<S: WmiSink> SessionSender<S> {
    pub fn send<A: CommandRecord>(&mut self, command: Command, arg: &A) -> Result<()> {
        let message = self.dispatcher.issue(command, arg)?;
        self.sink.send(message)?;
        Ok(())
    }

    pub fn send_tracked<A: CommandRecord>(
        &mut self,
        command: Command,
        arg: &A,
        key: PendingKey,
    ) -> Result<()> {
        let timeout = self.dispatcher.config().default_op_timeout;
        self.send_tracked_with_timeout(command, arg, key, timeout)
    }

    pub fn send_tracked_with_timeout<A: CommandRecord>(
        &mut self,
        command: Command,
        arg: &A,
        key: PendingKey,
        timeout: Duration,
    ) -> Result<()> {
        let sink = &mut self.sink;
        send_tracked(&self.dispatcher, &self.pending, command, arg, key, timeout, |m| {
            sink.send(m)
        })
    }

    pub fn expire_pending(&self) -> Vec<PendingFailure> {
        self.pending.expire(Instant::now())
    }

    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }
}

/// Event-receiving half of a split [`Session`].
#[derive(Debug)]
pub struct SessionReceiver<R> {
    source: R,
    dispatcher: Arc<Dispatcher>,
    pending: Arc<PendingTable>,
}

impl<R: WmiSource> SessionReceiver<R> {
    pub fn poll_event(&mut self, timeout: Duration) -> Result<Option<WmiEvent>> {
        Ok(self.poll(timeout)?.map(|received| received.event))
    }

    pub fn poll(&mut self, timeout: Duration) -> Result<Option<Received>> {
        let message = self.source.recv(timeout)?;
        receive(&self.dispatcher, &self.pending, message)
    }

    pub fn context(&self) -> &AbiContext {
        self.dispatcher.context()
    }

    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }
}

/// Register `key`, then send. A failed send drops the registration.
///
/// Registration comes first so a response racing the send on another
/// thread still finds its entry.
fn send_tracked<A: CommandRecord>(
    dispatcher: &Dispatcher,
    pending: &PendingTable,
    command: Command,
    arg: &A,
    key: PendingKey,
    timeout: Duration,
    send: impl FnOnce(Bytes) -> athwmi_transport::Result<()>,
) -> Result<()> {
    let message = dispatcher.issue(command, arg)?;
    pending.register(key, timeout)?;
    if let Err(err) = send(message) {
        pending.cancel(&key);
        return Err(err.into());
    }
    Ok(())
}

fn receive(
    dispatcher: &Dispatcher,
    pending: &PendingTable,
    message: Option<Bytes>,
) -> Result<Option<Received>> {
    let Some(message) = message else {
        return Ok(None);
    };
    let event = dispatcher.receive_message(message)?;
    let completed = pending.resolve(&event);
    Ok(Some(Received { event, completed }))
}

/// Read events until `select` accepts one or `timeout` runs out.
///
/// Anything else that arrives meanwhile, including undecodable messages, is
/// logged and dropped.
fn wait_for<T, R>(
    transport: &mut T,
    dispatcher: &Dispatcher,
    timeout: Duration,
    mut select: impl FnMut(WmiEvent) -> Option<R>,
) -> Result<R>
where
    T: WmiTransport + ?Sized,
{
    let deadline = Instant::now() + timeout;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err(SessionError::Timeout(timeout));
        }

        let Some(message) = transport.recv(deadline - now)? else {
            continue;
        };
        match dispatcher.receive_message(message) {
            Ok(event) => {
                let kind = event.kind();
                match select(event) {
                    Some(wanted) => return Ok(wanted),
                    None => debug!(event = ?kind, "ignoring event during attach"),
                }
            }
            Err(err) => debug!(error = %err, "dropped message during attach"),
        }
    }
}
