use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// A message link to the firmware.
///
/// Each message is one complete WMI message: the header word followed by
/// the record payload. The transport never looks inside it.
pub trait WmiTransport: Send {
    /// Hand one message to the link.
    fn send(&mut self, message: Bytes) -> Result<()>;

    /// Wait up to `timeout` for the next inbound message.
    ///
    /// `Ok(None)` means the wait elapsed with nothing to read.
    fn recv(&mut self, timeout: Duration) -> Result<Option<Bytes>>;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

impl<T: WmiTransport + ?Sized> WmiTransport for Box<T> {
    fn send(&mut self, message: Bytes) -> Result<()> {
        (**self).send(message)
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<Bytes>> {
        (**self).recv(timeout)
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

/// The sending half of a split transport.
pub trait WmiSink: Send {
    fn send(&mut self, message: Bytes) -> Result<()>;
}

/// The receiving half of a split transport.
pub trait WmiSource: Send {
    /// Wait up to `timeout` for the next inbound message.
    fn recv(&mut self, timeout: Duration) -> Result<Option<Bytes>>;
}

/// A transport whose directions can be driven from different threads.
pub trait SplitTransport: WmiTransport + Sized {
    type Sink: WmiSink;
    type Source: WmiSource;

    fn split(self) -> (Self::Sink, Self::Source);
}
