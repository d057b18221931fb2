use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::{SplitTransport, WmiSink, WmiSource, WmiTransport};

/// One end of an in-process message link.
///
/// Built in pairs: whatever one end sends, the other receives, in order.
/// Used as the host side in tests and as the firmware side of simulators.
pub struct LoopbackTransport {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
    max_message_size: usize,
}

impl LoopbackTransport {
    /// Default largest message either end accepts.
    pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

    /// Create a connected `(host, firmware)` pair.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_max_message_size(Self::DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn pair_with_max_message_size(max_message_size: usize) -> (Self, Self) {
        let (host_tx, fw_rx) = mpsc::channel();
        let (fw_tx, host_rx) = mpsc::channel();
        debug!(max_message_size, "created loopback pair");
        (
            Self {
                tx: host_tx,
                rx: host_rx,
                max_message_size,
            },
            Self {
                tx: fw_tx,
                rx: fw_rx,
                max_message_size,
            },
        )
    }

    /// Take the next message if one is already queued.
    pub fn try_recv(&mut self) -> Result<Option<Bytes>> {
        match self.rx.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

fn send_bounded(tx: &Sender<Bytes>, max_message_size: usize, message: Bytes) -> Result<()> {
    if message.len() > max_message_size {
        return Err(TransportError::MessageTooLarge {
            len: message.len(),
            max: max_message_size,
        });
    }
    trace!(len = message.len(), "loopback send");
    tx.send(message).map_err(|_| TransportError::Disconnected)
}

fn recv_timeout(rx: &Receiver<Bytes>, timeout: Duration) -> Result<Option<Bytes>> {
    match rx.recv_timeout(timeout) {
        Ok(message) => Ok(Some(message)),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Err(TransportError::Disconnected),
    }
}

impl WmiTransport for LoopbackTransport {
    fn send(&mut self, message: Bytes) -> Result<()> {
        send_bounded(&self.tx, self.max_message_size, message)
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<Bytes>> {
        recv_timeout(&self.rx, timeout)
    }

    fn transport_name(&self) -> &'static str {
        "loopback"
    }
}

/// Sending half of a split [`LoopbackTransport`].
pub struct LoopbackSink {
    tx: Sender<Bytes>,
    max_message_size: usize,
}

/// Receiving half of a split [`LoopbackTransport`].
pub struct LoopbackSource {
    rx: Receiver<Bytes>,
}

impl SplitTransport for LoopbackTransport {
    type Sink = LoopbackSink;
    type Source = LoopbackSource;

    fn split(self) -> (LoopbackSink, LoopbackSource) {
        (
            LoopbackSink {
                tx: self.tx,
                max_message_size: self.max_message_size,
            },
            LoopbackSource { rx: self.rx },
        )
    }
}

impl WmiSink for LoopbackSink {
    fn send(&mut self, message: Bytes) -> Result<()> {
        send_bounded(&self.tx, self.max_message_size, message)
    }
}

impl WmiSource for LoopbackSource {
    fn recv(&mut self, timeout: Duration) -> Result<Option<Bytes>> {
        recv_timeout(&self.rx, timeout)
    }
}

impl std::fmt::Debug for LoopbackSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackSink")
            .field("max_message_size", &self.max_message_size)
            .finish()
    }
}

impl std::fmt::Debug for LoopbackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackSource").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("max_message_size", &self.max_message_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_delivers_in_order() {
        let (mut host, mut fw) = LoopbackTransport::pair();
        host.send(Bytes::from_static(b"one")).unwrap();
        host.send(Bytes::from_static(b"two")).unwrap();
        assert_eq!(fw.recv(Duration::from_millis(10)).unwrap().unwrap(), "one");
        assert_eq!(fw.recv(Duration::from_millis(10)).unwrap().unwrap(), "two");

        fw.send(Bytes::from_static(b"ack")).unwrap();
        assert_eq!(host.try_recv().unwrap().unwrap(), "ack");
        assert!(host.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_recv_timeout_is_none() {
        let (mut host, _fw) = LoopbackTransport::pair();
        assert!(host.recv(Duration::from_millis(5)).unwrap().is_none());
    }

    #[test]
    fn test_dropped_peer_disconnects() {
        let (mut host, fw) = LoopbackTransport::pair();
        drop(fw);
        assert!(matches!(
            host.recv(Duration::from_millis(5)),
            Err(TransportError::Disconnected)
        ));
        assert!(matches!(
            host.send(Bytes::from_static(b"x")),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn test_oversize_message_rejected() {
        let (mut host, _fw) = LoopbackTransport::pair_with_max_message_size(8);
        let result = host.send(Bytes::from(vec![0u8; 9]));
        assert!(matches!(
            result,
            Err(TransportError::MessageTooLarge { len: 9, max: 8 })
        ));
    }

    #[test]
    fn test_split_halves_work_across_threads() {
        let (host, mut fw) = LoopbackTransport::pair_with_max_message_size(16);
        let (mut sink, mut source) = host.split();
        let reader = std::thread::spawn(move || {
            let first = source.recv(Duration::from_secs(1)).unwrap().unwrap();
            let second = source.recv(Duration::from_secs(1)).unwrap().unwrap();
            (first, second)
        });
        sink.send(Bytes::from_static(b"ping")).unwrap();
        assert!(matches!(
            sink.send(Bytes::from(vec![0u8; 17])),
            Err(TransportError::MessageTooLarge { len: 17, max: 16 })
        ));
        assert_eq!(fw.recv(Duration::from_secs(1)).unwrap().unwrap(), "ping");
        fw.send(Bytes::from_static(b"a")).unwrap();
        fw.send(Bytes::from_static(b"b")).unwrap();
        assert_eq!(reader.join().unwrap(), (Bytes::from_static(b"a"), Bytes::from_static(b"b")));
    }

    #[test]
    fn test_cross_thread() {
        let (mut host, mut fw) = LoopbackTransport::pair();
        let handle = std::thread::spawn(move || {
            let msg = fw.recv(Duration::from_secs(1)).unwrap().unwrap();
            fw.send(msg).unwrap();
        });
        host.send(Bytes::from_static(b"echo")).unwrap();
        assert_eq!(host.recv(Duration::from_secs(1)).unwrap().unwrap(), "echo");
        handle.join().unwrap();
    }
}
