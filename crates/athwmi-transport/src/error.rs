/// Errors that can occur while moving WMI messages.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The other end has gone away.
    #[error("transport disconnected")]
    Disconnected,

    /// The message does not fit the link's maximum message size.
    #[error("message too large ({len} bytes, max {max})")]
    MessageTooLarge { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
