//! Errors reported by store collaborators.

/// A failure reported by a [`KvStore`](crate::KvStore).
///
/// The wrapper treats every variant the same way (a failure that may be
/// cured by reconnecting); the variants exist so callers and logs can tell
/// a dead connection from a slow one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The connection is missing, refused, reset or otherwise unusable.
    #[error("connection error: {0}")]
    Connection(String),

    /// The command did not complete within the client's own timeout.
    #[error("command timed out: {0}")]
    Timeout(String),

    /// The store answered with something the client could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Anything else the client reported.
    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Returns `true` for errors that point at the connection itself.
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => Self::Timeout(error.to_string()),
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => Self::Connection(error.to_string()),
            ErrorKind::InvalidData => Self::Protocol(error.to_string()),
            _ => Self::Other(error.to_string()),
        }
    }
}
