/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The target could not be resolved to any socket address.
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        source: std::io::Error,
    },

    /// No resolved address accepted a connection.
    ///
    /// `source` is the error from the last candidate that was tried.
    #[error("failed to connect to {target} ({attempts} address(es) tried): {source}")]
    Connect {
        target: String,
        attempts: usize,
        source: std::io::Error,
    },

    /// Failed to bind a listener to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on an established stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    pub(crate) fn connect(target: &str, attempts: usize, source: std::io::Error) -> Self {
        Self::Connect {
            target: target.to_string(),
            attempts,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
