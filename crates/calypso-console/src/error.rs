use thiserror::Error;

/// Console-related errors
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("cannot connect to console at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("console I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The prompt did not show up within the read timeout. `partial` holds
    /// whatever was received before giving up.
    #[error("timed out waiting for prompt {expected:?}")]
    Timeout { expected: String, partial: String },

    #[error("console closed the connection")]
    Closed,

    #[error("console session is not connected")]
    NotConnected,

    #[error("command must be a single line: {0:?}")]
    MultiLine(String),
}
