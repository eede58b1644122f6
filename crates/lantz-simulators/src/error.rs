//! Error types for the instrument simulators
//!
//! [`CommandError`] describes why a single instrument command failed. It never
//! reaches the process boundary: the server answers `ERROR` and keeps going.
//! [`SimError`] covers everything that can stop a simulator or a client.

/// Failure of a single instrument command
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// Nothing but whitespace was received
    #[error("empty command")]
    Empty,

    /// The line contained non-ASCII bytes
    #[error("command is not ASCII")]
    NotAscii,

    /// The line exceeds the request length limit
    #[error("command longer than {0} bytes")]
    TooLong(usize),

    /// The line does not start with `?` or `!`
    #[error("command '{0}' must start with '?' or '!'")]
    BadPrefix(String),

    /// The instrument does not implement this command
    #[error("unknown command '{0}'")]
    Unknown(String),

    /// Wrong number of arguments
    #[error("'{command}' expects {expected} argument(s), got {got}")]
    ArgumentCount {
        /// Command as received
        command: String,
        /// Number of arguments the command takes
        expected: usize,
        /// Number of arguments received
        got: usize,
    },

    /// An argument could not be parsed
    #[error("invalid argument '{0}'")]
    InvalidArgument(String),

    /// A numeric value is outside the instrument limits
    #[error("{name} = {value} is outside {min}..={max}")]
    OutOfRange {
        /// Quantity being set
        name: &'static str,
        /// Requested value
        value: f64,
        /// Lower limit
        min: f64,
        /// Upper limit
        max: f64,
    },

    /// An IEEE 488.2 definite-length block could not be decoded
    #[error("malformed block: {0}")]
    MalformedBlock(&'static str),
}

/// Errors that stop a simulator or a client session
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Socket or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong and where
        message: String,
    },

    /// The instrument answered `ERROR`
    #[error("instrument rejected '{command}'")]
    Instrument {
        /// Command that was rejected
        command: String,
    },

    /// The peer sent something that violates the message protocol
    #[error("protocol error: {0}")]
    Protocol(#[from] CommandError),

    /// The peer closed the connection before replying
    #[error("connection closed by peer")]
    ConnectionClosed,
}

impl SimError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result alias for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;
