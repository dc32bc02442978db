//! Error types for the control session.
//!
//! Every fallible operation in this crate returns [`ControlError`]. Failures
//! reported by the daemon itself (status codes of 400 and above) arrive as
//! [`ControlError::Rejected`]; everything else describes the transport, the
//! local configuration, or a reply the codec could not make sense of.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for all control session operations.
#[derive(Error, Debug)]
pub enum ControlError {
    /// The underlying stream reported an error.
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// The control port could not be opened, or the greeting was not `250`.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The daemon refused our credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A command was issued while the session is disconnected.
    #[error("Not connected to the control port")]
    NotConnected,

    /// A reply line carried a failure status code.
    #[error("Command rejected (code {code}): {message}")]
    Rejected {
        /// The status code returned by the daemon.
        code: u16,
        /// The message text of the failing line.
        message: String,
    },

    /// A reply line did not follow the `<code><sep><message>` layout.
    #[error("Malformed reply: {0}")]
    Malformed(String),

    /// A well-formed reply did not contain what the operation expected.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The authentication cookie could not be read.
    #[error("Failed to read cookie file '{}': {source}", path.display())]
    CookieFile {
        /// Path that was read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Invalid session configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Opening the transport took longer than the configured timeout.
    #[error("Operation timed out")]
    Timeout,

    /// The daemon closed the connection.
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,
}

impl ControlError {
    /// Whether this error means the transport can no longer be used.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ControlError::Transport(_) | ControlError::ConnectionClosed
        )
    }

    /// Whether the link must be dropped after this error.
    ///
    /// Besides transport failures this covers replies that could not be
    /// decoded: the rest of such a reply is still in flight and would be
    /// read as the answer to the next command.
    pub fn breaks_link(&self) -> bool {
        self.is_transport() || matches!(self, ControlError::Malformed(_))
    }
}

/// Result type alias for control session operations.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Reply status codes defined by the control protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 250 - OK
    Ok = 250,
    /// 251 - Operation was unnecessary
    OperationUnnecessary = 251,
    /// 451 - Resource exhausted
    ResourceExhausted = 451,
    /// 500 - Syntax error: protocol
    SyntaxErrorProtocol = 500,
    /// 510 - Unrecognized command
    UnrecognizedCommand = 510,
    /// 511 - Unimplemented command
    UnimplementedCommand = 511,
    /// 512 - Syntax error in command argument
    SyntaxErrorArgument = 512,
    /// 513 - Unrecognized command argument
    UnrecognizedArgument = 513,
    /// 514 - Authentication required
    AuthenticationRequired = 514,
    /// 515 - Bad authentication
    BadAuthentication = 515,
    /// 550 - Unspecified error
    UnspecifiedError = 550,
    /// 551 - Internal error
    InternalError = 551,
    /// 552 - Unrecognized entity
    UnrecognizedEntity = 552,
    /// 553 - Invalid configuration value
    InvalidConfigValue = 553,
    /// 554 - Invalid descriptor
    InvalidDescriptor = 554,
    /// 555 - Unmanaged entity
    UnmanagedEntity = 555,
    /// Any other code
    Other = 0,
}

impl StatusCode {
    /// Codes at or above this value are failures.
    pub const FAILURE_THRESHOLD: u16 = 400;

    /// Map a numeric code to a known status.
    pub fn from_u16(code: u16) -> Self {
        match code {
            250 => StatusCode::Ok,
            251 => StatusCode::OperationUnnecessary,
            451 => StatusCode::ResourceExhausted,
            500 => StatusCode::SyntaxErrorProtocol,
            510 => StatusCode::UnrecognizedCommand,
            511 => StatusCode::UnimplementedCommand,
            512 => StatusCode::SyntaxErrorArgument,
            513 => StatusCode::UnrecognizedArgument,
            514 => StatusCode::AuthenticationRequired,
            515 => StatusCode::BadAuthentication,
            550 => StatusCode::UnspecifiedError,
            551 => StatusCode::InternalError,
            552 => StatusCode::UnrecognizedEntity,
            553 => StatusCode::InvalidConfigValue,
            554 => StatusCode::InvalidDescriptor,
            555 => StatusCode::UnmanagedEntity,
            _ => StatusCode::Other,
        }
    }

    /// Whether a raw code marks a failed line.
    pub fn is_failure(code: u16) -> bool {
        code >= Self::FAILURE_THRESHOLD
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode::from_u16(code)
    }
}
