//! Error and result types for settings resolution and dispatch.
use bson::oid;

use std::{error, fmt, io, sync};

/// A type for results generated by this crate.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Server error code reported for a duplicate `_id`.
pub const DUPLICATE_KEY: i32 = 11000;
/// Server error code reported when replication does not complete within `wtimeout`.
pub const WRITE_CONCERN_TIMEOUT: i32 = 64;
/// Server error code reported for an unrecognized `w` mode.
pub const UNKNOWN_REPL_WRITE_CONCERN: i32 = 79;

/// The error type for configuration and dispatch of MongoDB operations.
#[derive(Debug)]
pub enum Error {
    /// An option key, value, or shape was rejected.
    ConfigurationError(String),
    /// A flag received a value of the wrong type.
    TypeError(String),
    /// The server reported an error for an acknowledged operation.
    OperationFailure { code: i32, message: String },
    /// A connection string could not be parsed.
    ArgumentError(String),
    /// A server reply was missing an expected field.
    ResponseError(String),
    /// A settings lock was poisoned.
    LockError,
    /// The command log could not be written.
    IoError(io::Error),
    /// An `_id` could not be generated.
    OIDError(oid::Error),
    /// A monitoring hook failed while reporting an operation.
    EventListenerError(Option<Box<Error>>),
}

impl Error {
    /// Returns true if this error was reported by the server.
    pub fn is_operation_failure(&self) -> bool {
        match *self {
            Error::OperationFailure { .. } => true,
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<oid::Error> for Error {
    fn from(err: oid::Error) -> Error {
        Error::OIDError(err)
    }
}

impl<T> From<sync::PoisonError<T>> for Error {
    fn from(_: sync::PoisonError<T>) -> Error {
        Error::LockError
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::ConfigurationError(ref inner) => write!(fmt, "ConfigurationError: {}", inner),
            Error::TypeError(ref inner) => write!(fmt, "TypeError: {}", inner),
            Error::OperationFailure { code, ref message } => {
                write!(fmt, "OperationFailure ({}): {}", code, message)
            }
            Error::ArgumentError(ref inner) => inner.fmt(fmt),
            Error::ResponseError(ref inner) => inner.fmt(fmt),
            Error::LockError => fmt.write_str("Settings lock poisoned."),
            Error::IoError(ref inner) => inner.fmt(fmt),
            Error::OIDError(ref inner) => inner.fmt(fmt),
            Error::EventListenerError(ref inner) => match *inner {
                Some(ref err) => write!(fmt, "Event listener failed while handling: {}", err),
                None => fmt.write_str("Event listener failed."),
            },
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref inner) => Some(inner),
            Error::OIDError(ref inner) => Some(inner),
            Error::EventListenerError(Some(ref inner)) => Some(inner.as_ref()),
            _ => None,
        }
    }
}
