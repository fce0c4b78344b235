//! Server-reported errors for write operations.
use bson::{self, Bson};

use crate::error::Error::{self, OperationFailure, ResponseError};
use crate::resolver::Decision;
use crate::Result;

use std::convert::TryFrom;
use std::fmt;

/// The error reported in a write acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    pub code: i32,
    pub message: String,
    /// True if the error was a replication timeout rather than a failed write.
    pub wtimeout: bool,
}

impl fmt::Display for LastError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "LastError (code {}): {}", self.code, self.message)
    }
}

impl From<LastError> for Error {
    fn from(err: LastError) -> Error {
        OperationFailure { code: err.code, message: err.message }
    }
}

impl LastError {
    pub fn new<T: ToString>(code: i32, message: T) -> LastError {
        LastError { code, message: message.to_string(), wtimeout: false }
    }

    /// Parses the error out of an acknowledgment document, if there is one.
    ///
    /// Write failures are reported under `err`; command failures set `ok` to 0 and
    /// report under `errmsg`.
    pub fn parse(reply: &bson::Document) -> Result<Option<LastError>> {
        let code = match reply.get("code") {
            Some(&Bson::I32(code)) => code,
            Some(&Bson::I64(code)) => i32::try_from(code).map_err(|_| {
                ResponseError(format!("Error code out of range in reply: {}", code))
            })?,
            _ => 0,
        };

        let wtimeout = match reply.get("wtimeout") {
            Some(&Bson::Boolean(b)) => b,
            _ => false,
        };

        match reply.get("err") {
            Some(&Bson::String(ref message)) => {
                return Ok(Some(LastError { code, message: message.to_owned(), wtimeout }))
            }
            Some(&Bson::Null) | None => (),
            Some(other) => {
                return Err(ResponseError(format!("Invalid err field in reply: {}", other)))
            }
        }

        let ok = match reply.get("ok") {
            Some(&Bson::I32(n)) => n != 0,
            Some(&Bson::I64(n)) => n != 0,
            Some(&Bson::FloatingPoint(f)) => f != 0.0,
            Some(&Bson::Boolean(b)) => b,
            _ => return Err(ResponseError(format!("No ok field in reply: {:?}", reply))),
        };

        if ok {
            return Ok(None);
        }

        let message = match reply.get("errmsg") {
            Some(&Bson::String(ref message)) => message.to_owned(),
            _ => String::from("Command failed."),
        };

        Ok(Some(LastError { code, message, wtimeout }))
    }

    /// Validates a write result against the decision it was sent with.
    ///
    /// Unacknowledged writes never fail here, whatever the reply says.
    pub fn validate_write_result(reply: bson::Document,
                                 decision: &Decision)
                                 -> Result<Option<bson::Document>> {
        if !decision.acknowledge() {
            return Ok(None);
        }

        match LastError::parse(&reply)? {
            Some(err) => Err(err.into()),
            None => Ok(Some(reply)),
        }
    }
}
