use std::fmt::{Display, Error, Formatter};

use bson::Document;

use crate::error::Error as MongoError;
use crate::resolver::Decision;

/// Emitted before an operation is handed to the transport.
pub struct CommandStarted {
    pub command: Document,
    pub database_name: String,
    pub command_name: String,
    pub request_id: i64,
    pub connection_string: String,
    /// The resolved settings the operation is sent with. Reads carry only routing.
    pub decision: Decision,
}

impl Display for CommandStarted {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
        let decision = serde_json::to_string(&self.decision).unwrap_or_default();
        fmt.write_fmt(format_args!("COMMAND.{} {} STARTED: {:?} DECISION: {}",
                                   self.command_name, self.connection_string, self.command,
                                   decision))
    }
}

pub enum CommandResult<'a> {
    Success {
        duration: u64,
        reply: Document,
        command_name: String,
        request_id: i64,
        connection_string: String,
    },
    Failure {
        duration: u64,
        command_name: String,
        failure: &'a MongoError,
        request_id: i64,
        connection_string: String,
    },
}

impl<'a> CommandResult<'a> {
    pub fn request_id(&self) -> i64 {
        match *self {
            CommandResult::Success { request_id, .. } |
            CommandResult::Failure { request_id, .. } => request_id,
        }
    }

    pub fn is_success(&self) -> bool {
        match *self {
            CommandResult::Success { .. } => true,
            CommandResult::Failure { .. } => false,
        }
    }
}

impl<'a> Display for CommandResult<'a> {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
        match *self {
            CommandResult::Success { duration, ref reply, ref command_name,
                                     ref connection_string, .. } => {
                fmt.write_fmt(format_args!("COMMAND.{} {} COMPLETED: {:?} ({} ns)", command_name,
                                           connection_string, reply, duration))
            }
            CommandResult::Failure { duration, ref command_name, failure,
                                     ref connection_string, .. } => {
                fmt.write_fmt(format_args!("COMMAND.{} {} FAILURE: {} ({} ns)", command_name,
                                           connection_string, failure, duration))
            }
        }
    }
}
