//! Command Monitoring
//!
//! The APM module provides an interface for monitoring and responding to runtime information
//! about operations sent to the transport. Every operation triggers start and completion hooks
//! defined on the client, and each start event carries the acknowledgment and routing decision
//! resolved for it. Each operation is also logged, if a log file was specified during
//! instantiation of the client.
mod event;
mod listener;

pub use self::event::{CommandStarted, CommandResult};
pub use self::listener::{CompletionHook, EventRunner, Listener, StartHook};
