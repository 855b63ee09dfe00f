//! Connection-level commands.

use crate::commands::{CommandError, CommandResult};
use crate::protocol::RespValue;
use crate::storage::Store;
use tracing::debug;

/// PING [message]
///
/// Replies with `PONG`, or echoes the message back as a simple string.
/// A simple string cannot carry line breaks, so CR and LF in the message
/// are echoed as spaces.
pub fn ping(_store: &Store, args: &[RespValue]) -> CommandResult {
    match args {
        [] => Ok(RespValue::pong()),
        [message] => {
            let message = message.bulk_or_empty();
            debug!(message = ?message, "PING with message");
            let echo = String::from_utf8_lossy(&message).replace(['\r', '\n'], " ");
            Ok(RespValue::simple_string(echo))
        }
        _ => Err(CommandError::WrongArity("ping")),
    }
}
