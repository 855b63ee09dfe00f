//! Command Module
//!
//! This module turns decoded requests into responses.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Parser    │  (protocol module)
//! └────────┬────────┘
//!          │ array of bulk strings
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  name = upper(args[0]), rest = arguments
//! └────────┬────────┘
//!          │ lookup
//!          ▼
//! ┌─────────────────┐
//! │ CommandRegistry │  "PING" | "SET" | "GET" | "HSET" | "HGET" | "HGETALL"
//! └────────┬────────┘
//!          │ fn(&Store, &[RespValue])
//!          ▼
//! ┌─────────────────┐
//! │     Store       │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Errors
//!
//! Command errors never close a connection. A wrong argument count comes
//! back as a RESP error frame. An unknown command name comes back as an
//! empty simple string (`+\r\n`), which existing clients of this server
//! expect in place of an error.
//!
//! ## Argument coercion
//!
//! Arguments are read with [`RespValue::bulk_or_empty`]: anything that is not
//! a bulk string reads as an empty payload. `SET` with an integer argument
//! therefore stores an empty value instead of failing.

pub mod handler;
pub mod hash;
pub mod registry;
pub mod server;
pub mod string;

use crate::protocol::RespValue;
use thiserror::Error;

pub use handler::CommandHandler;
pub use registry::{CommandFn, CommandRegistry};

/// Errors produced while executing a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Argument count does not match the command's arity.
    /// Holds the command name in lowercase.
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    /// No command registered under this (uppercase) name
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),
}

/// Result type returned by command handlers.
pub type CommandResult = Result<RespValue, CommandError>;

impl From<CommandError> for RespValue {
    fn from(err: CommandError) -> Self {
        RespValue::error(err.to_string())
    }
}

/// Checks that a command received exactly `expected` arguments.
pub(crate) fn expect_args(
    args: &[RespValue],
    expected: usize,
    name: &'static str,
) -> Result<(), CommandError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(CommandError::WrongArity(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_arity_message() {
        let err = CommandError::WrongArity("hgetall");
        assert_eq!(
            err.to_string(),
            "ERR wrong number of arguments for 'hgetall' command"
        );
        assert_eq!(
            RespValue::from(err),
            RespValue::error("ERR wrong number of arguments for 'hgetall' command")
        );
    }

    #[test]
    fn test_expect_args() {
        let args = vec![RespValue::null(), RespValue::null()];
        assert!(expect_args(&args, 2, "set").is_ok());
        assert_eq!(
            expect_args(&args, 1, "get"),
            Err(CommandError::WrongArity("get"))
        );
    }
}
