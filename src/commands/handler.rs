//! Command dispatcher.
//!
//! Splits a decoded request into a command name and its arguments, then runs
//! the matching handler from the [`CommandRegistry`] against the shared
//! [`Store`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ split name  │───>│  lookup()   │───>│  handler()  │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │                                               │             │
//! │                                               ▼             │
//! │                                             Store           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::commands::{CommandError, CommandRegistry};
use crate::protocol::RespValue;
use crate::storage::Store;
use std::sync::Arc;
use tracing::debug;

/// Dispatches requests to command handlers.
///
/// Cloning is cheap: the store and the registry are shared through `Arc`s,
/// so every connection task gets its own handle onto the same state.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// The shared store
    store: Arc<Store>,
    /// Command table, built once at startup
    registry: Arc<CommandRegistry>,
}

impl CommandHandler {
    /// Creates a dispatcher over `store` using the default command table.
    pub fn new(store: Arc<Store>) -> Self {
        Self::with_registry(store, Arc::new(CommandRegistry::new()))
    }

    /// Creates a dispatcher with an explicit command table.
    pub fn with_registry(store: Arc<Store>, registry: Arc<CommandRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Executes one request and returns the response to write back.
    ///
    /// `request` is the element list of a decoded array. The first element is
    /// the command name, read leniently and upper-cased; the rest are the
    /// arguments.
    ///
    /// Returns `None` for an empty request: nothing is written back for it.
    pub fn execute(&self, request: &[RespValue]) -> Option<RespValue> {
        let (name, args) = request.split_first()?;

        let name = String::from_utf8_lossy(&name.bulk_or_empty()).to_uppercase();
        debug!(command = %name, args = args.len(), "Executing command");

        let response = match self.registry.invoke(&name, &self.store, args) {
            Ok(response) => response,
            Err(CommandError::UnknownCommand(name)) => {
                debug!(command = %name, "Unknown command");
                RespValue::simple_string("")
            }
            Err(err) => RespValue::from(err),
        };

        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn create_handler() -> CommandHandler {
        CommandHandler::new(Arc::new(Store::new()))
    }

    fn make_command(args: &[&str]) -> Vec<RespValue> {
        args.iter()
            .map(|s| RespValue::bulk_string(Bytes::from(s.to_string())))
            .collect()
    }

    fn run(handler: &CommandHandler, args: &[&str]) -> RespValue {
        handler.execute(&make_command(args)).unwrap()
    }

    #[test]
    fn test_ping() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["PING"]), RespValue::pong());
        assert_eq!(
            run(&handler, &["PING", "hello"]),
            RespValue::simple_string("hello")
        );
    }

    #[test]
    fn test_command_name_is_case_insensitive() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["ping"]), RespValue::pong());
        assert_eq!(run(&handler, &["sEt", "k", "v"]), RespValue::ok());
        assert_eq!(
            run(&handler, &["get", "k"]),
            RespValue::bulk_string(Bytes::from("v"))
        );
    }

    #[test]
    fn test_set_get() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["SET", "key", "value"]), RespValue::ok());
        assert_eq!(
            run(&handler, &["GET", "key"]),
            RespValue::bulk_string(Bytes::from("value"))
        );
    }

    #[test]
    fn test_get_nonexistent() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["GET", "nonexistent"]), RespValue::null());
    }

    #[test]
    fn test_hash_commands() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["HSET", "h", "f1", "v1"]), RespValue::ok());
        assert_eq!(run(&handler, &["HSET", "h", "f2", "v2"]), RespValue::ok());
        assert_eq!(
            run(&handler, &["HGET", "h", "f1"]),
            RespValue::bulk_string(Bytes::from("v1"))
        );
        assert_eq!(run(&handler, &["HGET", "h", "f3"]), RespValue::null());
        assert_eq!(run(&handler, &["HGET", "h2", "f1"]), RespValue::null());

        let all = run(&handler, &["HGETALL", "h"]).into_array().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(run(&handler, &["HGETALL", "h2"]), RespValue::null());
    }

    #[test]
    fn test_wrong_arity() {
        let handler = create_handler();
        let cases = vec![
            (vec!["SET", "k"], "set"),
            (vec!["SET", "k", "v", "x"], "set"),
            (vec!["GET"], "get"),
            (vec!["HSET", "h", "f"], "hset"),
            (vec!["HGET", "h"], "hget"),
            (vec!["HGETALL"], "hgetall"),
            (vec!["PING", "a", "b"], "ping"),
        ];

        for (command, name) in cases {
            assert_eq!(
                run(&handler, &command),
                RespValue::error(format!(
                    "ERR wrong number of arguments for '{}' command",
                    name
                ))
            );
        }
    }

    #[test]
    fn test_unknown_command() {
        let handler = create_handler();
        let response = run(&handler, &["FOOBAR"]);
        assert_eq!(response, RespValue::simple_string(""));
        assert!(!response.is_error());
    }

    #[test]
    fn test_non_bulk_command_name_is_unknown() {
        let handler = create_handler();
        let response = handler.execute(&[RespValue::integer(1)]).unwrap();
        assert_eq!(response, RespValue::simple_string(""));
    }

    #[test]
    fn test_empty_request_has_no_response() {
        let handler = create_handler();
        assert_eq!(handler.execute(&[]), None);
    }

    #[test]
    fn test_clones_share_store() {
        let handler = create_handler();
        let other = handler.clone();
        run(&handler, &["SET", "shared", "1"]);
        assert_eq!(
            run(&other, &["GET", "shared"]),
            RespValue::bulk_string(Bytes::from("1"))
        );
        assert_eq!(other.store().len(), 1);
    }
}
