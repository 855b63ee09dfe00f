//! Command table.
//!
//! Maps uppercase command names to handler functions. The table is built
//! once at startup and only read afterwards, so it is shared between
//! connection tasks behind an `Arc` without any locking.

use crate::commands::{hash, server, string, CommandError, CommandResult};
use crate::protocol::RespValue;
use crate::storage::Store;
use std::collections::HashMap;
use std::fmt;

/// Handler signature: the shared store and the arguments after the command name.
pub type CommandFn = fn(&Store, &[RespValue]) -> CommandResult;

/// Name-keyed table of command handlers.
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandFn>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates a registry holding every supported command.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("PING", server::ping);
        registry.register("SET", string::set);
        registry.register("GET", string::get);
        registry.register("HSET", hash::hset);
        registry.register("HGET", hash::hget);
        registry.register("HGETALL", hash::hgetall);
        registry
    }

    /// Creates a registry with no commands.
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers `handler` under `name`, replacing any previous entry.
    ///
    /// `name` must already be uppercase; lookups upper-case the incoming name.
    pub fn register(&mut self, name: &'static str, handler: CommandFn) {
        debug_assert_eq!(name, name.to_ascii_uppercase());
        self.commands.insert(name, handler);
    }

    /// Finds the handler for an uppercase command name.
    pub fn lookup(&self, name: &str) -> Result<CommandFn, CommandError> {
        self.commands
            .get(name)
            .copied()
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))
    }

    /// Runs the handler registered under `name`.
    ///
    /// Handler errors are turned into RESP error frames. An unknown name is
    /// returned as an error so the caller decides how to answer it.
    pub fn invoke(
        &self,
        name: &str,
        store: &Store,
        args: &[RespValue],
    ) -> Result<RespValue, CommandError> {
        let handler = self.lookup(name)?;
        Ok(handler(store, args).unwrap_or_else(RespValue::from))
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(Bytes::from(s.to_string()))
    }

    #[test]
    fn test_default_commands() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.names(),
            vec!["GET", "HGET", "HGETALL", "HSET", "PING", "SET"]
        );
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.lookup("FOOBAR").err(),
            Some(CommandError::UnknownCommand("FOOBAR".to_string()))
        );
        // Lookups are exact; case folding is the dispatcher's job
        assert!(registry.lookup("ping").is_err());
    }

    #[test]
    fn test_invoke_maps_errors_to_frames() {
        let registry = CommandRegistry::new();
        let store = Store::new();

        let response = registry.invoke("GET", &store, &[]).unwrap();
        assert_eq!(
            response,
            RespValue::error("ERR wrong number of arguments for 'get' command")
        );
    }

    #[test]
    fn test_register_custom_command() {
        fn echo(_: &Store, args: &[RespValue]) -> CommandResult {
            Ok(args.first().cloned().unwrap_or_else(RespValue::null))
        }

        let mut registry = CommandRegistry::empty();
        assert!(registry.is_empty());
        registry.register("ECHO", echo);

        let store = Store::new();
        let response = registry.invoke("ECHO", &store, &[bulk("hi")]).unwrap();
        assert_eq!(response, bulk("hi"));
    }
}
