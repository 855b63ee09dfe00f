//! String keyspace commands.

use crate::commands::{expect_args, CommandResult};
use crate::protocol::RespValue;
use crate::storage::Store;
use tracing::debug;

/// SET key value
pub fn set(store: &Store, args: &[RespValue]) -> CommandResult {
    expect_args(args, 2, "set")?;

    let key = args[0].bulk_or_empty();
    let value = args[1].bulk_or_empty();

    debug!(key = ?key, len = value.len(), "SET");
    store.set(key, value);

    Ok(RespValue::ok())
}

/// GET key
pub fn get(store: &Store, args: &[RespValue]) -> CommandResult {
    expect_args(args, 1, "get")?;

    let key = args[0].bulk_or_empty();

    match store.get(&key) {
        Some(value) => Ok(RespValue::bulk_string(value)),
        None => {
            debug!(key = ?key, "GET miss");
            Ok(RespValue::null())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;
    use bytes::Bytes;

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(Bytes::from(s.to_string()))
    }

    #[test]
    fn test_set_get() {
        let store = Store::new();
        assert_eq!(set(&store, &[bulk("key"), bulk("value")]), Ok(RespValue::ok()));
        assert_eq!(get(&store, &[bulk("key")]), Ok(bulk("value")));
    }

    #[test]
    fn test_get_nonexistent() {
        let store = Store::new();
        assert_eq!(get(&store, &[bulk("nope")]), Ok(RespValue::null()));
    }

    #[test]
    fn test_set_overwrites() {
        let store = Store::new();
        set(&store, &[bulk("key"), bulk("one")]).unwrap();
        set(&store, &[bulk("key"), bulk("two")]).unwrap();
        assert_eq!(get(&store, &[bulk("key")]), Ok(bulk("two")));
    }

    #[test]
    fn test_set_arity() {
        let store = Store::new();
        assert_eq!(
            set(&store, &[bulk("key")]),
            Err(CommandError::WrongArity("set"))
        );
        assert_eq!(
            set(&store, &[bulk("key"), bulk("value"), bulk("extra")]),
            Err(CommandError::WrongArity("set"))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_arity() {
        let store = Store::new();
        assert_eq!(get(&store, &[]), Err(CommandError::WrongArity("get")));
        assert_eq!(
            get(&store, &[bulk("a"), bulk("b")]),
            Err(CommandError::WrongArity("get"))
        );
    }

    #[test]
    fn test_non_bulk_arguments_read_as_empty() {
        let store = Store::new();
        set(&store, &[RespValue::integer(1), RespValue::simple_string("x")]).unwrap();
        assert_eq!(get(&store, &[bulk("")]), Ok(bulk("")));
    }

    #[test]
    fn test_binary_values() {
        let store = Store::new();
        let payload = RespValue::bulk_string(Bytes::from_static(b"\x00\r\n\xff"));
        set(&store, &[bulk("bin"), payload.clone()]).unwrap();
        assert_eq!(get(&store, &[bulk("bin")]), Ok(payload));
    }
}
