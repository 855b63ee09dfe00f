//! Hash keyspace commands.

use crate::commands::{expect_args, CommandResult};
use crate::protocol::RespValue;
use crate::storage::Store;
use tracing::debug;

/// HSET hash field value
pub fn hset(store: &Store, args: &[RespValue]) -> CommandResult {
    expect_args(args, 3, "hset")?;

    let hash = args[0].bulk_or_empty();
    let field = args[1].bulk_or_empty();
    let value = args[2].bulk_or_empty();

    debug!(hash = ?hash, field = ?field, "HSET");
    store.hset(hash, field, value);

    Ok(RespValue::ok())
}

/// HGET hash field
pub fn hget(store: &Store, args: &[RespValue]) -> CommandResult {
    expect_args(args, 2, "hget")?;

    let hash = args[0].bulk_or_empty();
    let field = args[1].bulk_or_empty();

    match store.hget(&hash, &field) {
        Some(value) => Ok(RespValue::bulk_string(value)),
        None => {
            debug!(hash = ?hash, field = ?field, "HGET miss");
            Ok(RespValue::null())
        }
    }
}

/// HGETALL hash
///
/// Field/value pairs come back flattened as alternating bulk strings.
/// Pair order is unspecified.
pub fn hgetall(store: &Store, args: &[RespValue]) -> CommandResult {
    expect_args(args, 1, "hgetall")?;

    let hash = args[0].bulk_or_empty();

    let pairs = match store.hgetall(&hash) {
        Some(pairs) => pairs,
        None => {
            debug!(hash = ?hash, "HGETALL on missing hash");
            return Ok(RespValue::null());
        }
    };

    debug!(hash = ?hash, pairs = pairs.len(), "HGETALL");
    let items = pairs
        .into_iter()
        .flat_map(|(field, value)| [RespValue::bulk_string(field), RespValue::bulk_string(value)])
        .collect();

    Ok(RespValue::array(items))
}
