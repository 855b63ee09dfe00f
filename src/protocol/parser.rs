//! RESP Protocol Decoder
//!
//! This module decodes one RESP value at a time from the front of a byte
//! buffer.
//!
//! ## How the Parser Works
//!
//! The parser reads from a buffer and returns either:
//! - `Ok(Some((value, consumed)))` - Decoded one value occupying exactly `consumed` bytes
//! - `Ok(None)` - The buffer holds only a prefix of a value
//! - `Err(ProtocolError)` - Invalid protocol data
//!
//! This lets the caller:
//! 1. Append incoming network data to a buffer
//! 2. Call `parse()` to attempt decoding
//! 3. If successful, advance the buffer by `consumed` bytes
//! 4. If incomplete, wait for more data
//! 5. If error, drop the client: once framing is lost there is no safe
//!    offset to resynchronize from
//!
//! Bulk string payloads are taken by length, never by scanning for CRLF, so
//! they may contain arbitrary bytes.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use std::num::ParseIntError;
use thiserror::Error;

/// Errors raised for malformed wire input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Unknown type prefix byte
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// A length line or integer line is not a base-10 i64
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a simple string, error, or length line
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative but not -1
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Bulk string payload is not followed by CRLF
    #[error("bulk string missing trailing CRLF")]
    MissingCrlf,

    /// Arrays nested deeper than the configured limit
    #[error("maximum nesting depth exceeded: {max}")]
    NestingTooDeep { max: usize },

    /// A bulk string exceeds the configured maximum size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ProtocolError>;

/// Default maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Default maximum array nesting depth
pub const MAX_NESTING_DEPTH: usize = 32;

/// Upper bound on the capacity reserved up front for an array.
/// The declared count is untrusted; the vector grows past this as elements arrive.
const MAX_PREALLOC: usize = 1024;

/// A RESP decoder with configurable limits.
///
/// # Example
///
/// ```
/// use respkv::protocol::{RespParser, RespValue};
/// use bytes::Bytes;
///
/// let parser = RespParser::new();
/// let buffer = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n+OK\r\n";
///
/// let (value, consumed) = parser.parse(buffer).unwrap().unwrap();
/// assert_eq!(consumed, 23);
/// assert_eq!(
///     value,
///     RespValue::array(vec![
///         RespValue::bulk_string(Bytes::from("GET")),
///         RespValue::bulk_string(Bytes::from("name")),
///     ])
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RespParser {
    /// Maximum number of nested arrays
    max_depth: usize,
    /// Maximum bulk string payload in bytes
    max_bulk_size: usize,
}

impl Default for RespParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RespParser {
    /// Creates a parser with the default limits.
    pub fn new() -> Self {
        Self::with_limits(MAX_NESTING_DEPTH, MAX_BULK_SIZE)
    }

    /// Creates a parser with explicit limits.
    ///
    /// `max_depth` counts nested arrays: with a limit of 1 a flat command
    /// array is accepted but an array inside it is rejected.
    pub fn with_limits(max_depth: usize, max_bulk_size: usize) -> Self {
        Self {
            max_depth,
            max_bulk_size,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_bulk_size(&self) -> usize {
        self.max_bulk_size
    }

    /// Attempts to decode one RESP value from the front of `buf`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((value, consumed)))` - Successfully decoded a value
    /// - `Ok(None)` - Incomplete data, need more bytes
    /// - `Err(e)` - Malformed input
    pub fn parse(&self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        self.parse_value(buf, 0)
    }

    /// Internal recursive parsing function. `depth` is the number of arrays
    /// enclosing the value being decoded.
    fn parse_value(&self, buf: &[u8], depth: usize) -> ParseResult<Option<(RespValue, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        match buf[0] {
            prefix::SIMPLE_STRING => {
                Ok(parse_text_line(buf)?.map(|(s, n)| (RespValue::SimpleString(s), n)))
            }
            prefix::ERROR => Ok(parse_text_line(buf)?.map(|(s, n)| (RespValue::Error(s), n))),
            prefix::INTEGER => Ok(parse_length_line(buf)?.map(|(n, c)| (RespValue::Integer(n), c))),
            prefix::BULK_STRING => self.parse_bulk_string(buf),
            prefix::ARRAY => self.parse_array(buf, depth),
            other => Err(ProtocolError::UnknownPrefix(other)),
        }
    }

    /// Parses a bulk string: `$<length>\r\n<data>\r\n`
    fn parse_bulk_string(&self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        debug_assert!(buf[0] == prefix::BULK_STRING);

        let (length, header_len) = match parse_length_line(buf)? {
            Some(line) => line,
            None => return Ok(None),
        };

        // Null bulk string
        if length == -1 {
            return Ok(Some((RespValue::Null, header_len)));
        }

        if length < 0 {
            return Err(ProtocolError::InvalidBulkLength(length));
        }

        let length = usize::try_from(length).map_err(|_| ProtocolError::MessageTooLarge {
            size: usize::MAX,
            max: self.max_bulk_size,
        })?;

        if length > self.max_bulk_size {
            return Err(ProtocolError::MessageTooLarge {
                size: length,
                max: self.max_bulk_size,
            });
        }

        let data_end = header_len + length;
        let total_needed = data_end + CRLF.len();
        if buf.len() < total_needed {
            return Ok(None);
        }

        if &buf[data_end..total_needed] != CRLF {
            return Err(ProtocolError::MissingCrlf);
        }

        let data = Bytes::copy_from_slice(&buf[header_len..data_end]);

        Ok(Some((RespValue::BulkString(data), total_needed)))
    }

    /// Parses an array: `*<count>\r\n<elements...>`
    fn parse_array(&self, buf: &[u8], depth: usize) -> ParseResult<Option<(RespValue, usize)>> {
        debug_assert!(buf[0] == prefix::ARRAY);

        if depth >= self.max_depth {
            return Err(ProtocolError::NestingTooDeep {
                max: self.max_depth,
            });
        }

        let (count, header_len) = match parse_length_line(buf)? {
            Some(line) => line,
            None => return Ok(None),
        };

        // Every negative count is a null array, not only -1
        if count < 0 {
            return Ok(Some((RespValue::Null, header_len)));
        }

        let count = count as usize;
        let mut elements = Vec::with_capacity(count.min(MAX_PREALLOC));
        let mut consumed = header_len;

        for _ in 0..count {
            match self.parse_value(&buf[consumed..], depth + 1)? {
                Some((value, element_consumed)) => {
                    elements.push(value);
                    consumed += element_consumed;
                }
                None => return Ok(None),
            }
        }

        Ok(Some((RespValue::Array(elements), consumed)))
    }
}

/// Reads the CRLF-terminated line that follows the type prefix.
///
/// Returns the line content (terminator stripped) and the total number of
/// bytes including prefix and CRLF.
fn read_line(buf: &[u8]) -> Option<(&[u8], usize)> {
    find_crlf(&buf[1..]).map(|pos| (&buf[1..1 + pos], 1 + pos + CRLF.len()))
}

/// Parses the body of a simple string or error line.
fn parse_text_line(buf: &[u8]) -> ParseResult<Option<(String, usize)>> {
    match read_line(buf) {
        Some((content, consumed)) => {
            let s = std::str::from_utf8(content)
                .map_err(|e| ProtocolError::InvalidUtf8(e.to_string()))?;
            Ok(Some((s.to_string(), consumed)))
        }
        None => Ok(None),
    }
}

/// Parses an integer line (`:`) or the length line of a bulk string or array.
fn parse_length_line(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    match read_line(buf) {
        Some((content, consumed)) => {
            let s = std::str::from_utf8(content)
                .map_err(|e| ProtocolError::InvalidUtf8(e.to_string()))?;
            let n: i64 = s
                .parse()
                .map_err(|e: ParseIntError| ProtocolError::InvalidInteger(e.to_string()))?;
            Ok(Some((n, consumed)))
        }
        None => Ok(None),
    }
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found, or None if CRLF is not present.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Decodes a single RESP value with the default limits.
pub fn parse_message(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    RespParser::new().parse(buf)
}
