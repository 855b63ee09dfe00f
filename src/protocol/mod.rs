//! RESP Protocol Implementation
//!
//! Decoding and encoding of the Redis Serialization Protocol (RESP).
//!
//! ## Modules
//!
//! - `types`: Defines the `RespValue` enum and its encoder
//! - `parser`: Decoder producing one `RespValue` per call
//!
//! ## Example
//!
//! ```
//! use respkv::protocol::{parse_message, RespValue};
//! use bytes::Bytes;
//!
//! // Decoding a request
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (value, consumed) = parse_message(data).unwrap().unwrap();
//! assert_eq!(consumed, data.len());
//!
//! // Encoding a response
//! let response = RespValue::bulk_string(Bytes::from("blue"));
//! assert_eq!(response.serialize(), b"$4\r\nblue\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_message, ParseResult, ProtocolError, RespParser};
pub use types::RespValue;
