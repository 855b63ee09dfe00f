//! Server configuration.
//!
//! Parsed from command-line arguments. Logging verbosity is controlled
//! separately through `RUST_LOG`.

use crate::protocol::parser::{MAX_BULK_SIZE, MAX_NESTING_DEPTH};
use crate::protocol::RespParser;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use thiserror::Error;

/// Errors raised while reading command-line arguments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum number of nested arrays accepted in one request
    pub max_depth: usize,
    /// Maximum bulk string payload in bytes
    pub max_bulk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_depth: MAX_NESTING_DEPTH,
            max_bulk_size: MAX_BULK_SIZE,
        }
    }
}

/// What the binary should do after reading its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Run(Config),
    Help,
    Version,
}

impl Config {
    /// Parses command-line arguments, excluding the program name.
    pub fn from_args<I, S>(args: I) -> Result<CliAction, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter().map(Into::<String>::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    config.host = next_value(&mut args, &arg)?;
                }
                "--port" | "-p" => {
                    config.port = parse_value(&mut args, &arg)?;
                }
                "--max-depth" => {
                    let depth: usize = parse_value(&mut args, &arg)?;
                    // Every request is an array, so at least one level is needed
                    if depth == 0 {
                        return Err(ConfigError::InvalidValue {
                            flag: arg.clone(),
                            value: depth.to_string(),
                        });
                    }
                    config.max_depth = depth;
                }
                "--max-bulk-size" => {
                    config.max_bulk_size = parse_value(&mut args, &arg)?;
                }
                "--help" => return Ok(CliAction::Help),
                "--version" | "-v" => return Ok(CliAction::Version),
                _ => return Err(ConfigError::UnknownArgument(arg.clone())),
            }
        }

        Ok(CliAction::Run(config))
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds a decoder with the configured limits.
    pub fn parser(&self) -> RespParser {
        RespParser::with_limits(self.max_depth, self.max_bulk_size)
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, ConfigError> {
    args.next()
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn parse_value<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T, ConfigError> {
    let value = next_value(args, flag)?;
    value.parse().map_err(|_| ConfigError::InvalidValue {
        flag: flag.to_string(),
        value,
    })
}

/// Usage text printed for `--help` and after argument errors.
pub fn help_text() -> String {
    format!(
        r#"
respkv - A minimal in-memory RESP key-value server

USAGE:
    respkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>             Host to bind to (default: {host})
    -p, --port <PORT>             Port to listen on (default: {port})
        --max-depth <N>           Maximum nested arrays per request (default: {depth})
        --max-bulk-size <BYTES>   Maximum bulk string size (default: {bulk})
    -v, --version                 Print version information
        --help                    Print this help message

ENVIRONMENT:
    RUST_LOG                      Log filter, e.g. "debug" (default: info)

SUPPORTED COMMANDS:
    PING [message], SET key value, GET key,
    HSET hash field value, HGET hash field, HGETALL hash
"#,
        host = DEFAULT_HOST,
        port = DEFAULT_PORT,
        depth = MAX_NESTING_DEPTH,
        bulk = MAX_BULK_SIZE,
    )
}
