//! Error types for the ChainRelay core primitives and decode path.

use thiserror::Error;

/// Errors from parsing or validating a compact base-32 name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Name '{name}' is longer than 13 characters")]
    TooLong { name: String },

    #[error("Invalid character '{ch}' in name '{name}'")]
    InvalidChar { name: String, ch: char },

    #[error("13th character '{ch}' of '{name}' is out of range (must be one of .1-5a-j)")]
    ThirteenthOutOfRange { name: String, ch: char },
}

/// Errors from parsing or validating a symbol or asset.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("Symbol code '{code}' is empty or longer than 7 characters")]
    BadLength { code: String },

    #[error("Invalid character '{ch}' in symbol code '{code}' (must be A-Z)")]
    InvalidChar { code: String, ch: char },

    #[error("Invalid asset string '{input}': {reason}")]
    BadAsset { input: String, reason: String },

    #[error("Amount overflows a signed 64-bit integer: {input}")]
    AmountOverflow { input: String },
}

/// Errors from the little-endian wire codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unexpected end of input: wanted {wanted} more bytes, {remaining} left")]
    UnexpectedEof { wanted: usize, remaining: usize },

    #[error("varuint32 is longer than 5 bytes")]
    VaruintOverflow,

    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("Invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("{remaining} trailing bytes after the last field")]
    TrailingBytes { remaining: usize },
}

/// Errors from loading or interrogating an ABI definition.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("Failed to read ABI file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse ABI JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors from decoding a transaction against cached ABI definitions.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Decode deadline exceeded after {ms}ms")]
    DeadlineExceeded { ms: u64 },

    #[error("Unknown ABI type '{name}'")]
    UnknownType { name: String },

    #[error("Typedef recursion limit reached while resolving '{name}'")]
    RecursionLimit { name: String },

    #[error("Wire codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
