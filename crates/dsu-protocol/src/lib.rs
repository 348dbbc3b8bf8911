//! Cemuhook DSU (DualShock UDP) wire protocol.
//!
//! This crate frames, serializes and parses the three DSU message exchanges
//! a motion provider speaks:
//!
//! | Exchange | Request body | Response body |
//! |----------|--------------|---------------|
//! | Version      | none | `{ type, max version }`, 8 bytes |
//! | Port info    | `{ count: i32, indices }` | 16 bytes per occupied slot |
//! | Pad data     | `{ flags, id, mac }` | 100-byte datagram per report |
//!
//! ## Framing
//!
//! Every datagram starts with a 16-byte header: 4-byte magic (`"DSUC"` from
//! clients, `"DSUS"` from the server), u16 LE protocol version, u16 LE payload
//! length (total − 16), u32 LE CRC32 and a u32 LE peer id. The CRC is the
//! IEEE 802.3 polynomial computed over the whole datagram with the CRC field
//! zeroed; both sides verify it before anything else is trusted.
//!
//! The pad-data response layout is bit-exact to what the Cemuhook consumer
//! expects: 100 bytes, motion tail as two u32 timestamp halves followed by
//! six IEEE-754 LE floats. See [`response`] for the full offset map.
//!
//! All parsing is allocation-light and never panics on arbitrary input;
//! malformed datagrams surface as [`ProtocolError`] so the server can drop
//! them without replying.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod header;
pub mod ids;
pub mod request;
pub mod response;
pub mod wire;

pub use header::*;
pub use ids::*;
pub use request::*;
pub use response::*;
pub use wire::*;

use thiserror::Error;

/// Errors raised while validating or decoding a DSU datagram.
///
/// Any of these means the datagram must be dropped without a reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("datagram too short: {actual} bytes, need at least {expected}")]
    Truncated { expected: usize, actual: usize },

    #[error("bad magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unsupported protocol version {0}, max {max}", max = ids::MAX_PROTOCOL_VERSION)]
    UnsupportedVersion(u16),

    #[error("declared payload length {declared} inconsistent with {actual}-byte datagram")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("CRC mismatch: header carries {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch { expected: u32, computed: u32 },

    #[error("unknown message type {0:#x}")]
    UnknownMessageType(u32),

    #[error("pad request count {0} outside 0..=4")]
    BadPadRequestCount(i32),

    #[error("pad index {0} outside 0..=3")]
    BadPadIndex(u8),

    #[error("invalid {field} byte {value:#04x}")]
    BadFieldValue { field: &'static str, value: u8 },
}

/// Convenience result alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
