//! Server error taxonomy.
//!
//! Only [`ServerError::Bind`] fails an operation; everything else flows on
//! the error stream and leaves the server running.

use std::io;
use std::net::SocketAddr;

use padbridge_dsu_protocol::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("send to {peer} failed: {source}")]
    Send {
        peer: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("short send to {peer}: wrote {written} of {expected} bytes")]
    ShortSend {
        peer: SocketAddr,
        written: usize,
        expected: usize,
    },

    #[error("dropped malformed datagram from {peer}: {source}")]
    Malformed {
        peer: SocketAddr,
        #[source]
        source: ProtocolError,
    },

    #[error("socket receive error: {0}")]
    Receive(#[source] io::Error),

    #[error("pad source in slot {slot} failed: {message}")]
    Source { slot: usize, message: String },

    #[error("pad source refused to start streaming: {0}")]
    SourceStart(String),

    #[error("server task has shut down")]
    Closed,
}
