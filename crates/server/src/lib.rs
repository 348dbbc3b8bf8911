//! Cemuhook DSU UDP server.
//!
//! [`DsuServer`] owns a UDP socket, a four-slot table of mounted
//! [`PadSource`]s and a registry of subscribed clients. Inbound datagrams are
//! validated and dispatched to the version / port-info / pad-data handlers;
//! reports flowing in from mounted sources fan out as 100-byte pad-data
//! datagrams to every client whose subscription covers the emitting slot.
//!
//! All state lives inside a single actor task, so the registry and slot
//! table need no locks; the public handle talks to it over a command
//! channel. Reports from one slot reach clients in arrival order.
//!
//! Non-fatal problems (send failures, malformed datagrams, upstream source
//! errors) surface on the error stream returned by
//! [`DsuServer::take_error_stream`]; only a failed bind fails loudly.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod config;
mod dispatch;
pub mod error;
pub mod registry;
pub mod server;
mod slots;
pub mod source;
pub mod synthetic;

pub use config::ServerConfig;
pub use error::ServerError;
pub use registry::ClientRegistry;
pub use server::{DsuServer, ServerStatus};
pub use source::{PadSource, PadStreams};
pub use synthetic::SyntheticSource;
