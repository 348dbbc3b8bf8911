//! DSU wire constants.
//!
//! Message type codes are shared between request and response directions;
//! the magic distinguishes who is speaking. Values are fixed by the external
//! consumer and must not change.

/// Magic prefix of server-to-client datagrams.
pub const SERVER_MAGIC: [u8; 4] = *b"DSUS";
/// Magic prefix of client-to-server datagrams.
pub const CLIENT_MAGIC: [u8; 4] = *b"DSUC";

/// Protocol version stamped into every outbound header.
pub const PROTOCOL_VERSION: u16 = 1001;
/// Highest protocol version accepted on inbound datagrams.
pub const MAX_PROTOCOL_VERSION: u16 = 1001;

/// Protocol version information exchange.
pub const MSG_VERSION: u32 = 0x10_0000;
/// Port (slot) metadata listing.
pub const MSG_PORT_INFO: u32 = 0x10_0001;
/// Pad data subscription request / pad data report.
pub const MSG_PAD_DATA: u32 = 0x10_0002;

/// Byte length of the common packet header.
pub const HEADER_LEN: usize = 16;
/// Offset of the CRC32 field inside the header.
pub const CRC_OFFSET: usize = 8;

/// Total length of a pad-data response datagram.
pub const PAD_DATA_LEN: usize = 100;
/// Body length of a port-info response (message type included).
pub const PORT_INFO_BODY_LEN: usize = 16;
/// Body length of a version response (message type included).
pub const VERSION_BODY_LEN: usize = 8;

/// Number of controller slots a DSU server exposes.
pub const MAX_PADS: usize = 4;
