//! The 16-byte packet header: magic, version, length, CRC32, peer id.
//!
//! Validation order matters: length and magic first (cheap), then version,
//! then declared length against the buffer, CRC last. Nothing past the header
//! is touched until the checksum holds.

use crate::ids::{
    CLIENT_MAGIC, CRC_OFFSET, HEADER_LEN, MAX_PROTOCOL_VERSION, PROTOCOL_VERSION, SERVER_MAGIC,
};
use crate::wire::{PacketReader, PacketWriter};
use crate::{ProtocolError, ProtocolResult};

/// Decoded header fields of a validated datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    /// Payload length as declared on the wire (total − 16).
    pub payload_len: u16,
    /// Client id on inbound datagrams, server id on outbound ones.
    pub peer_id: u32,
}

/// CRC32 (IEEE 802.3) over the whole datagram with the CRC field zeroed.
///
/// Hashing in three spans avoids copying the datagram just to blank four
/// bytes. Callers must have length-checked `datagram` to at least
/// [`HEADER_LEN`].
pub fn datagram_crc(datagram: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&datagram[..CRC_OFFSET]);
    hasher.update(&[0u8; 4]);
    hasher.update(&datagram[CRC_OFFSET + 4..]);
    hasher.finalize()
}

fn parse_datagram<'a>(
    expected_magic: [u8; 4],
    datagram: &'a [u8],
) -> ProtocolResult<(Header, PacketReader<'a>)> {
    if datagram.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated {
            expected: HEADER_LEN,
            actual: datagram.len(),
        });
    }

    let mut reader = PacketReader::new(datagram);
    let magic = reader.read_array::<4>()?;
    if magic != expected_magic {
        return Err(ProtocolError::BadMagic(magic));
    }

    let version = reader.read_u16_le()?;
    if version > MAX_PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    let payload_len = reader.read_u16_le()?;
    if HEADER_LEN + payload_len as usize != datagram.len() {
        return Err(ProtocolError::LengthMismatch {
            declared: payload_len as usize,
            actual: datagram.len(),
        });
    }

    let expected_crc = reader.read_u32_le()?;
    let computed = datagram_crc(datagram);
    if expected_crc != computed {
        return Err(ProtocolError::CrcMismatch {
            expected: expected_crc,
            computed,
        });
    }

    let peer_id = reader.read_u32_le()?;
    Ok((
        Header {
            version,
            payload_len,
            peer_id,
        },
        reader,
    ))
}

/// Validate a client-to-server datagram; on success the returned reader is
/// positioned at the message type field.
pub fn parse_client_datagram(datagram: &[u8]) -> ProtocolResult<(Header, PacketReader<'_>)> {
    parse_datagram(CLIENT_MAGIC, datagram)
}

/// Validate a server-to-client datagram. Used by the probe client and tests.
pub fn parse_server_datagram(datagram: &[u8]) -> ProtocolResult<(Header, PacketReader<'_>)> {
    parse_datagram(SERVER_MAGIC, datagram)
}

fn frame(magic: [u8; 4], peer_id: u32, body: &[u8]) -> Vec<u8> {
    let mut writer = PacketWriter::with_capacity(HEADER_LEN + body.len());
    writer
        .write_bytes(&magic)
        .write_u16_le(PROTOCOL_VERSION)
        .write_u16_le(body.len() as u16)
        .write_u32_le(0) // CRC placeholder
        .write_u32_le(peer_id)
        .write_bytes(body);
    let mut datagram = writer.into_inner();
    let crc = datagram_crc(&datagram);
    datagram[CRC_OFFSET..CRC_OFFSET + 4].copy_from_slice(&crc.to_le_bytes());
    datagram
}

/// Frame a server-to-client datagram around `body` (message type included).
pub fn frame_response(server_id: u32, body: &[u8]) -> Vec<u8> {
    frame(SERVER_MAGIC, server_id, body)
}

/// Frame a client-to-server datagram. Used by the probe client and tests.
pub fn frame_request(client_id: u32, body: &[u8]) -> Vec<u8> {
    frame(CLIENT_MAGIC, client_id, body)
}
