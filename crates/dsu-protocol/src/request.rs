//! Client-to-server messages: parsing on the server side, building for the
//! probe client and the test suites.

use padbridge_pad_types::MacAddress;

use crate::header::{frame_request, parse_client_datagram};
use crate::ids::{MAX_PADS, MSG_PAD_DATA, MSG_PORT_INFO, MSG_VERSION};
use crate::wire::PacketWriter;
use crate::{Header, ProtocolError, ProtocolResult};

/// A pad-data subscription request.
///
/// The flags byte selects which subscription dimensions the request touches:
/// bit 0 registers by pad id, bit 1 by MAC, and a zero flags byte registers
/// for all pads. Bits may be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadDataRequest {
    pub flags: u8,
    pub pad_id: u8,
    pub mac: MacAddress,
}

impl PadDataRequest {
    pub fn registers_all_pads(&self) -> bool {
        self.flags == 0
    }

    pub fn registers_pad_id(&self) -> bool {
        self.flags & 0x01 != 0
    }

    pub fn registers_mac(&self) -> bool {
        self.flags & 0x02 != 0
    }
}

/// A validated client request, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Version,
    /// Slot indices the client wants metadata for, each already checked
    /// against `0..=3`. May be empty.
    ListPorts { pad_indices: Vec<u8> },
    PadData(PadDataRequest),
}

/// Validate and decode one inbound datagram.
///
/// Header checks (magic, version, declared length, CRC) run first; the
/// message body is only interpreted once the datagram is known intact.
pub fn parse_request(datagram: &[u8]) -> ProtocolResult<(Header, Request)> {
    let (header, mut reader) = parse_client_datagram(datagram)?;
    let message_type = reader.read_u32_le()?;

    let request = match message_type {
        MSG_VERSION => Request::Version,
        MSG_PORT_INFO => {
            let count = reader.read_i32_le()?;
            if !(0..=MAX_PADS as i32).contains(&count) {
                return Err(ProtocolError::BadPadRequestCount(count));
            }
            let mut pad_indices = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let index = reader.read_u8()?;
                if index as usize >= MAX_PADS {
                    return Err(ProtocolError::BadPadIndex(index));
                }
                pad_indices.push(index);
            }
            Request::ListPorts { pad_indices }
        }
        MSG_PAD_DATA => {
            let flags = reader.read_u8()?;
            let pad_id = reader.read_u8()?;
            let mac = reader.read_mac()?;
            Request::PadData(PadDataRequest { flags, pad_id, mac })
        }
        other => return Err(ProtocolError::UnknownMessageType(other)),
    };

    Ok((header, request))
}

/// Build a version request datagram.
pub fn version_request(client_id: u32) -> Vec<u8> {
    let mut body = PacketWriter::with_capacity(4);
    body.write_u32_le(MSG_VERSION);
    frame_request(client_id, &body.into_inner())
}

/// Build a port listing request for the given slot indices.
pub fn list_ports_request(client_id: u32, pad_indices: &[u8]) -> Vec<u8> {
    let mut body = PacketWriter::with_capacity(8 + pad_indices.len());
    body.write_u32_le(MSG_PORT_INFO)
        .write_u32_le(pad_indices.len() as u32)
        .write_bytes(pad_indices);
    frame_request(client_id, &body.into_inner())
}

/// Build a pad-data subscription request.
pub fn pad_data_request(client_id: u32, flags: u8, pad_id: u8, mac: MacAddress) -> Vec<u8> {
    let mut body = PacketWriter::with_capacity(12);
    body.write_u32_le(MSG_PAD_DATA)
        .write_u8(flags)
        .write_u8(pad_id)
        .write_mac(mac);
    frame_request(client_id, &body.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_request_round_trips() -> ProtocolResult<()> {
        let datagram = version_request(0xCAFE);
        let (header, request) = parse_request(&datagram)?;
        assert_eq!(header.peer_id, 0xCAFE);
        assert_eq!(request, Request::Version);
        Ok(())
    }

    #[test]
    fn list_ports_round_trips() -> ProtocolResult<()> {
        let datagram = list_ports_request(1, &[0, 2, 3]);
        let (_, request) = parse_request(&datagram)?;
        assert_eq!(
            request,
            Request::ListPorts {
                pad_indices: vec![0, 2, 3]
            }
        );
        Ok(())
    }

    #[test]
    fn empty_list_ports_is_valid() -> ProtocolResult<()> {
        let datagram = list_ports_request(1, &[]);
        let (_, request) = parse_request(&datagram)?;
        assert_eq!(request, Request::ListPorts { pad_indices: vec![] });
        Ok(())
    }

    #[test]
    fn list_ports_rejects_count_out_of_range() {
        let mut body = PacketWriter::with_capacity(16);
        body.write_u32_le(MSG_PORT_INFO)
            .write_u32_le(5)
            .write_bytes(&[0, 1, 2, 3, 0]);
        let datagram = frame_request(1, &body.into_inner());
        assert_eq!(
            parse_request(&datagram).expect_err("count 5"),
            ProtocolError::BadPadRequestCount(5)
        );
    }

    #[test]
    fn list_ports_rejects_negative_count() {
        let mut body = PacketWriter::with_capacity(8);
        body.write_u32_le(MSG_PORT_INFO).write_u32_le(u32::MAX);
        let datagram = frame_request(1, &body.into_inner());
        assert_eq!(
            parse_request(&datagram).expect_err("count -1"),
            ProtocolError::BadPadRequestCount(-1)
        );
    }

    #[test]
    fn list_ports_rejects_index_out_of_range() {
        let datagram = list_ports_request(1, &[4]);
        assert_eq!(
            parse_request(&datagram).expect_err("index 4"),
            ProtocolError::BadPadIndex(4)
        );
    }

    #[test]
    fn pad_data_flag_combinations() -> ProtocolResult<()> {
        let mac = MacAddress([9, 8, 7, 6, 5, 4]);

        let (_, request) = parse_request(&pad_data_request(1, 0x00, 0, MacAddress::NIL))?;
        let Request::PadData(req) = request else {
            panic!("expected pad data request");
        };
        assert!(req.registers_all_pads());
        assert!(!req.registers_pad_id());
        assert!(!req.registers_mac());

        let (_, request) = parse_request(&pad_data_request(1, 0x03, 2, mac))?;
        let Request::PadData(req) = request else {
            panic!("expected pad data request");
        };
        assert!(!req.registers_all_pads());
        assert!(req.registers_pad_id());
        assert!(req.registers_mac());
        assert_eq!(req.pad_id, 2);
        assert_eq!(req.mac, mac);
        Ok(())
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let mut body = PacketWriter::with_capacity(4);
        body.write_u32_le(0x10_0003);
        let datagram = frame_request(1, &body.into_inner());
        assert_eq!(
            parse_request(&datagram).expect_err("unknown type"),
            ProtocolError::UnknownMessageType(0x10_0003)
        );
    }

    #[test]
    fn truncated_pad_data_body_is_rejected() {
        let mut body = PacketWriter::with_capacity(6);
        body.write_u32_le(MSG_PAD_DATA).write_u8(0).write_u8(0);
        // MAC bytes missing entirely.
        let datagram = frame_request(1, &body.into_inner());
        assert!(matches!(
            parse_request(&datagram).expect_err("truncated"),
            ProtocolError::Truncated { .. }
        ));
    }
}
