//! Wire-format tests pinning the exact datagram layouts the consumer relies
//! on. A regression in any of these breaks real emulators.

use padbridge_dsu_protocol as dsu;
use padbridge_pad_types::{
    BatteryStatus, ConnectionType, DualShockMeta, MacAddress, NormalizedReport, PadModel, PadState,
};

fn meta_with_mac(pad_id: u8, mac: &str) -> DualShockMeta {
    DualShockMeta {
        pad_id,
        state: PadState::Connected,
        model: PadModel::FullGyro,
        connection: ConnectionType::Usb,
        mac: mac.parse().expect("test MAC"),
        battery: BatteryStatus::Full,
        is_active: true,
    }
}

#[test]
fn header_prefix_of_every_response() {
    let meta = meta_with_mac(0, "aa:bb:cc:dd:ee:ff");
    for datagram in [
        dsu::version_response(0xAABB_CCDD),
        dsu::port_info_response(0xAABB_CCDD, &meta),
        dsu::pad_data_response(0xAABB_CCDD, &meta, &NormalizedReport::default()),
    ] {
        assert_eq!(&datagram[0..4], b"DSUS");
        assert_eq!(
            u16::from_le_bytes([datagram[4], datagram[5]]),
            dsu::PROTOCOL_VERSION
        );
        assert_eq!(
            u16::from_le_bytes([datagram[6], datagram[7]]) as usize,
            datagram.len() - dsu::HEADER_LEN
        );
        assert_eq!(
            u32::from_le_bytes([datagram[12], datagram[13], datagram[14], datagram[15]]),
            0xAABB_CCDD
        );
    }
}

#[test]
fn crc_invariant_holds_for_every_response() {
    let meta = meta_with_mac(3, "01:02:03:04:05:06");
    for datagram in [
        dsu::version_response(1),
        dsu::port_info_response(1, &meta),
        dsu::pad_data_response(1, &meta, &NormalizedReport::default()),
    ] {
        let stored = u32::from_le_bytes([datagram[8], datagram[9], datagram[10], datagram[11]]);
        assert_eq!(stored, dsu::datagram_crc(&datagram));
    }
}

#[test]
fn version_handshake_body() {
    // Request as a real client sends it: "DSUC", ver 1001, len 4, type only.
    let request = dsu::version_request(0x1234_5678);
    assert_eq!(&request[0..4], b"DSUC");
    assert_eq!(request.len(), 20);

    let (header, parsed) = dsu::parse_request(&request).expect("well-formed request");
    assert_eq!(header.peer_id, 0x1234_5678);
    assert_eq!(parsed, dsu::Request::Version);

    let reply = dsu::version_response(0xCAFE_BABE);
    assert_eq!(reply.len(), 24);
    assert_eq!(
        u32::from_le_bytes([reply[16], reply[17], reply[18], reply[19]]),
        dsu::MSG_VERSION
    );
    assert_eq!(
        u32::from_le_bytes([reply[20], reply[21], reply[22], reply[23]]),
        dsu::MAX_PROTOCOL_VERSION as u32
    );
}

#[test]
fn port_info_mac_bytes_sit_at_offsets_24_to_29() {
    let reply = dsu::port_info_response(7, &meta_with_mac(2, "11:22:33:44:55:66"));
    assert_eq!(reply.len(), 32);
    assert_eq!(&reply[24..30], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
}

#[test]
fn pad_data_carries_slot_in_byte_20() {
    for pad_id in 0..4u8 {
        let reply = dsu::pad_data_response(
            7,
            &meta_with_mac(pad_id, "11:22:33:44:55:66"),
            &NormalizedReport::default(),
        );
        assert_eq!(reply.len(), dsu::PAD_DATA_LEN);
        assert_eq!(reply[20], pad_id);
    }
}

#[test]
fn tampering_anywhere_outside_crc_field_is_detected() {
    let request = dsu::pad_data_request(9, 0, 0, MacAddress::NIL);
    for position in (0..request.len()).filter(|p| !(8..12).contains(p)) {
        let mut tampered = request.clone();
        tampered[position] ^= 0x01;
        assert!(
            dsu::parse_request(&tampered).is_err(),
            "bit flip at byte {position} must not parse"
        );
    }
}

#[test]
fn version_above_max_is_rejected_even_with_valid_crc() {
    // Rebuild the datagram by hand so the CRC is valid for the bumped version.
    let mac = MacAddress::NIL;
    let mut writer = dsu::PacketWriter::with_capacity(28);
    writer.write_u32_le(dsu::MSG_PAD_DATA).write_u8(0).write_u8(0).write_mac(mac);
    let body = writer.into_inner();

    let mut datagram = Vec::new();
    datagram.extend_from_slice(&dsu::CLIENT_MAGIC);
    datagram.extend_from_slice(&(dsu::MAX_PROTOCOL_VERSION + 1).to_le_bytes());
    datagram.extend_from_slice(&(body.len() as u16).to_le_bytes());
    datagram.extend_from_slice(&[0u8; 4]);
    datagram.extend_from_slice(&0u32.to_le_bytes());
    datagram.extend_from_slice(&body);
    let crc = dsu::datagram_crc(&datagram);
    datagram[8..12].copy_from_slice(&crc.to_le_bytes());

    assert_eq!(
        dsu::parse_request(&datagram),
        Err(dsu::ProtocolError::UnsupportedVersion(
            dsu::MAX_PROTOCOL_VERSION + 1
        ))
    );
}
