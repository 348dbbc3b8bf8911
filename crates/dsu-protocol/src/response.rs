//! Server-to-client messages: the version reply, per-slot port info, and the
//! 100-byte pad-data datagram.
//!
//! ## Pad-data layout
//!
//! Offsets are relative to the start of the datagram; all multi-byte values
//! little-endian, floats IEEE-754.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0  | 16 | header |
//! | 16 | 4  | message type (`MSG_PAD_DATA`) |
//! | 20 | 4  | pad id, state, model, connection type |
//! | 24 | 6  | MAC address octets |
//! | 30 | 2  | battery status, is-active |
//! | 32 | 4  | packet counter |
//! | 36 | 2  | button bitmaps (d-pad/meta, face/shoulder) |
//! | 38 | 2  | PS button, touch button |
//! | 40 | 4  | left stick X/Y, right stick X/Y |
//! | 44 | 4  | analog d-pad left, down, right, up |
//! | 48 | 4  | analog square, cross, circle, triangle |
//! | 52 | 2  | analog R1, L1 |
//! | 54 | 2  | trigger R2, L2 |
//! | 56 | 6  | touch #1: active, id, X, Y |
//! | 62 | 6  | touch #2: active, id, X, Y |
//! | 68 | 8  | motion timestamp (µs), low half first |
//! | 76 | 12 | accelerometer X, Y, Z |
//! | 88 | 12 | gyroscope X, Y, Z |
//!
//! Total 100 bytes, exactly what the Cemuhook consumer expects.

use padbridge_pad_types::{
    BatteryStatus, Buttons, ConnectionType, DualShockMeta, MotionVector, NormalizedReport,
    PadModel, PadState, StickPosition, TouchPoint,
};

use crate::header::{frame_response, parse_server_datagram};
use crate::ids::{
    MAX_PROTOCOL_VERSION, MSG_PAD_DATA, MSG_PORT_INFO, MSG_VERSION, PAD_DATA_LEN,
    PORT_INFO_BODY_LEN, VERSION_BODY_LEN,
};
use crate::wire::{PacketReader, PacketWriter};
use crate::{ProtocolError, ProtocolResult};

const PRESSED: u8 = 0xFF;

/// Build the version handshake reply.
pub fn version_response(server_id: u32) -> Vec<u8> {
    let mut body = PacketWriter::with_capacity(VERSION_BODY_LEN);
    body.write_u32_le(MSG_VERSION)
        .write_u32_le(MAX_PROTOCOL_VERSION as u32);
    frame_response(server_id, &body.into_inner())
}

fn write_meta(body: &mut PacketWriter, meta: &DualShockMeta) {
    body.write_u8(meta.pad_id)
        .write_u8(meta.state as u8)
        .write_u8(meta.model as u8)
        .write_u8(meta.connection as u8)
        .write_mac(meta.mac)
        .write_u8(meta.battery as u8);
}

/// Build one port-info reply for an occupied slot.
pub fn port_info_response(server_id: u32, meta: &DualShockMeta) -> Vec<u8> {
    let mut body = PacketWriter::with_capacity(PORT_INFO_BODY_LEN);
    body.write_u32_le(MSG_PORT_INFO);
    write_meta(&mut body, meta);
    body.write_u8(0);
    frame_response(server_id, &body.into_inner())
}

fn dpad_meta_bitmap(buttons: &Buttons) -> u8 {
    (u8::from(buttons.dpad_left) << 7)
        | (u8::from(buttons.dpad_down) << 6)
        | (u8::from(buttons.dpad_right) << 5)
        | (u8::from(buttons.dpad_up) << 4)
        | (u8::from(buttons.options) << 3)
        | (u8::from(buttons.r3) << 2)
        | (u8::from(buttons.l3) << 1)
        | u8::from(buttons.share)
}

fn face_shoulder_bitmap(buttons: &Buttons) -> u8 {
    (u8::from(buttons.square) << 7)
        | (u8::from(buttons.cross) << 6)
        | (u8::from(buttons.circle) << 5)
        | (u8::from(buttons.triangle) << 4)
        | (u8::from(buttons.r1) << 3)
        | (u8::from(buttons.l1) << 2)
        | (u8::from(buttons.r2) << 1)
        | u8::from(buttons.l2)
}

fn analog_from(pressed: bool) -> u8 {
    if pressed { PRESSED } else { 0x00 }
}

fn write_touch(body: &mut PacketWriter, touch: &TouchPoint) {
    body.write_bool(touch.is_active)
        .write_u8(touch.id)
        .write_u16_le(touch.x)
        .write_u16_le(touch.y);
}

/// Serialize one report into the 100-byte pad-data datagram.
pub fn pad_data_response(
    server_id: u32,
    meta: &DualShockMeta,
    report: &NormalizedReport,
) -> Vec<u8> {
    let mut body = PacketWriter::with_capacity(PAD_DATA_LEN);
    body.write_u32_le(MSG_PAD_DATA);
    write_meta(&mut body, meta);
    body.write_bool(meta.is_active)
        .write_u32_le(report.packet_counter);

    let buttons = &report.buttons;
    body.write_u8(dpad_meta_bitmap(buttons))
        .write_u8(face_shoulder_bitmap(buttons))
        .write_bool(buttons.ps)
        .write_bool(buttons.touch);

    body.write_u8(report.left_stick.x)
        .write_u8(report.left_stick.y)
        .write_u8(report.right_stick.x)
        .write_u8(report.right_stick.y);

    body.write_u8(analog_from(buttons.dpad_left))
        .write_u8(analog_from(buttons.dpad_down))
        .write_u8(analog_from(buttons.dpad_right))
        .write_u8(analog_from(buttons.dpad_up));
    body.write_u8(analog_from(buttons.square))
        .write_u8(analog_from(buttons.cross))
        .write_u8(analog_from(buttons.circle))
        .write_u8(analog_from(buttons.triangle));
    body.write_u8(analog_from(buttons.r1))
        .write_u8(analog_from(buttons.l1));
    body.write_u8(report.r2_analog).write_u8(report.l2_analog);

    write_touch(&mut body, &report.touch_first);
    write_touch(&mut body, &report.touch_second);

    body.write_u64_le(report.motion_timestamp_us);
    body.write_f32_le(report.accelerometer.x)
        .write_f32_le(report.accelerometer.y)
        .write_f32_le(report.accelerometer.z);
    body.write_f32_le(report.gyroscope.x)
        .write_f32_le(report.gyroscope.y)
        .write_f32_le(report.gyroscope.z);

    frame_response(server_id, &body.into_inner())
}

fn decode_state(value: u8) -> ProtocolResult<PadState> {
    match value {
        0x00 => Ok(PadState::Disconnected),
        0x01 => Ok(PadState::Reserved),
        0x02 => Ok(PadState::Connected),
        _ => Err(ProtocolError::BadFieldValue {
            field: "state",
            value,
        }),
    }
}

fn decode_model(value: u8) -> ProtocolResult<PadModel> {
    match value {
        0x00 => Ok(PadModel::None),
        0x01 => Ok(PadModel::PartialGyro),
        0x02 => Ok(PadModel::FullGyro),
        _ => Err(ProtocolError::BadFieldValue {
            field: "model",
            value,
        }),
    }
}

fn decode_connection(value: u8) -> ProtocolResult<ConnectionType> {
    match value {
        0x00 => Ok(ConnectionType::None),
        0x01 => Ok(ConnectionType::Usb),
        0x02 => Ok(ConnectionType::Bluetooth),
        _ => Err(ProtocolError::BadFieldValue {
            field: "connection",
            value,
        }),
    }
}

fn decode_battery(value: u8) -> ProtocolResult<BatteryStatus> {
    match value {
        0x00 => Ok(BatteryStatus::NotApplicable),
        0x01 => Ok(BatteryStatus::Dying),
        0x02 => Ok(BatteryStatus::Low),
        0x03 => Ok(BatteryStatus::Medium),
        0x04 => Ok(BatteryStatus::High),
        0x05 => Ok(BatteryStatus::Full),
        0xEE => Ok(BatteryStatus::Charging),
        0xEF => Ok(BatteryStatus::Charged),
        _ => Err(ProtocolError::BadFieldValue {
            field: "battery",
            value,
        }),
    }
}

fn read_meta(reader: &mut PacketReader<'_>) -> ProtocolResult<DualShockMeta> {
    Ok(DualShockMeta {
        pad_id: reader.read_u8()?,
        state: decode_state(reader.read_u8()?)?,
        model: decode_model(reader.read_u8()?)?,
        connection: decode_connection(reader.read_u8()?)?,
        mac: reader.read_mac()?,
        battery: decode_battery(reader.read_u8()?)?,
        is_active: false,
    })
}

fn read_touch(reader: &mut PacketReader<'_>) -> ProtocolResult<TouchPoint> {
    Ok(TouchPoint {
        is_active: reader.read_u8()? != 0,
        id: reader.read_u8()?,
        x: reader.read_u16_le()?,
        y: reader.read_u16_le()?,
    })
}

/// A decoded server-to-client datagram. Used by the probe client and the
/// round-trip tests; a DSU consumer would do the equivalent on its side.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Version { max_version: u32 },
    /// Port info carries no is-active flag; `meta.is_active` is `false`.
    PortInfo { meta: DualShockMeta },
    PadData { meta: DualShockMeta, report: NormalizedReport },
}

/// Validate and decode one server datagram.
pub fn parse_response(datagram: &[u8]) -> ProtocolResult<Response> {
    let (_, mut reader) = parse_server_datagram(datagram)?;
    let message_type = reader.read_u32_le()?;

    match message_type {
        MSG_VERSION => Ok(Response::Version {
            max_version: reader.read_u32_le()?,
        }),
        MSG_PORT_INFO => {
            let meta = read_meta(&mut reader)?;
            reader.skip(1)?;
            Ok(Response::PortInfo { meta })
        }
        MSG_PAD_DATA => {
            if datagram.len() != PAD_DATA_LEN {
                return Err(ProtocolError::Truncated {
                    expected: PAD_DATA_LEN,
                    actual: datagram.len(),
                });
            }
            let mut meta = read_meta(&mut reader)?;
            meta.is_active = reader.read_u8()? != 0;

            let packet_counter = reader.read_u32_le()?;
            let bitmap_a = reader.read_u8()?;
            let bitmap_b = reader.read_u8()?;
            let ps = reader.read_u8()? != 0;
            let touch = reader.read_u8()? != 0;

            let left_stick = StickPosition {
                x: reader.read_u8()?,
                y: reader.read_u8()?,
            };
            let right_stick = StickPosition {
                x: reader.read_u8()?,
                y: reader.read_u8()?,
            };

            // The analog button block repeats the bitmaps; skip it and the
            // shoulder pair, then pick up the true analog triggers.
            reader.skip(10)?;
            let r2_analog = reader.read_u8()?;
            let l2_analog = reader.read_u8()?;

            let touch_first = read_touch(&mut reader)?;
            let touch_second = read_touch(&mut reader)?;

            let motion_timestamp_us = reader.read_u64_le()?;
            let accelerometer = MotionVector {
                x: reader.read_f32_le()?,
                y: reader.read_f32_le()?,
                z: reader.read_f32_le()?,
            };
            let gyroscope = MotionVector {
                x: reader.read_f32_le()?,
                y: reader.read_f32_le()?,
                z: reader.read_f32_le()?,
            };

            let buttons = Buttons {
                dpad_left: bitmap_a & 0x80 != 0,
                dpad_down: bitmap_a & 0x40 != 0,
                dpad_right: bitmap_a & 0x20 != 0,
                dpad_up: bitmap_a & 0x10 != 0,
                options: bitmap_a & 0x08 != 0,
                r3: bitmap_a & 0x04 != 0,
                l3: bitmap_a & 0x02 != 0,
                share: bitmap_a & 0x01 != 0,
                square: bitmap_b & 0x80 != 0,
                cross: bitmap_b & 0x40 != 0,
                circle: bitmap_b & 0x20 != 0,
                triangle: bitmap_b & 0x10 != 0,
                r1: bitmap_b & 0x08 != 0,
                l1: bitmap_b & 0x04 != 0,
                r2: bitmap_b & 0x02 != 0,
                l2: bitmap_b & 0x01 != 0,
                ps,
                touch,
            };

            Ok(Response::PadData {
                meta,
                report: NormalizedReport {
                    packet_counter,
                    buttons,
                    left_stick,
                    right_stick,
                    l2_analog,
                    r2_analog,
                    touch_first,
                    touch_second,
                    motion_timestamp_us,
                    accelerometer,
                    gyroscope,
                },
            })
        }
        other => Err(ProtocolError::UnknownMessageType(other)),
    }
}
