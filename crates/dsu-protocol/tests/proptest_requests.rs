//! Property tests for the DSU codec: arbitrary input never panics, framed
//! packets always validate, and the pad-data serializer round-trips.

use padbridge_dsu_protocol as dsu;
use padbridge_pad_types::{
    BatteryStatus, Buttons, ConnectionType, DualShockMeta, MacAddress, MotionVector,
    NormalizedReport, PadModel, PadState, StickPosition, TouchPoint,
};
use proptest::prelude::*;

fn arb_mac() -> impl Strategy<Value = MacAddress> {
    any::<[u8; 6]>().prop_map(MacAddress)
}

fn arb_meta() -> impl Strategy<Value = DualShockMeta> {
    (0u8..4, arb_mac(), any::<bool>()).prop_map(|(pad_id, mac, is_active)| DualShockMeta {
        pad_id,
        state: PadState::Connected,
        model: PadModel::FullGyro,
        connection: ConnectionType::Bluetooth,
        mac,
        battery: BatteryStatus::Medium,
        is_active,
    })
}

fn arb_buttons() -> impl Strategy<Value = Buttons> {
    (any::<u32>()).prop_map(|bits| Buttons {
        cross: bits & 1 != 0,
        circle: bits & 2 != 0,
        square: bits & 4 != 0,
        triangle: bits & 8 != 0,
        l1: bits & 16 != 0,
        r1: bits & 32 != 0,
        l2: bits & 64 != 0,
        r2: bits & 128 != 0,
        l3: bits & 256 != 0,
        r3: bits & 512 != 0,
        options: bits & 1024 != 0,
        share: bits & 2048 != 0,
        ps: bits & 4096 != 0,
        touch: bits & 8192 != 0,
        dpad_up: bits & 16384 != 0,
        dpad_down: bits & 32768 != 0,
        dpad_left: bits & 65536 != 0,
        dpad_right: bits & 131072 != 0,
    })
}

fn arb_touch() -> impl Strategy<Value = TouchPoint> {
    (any::<bool>(), any::<u8>(), any::<u16>(), any::<u16>()).prop_map(|(is_active, id, x, y)| {
        TouchPoint {
            is_active,
            id,
            x,
            y,
        }
    })
}

fn arb_motion() -> impl Strategy<Value = MotionVector> {
    // Finite values only so equality survives the f32 round-trip.
    (-2000.0f32..2000.0, -2000.0f32..2000.0, -2000.0f32..2000.0)
        .prop_map(|(x, y, z)| MotionVector::new(x, y, z))
}

fn arb_report() -> impl Strategy<Value = NormalizedReport> {
    (
        (any::<u32>(), arb_buttons()),
        (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>()),
        (any::<u8>(), any::<u8>()),
        (arb_touch(), arb_touch()),
        any::<u64>(),
        (arb_motion(), arb_motion()),
    )
        .prop_map(
            |((packet_counter, buttons), (lx, ly, rx, ry), (l2, r2), (t1, t2), ts, (accel, gyro))| {
                NormalizedReport {
                    packet_counter,
                    buttons,
                    left_stick: StickPosition { x: lx, y: ly },
                    right_stick: StickPosition { x: rx, y: ry },
                    l2_analog: l2,
                    r2_analog: r2,
                    touch_first: t1,
                    touch_second: t2,
                    motion_timestamp_us: ts,
                    accelerometer: accel,
                    gyroscope: gyro,
                }
            },
        )
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn prop_arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0usize..256)) {
        let _ = dsu::parse_request(&data);
        let _ = dsu::parse_response(&data);
    }

    #[test]
    fn prop_short_datagrams_are_rejected(data in proptest::collection::vec(any::<u8>(), 0usize..16)) {
        prop_assert!(dsu::parse_request(&data).is_err());
    }

    #[test]
    fn prop_framed_requests_always_validate(
        client_id in any::<u32>(),
        flags in 0u8..4,
        pad_id in 0u8..4,
        mac in arb_mac(),
    ) {
        let datagram = dsu::pad_data_request(client_id, flags, pad_id, mac);
        let (header, request) = dsu::parse_request(&datagram).expect("framed request must parse");
        prop_assert_eq!(header.peer_id, client_id);
        prop_assert_eq!(request, dsu::Request::PadData(dsu::PadDataRequest { flags, pad_id, mac }));
    }

    #[test]
    fn prop_pad_data_round_trips(
        server_id in any::<u32>(),
        meta in arb_meta(),
        report in arb_report(),
    ) {
        let datagram = dsu::pad_data_response(server_id, &meta, &report);
        prop_assert_eq!(datagram.len(), dsu::PAD_DATA_LEN);

        let response = dsu::parse_response(&datagram).expect("own datagram must parse");
        match response {
            dsu::Response::PadData { meta: parsed_meta, report: parsed_report } => {
                prop_assert_eq!(parsed_meta, meta);
                prop_assert_eq!(parsed_report, report);
            }
            other => prop_assert!(false, "expected pad data, got {:?}", other),
        }
    }

    #[test]
    fn prop_truncating_any_response_fails_parsing(
        meta in arb_meta(),
        cut in 1usize..99,
    ) {
        let datagram = dsu::pad_data_response(1, &meta, &NormalizedReport::default());
        prop_assert!(dsu::parse_response(&datagram[..cut.min(datagram.len() - 1)]).is_err());
    }
}
