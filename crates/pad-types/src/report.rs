//! Per-frame pad state: buttons, sticks, touch points, motion.

use serde::{Deserialize, Serialize};

/// Named digital buttons, DualShock nomenclature.
///
/// The d-pad directions live here too: the wire format treats them as part
/// of the same bitmaps, and producers report them as plain booleans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buttons {
    pub cross: bool,
    pub circle: bool,
    pub square: bool,
    pub triangle: bool,
    pub l1: bool,
    pub r1: bool,
    pub l2: bool,
    pub r2: bool,
    pub l3: bool,
    pub r3: bool,
    pub options: bool,
    pub share: bool,
    pub ps: bool,
    pub touch: bool,
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
}

/// An analog stick position. `0x80` is center on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickPosition {
    pub x: u8,
    pub y: u8,
}

impl StickPosition {
    pub const CENTER: StickPosition = StickPosition { x: 0x80, y: 0x80 };
}

impl Default for StickPosition {
    fn default() -> Self {
        Self::CENTER
    }
}

/// One trackpad contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub is_active: bool,
    /// Contact id, stable for the lifetime of one touch.
    pub id: u8,
    pub x: u16,
    pub y: u16,
}

/// A three-axis sensor sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MotionVector {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// The per-frame dynamic portion of a pad's state, as emitted by producers.
///
/// `packet_counter` must increase monotonically per source; the DSU consumer
/// uses it to discard reordered datagrams. `motion_timestamp_us` is a
/// free-running microsecond counter, not wall-clock time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReport {
    pub packet_counter: u32,
    pub buttons: Buttons,
    pub left_stick: StickPosition,
    pub right_stick: StickPosition,
    /// Analog travel of the left trigger, 0 released .. 255 fully pressed.
    pub l2_analog: u8,
    /// Analog travel of the right trigger.
    pub r2_analog: u8,
    pub touch_first: TouchPoint,
    pub touch_second: TouchPoint,
    pub motion_timestamp_us: u64,
    /// Linear acceleration in g.
    pub accelerometer: MotionVector,
    /// Angular velocity in deg/s.
    pub gyroscope: MotionVector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_report_is_neutral() {
        let report = NormalizedReport::default();
        assert_eq!(report.left_stick, StickPosition::CENTER);
        assert_eq!(report.right_stick, StickPosition::CENTER);
        assert_eq!(report.l2_analog, 0);
        assert!(!report.buttons.cross);
        assert!(!report.touch_first.is_active);
    }
}
