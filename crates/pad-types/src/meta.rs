//! Pad identity: MAC address, slot state, battery and connection enums.
//!
//! Wire values follow the reference DSU definition; the enums carry their
//! one-byte encodings explicitly so the protocol crate can emit them without
//! a mapping table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 48-bit hardware address.
///
/// Internally always six raw octets. The canonical textual form is
/// lowercase colon-separated hex (`"aa:bb:cc:dd:ee:ff"`); conversion happens
/// only at the string boundary via [`fmt::Display`] and [`FromStr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// The all-zero address, used by clients that subscribe without naming a pad.
    pub const NIL: MacAddress = MacAddress([0; 6]);

    /// Raw octets in transmission order.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Error parsing a textual MAC address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid MAC address {input:?}: expected six colon-separated hex octets")]
pub struct MacParseError {
    pub input: String,
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in &mut octets {
            let part = parts.next().ok_or_else(|| MacParseError {
                input: s.to_string(),
            })?;
            *octet = u8::from_str_radix(part, 16).map_err(|_| MacParseError {
                input: s.to_string(),
            })?;
        }
        if parts.next().is_some() {
            return Err(MacParseError {
                input: s.to_string(),
            });
        }
        Ok(MacAddress(octets))
    }
}

/// Slot occupancy state as reported to DSU clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PadState {
    #[default]
    Disconnected = 0x00,
    Reserved = 0x01,
    Connected = 0x02,
}

/// How much of the DualShock feature set the pad models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PadModel {
    #[default]
    None = 0x00,
    PartialGyro = 0x01,
    FullGyro = 0x02,
}

/// Physical transport of the pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConnectionType {
    #[default]
    None = 0x00,
    Usb = 0x01,
    Bluetooth = 0x02,
}

/// Battery charge indication, one byte on the wire.
///
/// The charging states deliberately sit far from the level states; the
/// consumer treats `0xEE`/`0xEF` specially.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BatteryStatus {
    #[default]
    NotApplicable = 0x00,
    Dying = 0x01,
    Low = 0x02,
    Medium = 0x03,
    High = 0x04,
    Full = 0x05,
    Charging = 0xEE,
    Charged = 0xEF,
}

/// The identifying/static portion of a pad's state, attached to every
/// outgoing report and to port-info replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualShockMeta {
    /// Slot index 0..=3. The server overwrites this with the slot the source
    /// is actually mounted in before anything reaches the wire.
    pub pad_id: u8,
    pub state: PadState,
    pub model: PadModel,
    pub connection: ConnectionType,
    pub mac: MacAddress,
    pub battery: BatteryStatus,
    /// Whether the pad is currently delivering reports.
    pub is_active: bool,
}

impl DualShockMeta {
    /// Meta for a live full-motion pad, the common case for a mounted source.
    pub fn connected(mac: MacAddress, connection: ConnectionType) -> Self {
        Self {
            pad_id: 0,
            state: PadState::Connected,
            model: PadModel::FullGyro,
            connection,
            mac,
            battery: BatteryStatus::NotApplicable,
            is_active: true,
        }
    }

    pub fn with_pad_id(mut self, pad_id: u8) -> Self {
        self.pad_id = pad_id;
        self
    }
}
