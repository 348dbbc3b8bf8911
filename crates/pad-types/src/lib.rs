//! Shared pad data model for the padbridge DSU bridge.
//!
//! This crate defines the "DualShock-shaped" view of a motion-sensing gamepad
//! that the rest of the workspace exchanges:
//!
//! - [`DualShockMeta`]: the identifying/static portion of a pad's state
//!   (pad id, MAC address, battery, connection type).
//! - [`NormalizedReport`]: the per-frame dynamic portion (buttons, sticks,
//!   touch points, motion).
//!
//! HID producers emit these values; the DSU server consumes them. No wire
//! encoding lives here; that is `padbridge-dsu-protocol`'s job.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod meta;
pub mod report;

pub use meta::*;
pub use report::*;
