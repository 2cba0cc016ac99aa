//! HID report types sent over HID-over-GATT.
//!
//! Only the mouse input report exists: no clicks, no scrolling, just
//! relative motion produced by the motion model.

pub mod mouse;
pub mod notify;

#[cfg(test)]
mod tests;

pub use mouse::{MouseReport, MOUSE_REPORT_DESCRIPTOR, MOUSE_REPORT_ID, MOUSE_REPORT_SIZE};
pub use notify::{notifications_enabled, InputSubscription};

/// HID Information characteristic value: bcdHID 1.11, country 0,
/// flags = remote wake | normally connectable.
pub const HID_INFORMATION: [u8; 4] = [0x11, 0x01, 0x00, 0x03];

/// Report Reference descriptor type for an input report.
pub const REPORT_TYPE_INPUT: u8 = 0x01;

/// Report Reference descriptor value for the mouse input report.
pub const MOUSE_INPUT_REFERENCE: [u8; 2] = [MOUSE_REPORT_ID, REPORT_TYPE_INPUT];

/// Protocol Mode characteristic value for report protocol.
pub const PROTOCOL_MODE_REPORT: u8 = 0x01;
