//! Host-testable core of the gatinho mouse jiggler.
//!
//! Everything in here is hardware-agnostic: the motion model, the connection
//! watchdog, the HID report codec and the display logic (drawn through
//! `embedded-graphics`, so tests render into a `MockDisplay`).
//!
//! Usage: `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].
//! It adds the SoftDevice BLE peripheral and the SSD1306 driver on top of
//! this library.

#![cfg_attr(not(test), no_std)]

// ═══════════════════════════════════════════════════════════════════════════
// Core logic
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod motion;
pub mod random;
pub mod watchdog;

// ═══════════════════════════════════════════════════════════════════════════
// HID + display
// ═══════════════════════════════════════════════════════════════════════════

pub mod hid;
pub mod ui;

// ═══════════════════════════════════════════════════════════════════════════
// Control loop
// ═══════════════════════════════════════════════════════════════════════════

pub mod app;

pub use app::{Jiggler, JigglerConfig, TickOutcome, TickReport, Transport};
pub use error::{BleError, Error};
pub use motion::{MotionConfig, MotionEngine, MotionState, PointerDelta};
pub use random::RandomSource;
pub use watchdog::{ConnectionWatchdog, RestartSignal};
