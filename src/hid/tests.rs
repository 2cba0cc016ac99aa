//! Unit tests for the mouse report and its descriptor.
//!
//! These tests run on the host (not embedded) and verify the pure
//! logic of report construction and serialization.

use super::mouse::{MouseReport, MAX_AXIS_DELTA, MOUSE_REPORT_DESCRIPTOR, MOUSE_REPORT_SIZE};
use super::{MOUSE_INPUT_REFERENCE, MOUSE_REPORT_ID};
use crate::motion::PointerDelta;

// ═══════════════════════════════════════════════════════════════════════════
// Mouse Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn mouse_report_empty() {
    let report = MouseReport::empty();
    assert!(report.is_idle());
    assert_eq!(report.buttons, 0);
    assert_eq!(report.x, 0);
    assert_eq!(report.y, 0);
    assert_eq!(report.wheel, 0);
}

#[test]
fn mouse_report_from_small_delta() {
    let report = MouseReport::from_delta(PointerDelta::new(1, -1));
    assert_eq!(report.x, 1);
    assert_eq!(report.y, -1);
    assert_eq!(report.buttons, 0);
    assert_eq!(report.wheel, 0);
    assert!(!report.is_idle());
}

#[test]
fn mouse_report_clamps_oversized_delta() {
    let report = MouseReport::from_delta(PointerDelta::new(500, -500));
    assert_eq!(report.x as i32, MAX_AXIS_DELTA);
    assert_eq!(report.y as i32, -MAX_AXIS_DELTA);
}

#[test]
fn mouse_report_serialize_layout() {
    let report = MouseReport::from_delta(PointerDelta::new(-10, 20));
    let mut buf = [0u8; 4];
    let written = report.serialize(&mut buf);
    assert_eq!(written, MOUSE_REPORT_SIZE);
    assert_eq!(buf, [0x00, 0xF6, 0x14, 0x00]);
    assert_eq!(report.to_bytes(), buf);
}

#[test]
fn mouse_report_serialize_buffer_too_small() {
    let report = MouseReport::empty();
    let mut buf = [0u8; 2];
    let written = report.serialize(&mut buf);
    assert_eq!(written, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Descriptor Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn descriptor_declares_mouse_report_id() {
    let pos = MOUSE_REPORT_DESCRIPTOR
        .windows(2)
        .position(|w| w[0] == 0x85)
        .expect("report id item");
    assert_eq!(MOUSE_REPORT_DESCRIPTOR[pos + 1], MOUSE_REPORT_ID);
    assert_eq!(MOUSE_INPUT_REFERENCE, [MOUSE_REPORT_ID, 0x01]);
}

#[test]
fn descriptor_collections_are_balanced() {
    // Walk short items so data bytes are never mistaken for tags.
    let mut depth = 0i32;
    let mut i = 0;
    while i < MOUSE_REPORT_DESCRIPTOR.len() {
        let prefix = MOUSE_REPORT_DESCRIPTOR[i];
        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        match prefix & 0xFC {
            0xA0 => depth += 1,
            0xC0 => depth -= 1,
            _ => {}
        }
        assert!(depth >= 0);
        i += 1 + size;
    }
    assert_eq!(depth, 0);
}
